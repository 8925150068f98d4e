use thiserror::Error;

/// Malformed request input.
///
/// Every variant names the offending form field so the message can be shown
/// to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("missing field `{field}`")]
    Missing { field: &'static str },

    #[error("field `{field}` must be a number, got {value:?}")]
    NotANumber { field: &'static str, value: String },

    #[error("field `{field}` must be a whole number, got {value:?}")]
    NotAnInteger { field: &'static str, value: String },

    #[error("forecast horizon must be a positive number of months, got {value}")]
    NonPositiveHorizon { value: i64 },

    #[error("forecast horizon of {value} months exceeds the maximum of {max}")]
    HorizonTooLarge { value: i64, max: u32 },
}

impl InputError {
    /// Name of the field that failed, if the error is tied to one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Missing { field }
            | Self::NotANumber { field, .. }
            | Self::NotAnInteger { field, .. } => Some(field),
            Self::NonPositiveHorizon { .. } | Self::HorizonTooLarge { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_field() {
        let err = InputError::NotANumber {
            field: "Voltage",
            value: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "field `Voltage` must be a number, got \"abc\"");
        assert_eq!(err.field(), Some("Voltage"));

        let err = InputError::Missing { field: "Hour" };
        assert_eq!(err.to_string(), "missing field `Hour`");
    }

    #[test]
    fn test_horizon_errors_have_no_field() {
        assert_eq!(InputError::NonPositiveHorizon { value: 0 }.field(), None);
        assert_eq!(
            InputError::HorizonTooLarge { value: 900, max: 600 }.field(),
            None
        );
    }
}
