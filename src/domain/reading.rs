use serde::{Deserialize, Serialize};

use super::InputError;

/// Form/model field names in the order the regression model expects them.
pub const FEATURE_NAMES: [&str; 10] = [
    "Global_reactive_power",
    "Voltage",
    "Global_intensity",
    "Sub_metering_1",
    "Sub_metering_2",
    "Sub_metering_3",
    "Hour",
    "Day",
    "Month",
    "Weekday",
];

/// One household metering reading, as submitted for power estimation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeterReading {
    /// Global reactive power (kW)
    pub global_reactive_power: f64,
    /// Mains voltage (V)
    pub voltage: f64,
    /// Global current intensity (A)
    pub global_intensity: f64,
    /// Kitchen circuit (Wh)
    pub sub_metering_1: f64,
    /// Laundry circuit (Wh)
    pub sub_metering_2: f64,
    /// Water heater and air conditioning (Wh)
    pub sub_metering_3: f64,
    pub hour: i64,
    pub day: i64,
    pub month: i64,
    /// Day of week, Monday = 0
    pub weekday: i64,
}

impl MeterReading {
    /// Model input in `FEATURE_NAMES` order.
    pub fn features(&self) -> [f64; 10] {
        [
            self.global_reactive_power,
            self.voltage,
            self.global_intensity,
            self.sub_metering_1,
            self.sub_metering_2,
            self.sub_metering_3,
            self.hour as f64,
            self.day as f64,
            self.month as f64,
            self.weekday as f64,
        ]
    }
}

/// Raw `/predict_power` form body. Every field is kept as text so a bad
/// value can be reported by name instead of failing extraction wholesale.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReadingForm {
    #[serde(rename = "Global_reactive_power")]
    pub global_reactive_power: Option<String>,
    #[serde(rename = "Voltage")]
    pub voltage: Option<String>,
    #[serde(rename = "Global_intensity")]
    pub global_intensity: Option<String>,
    #[serde(rename = "Sub_metering_1")]
    pub sub_metering_1: Option<String>,
    #[serde(rename = "Sub_metering_2")]
    pub sub_metering_2: Option<String>,
    #[serde(rename = "Sub_metering_3")]
    pub sub_metering_3: Option<String>,
    #[serde(rename = "Hour")]
    pub hour: Option<String>,
    #[serde(rename = "Day")]
    pub day: Option<String>,
    #[serde(rename = "Month")]
    pub month: Option<String>,
    #[serde(rename = "Weekday")]
    pub weekday: Option<String>,
}

impl ReadingForm {
    /// Parse every field, failing on the first one that is missing or malformed.
    pub fn parse(&self) -> Result<MeterReading, InputError> {
        Ok(MeterReading {
            global_reactive_power: parse_real(
                "Global_reactive_power",
                self.global_reactive_power.as_deref(),
            )?,
            voltage: parse_real("Voltage", self.voltage.as_deref())?,
            global_intensity: parse_real("Global_intensity", self.global_intensity.as_deref())?,
            sub_metering_1: parse_real("Sub_metering_1", self.sub_metering_1.as_deref())?,
            sub_metering_2: parse_real("Sub_metering_2", self.sub_metering_2.as_deref())?,
            sub_metering_3: parse_real("Sub_metering_3", self.sub_metering_3.as_deref())?,
            hour: parse_integer("Hour", self.hour.as_deref())?,
            day: parse_integer("Day", self.day.as_deref())?,
            month: parse_integer("Month", self.month.as_deref())?,
            weekday: parse_integer("Weekday", self.weekday.as_deref())?,
        })
    }
}

fn present<'a>(field: &'static str, raw: Option<&'a str>) -> Result<&'a str, InputError> {
    match raw.map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(InputError::Missing { field }),
    }
}

/// Parse a finite real number.
pub fn parse_real(field: &'static str, raw: Option<&str>) -> Result<f64, InputError> {
    let value = present(field, raw)?;
    match value.parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => Ok(parsed),
        _ => Err(InputError::NotANumber {
            field,
            value: value.to_string(),
        }),
    }
}

/// Parse a whole number; `"3.0"` is rejected.
pub fn parse_integer(field: &'static str, raw: Option<&str>) -> Result<i64, InputError> {
    let value = present(field, raw)?;
    value.parse::<i64>().map_err(|_| InputError::NotAnInteger {
        field,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn valid_form() -> ReadingForm {
        ReadingForm {
            global_reactive_power: Some("0.418".to_string()),
            voltage: Some("234.84".to_string()),
            global_intensity: Some("18.4".to_string()),
            sub_metering_1: Some("0".to_string()),
            sub_metering_2: Some("1".to_string()),
            sub_metering_3: Some("17".to_string()),
            hour: Some("17".to_string()),
            day: Some("16".to_string()),
            month: Some("12".to_string()),
            weekday: Some("5".to_string()),
        }
    }

    #[test]
    fn test_parse_valid_form() {
        let reading = valid_form().parse().unwrap();
        assert_eq!(reading.voltage, 234.84);
        assert_eq!(reading.sub_metering_3, 17.0);
        assert_eq!(reading.weekday, 5);
    }

    #[test]
    fn test_features_follow_field_order() {
        let reading = valid_form().parse().unwrap();
        let features = reading.features();
        assert_eq!(features.len(), FEATURE_NAMES.len());
        assert_eq!(features[0], 0.418);
        assert_eq!(features[1], 234.84);
        assert_eq!(features[5], 17.0);
        assert_eq!(features[6], 17.0);
        assert_eq!(features[9], 5.0);
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        let mut form = valid_form();
        form.voltage = Some(" 230.5 ".to_string());
        form.hour = Some(" 8".to_string());
        let reading = form.parse().unwrap();
        assert_eq!(reading.voltage, 230.5);
        assert_eq!(reading.hour, 8);
    }

    #[test]
    fn test_missing_field_is_named() {
        let mut form = valid_form();
        form.sub_metering_2 = None;
        assert_eq!(
            form.parse().unwrap_err(),
            InputError::Missing { field: "Sub_metering_2" }
        );

        let mut form = valid_form();
        form.day = Some("   ".to_string());
        assert_eq!(form.parse().unwrap_err(), InputError::Missing { field: "Day" });
    }

    #[rstest]
    #[case("abc")]
    #[case("NaN")]
    #[case("inf")]
    #[case("1,5")]
    fn test_rejects_non_numeric_reals(#[case] raw: &str) {
        let mut form = valid_form();
        form.global_intensity = Some(raw.to_string());
        assert_eq!(
            form.parse().unwrap_err(),
            InputError::NotANumber {
                field: "Global_intensity",
                value: raw.to_string(),
            }
        );
    }

    #[rstest]
    #[case("3.0")]
    #[case("three")]
    #[case("1e2")]
    fn test_rejects_non_integer_calendar_fields(#[case] raw: &str) {
        let mut form = valid_form();
        form.month = Some(raw.to_string());
        assert_eq!(
            form.parse().unwrap_err(),
            InputError::NotAnInteger {
                field: "Month",
                value: raw.to_string(),
            }
        );
    }

    #[test]
    fn test_first_bad_field_wins() {
        let mut form = valid_form();
        form.voltage = Some("x".to_string());
        form.weekday = None;
        assert_eq!(form.parse().unwrap_err().field(), Some("Voltage"));
    }
}
