pub mod consumption;
pub mod power;

pub use consumption::*;
pub use power::*;

use thiserror::Error;

use crate::domain::InputError;

/// Failure of a single estimation or forecast request.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error(transparent)]
    InvalidInput(#[from] InputError),

    #[error("model failure: {0}")]
    Model(String),
}

impl ForecastError {
    pub(crate) fn model(err: impl std::fmt::Display) -> Self {
        Self::Model(err.to_string())
    }
}
