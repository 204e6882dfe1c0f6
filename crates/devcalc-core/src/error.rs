use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DevCalcError {
    #[error("Invalid parameter: {field} — {reason}")]
    InvalidParameter { field: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("No convergence: {function} did not converge after {iterations} iterations (delta: {last_delta})")]
    NoConvergence {
        function: String,
        iterations: u32,
        last_delta: Decimal,
    },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Report output error: {0}")]
    ReportOutput(String),
}

impl DevCalcError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        DevCalcError::InvalidParameter {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for DevCalcError {
    fn from(e: serde_json::Error) -> Self {
        DevCalcError::SerializationError(e.to_string())
    }
}
