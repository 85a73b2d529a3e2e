use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Missing required column: {column}")]
    MissingColumn { column: String },

    #[error("Invalid risk profile: {field} has unrecognized value '{value}'")]
    InvalidProfile { field: String, value: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for AdvisorError {
    fn from(e: serde_json::Error) -> Self {
        AdvisorError::SerializationError(e.to_string())
    }
}
