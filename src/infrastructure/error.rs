use thiserror::Error;

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Generation error: {0}")]
    Generation(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
