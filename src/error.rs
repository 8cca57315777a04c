use thiserror::Error;

/// Errors raised while decoding compiler input. Compilation itself never fails.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Invalid plan input: {0}")]
    InvalidInput(#[source] serde_json::Error),

    #[error("Invalid compile options: {0}")]
    InvalidOptions(#[source] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PlanError>;
