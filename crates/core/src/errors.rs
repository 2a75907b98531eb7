use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchedError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] eyre::Report),

    #[error("Internal server error: {0}")]
    Internal(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl SchedError {
    pub fn validation(message: impl Into<String>) -> Self {
        SchedError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        SchedError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        SchedError::Conflict(message.into())
    }

    /// True for failures of the store or the process rather than of the request.
    pub fn is_internal(&self) -> bool {
        matches!(self, SchedError::Database(_) | SchedError::Internal(_))
    }
}

pub type SchedResult<T> = Result<T, SchedError>;
