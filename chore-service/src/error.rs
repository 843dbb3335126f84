use thiserror::Error;
use tonic::{Code, Status};

pub type Result<T> = std::result::Result<T, ChoreError>;

#[derive(Debug, Error)]
pub enum ChoreError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("database error: {0}")]
    Database(String),

    #[error("hashing error: {0}")]
    Hashing(String),
}

impl ChoreError {
    /// Convert to gRPC Status for wire protocol
    pub fn to_status(&self) -> Status {
        match self {
            ChoreError::InvalidCredentials => {
                Status::new(Code::Unauthenticated, "invalid username or password")
            }
            // Don't leak internal details to callers
            ChoreError::Database(_) | ChoreError::Hashing(_) => {
                Status::new(Code::Internal, "internal server error")
            }
        }
    }
}

impl From<sqlx::Error> for ChoreError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {}", err);
        ChoreError::Database(err.to_string())
    }
}

impl From<ChoreError> for Status {
    fn from(err: ChoreError) -> Self {
        err.to_status()
    }
}
