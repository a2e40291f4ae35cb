use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("session not found")]
    NotFound,

    #[error("session expired")]
    Expired,

    #[error("token generation failed: {0}")]
    Generation(String),
}

pub type SessionResult<T> = Result<T, SessionError>;
