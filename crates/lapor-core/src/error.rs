//! Error taxonomy shared by every service.
//!
//! Request-path code returns `DomainError`; the HTTP layer maps each
//! variant onto a status code and the uniform `{success, error}` body.
//! Unique-constraint hits that the design treats as idempotent no-ops are
//! handled at the store layer and never surface as `Conflict`.

use thiserror::Error;

/// Platform-wide error kinds.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Bad request payload (empty content, malformed id, out-of-range value).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Missing or invalid credentials.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Role or agency mismatch.
    #[error("not authorized: {0}")]
    Authorization(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Operation forbidden by domain policy (e.g. upvote on a non-public report).
    #[error("policy violation: {0}")]
    Policy(String),

    /// Unique-constraint violation that is not an idempotent no-op.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Database or bus reachability failure.
    #[error("transport failure: {0}")]
    Transport(String),

    /// Per-replica projection apply failure.
    #[error("projection failure: {0}")]
    Projection(String),
}

impl DomainError {
    /// Shorthand for a `Validation` error from anything displayable.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => Self::NotFound("row not found".into()),
            other => Self::Transport(other.to_string()),
        }
    }
}
