//! Error types for the account API client.
//!
//! # Design
//! The taxonomy is flat. Status-derived variants (`ContentNotFound`,
//! `BadRequest`, `NotAuthorized`, `InternalServer`) come from the shared
//! classifier in `http`; `VersionConflict` is only produced by the delete
//! path. Failures that never reached a response (`Transport`, `Cancelled`,
//! `DeadlineExceeded`) are kept apart from the status taxonomy.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors returned by `AccountClient` and `Transport` implementations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The relative path could not be resolved or the body could not be
    /// serialized. Never retryable.
    #[error("request construction failed: {0}")]
    RequestConstruction(String),

    /// The server returned 404.
    #[error("content not found")]
    ContentNotFound,

    /// The server returned 400.
    #[error("bad request")]
    BadRequest,

    /// The server returned 403.
    #[error("not authorized")]
    NotAuthorized,

    /// Any other non-2xx status, or a non-201 answer to a create.
    #[error("internal server error (status {status})")]
    InternalServer { status: u16 },

    /// Delete was attempted against a stale version.
    #[error("version conflict")]
    VersionConflict,

    /// The response body did not match the expected shape.
    #[error("decode failed: {0}")]
    Decode(String),

    /// No response was received: connection refused, DNS, broken pipe.
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("request cancelled")]
    Cancelled,

    #[error("deadline exceeded")]
    DeadlineExceeded,
}

impl ApiError {
    /// Status code this error was derived from, when there is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::ContentNotFound => Some(404),
            ApiError::BadRequest => Some(400),
            ApiError::NotAuthorized => Some(403),
            ApiError::InternalServer { status } => Some(*status),
            ApiError::VersionConflict => Some(409),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_reported_for_status_derived_variants() {
        assert_eq!(ApiError::ContentNotFound.status(), Some(404));
        assert_eq!(ApiError::VersionConflict.status(), Some(409));
        assert_eq!(ApiError::InternalServer { status: 502 }.status(), Some(502));
        assert_eq!(ApiError::Transport("refused".to_string()).status(), None);
        assert_eq!(ApiError::Cancelled.status(), None);
    }

    #[test]
    fn display_includes_status_for_internal_server() {
        let err = ApiError::InternalServer { status: 500 };
        assert_eq!(err.to_string(), "internal server error (status 500)");
    }
}
