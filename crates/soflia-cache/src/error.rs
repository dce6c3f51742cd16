//! Error types for the layers built on top of the cache.
//!
//! [`TtlCache`](crate::TtlCache) and [`ScormSessionStore`](crate::ScormSessionStore)
//! are total and never produce these. They come from key validation,
//! attempt authorization and persistence.

/// Error type for SCORM runtime and rate limiting operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// CMI key failed shape validation.
    #[error("Invalid CMI key: {0}")]
    InvalidKey(String),

    /// Value is not part of the element's vocabulary.
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    /// Element cannot be written by content.
    #[error("Element is read-only: {0}")]
    ReadOnly(String),

    /// Element cannot be read by content.
    #[error("Element is write-only: {0}")]
    WriteOnly(String),

    /// Attempt does not exist in storage.
    #[error("Attempt not found: {0}")]
    AttemptNotFound(String),

    /// Attempt belongs to a different user.
    #[error("Attempt {attempt_id} is not owned by user {user_id}")]
    Forbidden { attempt_id: String, user_id: String },

    /// Runtime call made before `initialize`.
    #[error("Attempt not initialized: {0}")]
    NotInitialized(String),

    /// Request denied by the rate limiter.
    #[error("{message}")]
    RateLimited {
        message: String,
        retry_after_secs: u64,
    },

    /// Error from the persistence backend.
    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl Error {
    /// HTTP status a request handler should answer with for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::InvalidKey(_)
            | Error::InvalidValue { .. }
            | Error::ReadOnly(_)
            | Error::WriteOnly(_)
            | Error::NotInitialized(_) => 400,
            Error::Forbidden { .. } => 403,
            Error::AttemptNotFound(_) => 404,
            Error::RateLimited { .. } => 429,
            Error::Persistence(_) => 500,
        }
    }
}

/// Result type for SCORM runtime and rate limiting operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::InvalidKey("x".into()).status_code(), 400);
        assert_eq!(
            Error::Forbidden {
                attempt_id: "a".into(),
                user_id: "u".into()
            }
            .status_code(),
            403
        );
        assert_eq!(Error::AttemptNotFound("a".into()).status_code(), 404);
        assert_eq!(
            Error::RateLimited {
                message: "slow down".into(),
                retry_after_secs: 1
            }
            .status_code(),
            429
        );
        assert_eq!(Error::Persistence("db".into()).status_code(), 500);
    }

    #[test]
    fn test_rate_limited_displays_message() {
        let err = Error::RateLimited {
            message: "Too many attempts".into(),
            retry_after_secs: 60,
        };
        assert_eq!(err.to_string(), "Too many attempts");
    }
}
