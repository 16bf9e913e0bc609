//! Error types for snapshot sources.

use thiserror::Error;

/// Errors that can occur while fetching a monitor snapshot.
///
/// Every variant ends up in the same degraded badge; the distinction only
/// matters for logging and tests.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not complete.
    #[error("network error: {0}")]
    Network(String),

    /// The endpoint answered with a non-success status.
    #[error("HTTP error! status: {0}")]
    Status(u16),

    /// The body was not a valid snapshot.
    #[error("failed to decode snapshot: {0}")]
    Decode(#[from] serde_json::Error),

    /// A local snapshot file could not be read.
    #[error("read error: {0}")]
    Io(#[from] std::io::Error),
}

impl FetchError {
    /// Returns the HTTP status code, if this error carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status(code) => Some(*code),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_message_carries_code() {
        let err = FetchError::Status(503);
        assert_eq!(err.to_string(), "HTTP error! status: 503");
        assert_eq!(err.status(), Some(503));
    }

    #[test]
    fn test_decode_error_from_serde() {
        let err: FetchError = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        assert!(matches!(err, FetchError::Decode(_)));
        assert!(err.status().is_none());
    }
}
