use std::{fmt, io, path::StripPrefixError};

use http::status::StatusCode;
use regex::Error as RegexError;
use serde::{Deserialize, Serialize};
use serde_json::Error as JsonError;
use thiserror::Error;
use walkdir::Error as WalkdirError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub enum VaultError {
    /// Transport or authorization failure talking to the backing store.
    #[error("Repository unavailable: {0}")]
    RepositoryUnavailable(String),
    #[error("Item Not Found: {0}")]
    NotFound(String),
    /// Optimistic-concurrency mismatch on create/update.
    #[error("Revision conflict on '{path}': expected {expected:?}, found {actual:?}")]
    Conflict {
        path: String,
        expected: Option<String>,
        actual: Option<String>,
    },
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Operation timed out after {0} ms")]
    Timeout(u64),
    #[error("File System error: {0}")]
    Io(String),
    #[error("(De)Serialization error: {0}")]
    Serialization(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Custom error: {0}")]
    Custom(String),
}

impl VaultError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            VaultError::RepositoryUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            VaultError::NotFound(_) => StatusCode::NOT_FOUND,
            VaultError::Conflict { .. } => StatusCode::CONFLICT,
            VaultError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            VaultError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            VaultError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            VaultError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            VaultError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            VaultError::Custom(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Fatal errors abort a multi-note scan. Everything else is recorded against the single note
    /// that raised it and the scan moves on.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            VaultError::RepositoryUnavailable(_) | VaultError::Timeout(_)
        )
    }
}

impl From<StripPrefixError> for VaultError {
    fn from(src: StripPrefixError) -> VaultError {
        VaultError::InvalidRequest(format!("Strip prefix failed for path. Error: {src}"))
    }
}

impl From<toml::de::Error> for VaultError {
    fn from(src: toml::de::Error) -> VaultError {
        VaultError::Config(format!("Toml deserialization error: {src}"))
    }
}

impl From<JsonError> for VaultError {
    fn from(src: JsonError) -> VaultError {
        VaultError::Serialization(format!("JSON (de)serialization error: {src}"))
    }
}

impl From<io::Error> for VaultError {
    fn from(x: io::Error) -> Self {
        match x.kind() {
            io::ErrorKind::NotFound => VaultError::NotFound(format!("{x}")),
            io::ErrorKind::AlreadyExists => VaultError::Conflict {
                path: format!("{x}"),
                expected: None,
                actual: None,
            },
            // A single unreadable file is a per-note failure, not an outage.
            io::ErrorKind::PermissionDenied => VaultError::Io(format!("{x}")),
            io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected => VaultError::RepositoryUnavailable(format!("{x}")),
            io::ErrorKind::InvalidData => VaultError::Serialization(format!("{x}")),
            _ => VaultError::Io(format!("IOError: {}", x.kind())),
        }
    }
}

impl From<WalkdirError> for VaultError {
    fn from(x: WalkdirError) -> Self {
        match x.into_io_error() {
            Some(io_error) => io_error.into(),
            None => VaultError::Io("directory walk hit a filesystem loop".to_string()),
        }
    }
}

impl From<fmt::Error> for VaultError {
    fn from(x: fmt::Error) -> Self {
        VaultError::Custom(format!("{x}"))
    }
}

impl From<RegexError> for VaultError {
    fn from(x: RegexError) -> Self {
        VaultError::Serialization(format!("Regex parse failed: {x}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_map_to_vault_kinds() {
        let not_found: VaultError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(not_found, VaultError::NotFound(_)));
        assert!(!not_found.is_fatal());

        let denied: VaultError = io::Error::new(io::ErrorKind::PermissionDenied, "no").into();
        assert!(matches!(denied, VaultError::Io(_)));
        assert!(!denied.is_fatal());

        let refused: VaultError = io::Error::new(io::ErrorKind::ConnectionRefused, "down").into();
        assert!(matches!(refused, VaultError::RepositoryUnavailable(_)));
        assert!(refused.is_fatal());
    }

    #[test]
    fn status_codes() {
        assert_eq!(
            VaultError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            VaultError::Conflict {
                path: "a.md".into(),
                expected: Some("1".into()),
                actual: Some("2".into())
            }
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(VaultError::Timeout(10).status_code(), StatusCode::GATEWAY_TIMEOUT);
    }
}
