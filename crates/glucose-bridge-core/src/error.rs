//! Core error types for glucose-bridge-core.
//!
//! This module defines the error hierarchy using thiserror. Every failure a
//! sync run can end in is classified into an [`ErrorKind`] before it is shown
//! to the user; the detailed enums keep the low-level cause for logging.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Terminal outcome classification of a sync run.
///
/// Each kind maps to one distinct user-facing status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    PermissionDenied,
    MissingToken,
    NetworkError,
    RemoteRejected,
    EmptyResponse,
    MalformedPayload,
    NothingToImport,
    StoreWriteError,
    Cancelled,
    InvalidManualValue,
}

impl ErrorKind {
    /// Stable identifier, used in logs and serialized results.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::PermissionDenied => "permission_denied",
            ErrorKind::MissingToken => "missing_token",
            ErrorKind::NetworkError => "network_error",
            ErrorKind::RemoteRejected => "remote_rejected",
            ErrorKind::EmptyResponse => "empty_response",
            ErrorKind::MalformedPayload => "malformed_payload",
            ErrorKind::NothingToImport => "nothing_to_import",
            ErrorKind::StoreWriteError => "store_write_error",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::InvalidManualValue => "invalid_manual_value",
        }
    }

    /// Message shown to the user when a run ends with this kind.
    pub fn status_message(&self) -> &'static str {
        match self {
            ErrorKind::PermissionDenied => {
                "Permission not granted. Open the health store permissions and allow writing blood glucose."
            }
            ErrorKind::MissingToken => "No import token found. Open the import link again.",
            ErrorKind::NetworkError => {
                "Could not reach the import service. Check your connection and try again."
            }
            ErrorKind::RemoteRejected => {
                "The import service rejected the request. The link may have expired."
            }
            ErrorKind::EmptyResponse => "The import service returned no data.",
            ErrorKind::MalformedPayload => {
                "The import service returned data in an unexpected format."
            }
            ErrorKind::NothingToImport => "No valid readings to import.",
            ErrorKind::StoreWriteError => "Saving to the health store failed. Nothing was imported.",
            ErrorKind::Cancelled => "Import cancelled.",
            ErrorKind::InvalidManualValue => "Enter a valid glucose value, for example 6.1.",
        }
    }

    /// Informational outcomes are reported to the user but are not faults.
    pub fn is_informational(&self) -> bool {
        matches!(self, ErrorKind::NothingToImport)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error that ends a sync run.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Write authorization for blood glucose is missing
    #[error("Write permission for blood glucose is not granted")]
    PermissionDenied,

    /// No usable import token
    #[error("No import token was supplied")]
    MissingToken,

    /// Fetching the batch failed
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// The batch body could not be decoded
    #[error("Malformed payload: {0}")]
    Payload(#[from] PayloadError),

    /// Every item was filtered out
    #[error("Batch of {attempted} item(s) contained no importable readings")]
    NothingToImport { attempted: usize },

    /// The store refused the bulk write
    #[error("Store write failed: {0}")]
    Store(#[from] StoreError),

    /// The hosting context cancelled the run
    #[error("Sync cancelled")]
    Cancelled,

    /// Manually typed value could not be used
    #[error("Invalid manual value '{input}': {message}")]
    InvalidManualValue { input: String, message: String },
}

impl SyncError {
    /// Classify this error for presentation.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::PermissionDenied => ErrorKind::PermissionDenied,
            SyncError::MissingToken => ErrorKind::MissingToken,
            SyncError::Fetch(err) => err.kind(),
            SyncError::Payload(_) => ErrorKind::MalformedPayload,
            SyncError::NothingToImport { .. } => ErrorKind::NothingToImport,
            SyncError::Store(_) => ErrorKind::StoreWriteError,
            SyncError::Cancelled => ErrorKind::Cancelled,
            SyncError::InvalidManualValue { .. } => ErrorKind::InvalidManualValue,
        }
    }
}

/// Errors from retrieving a batch over HTTP.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport failure (DNS, connect, TLS, timeout, body read)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Configured endpoint cannot be turned into a request URL
    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Non-2xx status
    #[error("Remote service rejected the request: HTTP {status}")]
    RemoteRejected { status: u16 },

    /// 2xx with a zero-length body
    #[error("Remote service returned an empty body")]
    EmptyResponse,
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::Network(_) | FetchError::InvalidUrl(_) => ErrorKind::NetworkError,
            FetchError::RemoteRejected { .. } => ErrorKind::RemoteRejected,
            FetchError::EmptyResponse => ErrorKind::EmptyResponse,
        }
    }
}

/// Structural payload errors. Item-level problems are never reported here.
#[derive(Error, Debug)]
pub enum PayloadError {
    /// Body is not valid JSON
    #[error("Payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// JSON root is not an object
    #[error("Payload root is not a JSON object")]
    NotAnObject,

    /// Object has no `items` array
    #[error("Payload has no '{key}' list")]
    MissingItems { key: &'static str },

    /// The parsing task did not run to completion
    #[error("Payload parsing was interrupted: {0}")]
    Interrupted(String),
}

/// Errors reported by the external health store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store rejected the records (validation, quota, permission revoked)
    #[error("Store rejected the records: {0}")]
    Rejected(String),

    /// The store could not be reached
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Failure of the external permission capability itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Permission capability error: {0}")]
pub struct PermissionError(pub String);

/// Result type alias for SyncError
pub type Result<T, E = SyncError> = std::result::Result<T, E>;
