//! Error types for the gymdesk_core library.
//!
//! Every variant is recoverable by user retry; nothing here is fatal to
//! the process. The store client itself swallows transport failures into
//! fallback values (see `store`), so the taxonomy below is what business
//! operations report back to the UI.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for gymdesk_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Login state error
    #[error("Login state error: {0}")]
    State(String),

    /// Caller lacks the capability for the operation
    #[error("permission denied: {0}")]
    PermissionDenied(&'static str),

    /// Referenced entity does not exist
    #[error("not found: {0}")]
    NotFound(&'static str),

    /// Session has no seats left
    #[error("no seats left on this session")]
    CapacityExceeded,

    /// Caller already holds a non-cancelled booking for the session
    #[error("already booked on this session")]
    DuplicateBooking,

    /// A subscription write the operation depends on was rejected
    #[error("subscription ledger write failed: {0}")]
    LedgerWriteFailed(String),

    /// The document store rejected or dropped a required write
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// User-supplied input failed a client-side rule
    #[error("invalid input: {0}")]
    Validation(String),
}
