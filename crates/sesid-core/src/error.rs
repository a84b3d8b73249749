//! Error types for domain identity reconciliation
//!
//! Reconciliation operations never catch their own errors. Everything bubbles
//! up to the lifecycle boundary, which turns it into a failure reason.

use thiserror::Error;

/// Result type alias for reconciliation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the identity reconciliation engine
#[derive(Error, Debug)]
pub enum Error {
    /// The mail service returned no token (or an empty token list)
    #[error("Token missing: {0}")]
    TokenMissing(String),

    /// The mail service has no identity registered for the domain
    #[error("Identity not found: {0}")]
    IdentityNotFound(String),

    /// DKIM attributes are absent or DKIM is disabled for the domain
    #[error("DKIM not configured: {0}")]
    DkimNotConfigured(String),

    /// A poll or propagation wait exhausted its attempt budget
    #[error("Wait timed out: {0}")]
    WaitTimeout(String),

    /// Mail service API errors
    #[error("Mail service error: {0}")]
    MailService(String),

    /// DNS provider API errors
    #[error("DNS provider error: {0}")]
    DnsProvider(String),

    /// A record read back from the DNS provider could not be decoded
    #[error("Record error: {0}")]
    Record(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a "token missing" error
    pub fn token_missing(msg: impl Into<String>) -> Self {
        Self::TokenMissing(msg.into())
    }

    /// Create an "identity not found" error
    pub fn identity_not_found(msg: impl Into<String>) -> Self {
        Self::IdentityNotFound(msg.into())
    }

    /// Create a "DKIM not configured" error
    pub fn dkim_not_configured(msg: impl Into<String>) -> Self {
        Self::DkimNotConfigured(msg.into())
    }

    /// Create a wait timeout error
    pub fn wait_timeout(msg: impl Into<String>) -> Self {
        Self::WaitTimeout(msg.into())
    }

    /// Create a mail service error
    pub fn mail_service(msg: impl Into<String>) -> Self {
        Self::MailService(msg.into())
    }

    /// Create a DNS provider error
    pub fn dns_provider(msg: impl Into<String>) -> Self {
        Self::DnsProvider(msg.into())
    }

    /// Create a record decoding error
    pub fn record(msg: impl Into<String>) -> Self {
        Self::Record(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the error came from a remote call that may succeed on retry
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::MailService(_) | Self::DnsProvider(_))
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
