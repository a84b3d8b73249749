// # Mail Service Trait
//
// Defines the interface to the mail-sending service that owns domain
// identities and their DKIM signing configuration.
//
// ## Implementations
//
// - Amazon SES: `sesid-provider-aws` crate
//
// ## Usage
//
// ```rust,ignore
// use sesid_core::MailService;
//
// async fn register(service: &dyn MailService) -> sesid_core::Result<()> {
//     let token = service.request_verification_token("example.com").await?;
//     println!("publish {} under _amazonses.example.com", token);
//     Ok(())
// }
// ```

use crate::config::WaitSpec;
use async_trait::async_trait;
use std::fmt;

/// Verification state reported by the mail service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationStatus {
    Pending,
    Success,
    Failed,
    TemporaryFailure,
    NotStarted,
    /// A status this crate does not know about yet
    Unknown(String),
}

impl VerificationStatus {
    /// Parse the service's status string
    pub fn parse(value: &str) -> Self {
        match value {
            "Pending" => VerificationStatus::Pending,
            "Success" => VerificationStatus::Success,
            "Failed" => VerificationStatus::Failed,
            "TemporaryFailure" => VerificationStatus::TemporaryFailure,
            "NotStarted" => VerificationStatus::NotStarted,
            other => VerificationStatus::Unknown(other.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, VerificationStatus::Success)
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationStatus::Pending => f.write_str("Pending"),
            VerificationStatus::Success => f.write_str("Success"),
            VerificationStatus::Failed => f.write_str("Failed"),
            VerificationStatus::TemporaryFailure => f.write_str("TemporaryFailure"),
            VerificationStatus::NotStarted => f.write_str("NotStarted"),
            VerificationStatus::Unknown(other) => f.write_str(other),
        }
    }
}

/// Identity verification attributes of one domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationAttributes {
    pub status: VerificationStatus,
    /// Current verification token, if one has been issued
    pub token: Option<String>,
}

/// DKIM attributes of one domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DkimAttributes {
    pub enabled: bool,
    pub status: VerificationStatus,
    pub tokens: Vec<String>,
}

/// Trait for mail service implementations
///
/// Every method is a single remote call (or, for
/// [`wait_until_identity_exists`](MailService::wait_until_identity_exists), a
/// provider-native waiter). Ordering, merging and polling decisions belong to
/// [`crate::Verifier`].
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait MailService: Send + Sync {
    /// Start (or restart) domain verification and return the token to publish
    ///
    /// An empty string means the service issued no token.
    async fn request_verification_token(&self, domain: &str) -> Result<String, crate::Error>;

    /// Start DKIM setup and return the signing tokens to publish
    async fn request_dkim_tokens(&self, domain: &str) -> Result<Vec<String>, crate::Error>;

    /// Get the verification attributes of `domain`
    ///
    /// # Returns
    ///
    /// - `Ok(Some(..))`: The service knows the identity
    /// - `Ok(None)`: No identity is registered for the domain
    async fn verification_attributes(
        &self,
        domain: &str,
    ) -> Result<Option<VerificationAttributes>, crate::Error>;

    /// Get the DKIM attributes of `domain`
    ///
    /// # Returns
    ///
    /// - `Ok(Some(..))`: The service returned DKIM attributes
    /// - `Ok(None)`: The domain has no DKIM attributes
    async fn dkim_attributes(&self, domain: &str) -> Result<Option<DkimAttributes>, crate::Error>;

    /// Enable or disable DKIM signing for `domain`
    async fn set_dkim_enabled(&self, domain: &str, enabled: bool) -> Result<(), crate::Error>;

    /// Delete the identity registration of `domain`
    async fn delete_identity(&self, domain: &str) -> Result<(), crate::Error>;

    /// Block until the service reports `domain` verified
    ///
    /// Total wait is bounded by `wait.total()`; exceeding it is
    /// [`crate::Error::WaitTimeout`].
    async fn wait_until_identity_exists(
        &self,
        domain: &str,
        wait: &WaitSpec,
    ) -> Result<(), crate::Error>;

    /// Get the service name (for logging/debugging)
    fn service_name(&self) -> &'static str;
}
