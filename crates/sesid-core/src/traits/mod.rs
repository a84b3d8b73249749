//! Core traits for identity reconciliation
//!
//! This module defines the abstract interfaces the engine drives.
//!
//! - [`MailService`]: Register, inspect and remove sending identities
//! - [`DnsProvider`]: Read and change record sets in a hosted zone
//! - [`ServiceFactory`]: Build both for a given region

pub mod dns_provider;
pub mod mail_service;

pub use dns_provider::DnsProvider;
pub use mail_service::{DkimAttributes, MailService, VerificationAttributes, VerificationStatus};

use async_trait::async_trait;
use std::sync::Arc;

/// Helper trait for constructing region-bound service clients
///
/// The lifecycle handler may reconcile an old and a new configuration that
/// live in different regions, so clients are built per configuration rather
/// than once per process.
#[async_trait]
pub trait ServiceFactory: Send + Sync {
    /// Create a mail service client for `region`
    async fn mail_service(&self, region: &str) -> Result<Arc<dyn MailService>, crate::Error>;

    /// Create a DNS provider client for `region`
    async fn dns_provider(&self, region: &str) -> Result<Arc<dyn DnsProvider>, crate::Error>;
}
