//! Domain identity reconciliation
//!
//! The [`Verifier`] drives one domain identity to convergence:
//! - Requests verification and DKIM tokens from the mail service
//! - Merges its own values into (or out of) shared DNS record sets
//! - Submits change batches and waits for propagation
//! - Waits for the mail service to report the identity verified
//!
//! ## Merge-on-write
//!
//! The identity TXT record name (`_amazonses.<domain>.`) may legitimately
//! carry values owned by other systems. Every mutation reads the record
//! first and only adds or removes this identity's token. The full value set
//! is written blindly only when the record does not exist yet.
//!
//! ## Flow
//!
//! ```text
//! verify_identity:  token ──▶ read TXT ──▶ merge ──▶ change ──▶ wait DNS ──▶ wait verified
//! enable_dkim:      tokens ─▶ CNAME per token ─────▶ change ──▶ wait DNS ──▶ poll DKIM status
//! revoke_identity:  token ──▶ delete identity ──▶ read TXT ──▶ remove token ──▶ DELETE | UPSERT
//! disable_dkim:     tokens ─▶ disable DKIM ──▶ DELETE each CNAME
//! ```
//!
//! Nothing here is transactional: a failure leaves remote state as far as it
//! progressed, and re-running the same operation is safe.

use crate::config::{EngineConfig, IdentityConfig, WaitSpec};
use crate::error::{Error, Result};
use crate::record::{Change, ChangeAction, DnsRecord, RecordType, identity_record_name};
use crate::traits::{DkimAttributes, DnsProvider, MailService};
use crate::wait::wait_for;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Reconciles one domain identity against a mail service and a DNS zone
pub struct Verifier {
    config: IdentityConfig,
    mail: Arc<dyn MailService>,
    dns: Arc<dyn DnsProvider>,
    wait: WaitSpec,
}

impl std::fmt::Debug for Verifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Verifier")
            .field("config", &self.config)
            .field("mail", &self.mail.service_name())
            .field("dns", &self.dns.provider_name())
            .field("wait", &self.wait)
            .finish()
    }
}

impl Verifier {
    /// Create a verifier for `config`
    ///
    /// # Returns
    ///
    /// - `Ok(Verifier)`: Ready to reconcile
    /// - `Err(Error::Config)`: If `config` is incomplete
    pub fn new(
        config: IdentityConfig,
        mail: Arc<dyn MailService>,
        dns: Arc<dyn DnsProvider>,
        engine: &EngineConfig,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            mail,
            dns,
            wait: engine.wait,
        })
    }

    pub fn domain_name(&self) -> &str {
        &self.config.domain_name
    }

    pub fn hosted_zone_id(&self) -> &str {
        &self.config.hosted_zone_id
    }

    /// Publish a fresh verification token and wait until the domain verifies
    ///
    /// If the TXT record already exists the token is merged into it and the
    /// record is upserted. Otherwise `upsert` picks CREATE or UPSERT.
    pub async fn verify_identity(&self, upsert: bool) -> Result<()> {
        info!("Verifying domain {}", self.domain_name());
        let token = self.request_identity_token().await?;

        let change = match self.find_identity_record().await? {
            Some(mut record) => {
                if !record.insert(token.as_str()) {
                    debug!("Token already present in {}", record.name());
                }
                info!(
                    "Merging verification token into existing TXT record {} ({} value(s))",
                    record.name(),
                    record.len()
                );
                record.action(ChangeAction::Upsert)
            }
            None => {
                let record = DnsRecord::for_identity(self.domain_name(), [token]);
                info!(
                    "Creating TXT record {} in zone {}",
                    record.name(),
                    self.hosted_zone_id()
                );
                record.action(ChangeAction::create_or_upsert(upsert))
            }
        };

        let change_id = self.change_records(vec![change]).await?;

        info!("Waiting for DNS records to commit...");
        self.wait_for_record_change(&change_id).await?;

        info!("Waiting for domain verification...");
        self.wait_for_identity_verified().await
    }

    /// Publish DKIM CNAME records and wait until DKIM verifies
    pub async fn enable_dkim(&self, upsert: bool) -> Result<()> {
        info!("Enabling DKIM for {}", self.domain_name());
        let tokens = self.request_dkim_tokens().await?;

        info!(
            "Creating {} DKIM record(s) in zone {}",
            tokens.len(),
            self.hosted_zone_id()
        );
        let action = ChangeAction::create_or_upsert(upsert);
        let changes = tokens
            .iter()
            .map(|token| DnsRecord::for_dkim(self.domain_name(), token).action(action))
            .collect();

        let change_id = self.change_records(changes).await?;

        info!("Waiting for DNS records to commit...");
        self.wait_for_record_change(&change_id).await?;

        info!("Waiting for DKIM verification...");
        self.wait_for_dkim_verified().await
    }

    /// Remove the identity and its token from the verification TXT record
    ///
    /// Values owned by other systems stay in place; the record is deleted
    /// only once this identity's token was its last value.
    pub async fn revoke_identity(&self) -> Result<()> {
        info!("Getting current verification state for {}", self.domain_name());
        let token = self.describe_identity_token().await?;

        info!("Revoking verification for {}", self.domain_name());
        self.mail.delete_identity(self.domain_name()).await?;

        let Some(record) = self.find_identity_record().await? else {
            warn!(
                "TXT record {} not found, skipping DNS cleanup",
                identity_record_name(self.domain_name())
            );
            return Ok(());
        };

        if !record.contains(&token) {
            warn!(
                "TXT record {} does not carry the verification token, skipping DNS cleanup",
                record.name()
            );
            return Ok(());
        }

        let mut reduced = record.clone();
        reduced.remove(&token);

        let change = if reduced.is_empty() {
            info!("Deleting TXT record {}", record.name());
            record.action(ChangeAction::Delete)
        } else {
            info!(
                "Removing verification token from TXT record {} ({} value(s) remain)",
                reduced.name(),
                reduced.len()
            );
            reduced.action(ChangeAction::Upsert)
        };

        self.change_records(vec![change]).await?;
        Ok(())
    }

    /// Disable DKIM and delete its CNAME records
    pub async fn disable_dkim(&self) -> Result<()> {
        info!("Getting current DKIM state for {}", self.domain_name());
        let dkim = self.describe_dkim().await?;

        info!("Disabling DKIM for {}", self.domain_name());
        self.mail.set_dkim_enabled(self.domain_name(), false).await?;

        if dkim.tokens.is_empty() {
            warn!("No DKIM tokens reported for {}, skipping DNS cleanup", self.domain_name());
            return Ok(());
        }

        info!("Deleting {} DKIM record(s)", dkim.tokens.len());
        let changes = dkim
            .tokens
            .iter()
            .map(|token| DnsRecord::for_dkim(self.domain_name(), token).action(ChangeAction::Delete))
            .collect();

        self.change_records(changes).await?;
        Ok(())
    }

    async fn request_identity_token(&self) -> Result<String> {
        let token = self
            .mail
            .request_verification_token(self.domain_name())
            .await?;

        if token.is_empty() {
            return Err(Error::token_missing(format!(
                "No verification token issued for {}",
                self.domain_name()
            )));
        }
        Ok(token)
    }

    async fn request_dkim_tokens(&self) -> Result<Vec<String>> {
        let tokens: Vec<String> = self
            .mail
            .request_dkim_tokens(self.domain_name())
            .await?
            .into_iter()
            .filter(|token| !token.is_empty())
            .collect();

        if tokens.is_empty() {
            return Err(Error::token_missing(format!(
                "No DKIM tokens issued for {}",
                self.domain_name()
            )));
        }
        Ok(tokens)
    }

    async fn describe_identity_token(&self) -> Result<String> {
        self.mail
            .verification_attributes(self.domain_name())
            .await?
            .and_then(|attributes| attributes.token)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                Error::identity_not_found(format!(
                    "There is no identity for {}",
                    self.domain_name()
                ))
            })
    }

    async fn describe_dkim(&self) -> Result<DkimAttributes> {
        self.mail
            .dkim_attributes(self.domain_name())
            .await?
            .filter(|attributes| attributes.enabled)
            .ok_or_else(|| {
                Error::dkim_not_configured(format!(
                    "DKIM is not configured for {}",
                    self.domain_name()
                ))
            })
    }

    async fn find_identity_record(&self) -> Result<Option<DnsRecord>> {
        let name = identity_record_name(self.domain_name());
        debug!("Looking up TXT record {}", name);

        self.dns
            .find_record_set(self.hosted_zone_id(), &name, RecordType::Txt.as_str())
            .await?
            .map(|record_set| DnsRecord::from_record_set(&record_set))
            .transpose()
    }

    async fn change_records(&self, changes: Vec<Change>) -> Result<String> {
        debug!(
            "Submitting {} change(s) to zone {} via {}",
            changes.len(),
            self.hosted_zone_id(),
            self.dns.provider_name()
        );
        self.dns
            .change_record_sets(self.hosted_zone_id(), &changes)
            .await
    }

    async fn wait_for_record_change(&self, change_id: &str) -> Result<()> {
        self.dns.wait_until_changed(change_id, &self.wait).await
    }

    async fn wait_for_identity_verified(&self) -> Result<()> {
        self.mail
            .wait_until_identity_exists(self.domain_name(), &self.wait)
            .await
    }

    async fn wait_for_dkim_verified(&self) -> Result<()> {
        wait_for(
            || self.describe_dkim(),
            |dkim| dkim.status.is_success(),
            &self.wait,
            "Failed to verify DKIM status",
        )
        .await?;
        Ok(())
    }
}
