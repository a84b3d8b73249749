//! Amazon SES (v1 API) as the mail service
//!
//! The v1 API is used because it exposes the domain verification token that
//! the identity TXT record is built from.

use async_trait::async_trait;
use aws_sdk_ses::Client;
use aws_sdk_ses::client::Waiters;
use aws_sdk_ses::types::{IdentityDkimAttributes, IdentityVerificationAttributes};
use sesid_core::config::WaitSpec;
use sesid_core::traits::{DkimAttributes, MailService, VerificationAttributes, VerificationStatus};
use sesid_core::{Error, Result};
use tracing::debug;

use crate::sdk_error::sdk_error_details;

/// Mail service backed by an SES client bound to one region
#[derive(Clone)]
pub struct SesMailService {
    client: Client,
    region: String,
}

impl std::fmt::Debug for SesMailService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SesMailService")
            .field("region", &self.region)
            .finish()
    }
}

impl SesMailService {
    pub fn new(client: Client, region: impl Into<String>) -> Self {
        Self {
            client,
            region: region.into(),
        }
    }
}

#[async_trait]
impl MailService for SesMailService {
    async fn request_verification_token(&self, domain: &str) -> Result<String> {
        debug!("ses: VerifyDomainIdentity {} ({})", domain, self.region);
        let output = self
            .client
            .verify_domain_identity()
            .domain(domain)
            .send()
            .await
            .map_err(|e| {
                Error::mail_service(format!(
                    "VerifyDomainIdentity failed for {}: {}",
                    domain,
                    sdk_error_details(&e)
                ))
            })?;

        Ok(output.verification_token().to_string())
    }

    async fn request_dkim_tokens(&self, domain: &str) -> Result<Vec<String>> {
        debug!("ses: VerifyDomainDkim {} ({})", domain, self.region);
        let output = self
            .client
            .verify_domain_dkim()
            .domain(domain)
            .send()
            .await
            .map_err(|e| {
                Error::mail_service(format!(
                    "VerifyDomainDkim failed for {}: {}",
                    domain,
                    sdk_error_details(&e)
                ))
            })?;

        Ok(output.dkim_tokens().to_vec())
    }

    async fn verification_attributes(&self, domain: &str) -> Result<Option<VerificationAttributes>> {
        debug!("ses: GetIdentityVerificationAttributes {}", domain);
        let output = self
            .client
            .get_identity_verification_attributes()
            .identities(domain)
            .send()
            .await
            .map_err(|e| {
                Error::mail_service(format!(
                    "GetIdentityVerificationAttributes failed for {}: {}",
                    domain,
                    sdk_error_details(&e)
                ))
            })?;

        Ok(output
            .verification_attributes()
            .get(domain)
            .map(verification_from_sdk))
    }

    async fn dkim_attributes(&self, domain: &str) -> Result<Option<DkimAttributes>> {
        debug!("ses: GetIdentityDkimAttributes {}", domain);
        let output = self
            .client
            .get_identity_dkim_attributes()
            .identities(domain)
            .send()
            .await
            .map_err(|e| {
                Error::mail_service(format!(
                    "GetIdentityDkimAttributes failed for {}: {}",
                    domain,
                    sdk_error_details(&e)
                ))
            })?;

        Ok(output.dkim_attributes().get(domain).map(dkim_from_sdk))
    }

    async fn set_dkim_enabled(&self, domain: &str, enabled: bool) -> Result<()> {
        debug!("ses: SetIdentityDkimEnabled {} = {}", domain, enabled);
        self.client
            .set_identity_dkim_enabled()
            .identity(domain)
            .dkim_enabled(enabled)
            .send()
            .await
            .map_err(|e| {
                Error::mail_service(format!(
                    "SetIdentityDkimEnabled failed for {}: {}",
                    domain,
                    sdk_error_details(&e)
                ))
            })?;
        Ok(())
    }

    async fn delete_identity(&self, domain: &str) -> Result<()> {
        debug!("ses: DeleteIdentity {} ({})", domain, self.region);
        self.client
            .delete_identity()
            .identity(domain)
            .send()
            .await
            .map_err(|e| {
                Error::mail_service(format!(
                    "DeleteIdentity failed for {}: {}",
                    domain,
                    sdk_error_details(&e)
                ))
            })?;
        Ok(())
    }

    async fn wait_until_identity_exists(&self, domain: &str, wait: &WaitSpec) -> Result<()> {
        debug!(
            "ses: waiting up to {:?} for {} to verify",
            wait.total(),
            domain
        );
        self.client
            .wait_until_identity_exists()
            .identities(domain)
            .wait(wait.total())
            .await
            .map_err(|e| {
                Error::wait_timeout(format!("Identity {} was not verified: {}", domain, e))
            })?;
        Ok(())
    }

    fn service_name(&self) -> &'static str {
        "ses"
    }
}

fn verification_from_sdk(attributes: &IdentityVerificationAttributes) -> VerificationAttributes {
    VerificationAttributes {
        status: VerificationStatus::parse(attributes.verification_status().as_str()),
        token: attributes.verification_token().map(str::to_string),
    }
}

fn dkim_from_sdk(attributes: &IdentityDkimAttributes) -> DkimAttributes {
    DkimAttributes {
        enabled: attributes.dkim_enabled(),
        status: VerificationStatus::parse(attributes.dkim_verification_status().as_str()),
        tokens: attributes.dkim_tokens().to_vec(),
    }
}
