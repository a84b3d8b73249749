// # AWS Providers
//
// SES and Route53 implementations of the sesid-core traits.
//
// ## Scope
//
// - `SesMailService`: registers, inspects and deletes SES domain identities
// - `Route53DnsProvider`: reads and changes record sets in a hosted zone
// - `AwsServiceFactory`: builds both from the default credential chain,
//   one client per region
//
// Providers make exactly one API call per trait method (waiters aside) and
// never retry on their own; bounded waiting is driven by the caller's
// `WaitSpec`.
//
// ## Credentials
//
// Credentials come from the standard AWS provider chain (environment,
// profile, container or instance role). Nothing here reads or logs them.

mod route53;
mod sdk_error;
mod ses;

pub use route53::Route53DnsProvider;
pub use ses::SesMailService;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use sesid_core::traits::{DnsProvider, MailService, ServiceFactory};
use sesid_core::{Error, Result};
use std::sync::Arc;
use tracing::debug;

/// Builds SES and Route53 clients for a region
#[derive(Debug, Default, Clone)]
pub struct AwsServiceFactory {
    endpoint_url: Option<String>,
}

impl AwsServiceFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Send every request to `endpoint_url` (e.g. a local AWS emulator)
    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }

    async fn load(&self, region: &str) -> Result<SdkConfig> {
        if region.is_empty() {
            return Err(Error::config("AWS region cannot be empty"));
        }

        debug!("Loading AWS configuration for {}", region);
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region.to_string()));
        if let Some(endpoint_url) = &self.endpoint_url {
            loader = loader.endpoint_url(endpoint_url);
        }
        Ok(loader.load().await)
    }
}

#[async_trait]
impl ServiceFactory for AwsServiceFactory {
    async fn mail_service(&self, region: &str) -> Result<Arc<dyn MailService>> {
        let config = self.load(region).await?;
        let client = aws_sdk_ses::Client::new(&config);
        Ok(Arc::new(SesMailService::new(client, region)))
    }

    async fn dns_provider(&self, region: &str) -> Result<Arc<dyn DnsProvider>> {
        let config = self.load(region).await?;
        let client = aws_sdk_route53::Client::new(&config);
        Ok(Arc::new(Route53DnsProvider::new(client)))
    }
}
