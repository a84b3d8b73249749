//! Lifecycle handler
//!
//! Maps create / update / delete events onto [`Verifier`] operations and
//! turns the outcome into a response document. This is the only place
//! reconciliation errors are caught.
//!
//! ## Update semantics
//!
//! - Identity moved (domain or zone changed): verify the new identity
//!   first (upsert), then tear the old one down.
//! - Region is not part of the identity move. A region-only change makes
//!   no remote calls.
//! - Only the DKIM flag flipped: enable or disable DKIM, nothing else.
//! - Nothing relevant changed: no remote calls at all.

pub mod event;

pub use event::{
    Consumed, LifecycleEvent, LifecycleRequest, LifecycleResponse, RequestType, ResponseStatus,
};

use crate::config::{EngineConfig, IdentityConfig};
use crate::error::Result;
use crate::traits::ServiceFactory;
use crate::verifier::Verifier;
use std::sync::Arc;
use tracing::{error, info};

/// Dispatches lifecycle events to the reconciliation engine
pub struct LifecycleHandler {
    factory: Arc<dyn ServiceFactory>,
    engine: EngineConfig,
}

impl LifecycleHandler {
    /// Create a handler building its clients from `factory`
    pub fn new(factory: Arc<dyn ServiceFactory>, engine: EngineConfig) -> Self {
        Self { factory, engine }
    }

    /// Consume `event` and build the response to report
    ///
    /// Never fails: reconciliation errors become a FAILED response carrying
    /// the error message and the event's prior physical id.
    pub async fn handle(&self, event: &LifecycleEvent) -> LifecycleResponse {
        match self.consume(event).await {
            Ok(consumed) => {
                info!(
                    "{:?} of {} succeeded (physical id {})",
                    event.request_type, event.logical_resource_id, consumed.physical_resource_id
                );
                LifecycleResponse::success(event, consumed)
            }
            Err(e) => {
                error!(
                    "Failed to provision resource {}: {}",
                    event.logical_resource_id, e
                );
                LifecycleResponse::failed(event, e.to_string())
            }
        }
    }

    /// Consume `event`, returning the physical id and attribute data
    pub async fn consume(&self, event: &LifecycleEvent) -> Result<Consumed> {
        match event.request()? {
            LifecycleRequest::Create { properties } => self.on_create(&properties).await,
            LifecycleRequest::Update {
                old,
                new,
                physical_resource_id,
            } => self.on_update(&old, &new, physical_resource_id).await,
            LifecycleRequest::Delete {
                properties,
                physical_resource_id,
            } => self.on_delete(&properties, physical_resource_id).await,
        }
    }

    /// Verify a new identity and, if requested, enable DKIM
    pub async fn on_create(&self, properties: &IdentityConfig) -> Result<Consumed> {
        let verifier = self.verifier(properties).await?;

        verifier.verify_identity(false).await?;
        if properties.dkim {
            verifier.enable_dkim(false).await?;
        }

        Ok(Consumed::new(verifier.domain_name()))
    }

    /// Move from `old` to `new` with the fewest remote changes
    pub async fn on_update(
        &self,
        old: &IdentityConfig,
        new: &IdentityConfig,
        physical_resource_id: &str,
    ) -> Result<Consumed> {
        if old.identity_differs(new) {
            info!(
                "Identity moved from {} ({}, {}) to {} ({}, {})",
                old.domain_name,
                old.hosted_zone_id,
                old.region,
                new.domain_name,
                new.hosted_zone_id,
                new.region
            );
            let new_verifier = self.verifier(new).await?;
            let old_verifier = self.verifier(old).await?;

            new_verifier.verify_identity(true).await?;
            if new.dkim {
                new_verifier.enable_dkim(true).await?;
            }

            if old.dkim {
                old_verifier.disable_dkim().await?;
            }
            old_verifier.revoke_identity().await?;

            return Ok(Consumed::new(new_verifier.domain_name()));
        }

        if old.dkim != new.dkim {
            let verifier = self.verifier(new).await?;
            if new.dkim {
                verifier.enable_dkim(true).await?;
            } else {
                verifier.disable_dkim().await?;
            }
        } else {
            info!("No relevant change for {}, nothing to do", new.domain_name);
        }

        Ok(Consumed::new(physical_resource_id))
    }

    /// Tear the identity down if it was ever created
    ///
    /// A failed create leaves a physical id that is not the domain name; in
    /// that case there is nothing to clean up.
    pub async fn on_delete(
        &self,
        properties: &IdentityConfig,
        physical_resource_id: &str,
    ) -> Result<Consumed> {
        if physical_resource_id != properties.domain_name {
            info!(
                "Physical id {} does not match {}, skipping delete",
                physical_resource_id, properties.domain_name
            );
            return Ok(Consumed::new(physical_resource_id));
        }

        let verifier = self.verifier(properties).await?;
        if properties.dkim {
            verifier.disable_dkim().await?;
        }
        verifier.revoke_identity().await?;

        Ok(Consumed::new(physical_resource_id))
    }

    async fn verifier(&self, config: &IdentityConfig) -> Result<Verifier> {
        let mail = self.factory.mail_service(&config.region).await?;
        let dns = self.factory.dns_provider(&config.region).await?;
        Verifier::new(config.clone(), mail, dns, &self.engine)
    }
}
