// # DNS Provider Trait
//
// Defines the interface for reading and changing record sets in a hosted
// zone.
//
// ## Implementations
//
// - Route 53: `sesid-provider-aws` crate
//
// ## Usage
//
// ```rust,ignore
// use sesid_core::DnsProvider;
// use sesid_core::record::{ChangeAction, DnsRecord};
//
// async fn publish(provider: &dyn DnsProvider) -> sesid_core::Result<()> {
//     let record = DnsRecord::for_identity("example.com", ["token".to_string()]);
//     let change_id = provider
//         .change_record_sets("Z123", &[record.action(ChangeAction::Create)])
//         .await?;
//     provider.wait_until_changed(&change_id, &Default::default()).await
// }
// ```

use crate::config::WaitSpec;
use crate::record::{Change, ResourceRecordSet};
use async_trait::async_trait;

/// Trait for DNS provider implementations
///
/// Providers execute single calls and report the outcome. They never merge
/// values, retry, or decide between CREATE and UPSERT; that is owned by
/// [`crate::Verifier`].
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Find the record set named `name` with type `record_type`
    ///
    /// Providers list record sets starting at (`name`, `record_type`); the
    /// first one is returned only if it matches both exactly (names compared
    /// case-insensitively, trailing dot ignored).
    ///
    /// # Returns
    ///
    /// - `Ok(Some(ResourceRecordSet))`: The record set exists
    /// - `Ok(None)`: No such record set
    /// - `Err(Error)`: If the request failed
    async fn find_record_set(
        &self,
        hosted_zone_id: &str,
        name: &str,
        record_type: &str,
    ) -> Result<Option<ResourceRecordSet>, crate::Error>;

    /// Submit a change batch and return the provider's change id
    async fn change_record_sets(
        &self,
        hosted_zone_id: &str,
        changes: &[Change],
    ) -> Result<String, crate::Error>;

    /// Block until the change `change_id` has propagated
    ///
    /// Total wait is bounded by `wait.total()`; exceeding it is
    /// [`crate::Error::WaitTimeout`].
    async fn wait_until_changed(&self, change_id: &str, wait: &WaitSpec)
    -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
