//! Route53 as the DNS provider

use async_trait::async_trait;
use aws_sdk_route53::Client;
use aws_sdk_route53::client::Waiters;
use aws_sdk_route53::types::{
    Change as SdkChange, ChangeAction as SdkChangeAction, ChangeBatch, ResourceRecord,
    ResourceRecordSet as SdkRecordSet, RrType,
};
use sesid_core::config::WaitSpec;
use sesid_core::record::{Change, ChangeAction, ResourceRecordSet, names_match};
use sesid_core::traits::DnsProvider;
use sesid_core::{Error, Result};
use tracing::debug;

use crate::sdk_error::sdk_error_details;

/// DNS provider backed by a Route53 client
#[derive(Clone)]
pub struct Route53DnsProvider {
    client: Client,
}

impl std::fmt::Debug for Route53DnsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route53DnsProvider").finish_non_exhaustive()
    }
}

impl Route53DnsProvider {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DnsProvider for Route53DnsProvider {
    async fn find_record_set(
        &self,
        hosted_zone_id: &str,
        name: &str,
        record_type: &str,
    ) -> Result<Option<ResourceRecordSet>> {
        debug!(
            "route53: ListResourceRecordSets {} from {} {}",
            hosted_zone_id, name, record_type
        );
        let output = self
            .client
            .list_resource_record_sets()
            .hosted_zone_id(hosted_zone_id)
            .start_record_name(name)
            .start_record_type(RrType::from(record_type))
            .max_items(1)
            .send()
            .await
            .map_err(|e| {
                Error::dns_provider(format!(
                    "ListResourceRecordSets failed for {}: {}",
                    name,
                    sdk_error_details(&e)
                ))
            })?;

        // The listing starts at (name, type) but returns whatever comes next
        // when nothing matches exactly.
        Ok(output
            .resource_record_sets()
            .first()
            .map(record_set_from_sdk)
            .filter(|set| names_match(&set.name, name) && set.record_type == record_type))
    }

    async fn change_record_sets(&self, hosted_zone_id: &str, changes: &[Change]) -> Result<String> {
        let sdk_changes = changes
            .iter()
            .map(change_to_sdk)
            .collect::<Result<Vec<_>>>()?;
        let batch = ChangeBatch::builder()
            .set_changes(Some(sdk_changes))
            .build()
            .map_err(|e| Error::dns_provider(format!("Invalid change batch: {}", e)))?;

        debug!(
            "route53: ChangeResourceRecordSets {} ({} changes)",
            hosted_zone_id,
            changes.len()
        );
        let output = self
            .client
            .change_resource_record_sets()
            .hosted_zone_id(hosted_zone_id)
            .change_batch(batch)
            .send()
            .await
            .map_err(|e| {
                Error::dns_provider(format!(
                    "ChangeResourceRecordSets failed for zone {}: {}",
                    hosted_zone_id,
                    sdk_error_details(&e)
                ))
            })?;

        output
            .change_info()
            .map(|info| info.id().to_string())
            .ok_or_else(|| Error::dns_provider("ChangeResourceRecordSets returned no change info"))
    }

    async fn wait_until_changed(&self, change_id: &str, wait: &WaitSpec) -> Result<()> {
        debug!(
            "route53: waiting up to {:?} for change {}",
            wait.total(),
            change_id
        );
        self.client
            .wait_until_resource_record_sets_changed()
            .id(change_id)
            .wait(wait.total())
            .await
            .map_err(|e| {
                Error::wait_timeout(format!("Change {} did not propagate: {}", change_id, e))
            })?;
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "route53"
    }
}

fn record_set_from_sdk(set: &SdkRecordSet) -> ResourceRecordSet {
    ResourceRecordSet {
        name: set.name().to_string(),
        record_type: set.r#type().as_str().to_string(),
        ttl: set.ttl(),
        values: set
            .resource_records()
            .iter()
            .map(|record| record.value().to_string())
            .collect(),
    }
}

fn action_to_sdk(action: ChangeAction) -> SdkChangeAction {
    match action {
        ChangeAction::Create => SdkChangeAction::Create,
        ChangeAction::Upsert => SdkChangeAction::Upsert,
        ChangeAction::Delete => SdkChangeAction::Delete,
    }
}

fn change_to_sdk(change: &Change) -> Result<SdkChange> {
    let set = &change.record_set;
    let records = set
        .values
        .iter()
        .map(|value| ResourceRecord::builder().value(value).build())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::dns_provider(format!("Invalid record value for {}: {}", set.name, e)))?;

    let record_set = SdkRecordSet::builder()
        .name(&set.name)
        .r#type(RrType::from(set.record_type.as_str()))
        .set_ttl(set.ttl)
        .set_resource_records(Some(records))
        .build()
        .map_err(|e| Error::dns_provider(format!("Invalid record set {}: {}", set.name, e)))?;

    SdkChange::builder()
        .action(action_to_sdk(change.action))
        .resource_record_set(record_set)
        .build()
        .map_err(|e| Error::dns_provider(format!("Invalid change for {}: {}", set.name, e)))
}
