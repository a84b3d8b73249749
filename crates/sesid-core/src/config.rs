//! Configuration types for identity reconciliation
//!
//! [`IdentityConfig`] is the plain configuration a [`crate::Verifier`] is
//! built from. Its serde names follow the orchestrator's resource properties
//! (`DomainName`, `HostedZoneId`, `Region`, `DKIM`).

use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

/// Desired configuration of one domain identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IdentityConfig {
    /// Fully-qualified domain name to verify
    pub domain_name: String,

    /// DNS zone authoritative for `domain_name`
    pub hosted_zone_id: String,

    /// Mail-service region the identity is registered in
    pub region: String,

    /// Whether DKIM signing records should be provisioned
    #[serde(rename = "DKIM", default, deserialize_with = "deserialize_flag")]
    pub dkim: bool,
}

impl IdentityConfig {
    /// Create a new identity configuration with DKIM disabled
    pub fn new(
        domain_name: impl Into<String>,
        hosted_zone_id: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            domain_name: domain_name.into(),
            hosted_zone_id: hosted_zone_id.into(),
            region: region.into(),
            dkim: false,
        }
    }

    /// Enable or disable DKIM
    pub fn with_dkim(mut self, dkim: bool) -> Self {
        self.dkim = dkim;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.domain_name.trim().is_empty() {
            return Err(crate::Error::config("DomainName cannot be empty"));
        }
        if self.hosted_zone_id.trim().is_empty() {
            return Err(crate::Error::config("HostedZoneId cannot be empty"));
        }
        if self.region.trim().is_empty() {
            return Err(crate::Error::config("Region cannot be empty"));
        }
        Ok(())
    }

    /// Whether moving from `self` to `other` relocates the identity
    ///
    /// Only the domain and the zone holding its records count; the region
    /// is not compared.
    pub fn identity_differs(&self, other: &Self) -> bool {
        self.domain_name != other.domain_name || self.hosted_zone_id != other.hosted_zone_id
    }
}

/// Orchestrators stringify resource properties, so accept "true"/"false" too
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    match Option::<Flag>::deserialize(deserializer)? {
        None => Ok(false),
        Some(Flag::Bool(value)) => Ok(value),
        Some(Flag::Text(text)) => match text.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" | "" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "invalid DKIM flag: {other}"
            ))),
        },
    }
}

/// Bounds for a wait: attempts and the base delay between them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitSpec {
    /// Base delay between attempts
    #[serde(with = "duration_secs", default = "default_wait_delay")]
    pub delay: Duration,

    /// Maximum number of attempts
    #[serde(default = "default_wait_max_attempts")]
    pub max_attempts: u32,
}

impl WaitSpec {
    /// Create a wait spec
    pub fn new(delay: Duration, max_attempts: u32) -> Self {
        Self { delay, max_attempts }
    }

    /// Total wait budget handed to provider-native waiters
    pub fn total(&self) -> Duration {
        self.delay.saturating_mul(self.max_attempts)
    }
}

impl Default for WaitSpec {
    fn default() -> Self {
        Self {
            delay: default_wait_delay(),
            max_attempts: default_wait_max_attempts(),
        }
    }
}

fn default_wait_delay() -> Duration {
    Duration::from_secs(30)
}

fn default_wait_max_attempts() -> u32 {
    30
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

/// Engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Wait bounds used for DNS propagation, identity and DKIM waits
    #[serde(default)]
    pub wait: WaitSpec,
}

impl EngineConfig {
    /// Create an engine configuration with the given wait bounds
    pub fn with_wait(wait: WaitSpec) -> Self {
        Self { wait }
    }
}
