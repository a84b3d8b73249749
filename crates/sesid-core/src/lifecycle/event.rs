//! Lifecycle event and response documents
//!
//! The orchestrator sends one [`LifecycleEvent`] per invocation and expects
//! one [`LifecycleResponse`] back. Field names follow its PascalCase wire
//! format.

use crate::config::IdentityConfig;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Kind of lifecycle event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestType {
    Create,
    Update,
    Delete,
}

/// A lifecycle event as delivered by the orchestrator
///
/// Resource properties stay raw until [`LifecycleEvent::request`] so that a
/// malformed property still yields an event that can be answered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LifecycleEvent {
    pub request_type: RequestType,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
    #[serde(rename = "ResponseURL")]
    pub response_url: String,
    #[serde(default)]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub resource_properties: serde_json::Value,
    #[serde(default)]
    pub old_resource_properties: Option<serde_json::Value>,
    #[serde(default)]
    pub physical_resource_id: Option<String>,
}

/// The operation an event asks for, with exactly the inputs it needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleRequest<'a> {
    Create {
        properties: IdentityConfig,
    },
    Update {
        old: IdentityConfig,
        new: IdentityConfig,
        physical_resource_id: &'a str,
    },
    Delete {
        properties: IdentityConfig,
        physical_resource_id: &'a str,
    },
}

impl LifecycleEvent {
    /// Resolve the event into its tagged request
    ///
    /// # Returns
    ///
    /// - `Err(Error::Config)`: If the resource properties do not decode, an
    ///   update lacks its old properties or physical id, or a delete lacks
    ///   its physical id
    pub fn request(&self) -> Result<LifecycleRequest<'_>> {
        let properties = decode_properties("ResourceProperties", &self.resource_properties)?;

        match self.request_type {
            RequestType::Create => Ok(LifecycleRequest::Create { properties }),
            RequestType::Update => {
                let old = self
                    .old_resource_properties
                    .as_ref()
                    .ok_or_else(|| Error::config("Update event without OldResourceProperties"))?;
                Ok(LifecycleRequest::Update {
                    old: decode_properties("OldResourceProperties", old)?,
                    new: properties,
                    physical_resource_id: self.require_physical_id()?,
                })
            }
            RequestType::Delete => Ok(LifecycleRequest::Delete {
                properties,
                physical_resource_id: self.require_physical_id()?,
            }),
        }
    }

    fn require_physical_id(&self) -> Result<&str> {
        self.physical_resource_id.as_deref().ok_or_else(|| {
            Error::config(format!(
                "{:?} event without PhysicalResourceId",
                self.request_type
            ))
        })
    }
}

fn decode_properties(field: &str, raw: &serde_json::Value) -> Result<IdentityConfig> {
    IdentityConfig::deserialize(raw)
        .map_err(|e| Error::config(format!("Invalid {}: {}", field, e)))
}

/// What a successfully consumed event produced
#[derive(Debug, Clone, PartialEq)]
pub struct Consumed {
    pub physical_resource_id: String,
    pub data: serde_json::Map<String, serde_json::Value>,
}

impl Consumed {
    /// A result with no attribute data
    pub fn new(physical_resource_id: impl Into<String>) -> Self {
        Self {
            physical_resource_id: physical_resource_id.into(),
            data: serde_json::Map::new(),
        }
    }
}

/// Outcome reported back to the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseStatus {
    Success,
    Failed,
}

/// Response document reported back to the orchestrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LifecycleResponse {
    pub status: ResponseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub physical_resource_id: String,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
    pub data: serde_json::Map<String, serde_json::Value>,
}

/// Physical id reported when a failed event carried none
pub const UNKNOWN_PHYSICAL_RESOURCE_ID: &str = "Unknown";

impl LifecycleResponse {
    /// Build a SUCCESS response for `event`
    pub fn success(event: &LifecycleEvent, consumed: Consumed) -> Self {
        Self {
            status: ResponseStatus::Success,
            reason: None,
            physical_resource_id: consumed.physical_resource_id,
            stack_id: event.stack_id.clone(),
            request_id: event.request_id.clone(),
            logical_resource_id: event.logical_resource_id.clone(),
            data: consumed.data,
        }
    }

    /// Build a FAILED response for `event`, keeping its prior physical id
    pub fn failed(event: &LifecycleEvent, reason: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Failed,
            reason: Some(reason.into()),
            physical_resource_id: event
                .physical_resource_id
                .clone()
                .unwrap_or_else(|| UNKNOWN_PHYSICAL_RESOURCE_ID.to_string()),
            stack_id: event.stack_id.clone(),
            request_id: event.request_id.clone(),
            logical_resource_id: event.logical_resource_id.clone(),
            data: serde_json::Map::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }
}
