//! DNS record model
//!
//! A [`DnsRecord`] is one record set (name, type, unique values, TTL) as the
//! engine reasons about it. [`ResourceRecordSet`] and [`Change`] are the
//! provider-facing wire shapes it converts to and from.
//!
//! TXT values travel JSON-string-encoded on the wire (`token` becomes
//! `"token"`), CNAME values travel raw.

use crate::error::{Error, Result};
use std::collections::BTreeSet;
use std::fmt;

/// TTL applied to verification records (30 minutes)
pub const DEFAULT_VERIFICATION_RECORD_TTL: i64 = 1800;

/// Domain the mail service serves DKIM public keys from
pub const MAIL_SERVICE_DKIM_DOMAIN: &str = "dkim.amazonses.com";

/// Label prefix of the identity verification TXT record
pub const IDENTITY_RECORD_PREFIX: &str = "_amazonses";

/// DNS record types this engine manages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    Txt,
    Cname,
}

impl RecordType {
    /// Wire name of the record type
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Txt => "TXT",
            RecordType::Cname => "CNAME",
        }
    }

    /// Parse a wire record type, rejecting types this engine does not manage
    pub fn parse(value: &str) -> Result<Self> {
        match value.to_ascii_uppercase().as_str() {
            "TXT" => Ok(RecordType::Txt),
            "CNAME" => Ok(RecordType::Cname),
            other => Err(Error::record(format!("Unsupported record type: {other}"))),
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Action applied to a record set in a change batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeAction {
    Create,
    Upsert,
    Delete,
}

impl ChangeAction {
    /// Pick CREATE or UPSERT for a freshly built record
    pub fn create_or_upsert(upsert: bool) -> Self {
        if upsert {
            ChangeAction::Upsert
        } else {
            ChangeAction::Create
        }
    }

    /// Wire name of the action
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeAction::Create => "CREATE",
            ChangeAction::Upsert => "UPSERT",
            ChangeAction::Delete => "DELETE",
        }
    }
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record set as exchanged with the DNS provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecordSet {
    /// Record name as the provider reports it
    pub name: String,
    /// Record type wire name (e.g. "TXT")
    pub record_type: String,
    /// TTL in seconds, if the provider reported one
    pub ttl: Option<i64>,
    /// Encoded record values
    pub values: Vec<String>,
}

/// One entry of a change batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub action: ChangeAction,
    pub record_set: ResourceRecordSet,
}

/// A DNS record owned (fully or partially) by a domain identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsRecord {
    name: String,
    record_type: RecordType,
    values: BTreeSet<String>,
    ttl: i64,
}

impl DnsRecord {
    /// Create a record; the name is normalized to a single trailing dot
    pub fn new(
        name: impl AsRef<str>,
        record_type: RecordType,
        values: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            name: normalize_name(name.as_ref()),
            record_type,
            values: values.into_iter().collect(),
            ttl: DEFAULT_VERIFICATION_RECORD_TTL,
        }
    }

    /// The identity verification TXT record for `domain_name`
    pub fn for_identity(domain_name: &str, values: impl IntoIterator<Item = String>) -> Self {
        Self::new(identity_record_name(domain_name), RecordType::Txt, values)
    }

    /// The DKIM CNAME record for one signing token
    pub fn for_dkim(domain_name: &str, token: &str) -> Self {
        Self::new(
            dkim_record_name(domain_name, token),
            RecordType::Cname,
            [format!("{token}.{MAIL_SERVICE_DKIM_DOMAIN}")],
        )
    }

    /// Decode a record set read back from the DNS provider
    pub fn from_record_set(record_set: &ResourceRecordSet) -> Result<Self> {
        let record_type = RecordType::parse(&record_set.record_type)?;

        let values = match record_type {
            RecordType::Cname => record_set.values.iter().cloned().collect(),
            RecordType::Txt => record_set
                .values
                .iter()
                .map(|value| decode_txt_value(value))
                .collect::<Result<BTreeSet<_>>>()?,
        };

        Ok(Self {
            name: normalize_name(&record_set.name),
            record_type,
            values,
            ttl: record_set.ttl.unwrap_or(DEFAULT_VERIFICATION_RECORD_TTL),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn record_type(&self) -> RecordType {
        self.record_type
    }

    pub fn ttl(&self) -> i64 {
        self.ttl
    }

    /// Decoded values in deterministic order
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains(&self, value: &str) -> bool {
        self.values.contains(value)
    }

    /// Add a value; returns `false` if it was already present
    pub fn insert(&mut self, value: impl Into<String>) -> bool {
        self.values.insert(value.into())
    }

    /// Remove a value; returns `false` if it was not present
    pub fn remove(&mut self, value: &str) -> bool {
        self.values.remove(value)
    }

    /// Build a change carrying the full current value set
    ///
    /// DELETE carries the full record too: the provider only deletes a record
    /// set whose values match exactly.
    pub fn action(&self, action: ChangeAction) -> Change {
        Change {
            action,
            record_set: self.to_record_set(),
        }
    }

    /// Encode to the provider's record set shape
    pub fn to_record_set(&self) -> ResourceRecordSet {
        let values = match self.record_type {
            RecordType::Cname => self.values.iter().cloned().collect(),
            RecordType::Txt => self.values.iter().map(|v| encode_txt_value(v)).collect(),
        };

        ResourceRecordSet {
            name: self.name.clone(),
            record_type: self.record_type.as_str().to_string(),
            ttl: Some(self.ttl),
            values,
        }
    }
}

/// Name of the identity verification TXT record
pub fn identity_record_name(domain_name: &str) -> String {
    normalize_name(&format!("{IDENTITY_RECORD_PREFIX}.{}", trim_dot(domain_name)))
}

/// Name of the DKIM CNAME record for `token`
pub fn dkim_record_name(domain_name: &str, token: &str) -> String {
    normalize_name(&format!("{token}._domainkey.{}", trim_dot(domain_name)))
}

/// Normalize a record name to exactly one trailing dot
pub fn normalize_name(name: &str) -> String {
    format!("{}.", trim_dot(name))
}

/// Compare two record names the way DNS does
pub fn names_match(a: &str, b: &str) -> bool {
    trim_dot(a).eq_ignore_ascii_case(trim_dot(b))
}

fn trim_dot(name: &str) -> &str {
    name.trim().trim_end_matches('.')
}

fn encode_txt_value(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}

fn decode_txt_value(value: &str) -> Result<String> {
    serde_json::from_str::<String>(value)
        .map_err(|e| Error::record(format!("Invalid TXT value {value}: {e}")))
}
