//! Test doubles and common utilities for reconciliation contract tests
//!
//! The fakes keep just enough state to behave like the real services: the
//! DNS fake keeps one record map per hosted zone and applies change batches
//! with the provider's CREATE/UPSERT/DELETE rules, and the mail service
//! tracks identities per (region, domain).
//! Every remote call is appended to a shared, ordered call log.

#![allow(dead_code)]

use async_trait::async_trait;
use sesid_core::config::{EngineConfig, IdentityConfig, WaitSpec};
use sesid_core::error::{Error, Result};
use sesid_core::record::{Change, ChangeAction, ResourceRecordSet, names_match};
use sesid_core::traits::{
    DkimAttributes, DnsProvider, MailService, ServiceFactory, VerificationAttributes,
    VerificationStatus,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const DOMAIN: &str = "example.com";
pub const ZONE: &str = "HOSTED_ZONE_ID";
pub const ZONE_2: &str = "HOSTED_ZONE_ID_2";
pub const REGION: &str = "us-east-1";
pub const IDENTITY_RECORD: &str = "_amazonses.example.com.";

/// Ordered log of every remote call, shared by all fakes of one test
#[derive(Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls whose entry starts with `prefix`
    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    /// Index of the first call starting with `prefix`
    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .position(|call| call.starts_with(prefix))
    }

    pub fn is_empty(&self) -> bool {
        self.calls.lock().unwrap().is_empty()
    }
}

/// In-memory hosted zones, records keyed by (zone, name, type)
pub struct FakeDnsZone {
    log: CallLog,
    records: Mutex<HashMap<(String, String, String), ResourceRecordSet>>,
    batches: Mutex<Vec<Vec<Change>>>,
    change_counter: AtomicUsize,
    /// When set, propagation waits fail with a timeout
    pub propagation_fails: std::sync::atomic::AtomicBool,
}

impl FakeDnsZone {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            records: Mutex::new(HashMap::new()),
            batches: Mutex::new(Vec::new()),
            change_counter: AtomicUsize::new(0),
            propagation_fails: std::sync::atomic::AtomicBool::new(false),
        }
    }

    fn key(zone: &str, name: &str, record_type: &str) -> (String, String, String) {
        (
            zone.to_string(),
            name.trim_end_matches('.').to_ascii_lowercase(),
            record_type.to_ascii_uppercase(),
        )
    }

    /// Seed a record set in the default zone with already-encoded wire values
    pub fn seed_record(&self, name: &str, record_type: &str, wire_values: &[&str]) {
        self.seed_record_in(ZONE, name, record_type, wire_values);
    }

    pub fn seed_record_in(&self, zone: &str, name: &str, record_type: &str, wire_values: &[&str]) {
        self.records.lock().unwrap().insert(
            Self::key(zone, name, record_type),
            ResourceRecordSet {
                name: name.to_string(),
                record_type: record_type.to_string(),
                ttl: Some(1800),
                values: wire_values.iter().map(|v| v.to_string()).collect(),
            },
        );
    }

    /// Seed a TXT record with already-quoted wire values
    pub fn seed_txt(&self, name: &str, wire_values: &[&str]) {
        self.seed_record(name, "TXT", wire_values);
    }

    /// Seed the DKIM CNAME records a previous run would have created
    pub fn seed_dkim(&self, domain: &str, tokens: &[&str]) {
        for token in tokens {
            let value = format!("{token}.dkim.amazonses.com");
            self.seed_record(
                &format!("{token}._domainkey.{domain}."),
                "CNAME",
                &[value.as_str()],
            );
        }
    }

    /// A record in the default zone
    pub fn record(&self, name: &str, record_type: &str) -> Option<ResourceRecordSet> {
        self.record_in(ZONE, name, record_type)
    }

    pub fn record_in(&self, zone: &str, name: &str, record_type: &str) -> Option<ResourceRecordSet> {
        self.records
            .lock()
            .unwrap()
            .get(&Self::key(zone, name, record_type))
            .cloned()
    }

    /// Wire values of a record in the default zone, sorted
    pub fn values(&self, name: &str, record_type: &str) -> Option<Vec<String>> {
        self.values_in(ZONE, name, record_type)
    }

    pub fn values_in(&self, zone: &str, name: &str, record_type: &str) -> Option<Vec<String>> {
        self.record_in(zone, name, record_type).map(|record| {
            let mut values = record.values;
            values.sort();
            values
        })
    }

    pub fn batches(&self) -> Vec<Vec<Change>> {
        self.batches.lock().unwrap().clone()
    }

    pub fn last_batch(&self) -> Option<Vec<Change>> {
        self.batches.lock().unwrap().last().cloned()
    }

    fn apply(&self, zone: &str, change: &Change) -> Result<()> {
        let set = &change.record_set;
        let key = Self::key(zone, &set.name, &set.record_type);
        let mut records = self.records.lock().unwrap();

        match change.action {
            ChangeAction::Create => {
                if records.contains_key(&key) {
                    return Err(Error::dns_provider(format!(
                        "InvalidChangeBatch: {} already exists",
                        set.name
                    )));
                }
                records.insert(key, set.clone());
            }
            ChangeAction::Upsert => {
                records.insert(key, set.clone());
            }
            ChangeAction::Delete => {
                let existing = records.get(&key).ok_or_else(|| {
                    Error::dns_provider(format!("InvalidChangeBatch: {} not found", set.name))
                })?;
                let mut current = existing.values.clone();
                let mut requested = set.values.clone();
                current.sort();
                requested.sort();
                if current != requested {
                    return Err(Error::dns_provider(format!(
                        "InvalidChangeBatch: values of {} do not match",
                        set.name
                    )));
                }
                records.remove(&key);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DnsProvider for FakeDnsZone {
    async fn find_record_set(
        &self,
        hosted_zone_id: &str,
        name: &str,
        record_type: &str,
    ) -> Result<Option<ResourceRecordSet>> {
        self.log.push(format!("dns.find {hosted_zone_id} {name} {record_type}"));
        Ok(self
            .record_in(hosted_zone_id, name, record_type)
            .filter(|record| names_match(&record.name, name)))
    }

    async fn change_record_sets(&self, hosted_zone_id: &str, changes: &[Change]) -> Result<String> {
        let summary: Vec<String> = changes
            .iter()
            .map(|c| format!("{}:{}", c.action, c.record_set.name))
            .collect();
        self.log
            .push(format!("dns.change {hosted_zone_id} {}", summary.join(",")));

        for change in changes {
            self.apply(hosted_zone_id, change)?;
        }
        self.batches.lock().unwrap().push(changes.to_vec());

        let n = self.change_counter.fetch_add(1, Ordering::SeqCst);
        Ok(format!("/change/C{n}"))
    }

    async fn wait_until_changed(&self, change_id: &str, _wait: &WaitSpec) -> Result<()> {
        self.log.push(format!("dns.wait {change_id}"));
        if self.propagation_fails.load(Ordering::SeqCst) {
            return Err(Error::wait_timeout(format!("Change {change_id} did not propagate")));
        }
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "fake-dns"
    }
}

#[derive(Clone, Debug)]
struct FakeIdentity {
    token: String,
    status: VerificationStatus,
    dkim_enabled: bool,
    dkim_tokens: Vec<String>,
}

struct MailState {
    log: CallLog,
    identities: Mutex<HashMap<(String, String), FakeIdentity>>,
    tokens: Mutex<HashMap<(String, String), String>>,
    dkim_tokens: Mutex<Vec<String>>,
    /// Number of DKIM status polls answered with Pending before Success
    dkim_pending_polls: AtomicUsize,
    dkim_never_verifies: std::sync::atomic::AtomicBool,
    identity_never_verifies: std::sync::atomic::AtomicBool,
    dkim_status_polls: AtomicUsize,
}

/// An in-memory mail service, viewed from one region
#[derive(Clone)]
pub struct FakeMailService {
    region: String,
    state: Arc<MailState>,
}

impl FakeMailService {
    pub fn new(log: CallLog) -> Self {
        Self {
            region: REGION.to_string(),
            state: Arc::new(MailState {
                log,
                identities: Mutex::new(HashMap::new()),
                tokens: Mutex::new(HashMap::new()),
                dkim_tokens: Mutex::new(vec!["foo".into(), "bar".into(), "baz".into()]),
                dkim_pending_polls: AtomicUsize::new(0),
                dkim_never_verifies: std::sync::atomic::AtomicBool::new(false),
                identity_never_verifies: std::sync::atomic::AtomicBool::new(false),
                dkim_status_polls: AtomicUsize::new(0),
            }),
        }
    }

    /// The same service state seen from another region
    pub fn in_region(&self, region: &str) -> Self {
        Self {
            region: region.to_string(),
            state: Arc::clone(&self.state),
        }
    }

    fn key(&self, domain: &str) -> (String, String) {
        (self.region.clone(), domain.to_string())
    }

    /// Token issued for `domain` in this region (default "token")
    pub fn issue_token(&self, domain: &str, token: &str) {
        self.state
            .tokens
            .lock()
            .unwrap()
            .insert(self.key(domain), token.to_string());
    }

    pub fn issue_dkim_tokens(&self, tokens: &[&str]) {
        *self.state.dkim_tokens.lock().unwrap() = tokens.iter().map(|t| t.to_string()).collect();
    }

    pub fn set_dkim_pending_polls(&self, polls: usize) {
        self.state.dkim_pending_polls.store(polls, Ordering::SeqCst);
    }

    pub fn set_dkim_never_verifies(&self) {
        self.state.dkim_never_verifies.store(true, Ordering::SeqCst);
    }

    pub fn set_identity_never_verifies(&self) {
        self.state.identity_never_verifies.store(true, Ordering::SeqCst);
    }

    pub fn dkim_status_polls(&self) -> usize {
        self.state.dkim_status_polls.load(Ordering::SeqCst)
    }

    /// Register an identity as if a previous run had verified it
    pub fn seed_identity(&self, domain: &str, token: &str, dkim_tokens: &[&str]) {
        self.state.identities.lock().unwrap().insert(
            self.key(domain),
            FakeIdentity {
                token: token.to_string(),
                status: VerificationStatus::Success,
                dkim_enabled: !dkim_tokens.is_empty(),
                dkim_tokens: dkim_tokens.iter().map(|t| t.to_string()).collect(),
            },
        );
    }

    pub fn has_identity(&self, domain: &str) -> bool {
        self.state
            .identities
            .lock()
            .unwrap()
            .contains_key(&self.key(domain))
    }

    pub fn dkim_enabled(&self, domain: &str) -> bool {
        self.state
            .identities
            .lock()
            .unwrap()
            .get(&self.key(domain))
            .is_some_and(|identity| identity.dkim_enabled)
    }

    fn log(&self, op: &str, domain: &str) {
        self.state.log.push(format!("mail.{op} {domain}@{}", self.region));
    }
}

#[async_trait]
impl MailService for FakeMailService {
    async fn request_verification_token(&self, domain: &str) -> Result<String> {
        self.log("verify_domain_identity", domain);
        let token = self
            .state
            .tokens
            .lock()
            .unwrap()
            .get(&self.key(domain))
            .cloned()
            .unwrap_or_else(|| "token".to_string());

        let mut identities = self.state.identities.lock().unwrap();
        let identity = identities.entry(self.key(domain)).or_insert(FakeIdentity {
            token: String::new(),
            status: VerificationStatus::Pending,
            dkim_enabled: false,
            dkim_tokens: Vec::new(),
        });
        identity.token = token.clone();
        Ok(token)
    }

    async fn request_dkim_tokens(&self, domain: &str) -> Result<Vec<String>> {
        self.log("verify_domain_dkim", domain);
        let tokens = self.state.dkim_tokens.lock().unwrap().clone();

        let mut identities = self.state.identities.lock().unwrap();
        if let Some(identity) = identities.get_mut(&self.key(domain)) {
            identity.dkim_enabled = !tokens.is_empty();
            identity.dkim_tokens = tokens.clone();
        }
        Ok(tokens)
    }

    async fn verification_attributes(&self, domain: &str) -> Result<Option<VerificationAttributes>> {
        self.log("get_verification_attributes", domain);
        Ok(self
            .state
            .identities
            .lock()
            .unwrap()
            .get(&self.key(domain))
            .map(|identity| VerificationAttributes {
                status: identity.status.clone(),
                token: Some(identity.token.clone()),
            }))
    }

    async fn dkim_attributes(&self, domain: &str) -> Result<Option<DkimAttributes>> {
        self.log("get_dkim_attributes", domain);
        self.state.dkim_status_polls.fetch_add(1, Ordering::SeqCst);

        let status = if self.state.dkim_never_verifies.load(Ordering::SeqCst) {
            VerificationStatus::Pending
        } else {
            let pending = self.state.dkim_pending_polls.load(Ordering::SeqCst);
            if pending > 0 {
                self.state.dkim_pending_polls.store(pending - 1, Ordering::SeqCst);
                VerificationStatus::Pending
            } else {
                VerificationStatus::Success
            }
        };

        Ok(self
            .state
            .identities
            .lock()
            .unwrap()
            .get(&self.key(domain))
            .map(|identity| DkimAttributes {
                enabled: identity.dkim_enabled,
                status,
                tokens: identity.dkim_tokens.clone(),
            }))
    }

    async fn set_dkim_enabled(&self, domain: &str, enabled: bool) -> Result<()> {
        self.log("set_dkim_enabled", domain);
        let mut identities = self.state.identities.lock().unwrap();
        let identity = identities
            .get_mut(&self.key(domain))
            .ok_or_else(|| Error::mail_service(format!("Unknown identity {domain}")))?;
        identity.dkim_enabled = enabled;
        Ok(())
    }

    async fn delete_identity(&self, domain: &str) -> Result<()> {
        self.log("delete_identity", domain);
        self.state.identities.lock().unwrap().remove(&self.key(domain));
        Ok(())
    }

    async fn wait_until_identity_exists(&self, domain: &str, _wait: &WaitSpec) -> Result<()> {
        self.log("wait_identity_exists", domain);
        if self.state.identity_never_verifies.load(Ordering::SeqCst) {
            return Err(Error::wait_timeout(format!("Identity {domain} was not verified")));
        }

        let mut identities = self.state.identities.lock().unwrap();
        match identities.get_mut(&self.key(domain)) {
            Some(identity) => {
                identity.status = VerificationStatus::Success;
                Ok(())
            }
            None => Err(Error::wait_timeout(format!("Identity {domain} does not exist"))),
        }
    }

    fn service_name(&self) -> &'static str {
        "fake-mail"
    }
}

/// Hands out the shared fakes, one mail-service view per region
pub struct FakeServiceFactory {
    pub mail: FakeMailService,
    pub dns: Arc<FakeDnsZone>,
}

#[async_trait]
impl ServiceFactory for FakeServiceFactory {
    async fn mail_service(&self, region: &str) -> Result<Arc<dyn MailService>> {
        Ok(Arc::new(self.mail.in_region(region)))
    }

    async fn dns_provider(&self, _region: &str) -> Result<Arc<dyn DnsProvider>> {
        Ok(Arc::clone(&self.dns) as Arc<dyn DnsProvider>)
    }
}

/// Shared fixture: one call log, one zone, one mail service
pub struct Harness {
    pub log: CallLog,
    pub mail: FakeMailService,
    pub dns: Arc<FakeDnsZone>,
}

impl Harness {
    pub fn new() -> Self {
        let log = CallLog::new();
        Self {
            mail: FakeMailService::new(log.clone()),
            dns: Arc::new(FakeDnsZone::new(log.clone())),
            log,
        }
    }

    pub fn verifier(&self, config: IdentityConfig) -> sesid_core::Verifier {
        sesid_core::Verifier::new(
            config.clone(),
            Arc::new(self.mail.in_region(&config.region)),
            Arc::clone(&self.dns) as Arc<dyn DnsProvider>,
            &fast_engine(),
        )
        .expect("verifier construction succeeds")
    }

    pub fn handler(&self) -> sesid_core::LifecycleHandler {
        sesid_core::LifecycleHandler::new(
            Arc::new(FakeServiceFactory {
                mail: self.mail.clone(),
                dns: Arc::clone(&self.dns),
            }),
            fast_engine(),
        )
    }
}

/// Helper to create an identity config for the default domain
pub fn identity(dkim: bool) -> IdentityConfig {
    IdentityConfig::new(DOMAIN, ZONE, REGION).with_dkim(dkim)
}

/// Engine config with zero delays so poll loops finish instantly
pub fn fast_engine() -> EngineConfig {
    EngineConfig::with_wait(WaitSpec::new(Duration::ZERO, 5))
}
