// # sesid-core
//
// Core library for provisioning DNS-validated mail-sending domain identities.
//
// ## Architecture Overview
//
// - **MailService**: Trait for the mail service that owns domain identities
// - **DnsProvider**: Trait for reading and changing hosted-zone record sets
// - **DnsRecord**: Record model with merge semantics for shared record sets
// - **wait_for**: Bounded poll loop with quadratic backoff
// - **Verifier**: Reconciles one identity (verify, enable DKIM, revoke, disable DKIM)
// - **LifecycleHandler**: Maps create/update/delete events onto the Verifier
//
// ## Design Principles
//
// 1. **Stateless**: Every invocation re-reads the mail service and DNS zone
// 2. **Merge-on-write**: Only this identity's values are added or removed
// 3. **Idempotent**: Re-running a failed reconciliation is safe
// 4. **Library-First**: The handler binary is a thin shell around this crate

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod record;
pub mod traits;
pub mod verifier;
pub mod wait;

// Re-export core types for convenience
pub use config::{EngineConfig, IdentityConfig, WaitSpec};
pub use error::{Error, Result};
pub use lifecycle::{LifecycleEvent, LifecycleHandler, LifecycleResponse};
pub use record::{Change, ChangeAction, DnsRecord, RecordType, ResourceRecordSet};
pub use traits::{DnsProvider, MailService, ServiceFactory};
pub use verifier::Verifier;
pub use wait::wait_for;
