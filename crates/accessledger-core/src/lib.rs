//! # accessledger-core
//!
//! Core logic for `AccessLedger`, a read-only file gateway that trusts an
//! upstream proxy for identity.
//!
//! This crate provides:
//! - **Permission Table** - per-user permission sets loaded once at startup
//! - **Policy Evaluator** - entry visibility and path authorization
//! - **Configuration** - immutable service configuration with validation
//! - **Audit Pipeline** - per-user buffering of accesses, flushed as one
//!   mail after an idle window
//! - **SMTP notifier** - delivers audit batches to a mail relay

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod audit;
pub mod config;
mod error;
pub mod identity;
pub mod permissions;
pub mod policy;
pub mod service;

pub use audit::{AccessEvent, AuditBatch, AuditPipeline, IdleDeadline, Notifier};
pub use config::{
    AuditConfig, Config, PathsConfig, ServerConfig, SmtpConfig, SystemConfig, ValidationError,
    ValidationResult, validate_config,
};
pub use error::{Error, Result};
pub use identity::{Identity, User};
pub use permissions::{PermissionTable, Permissions};
pub use policy::{EntryDescriptor, ListingOptions, is_authorized, is_visible};
pub use service::{AuditMessage, SmtpNotifier};
