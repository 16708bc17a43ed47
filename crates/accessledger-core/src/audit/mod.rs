//! Per-identity audit buffering.
//!
//! Every successful read is recorded as an [`AccessEvent`]. Events for the
//! same identity are collected by one buffering task until the identity has
//! been quiet for the idle window, then handed to a [`Notifier`] as a single
//! [`AuditBatch`].

mod event;
mod notifier;
mod pipeline;
mod timer;

pub use event::{AccessEvent, AuditBatch};
pub use notifier::Notifier;
pub use pipeline::AuditPipeline;
pub use timer::IdleDeadline;
