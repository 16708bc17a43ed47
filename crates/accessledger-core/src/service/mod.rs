//! Delivery of flushed audit batches.
//!
//! This module bridges the audit pipeline with the SMTP library.

pub mod smtp;

pub use smtp::{AuditMessage, SmtpNotifier};
