//! Destination of flushed batches.

use std::future::Future;

use super::AuditBatch;
use crate::Result;

/// Delivers a flushed batch somewhere.
///
/// The pipeline spawns one delivery per flush and only logs the outcome;
/// a failed delivery is not retried.
pub trait Notifier: Send + Sync + 'static {
    /// Deliver one batch.
    fn notify(&self, batch: AuditBatch) -> impl Future<Output = Result<()>> + Send;
}
