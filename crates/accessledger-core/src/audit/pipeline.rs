//! Live-task registry and buffering tasks.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, error, info, warn};

use super::{AccessEvent, AuditBatch, IdleDeadline, Notifier};
use crate::config::AuditConfig;
use crate::identity::User;

/// Routes access events to one buffering task per identity.
///
/// Cloning is cheap; clones share the same registry. When the last clone
/// is dropped every buffering task flushes what it holds.
pub struct AuditPipeline<N> {
    inner: Arc<Inner<N>>,
}

struct Inner<N> {
    registry: Mutex<HashMap<String, TaskHandle>>,
    notifier: Arc<N>,
    idle_window: Duration,
    queue_capacity: usize,
    next_id: AtomicU64,
}

/// Registry entry for a live buffering task.
struct TaskHandle {
    id: u64,
    tx: mpsc::Sender<AccessEvent>,
}

impl<N> Clone for AuditPipeline<N> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<N> std::fmt::Debug for AuditPipeline<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditPipeline")
            .field("idle_window", &self.inner.idle_window)
            .field("queue_capacity", &self.inner.queue_capacity)
            .field("live_tasks", &self.inner.lock_registry().len())
            .finish_non_exhaustive()
    }
}

impl<N: Notifier> AuditPipeline<N> {
    /// Create a pipeline from configuration.
    #[must_use]
    pub fn new(notifier: N, config: &AuditConfig) -> Self {
        Self::with_settings(notifier, config.idle_window(), config.queue_capacity)
    }

    /// Create a pipeline with explicit settings.
    ///
    /// A zero `queue_capacity` is raised to one.
    #[must_use]
    pub fn with_settings(notifier: N, idle_window: Duration, queue_capacity: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                registry: Mutex::new(HashMap::new()),
                notifier: Arc::new(notifier),
                idle_window,
                queue_capacity: queue_capacity.max(1),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Record a successful read by `user`.
    ///
    /// Never blocks. Users with `ignore_access` are not audited.
    pub fn record_access(&self, user: &User, path: &str) {
        if user.permissions.ignore_access {
            debug!("not auditing {} (ignoreAccess)", user.email());
            return;
        }

        self.record(AccessEvent::now(user.email(), path));
    }

    /// Route an event to its identity's buffering task, creating the task
    /// if none is live.
    ///
    /// Lookup and creation happen under one lock, so concurrent first events
    /// for an identity share a single task. If that task's queue is full the
    /// event is dropped.
    pub fn record(&self, event: AccessEvent) {
        let mut registry = self.inner.lock_registry();

        let event = match registry.get(&event.email) {
            Some(handle) => match handle.tx.try_send(event) {
                Ok(()) => return,
                Err(TrySendError::Full(event)) => {
                    warn!(
                        "audit queue for {} is full, dropping access to {}",
                        event.email, event.path
                    );
                    return;
                }
                // Task died without deregistering; replace it.
                Err(TrySendError::Closed(event)) => event,
            },
            None => event,
        };

        let email = event.email.clone();
        let handle = self.spawn_task(email.clone());
        if let Err(e) = handle.tx.try_send(event) {
            warn!("failed to queue first access for {email}: {e}");
        }
        registry.insert(email, handle);
    }

    /// Number of identities with a live buffering task.
    #[must_use]
    pub fn live_tasks(&self) -> usize {
        self.inner.lock_registry().len()
    }

    fn spawn_task(&self, email: String) -> TaskHandle {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.inner.queue_capacity);

        debug!("starting audit buffer {id} for {email}");
        tokio::spawn(buffer(
            id,
            email,
            rx,
            Arc::downgrade(&self.inner),
            Arc::clone(&self.inner.notifier),
            self.inner.idle_window,
        ));

        TaskHandle { id, tx }
    }
}

impl<N> Inner<N> {
    fn lock_registry(&self) -> MutexGuard<'_, HashMap<String, TaskHandle>> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Remove `email` from the registry if the entry still belongs to task `id`.
    fn deregister(&self, email: &str, id: u64) {
        let mut registry = self.lock_registry();
        if registry.get(email).is_some_and(|handle| handle.id == id) {
            registry.remove(email);
        }
    }
}

/// Buffering task: collect events until the identity is idle, then flush.
async fn buffer<N: Notifier>(
    id: u64,
    email: String,
    mut rx: mpsc::Receiver<AccessEvent>,
    inner: Weak<Inner<N>>,
    notifier: Arc<N>,
    idle_window: Duration,
) {
    let mut batch = AuditBatch::new(email.as_str());
    let mut idle = IdleDeadline::new(idle_window);

    loop {
        tokio::select! {
            biased;

            event = rx.recv() => match event {
                Some(event) => {
                    batch.push(event);
                    idle.touch();
                }
                None => {
                    debug!("audit pipeline dropped, flushing {email}");
                    break;
                }
            },

            () = tokio::time::sleep_until(idle.deadline()) => {
                debug!("{email} idle for {idle_window:?}, flushing");
                break;
            }
        }
    }

    if let Some(inner) = inner.upgrade() {
        inner.deregister(&email, id);
    }

    // Anything accepted before deregistration still belongs to this batch.
    rx.close();
    while let Ok(event) = rx.try_recv() {
        batch.push(event);
    }

    if batch.is_empty() {
        return;
    }

    tokio::spawn(async move {
        let count = batch.len();
        match notifier.notify(batch).await {
            Ok(()) => info!("flushed {count} access(es) for {email}"),
            Err(e) => error!("failed to deliver access log for {email}: {e}"),
        }
    });
}
