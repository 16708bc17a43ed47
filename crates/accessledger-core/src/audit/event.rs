//! Access events and the batches they are flushed in.

use chrono::{DateTime, SecondsFormat, Utc};

/// One successful, authorized read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessEvent {
    /// Email of the identity that performed the read.
    pub email: String,
    /// Request path that was read.
    pub path: String,
    /// When the read happened.
    pub at: DateTime<Utc>,
}

impl AccessEvent {
    /// Create an event timestamped now.
    #[must_use]
    pub fn now(email: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            path: path.into(),
            at: Utc::now(),
        }
    }

    /// Audit line: `[<RFC 3339 timestamp>] <path>`.
    #[must_use]
    pub fn line(&self) -> String {
        format!(
            "[{}] {}",
            self.at.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.path
        )
    }
}

/// Events of one identity flushed together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditBatch {
    /// Audited identity.
    pub email: String,
    /// Events in arrival order.
    pub events: Vec<AccessEvent>,
}

impl AuditBatch {
    /// Create an empty batch for an identity.
    #[must_use]
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            events: Vec::new(),
        }
    }

    /// Append an event.
    pub fn push(&mut self, event: AccessEvent) {
        self.events.push(event);
    }

    /// Message body: one audit line per event, oldest first.
    #[must_use]
    pub fn payload(&self) -> String {
        self.events
            .iter()
            .map(AccessEvent::line)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Paths in arrival order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.events.iter().map(|e| e.path.as_str())
    }

    /// Number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if the batch holds no event.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
