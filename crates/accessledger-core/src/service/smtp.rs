//! SMTP notifier for audit batches.

use std::fmt::Write;
use std::future::Future;
use std::sync::Arc;

use accessledger_smtp::connection::connect;
use accessledger_smtp::{Envelope, ReplyPolicy, deliver};
use tracing::{debug, info};

use crate::Result;
use crate::audit::{AuditBatch, Notifier};
use crate::config::SmtpConfig;

/// An audit mail ready to hand to the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditMessage {
    /// `From` header.
    pub from: String,
    /// `To` header.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain text body.
    pub body: String,
}

impl AuditMessage {
    /// Build the audit mail for a batch.
    #[must_use]
    pub fn for_batch(envelope: &Envelope, batch: &AuditBatch) -> Self {
        Self {
            from: envelope.from.to_string(),
            to: envelope.to.to_string(),
            subject: format!("Access log for {}", batch.email),
            body: batch.payload(),
        }
    }

    /// Builds the RFC 5322 formatted message.
    ///
    /// Line endings in the body are normalised and dot-stuffed when the
    /// message is sent.
    #[must_use]
    pub fn to_rfc5322(&self) -> String {
        let mut message = String::new();

        let _ = write!(message, "From: {}\r\n", self.from);
        let _ = write!(message, "To: {}\r\n", self.to);
        let _ = write!(message, "Subject: {}\r\n", self.subject);

        // Empty line between headers and body
        message.push_str("\r\n");
        message.push_str(&self.body);

        message
    }
}

/// Delivers each batch as one mail through a plain SMTP relay.
#[derive(Debug, Clone)]
pub struct SmtpNotifier {
    relay: String,
    envelope: Envelope,
    policy: Arc<dyn ReplyPolicy>,
}

impl SmtpNotifier {
    /// Create a notifier for a relay.
    #[must_use]
    pub fn new(relay: impl Into<String>, envelope: Envelope, policy: Arc<dyn ReplyPolicy>) -> Self {
        Self {
            relay: relay.into(),
            envelope,
            policy,
        }
    }

    /// Create a notifier from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the sender or recipient address is invalid.
    pub fn from_config(config: &SmtpConfig) -> Result<Self> {
        Ok(Self::new(
            config.server.as_str(),
            config.envelope()?,
            config.reply_policy(),
        ))
    }

    /// Relay address.
    #[must_use]
    pub fn relay(&self) -> &str {
        &self.relay
    }

    async fn send(&self, batch: AuditBatch) -> Result<()> {
        let message = AuditMessage::for_batch(&self.envelope, &batch);

        debug!("connecting to {} for {}", self.relay, batch.email);
        let stream = connect(&self.relay).await?;
        deliver(
            stream,
            Arc::clone(&self.policy),
            &self.envelope,
            message.to_rfc5322().as_bytes(),
        )
        .await?;

        info!(
            "sent access log for {} ({} entries) to {}",
            batch.email,
            batch.len(),
            self.envelope.to
        );
        Ok(())
    }
}

impl Notifier for SmtpNotifier {
    fn notify(&self, batch: AuditBatch) -> impl Future<Output = Result<()>> + Send {
        self.send(batch)
    }
}
