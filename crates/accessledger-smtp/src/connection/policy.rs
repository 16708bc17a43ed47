//! Reply interpretation.
//!
//! The relay's answer to each step is handed to a [`ReplyPolicy`], which
//! decides whether the exchange may continue. Swapping the policy changes
//! how strictly replies are judged without touching callers.

use crate::error::{Error, Result};
use crate::parser::parse_reply_bytes;
use crate::types::ReplyCode;

/// Step of the delivery exchange a reply belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Server greeting after connect.
    Greeting,
    /// Reply to `HELO`.
    Helo,
    /// Reply to `MAIL FROM`.
    MailFrom,
    /// Reply to `RCPT TO`.
    RcptTo,
    /// Reply to `DATA`.
    Data,
    /// Reply after the terminating `.` line.
    Message,
    /// Reply to `QUIT`.
    Quit,
}

impl Step {
    /// Returns the command name used in log lines.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::Helo => "HELO",
            Self::MailFrom => "MAIL FROM",
            Self::RcptTo => "RCPT TO",
            Self::Data => "DATA",
            Self::Message => "message",
            Self::Quit => "QUIT",
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decides whether a relay reply lets the exchange continue.
pub trait ReplyPolicy: std::fmt::Debug + Send + Sync {
    /// Checks the raw reply received for `step`.
    ///
    /// `reply` is never empty; an empty read is a transport error reported
    /// before the policy is consulted.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange must stop.
    fn check(&self, step: Step, reply: &[u8]) -> Result<()>;

    /// Whether replies must be read up to their final line before `check`.
    ///
    /// When false, a single read is taken as the whole reply.
    fn needs_complete_reply(&self) -> bool {
        false
    }
}

/// Accepts any non-empty reply.
///
/// Reply codes are not interpreted: a relay that rejects a command is
/// treated exactly like one that accepts it.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lenient;

impl ReplyPolicy for Lenient {
    fn check(&self, _step: Step, _reply: &[u8]) -> Result<()> {
        Ok(())
    }
}

/// Parses reply codes and stops on anything but the expected class.
///
/// `DATA` expects 354; every other step expects 2xx.
#[derive(Debug, Clone, Copy, Default)]
pub struct Strict;

impl ReplyPolicy for Strict {
    fn needs_complete_reply(&self) -> bool {
        true
    }

    fn check(&self, step: Step, reply: &[u8]) -> Result<()> {
        let reply = parse_reply_bytes(reply)?;

        let accepted = match step {
            Step::Data => reply.code == ReplyCode::START_DATA,
            _ => reply.is_success(),
        };

        if accepted {
            Ok(())
        } else {
            Err(Error::smtp_error(reply.code.as_u16(), reply.message_text()))
        }
    }
}
