//! # accessledger-smtp
//!
//! A small SMTP client that hands one plain-text message to a relay.
//!
//! The exchange is deliberately fixed: greeting, `HELO`, `MAIL FROM`,
//! `RCPT TO`, `DATA`, message, `QUIT`. There is no TLS, no authentication
//! and no extension negotiation. How relay replies are judged is pluggable
//! through [`ReplyPolicy`]: [`Lenient`] only requires that the relay said
//! something, [`Strict`] parses the reply code.
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use accessledger_smtp::{Address, Envelope, Lenient, deliver};
//! use accessledger_smtp::connection::connect;
//!
//! #[tokio::main]
//! async fn main() -> accessledger_smtp::Result<()> {
//!     let stream = connect("localhost:25").await?;
//!     let envelope = Envelope::new(
//!         "sender.example.com",
//!         Address::new("audit@example.com")?,
//!         Address::new("security@example.com")?,
//!     );
//!
//!     let message = b"Subject: Test\r\n\r\nHello, World!";
//!     deliver(stream, Arc::new(Lenient), &envelope, message).await
//! }
//! ```
//!
//! ## Connection States
//!
//! ```text
//! Greeted ─ helo() ─→ Identified ─ mail_from() ─→ MailTransaction
//!    ─ rcpt_to() ─→ RecipientAdded ─ data() ─→ Data ─ send_message() ─→ Delivered
//! ```
//!
//! `quit()` is available in every state.
//!
//! ## Modules
//!
//! - [`command`]: SMTP command builders
//! - [`connection`]: Stream handling, reply policies and the type-state client
//! - [`parser`]: Reply parser used by strict reply checking
//! - [`types`]: Addresses and replies

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod types;

pub use connection::{
    Client, Data, Delivered, Envelope, Greeted, Identified, Lenient, MailTransaction,
    RecipientAdded, ReplyPolicy, SmtpStream, Step, Strict, deliver,
};
pub use error::{Error, Result};
pub use types::{Address, Reply, ReplyCode};
