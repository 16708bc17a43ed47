//! SMTP connection management with type-state pattern.

mod client;
mod policy;
mod stream;

pub use client::{
    Client, Data, Delivered, Envelope, Greeted, Identified, MailTransaction, RecipientAdded,
    deliver,
};
pub use policy::{Lenient, ReplyPolicy, Step, Strict};
pub use stream::{SmtpStream, connect};
