//! Type-state SMTP client.

use std::marker::PhantomData;
use std::sync::Arc;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

use super::policy::{ReplyPolicy, Step};
use super::stream::SmtpStream;
use crate::command::{Command, encode_message};
use crate::error::Result;
use crate::types::Address;

/// Type-state marker: greeting received.
#[derive(Debug)]
pub struct Greeted;

/// Type-state marker: `HELO` accepted.
#[derive(Debug)]
pub struct Identified;

/// Type-state marker: mail transaction started.
#[derive(Debug)]
pub struct MailTransaction;

/// Type-state marker: recipient added.
#[derive(Debug)]
pub struct RecipientAdded;

/// Type-state marker: data mode.
#[derive(Debug)]
pub struct Data;

/// Type-state marker: message handed over.
#[derive(Debug)]
pub struct Delivered;

/// SMTP client with type-state pattern.
///
/// Every step consumes the client, so an error anywhere drops the stream
/// and closes the connection.
#[derive(Debug)]
pub struct Client<S, State> {
    stream: SmtpStream<S>,
    policy: Arc<dyn ReplyPolicy>,
    _state: PhantomData<State>,
}

/// Sender, recipient and announced identity of one delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Identity sent with `HELO`.
    pub identity: String,
    /// `MAIL FROM` address.
    pub from: Address,
    /// `RCPT TO` address.
    pub to: Address,
}

impl Envelope {
    /// Creates a new envelope.
    #[must_use]
    pub fn new(identity: impl Into<String>, from: Address, to: Address) -> Self {
        Self {
            identity: identity.into(),
            from,
            to,
        }
    }
}

impl<S> Client<S, Greeted>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a client from a stream and reads the server greeting.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the greeting fails or the policy rejects it.
    pub async fn from_stream(
        mut stream: SmtpStream<S>,
        policy: Arc<dyn ReplyPolicy>,
    ) -> Result<Self> {
        let greeting = stream.read_reply(policy.needs_complete_reply()).await?;
        policy.check(Step::Greeting, &greeting)?;

        Ok(Self {
            stream,
            policy,
            _state: PhantomData,
        })
    }

    /// Sends `HELO` with the client identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn helo(mut self, identity: &str) -> Result<Client<S, Identified>> {
        let cmd = Command::Helo {
            identity: identity.to_string(),
        };
        self.send_command(Step::Helo, &cmd).await?;
        Ok(self.transition())
    }
}

impl<S> Client<S, Identified>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Starts a mail transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the MAIL FROM command fails.
    pub async fn mail_from(mut self, from: &Address) -> Result<Client<S, MailTransaction>> {
        let cmd = Command::MailFrom { from: from.clone() };
        self.send_command(Step::MailFrom, &cmd).await?;
        Ok(self.transition())
    }
}

impl<S> Client<S, MailTransaction>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Adds the recipient to the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the RCPT TO command fails.
    pub async fn rcpt_to(mut self, to: &Address) -> Result<Client<S, RecipientAdded>> {
        let cmd = Command::RcptTo { to: to.clone() };
        self.send_command(Step::RcptTo, &cmd).await?;
        Ok(self.transition())
    }
}

impl<S> Client<S, RecipientAdded>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Begins sending message data.
    ///
    /// # Errors
    ///
    /// Returns an error if the DATA command fails.
    pub async fn data(mut self) -> Result<Client<S, Data>> {
        self.send_command(Step::Data, &Command::Data).await?;
        Ok(self.transition())
    }
}

impl<S> Client<S, Data>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Sends the message content and the terminating `.` line.
    ///
    /// Line endings are normalized to CRLF and leading dots are stuffed.
    ///
    /// # Errors
    ///
    /// Returns an error if sending the message fails or the policy rejects
    /// the reply.
    pub async fn send_message(mut self, message: &[u8]) -> Result<Client<S, Delivered>> {
        let encoded = encode_message(message);
        self.stream.write_all(&encoded).await?;
        debug!("> <message, {} bytes>", encoded.len());

        let reply = self.read_reply().await?;
        self.policy.check(Step::Message, &reply)?;

        Ok(self.transition())
    }
}

// Common implementation for all states
impl<S, State> Client<S, State>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    async fn send_command(&mut self, step: Step, cmd: &Command) -> Result<()> {
        let data = cmd.serialize();
        self.stream.write_all(&data).await?;
        debug!("> {}", String::from_utf8_lossy(&data).trim_end());

        let reply = self.read_reply().await?;
        self.policy.check(step, &reply)
    }

    async fn read_reply(&mut self) -> Result<Bytes> {
        self.stream
            .read_reply(self.policy.needs_complete_reply())
            .await
    }

    fn transition<Next>(self) -> Client<S, Next> {
        Client {
            stream: self.stream,
            policy: self.policy,
            _state: PhantomData,
        }
    }

    /// Sends QUIT and closes the connection (available in any state).
    ///
    /// # Errors
    ///
    /// Returns an error if the QUIT command fails.
    pub async fn quit(mut self) -> Result<()> {
        self.send_command(Step::Quit, &Command::Quit).await
    }
}

/// Runs the whole delivery exchange for one message.
///
/// Any failure aborts the remaining steps; the connection is released on
/// every exit path.
///
/// # Errors
///
/// Returns the first transport error or policy rejection.
pub async fn deliver<S>(
    stream: SmtpStream<S>,
    policy: Arc<dyn ReplyPolicy>,
    envelope: &Envelope,
    message: &[u8],
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    Client::from_stream(stream, policy)
        .await?
        .helo(&envelope.identity)
        .await?
        .mail_from(&envelope.from)
        .await?
        .rcpt_to(&envelope.to)
        .await?
        .data()
        .await?
        .send_message(message)
        .await?
        .quit()
        .await
}
