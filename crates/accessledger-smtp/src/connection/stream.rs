//! Low-level SMTP stream handling.

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

use crate::error::{Error, Result};
use crate::parser::is_last_reply_line;

/// Initial capacity of the reply buffer.
const REPLY_BUFFER_SIZE: usize = 512;

/// SMTP stream over any byte-stream connection.
///
/// Dropping the stream releases the underlying connection.
#[derive(Debug)]
pub struct SmtpStream<S> {
    inner: S,
    buffer: BytesMut,
}

impl<S> SmtpStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps an already established connection.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            buffer: BytesMut::with_capacity(REPLY_BUFFER_SIZE),
        }
    }

    /// Reads one reply from the relay.
    ///
    /// With `complete` unset, whatever a single read returns is the reply.
    /// With `complete` set, reads continue until the buffer ends in a final
    /// reply line (`NNN <text>` followed by a line break), so a multi-line
    /// reply split across segments arrives whole. If the relay closes the
    /// connection part-way, the partial reply is returned as is.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyReply`] if the relay closed the connection
    /// before sending anything, or an I/O error if a read fails.
    pub async fn read_reply(&mut self, complete: bool) -> Result<Bytes> {
        self.buffer.clear();

        loop {
            self.buffer.reserve(REPLY_BUFFER_SIZE);
            let read = self.inner.read_buf(&mut self.buffer).await?;
            if read == 0 {
                if self.buffer.is_empty() {
                    return Err(Error::EmptyReply);
                }
                break;
            }
            if !complete || ends_with_final_line(&self.buffer) {
                break;
            }
        }

        let reply = self.buffer.split().freeze();
        debug!("< {}", String::from_utf8_lossy(&reply).trim_end());
        Ok(reply)
    }

    /// Writes data to the stream and flushes it.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails or the peer stops accepting bytes.
    pub async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.inner.write_all(data).await?;
        self.inner.flush().await?;
        Ok(())
    }
}

fn ends_with_final_line(buffer: &[u8]) -> bool {
    let Some(body) = buffer.strip_suffix(b"\n") else {
        return false;
    };
    let body = body.strip_suffix(b"\r").unwrap_or(body);
    let last = body
        .rsplit(|&b| b == b'\n')
        .next()
        .unwrap_or_default();
    is_last_reply_line(&String::from_utf8_lossy(last)) || last.len() == 3
}

/// Connects to a relay over plain TCP.
///
/// `addr` is a `host:port` pair.
///
/// # Errors
///
/// Returns an error if the connection fails.
pub async fn connect(addr: &str) -> Result<SmtpStream<TcpStream>> {
    let stream = TcpStream::connect(addr).await?;
    Ok(SmtpStream::new(stream))
}
