//! SMTP reply parser.

use crate::error::{Error, Result};
use crate::types::{Reply, ReplyCode};

/// Parses an SMTP reply from response lines.
///
/// SMTP replies can be single-line or multi-line:
/// - Single: `250 OK\r\n`
/// - Multi: `250-First line\r\n250-Second line\r\n250 Last line\r\n`
///
/// # Errors
///
/// Returns an error if the reply is malformed.
pub fn parse_reply(lines: &[String]) -> Result<Reply> {
    let Some(first) = lines.first() else {
        return Err(Error::Protocol("Empty reply".into()));
    };

    let code_str = first
        .get(0..3)
        .ok_or_else(|| Error::Protocol(format!("Reply too short: {first}")))?;
    let code = code_str
        .parse::<u16>()
        .map_err(|_| Error::Protocol(format!("Invalid reply code: {code_str}")))?;

    let mut message = Vec::with_capacity(lines.len());
    for line in lines {
        if line.len() == 3 {
            message.push(String::new());
        } else if let Some(text) = line.get(4..) {
            // Skip code and separator (e.g., "250-" or "250 ")
            message.push(text.to_string());
        } else {
            return Err(Error::Protocol(format!("Malformed reply line: {line}")));
        }
    }

    Ok(Reply::new(ReplyCode::new(code), message))
}

/// Parses a raw reply chunk as read from the wire.
///
/// The chunk must end with a complete final line (`NNN <text>`).
///
/// # Errors
///
/// Returns an error if the chunk is not a complete, well-formed reply.
pub fn parse_reply_bytes(raw: &[u8]) -> Result<Reply> {
    let text = String::from_utf8_lossy(raw);
    let lines: Vec<String> = text
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect();

    match lines.last() {
        Some(last) if is_last_reply_line(last) || last.len() == 3 => parse_reply(&lines),
        Some(last) => Err(Error::Protocol(format!("Incomplete reply: {last}"))),
        None => Err(Error::Protocol("Empty reply".into())),
    }
}

/// Checks if a line is the last line of a multi-line reply.
///
/// Multi-line replies use `-` separator for continuation and ` ` for the last line.
#[must_use]
pub fn is_last_reply_line(line: &str) -> bool {
    line.len() >= 4 && line.as_bytes()[3] == b' '
}
