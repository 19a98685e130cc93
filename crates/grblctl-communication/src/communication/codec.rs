//! Line framing between command strings and wire bytes
//!
//! GRBL accepts `\n`-terminated ASCII blocks and answers with `\r\n`
//! terminated lines. Outbound lines get a single `\n`; inbound lines lose
//! any trailing `\r`/`\n` characters and nothing else.

use super::Transport;
use grblctl_core::TransportError;

/// Terminator appended to every outbound line
pub const LINE_TERMINATOR: u8 = b'\n';

/// Encode a command line for transmission
pub fn encode(line: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(line.len() + 1);
    bytes.extend_from_slice(line.as_bytes());
    bytes.push(LINE_TERMINATOR);
    bytes
}

/// Decode received bytes and strip trailing line terminators
pub fn normalize_received(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim_end_matches(['\r', '\n'])
        .to_string()
}

/// Encode and write one line; a failed write is never retried
pub fn send_line<T: Transport + ?Sized>(
    transport: &mut T,
    line: &str,
) -> Result<(), TransportError> {
    tracing::debug!("-> {}", line);
    transport.write_all(&encode(line))
}
