//! In-memory transport with canned controller replies
//!
//! Every write consumes the next scripted reply (or the default reply once
//! the script runs out) and queues it on the input side, the way a
//! controller answers each line it receives, blank ones included. All
//! traffic is recorded in order so tests can check pacing. Clones share
//! the same channel, which lets a test keep a handle while the console
//! owns the transport.

use super::Transport;
use grblctl_core::TransportError;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// One recorded interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Bytes written, decoded lossily
    Write(String),
    /// A completed `read_line` call and what it returned
    ReadLine(String),
    /// Input buffer discarded
    Discard,
    /// Channel closed
    Close,
}

#[derive(Debug, Default)]
struct ScriptState {
    inbound: VecDeque<u8>,
    replies: VecDeque<String>,
    default_reply: Option<String>,
    events: Vec<TransportEvent>,
    writes_before_failure: Option<usize>,
    closed: bool,
}

/// Scripted stand-in for a controller
#[derive(Debug, Clone)]
pub struct ScriptedTransport {
    name: String,
    state: Rc<RefCell<ScriptState>>,
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedTransport {
    /// A channel that stays silent unless scripted
    pub fn new() -> Self {
        Self {
            name: "scripted".to_string(),
            state: Rc::new(RefCell::new(ScriptState::default())),
        }
    }

    /// A channel that acknowledges everything with `ok`
    pub fn always_ok() -> Self {
        Self::new().with_default_reply("ok")
    }

    /// Queue replies, one per written block, in order
    pub fn with_replies<I, S>(self, replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state
            .borrow_mut()
            .replies
            .extend(replies.into_iter().map(Into::into));
        self
    }

    /// Reply used once the scripted replies are exhausted
    pub fn with_default_reply(self, reply: impl Into<String>) -> Self {
        self.state.borrow_mut().default_reply = Some(reply.into());
        self
    }

    /// Let `count` writes succeed, then fail every write after that
    pub fn fail_writes_after(self, count: usize) -> Self {
        self.state.borrow_mut().writes_before_failure = Some(count);
        self
    }

    /// Put unsolicited text on the input side (boot banner, status push)
    pub fn push_inbound(&self, text: &str) {
        let mut state = self.state.borrow_mut();
        state.inbound.extend(text.as_bytes());
        if !text.ends_with('\n') {
            state.inbound.extend(b"\r\n");
        }
    }

    /// Every recorded interaction, in order
    pub fn events(&self) -> Vec<TransportEvent> {
        self.state.borrow().events.clone()
    }

    /// One entry per write, with trailing terminators removed
    pub fn written_lines(&self) -> Vec<String> {
        self.state
            .borrow()
            .events
            .iter()
            .filter_map(|e| match e {
                TransportEvent::Write(text) => {
                    Some(text.trim_end_matches(['\r', '\n']).to_string())
                }
                _ => None,
            })
            .collect()
    }

    /// Total bytes written
    pub fn bytes_written(&self) -> usize {
        self.state
            .borrow()
            .events
            .iter()
            .map(|e| match e {
                TransportEvent::Write(text) => text.len(),
                _ => 0,
            })
            .sum()
    }

    /// Whether `close` has been called
    pub fn is_closed(&self) -> bool {
        self.state.borrow().closed
    }
}

impl Transport for ScriptedTransport {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn write_all(&mut self, data: &[u8]) -> Result<(), TransportError> {
        let mut state = self.state.borrow_mut();
        if state.closed {
            return Err(TransportError::Closed);
        }
        if let Some(remaining) = state.writes_before_failure.as_mut() {
            if *remaining == 0 {
                return Err(TransportError::WriteFailed {
                    reason: "scripted write failure".to_string(),
                });
            }
            *remaining -= 1;
        }

        let text = String::from_utf8_lossy(data).to_string();
        state.events.push(TransportEvent::Write(text));

        let reply = state
            .replies
            .pop_front()
            .or_else(|| state.default_reply.clone());
        if let Some(reply) = reply.filter(|r| !r.is_empty()) {
            for line in reply.lines() {
                state.inbound.extend(line.as_bytes());
                state.inbound.extend(b"\r\n");
            }
        }
        Ok(())
    }

    fn read_line(&mut self) -> Result<Vec<u8>, TransportError> {
        let mut state = self.state.borrow_mut();
        if state.inbound.is_empty() {
            // A real port would block forever here
            return Err(if state.closed {
                TransportError::Closed
            } else {
                TransportError::ReadFailed {
                    reason: "no scripted data".to_string(),
                }
            });
        }

        let end = state
            .inbound
            .iter()
            .position(|&b| b == b'\n')
            .map(|i| i + 1)
            .unwrap_or(state.inbound.len());
        let line: Vec<u8> = state.inbound.drain(..end).collect();
        state
            .events
            .push(TransportEvent::ReadLine(String::from_utf8_lossy(&line).to_string()));
        Ok(line)
    }

    fn bytes_available(&mut self) -> Result<usize, TransportError> {
        Ok(self.state.borrow().inbound.len())
    }

    fn discard_input(&mut self) -> Result<(), TransportError> {
        let mut state = self.state.borrow_mut();
        state.inbound.clear();
        state.events.push(TransportEvent::Discard);
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        let mut state = self.state.borrow_mut();
        state.closed = true;
        state.events.push(TransportEvent::Close);
        Ok(())
    }
}
