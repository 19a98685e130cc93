//! Single-command send path
//!
//! `DeviceLink` owns the transport and is the only way the console and the
//! streaming engine talk to the controller. One command is in flight at a
//! time and nothing here spawns threads.

use super::codec;
use super::collector::ResponseCollector;
use super::Transport;
use crate::firmware::grbl::ResetBanner;
use grblctl_core::{ConnectionError, SessionState, TransportError};
use std::time::Duration;

/// Bytes written to wake the controller after the port opens
const WAKE_UP: &[u8] = b"\r\n\r\n";

/// What the controller said in reply to one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceResponse {
    /// The command as transmitted
    pub command: String,
    /// Raw reply text, possibly multi-line, possibly empty
    pub text: String,
    /// Whether the reply carries the boot/reset banner signature
    pub is_reset_banner: bool,
}

impl DeviceResponse {
    /// Build a response and classify it against the reset banner
    pub fn new(command: impl Into<String>, text: impl Into<String>, banner: &ResetBanner) -> Self {
        let text = text.into();
        let is_reset_banner = banner.matches(&text);
        Self {
            command: command.into(),
            text,
            is_reset_banner,
        }
    }
}

/// A connected controller
pub struct DeviceLink<T: Transport> {
    transport: T,
    collector: ResponseCollector,
    banner: ResetBanner,
}

impl<T: Transport> DeviceLink<T> {
    /// Wrap an open transport
    pub fn new(transport: T, collector: ResponseCollector, banner: ResetBanner) -> Self {
        Self {
            transport,
            collector,
            banner,
        }
    }

    /// Startup handshake: wake the controller, let it boot, and throw away
    /// its banner so it is never mistaken for a command reply
    pub fn wake_up(&mut self, settle: Duration) -> Result<(), ConnectionError> {
        let failed = |e: TransportError| ConnectionError::HandshakeFailed {
            reason: e.to_string(),
        };
        self.transport.write_all(WAKE_UP).map_err(failed)?;
        std::thread::sleep(settle);
        self.transport.discard_input().map_err(failed)?;
        tracing::info!("Controller on {} is awake", self.transport.name());
        Ok(())
    }

    /// Encode and write one line
    pub fn send_line(&mut self, line: &str) -> Result<(), TransportError> {
        codec::send_line(&mut self.transport, line)
    }

    /// Loose drain of everything currently arriving
    pub fn collect_available(&mut self) -> Result<String, TransportError> {
        self.collector.collect_available(&mut self.transport)
    }

    /// Exactly one blocking line read
    pub fn collect_one_line(&mut self) -> Result<String, TransportError> {
        self.collector.collect_one_line(&mut self.transport)
    }

    /// Send one interactive command and collect its reply.
    ///
    /// The coordinate mode is updated from the command text before it is
    /// transmitted. The reply is gathered with the loose drain policy.
    pub fn send_command(
        &mut self,
        state: &mut SessionState,
        line: &str,
    ) -> Result<DeviceResponse, TransportError> {
        state.observe_command(line);
        self.send_line(line)?;
        let text = self.collect_available()?;
        Ok(DeviceResponse::new(line, text, &self.banner))
    }

    /// Send macro lines one after another, skipping blank ones.
    ///
    /// Stops at the first failure; lines after it are never sent.
    pub fn send_macro_lines<I, S>(
        &mut self,
        state: &mut SessionState,
        lines: I,
    ) -> Result<Vec<DeviceResponse>, TransportError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut responses = Vec::new();
        self.send_macro_lines_with(state, lines, |response| responses.push(response))?;
        Ok(responses)
    }

    /// Like [`send_macro_lines`](Self::send_macro_lines), but hands each
    /// reply to `on_response` as soon as it is collected. Replies to lines
    /// sent before a failure have already been delivered when it returns.
    pub fn send_macro_lines_with<I, S, F>(
        &mut self,
        state: &mut SessionState,
        lines: I,
        mut on_response: F,
    ) -> Result<(), TransportError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: FnMut(DeviceResponse),
    {
        for line in lines {
            let line = line.as_ref().trim();
            if line.is_empty() {
                continue;
            }
            on_response(self.send_command(state, line)?);
        }
        Ok(())
    }

    /// Reset banner signature used to classify replies
    pub fn banner(&self) -> &ResetBanner {
        &self.banner
    }

    /// The underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The underlying transport, mutably
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Close the channel
    pub fn close(&mut self) -> Result<(), TransportError> {
        self.transport.close()
    }
}
