//! Response collection policies
//!
//! Two ways to read what the controller says back:
//! - `collect_one_line`: exactly one blocking line read, used as the
//!   acknowledgement that paces streaming
//! - `collect_available`: wait briefly for anything to show up, then drain
//!   every buffered line; used for interactive commands and buffer flushes
//!   where no particular reply is guaranteed

use super::codec::normalize_received;
use super::Transport;
use grblctl_core::TransportError;
use std::time::{Duration, Instant};

/// Timing for the loose drain policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectorConfig {
    /// Sleep between "bytes available" polls
    pub poll_interval: Duration,
    /// Give up when nothing has arrived after this long
    pub quiescence: Duration,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(50),
            quiescence: Duration::from_millis(150),
        }
    }
}

/// Reads device responses from a transport
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseCollector {
    config: CollectorConfig,
}

impl ResponseCollector {
    /// Create a collector with the given timing
    pub fn new(config: CollectorConfig) -> Self {
        Self { config }
    }

    /// Current timing configuration
    pub fn config(&self) -> CollectorConfig {
        self.config
    }

    /// Drain everything the controller has sent.
    ///
    /// Polls until data appears or the quiescence window passes with
    /// nothing buffered, then reads line by line until the input buffer is
    /// empty. Lines are joined with `\n` and the result trimmed; an idle
    /// channel yields an empty string.
    pub fn collect_available<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
    ) -> Result<String, TransportError> {
        let started = Instant::now();
        while transport.bytes_available()? == 0 {
            if started.elapsed() >= self.config.quiescence {
                return Ok(String::new());
            }
            std::thread::sleep(self.config.poll_interval);
        }

        let mut lines = Vec::new();
        while transport.bytes_available()? > 0 {
            let raw = transport.read_line()?;
            lines.push(normalize_received(&raw));
        }

        let response = lines.join("\n").trim().to_string();
        tracing::debug!("<- {:?}", response);
        Ok(response)
    }

    /// Block for exactly one line, with no deadline
    pub fn collect_one_line<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
    ) -> Result<String, TransportError> {
        let raw = transport.read_line()?;
        let line = normalize_received(&raw);
        tracing::debug!("<- {:?}", line);
        Ok(line)
    }
}
