//! Transport channel and the primitives built on top of it
//!
//! - `serial`: the real serial port
//! - `scripted`: an in-memory channel with canned replies
//! - `codec`: line framing
//! - `collector`: response collection policies
//! - `link`: single-command send path and startup handshake

pub mod codec;
pub mod collector;
pub mod link;
pub mod scripted;
pub mod serial;

use grblctl_core::TransportError;

/// Byte-oriented duplex channel to the controller.
///
/// All calls block the caller. The channel is only ever driven from one
/// thread with one command in flight, so implementations need no locking.
pub trait Transport {
    /// Human readable channel name (port path)
    fn name(&self) -> String;

    /// Write every byte or fail
    fn write_all(&mut self, data: &[u8]) -> Result<(), TransportError>;

    /// Block until a full `\n`-terminated line arrives; the terminator is
    /// included in the returned bytes
    fn read_line(&mut self) -> Result<Vec<u8>, TransportError>;

    /// Number of bytes received and not yet read
    fn bytes_available(&mut self) -> Result<usize, TransportError>;

    /// Throw away everything currently buffered on the input side
    fn discard_input(&mut self) -> Result<(), TransportError>;

    /// Release the channel
    fn close(&mut self) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn name(&self) -> String {
        (**self).name()
    }

    fn write_all(&mut self, data: &[u8]) -> Result<(), TransportError> {
        (**self).write_all(data)
    }

    fn read_line(&mut self) -> Result<Vec<u8>, TransportError> {
        (**self).read_line()
    }

    fn bytes_available(&mut self) -> Result<usize, TransportError> {
        (**self).bytes_available()
    }

    fn discard_input(&mut self) -> Result<(), TransportError> {
        (**self).discard_input()
    }

    fn close(&mut self) -> Result<(), TransportError> {
        (**self).close()
    }
}
