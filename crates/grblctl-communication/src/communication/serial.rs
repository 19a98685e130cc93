//! Serial port transport
//!
//! Connects to the controller over USB or RS-232 with the `serialport`
//! crate. Supports:
//! - Port enumeration for connection diagnostics
//! - Baud rate configuration (8N1, no flow control)
//! - Blocking line reads with no overall deadline

use super::Transport;
use grblctl_core::{ConnectionError, TransportError};
use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

/// Information about an available serial port
#[derive(Debug, Clone)]
pub struct SerialPortInfo {
    /// Port name (e.g., "/dev/ttyUSB0", "COM3")
    pub port_name: String,

    /// Port description (e.g., "USB Serial Port")
    pub description: String,

    /// Manufacturer name if available
    pub manufacturer: Option<String>,
}

impl SerialPortInfo {
    /// Create a new port info
    pub fn new(port_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            description: description.into(),
            manufacturer: None,
        }
    }

    /// Set manufacturer
    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }
}

/// List serial ports that look like CNC controllers
///
/// Enumeration failures are logged and yield an empty list; the result is
/// only used to help the operator after a failed connection.
pub fn list_ports() -> Vec<SerialPortInfo> {
    match serialport::available_ports() {
        Ok(ports) => ports
            .iter()
            .filter(|port| is_valid_cnc_port(&port.port_name))
            .map(|port| {
                let info = SerialPortInfo::new(&port.port_name, get_port_description(port));
                match &port.port_type {
                    serialport::SerialPortType::UsbPort(usb_info) => {
                        match usb_info.manufacturer.as_deref() {
                            Some(mfg) => info.with_manufacturer(mfg),
                            None => info,
                        }
                    }
                    _ => info,
                }
            })
            .collect(),
        Err(e) => {
            tracing::error!("Failed to enumerate serial ports: {}", e);
            Vec::new()
        }
    }
}

/// Check if a port name matches CNC controller patterns
///
/// Valid patterns:
/// - Windows: COM* (COM1, COM2, etc.)
/// - Linux: /dev/ttyUSB*, /dev/ttyACM*
/// - macOS: /dev/cu.usbserial-*, /dev/cu.usbmodem*
pub fn is_valid_cnc_port(port_name: &str) -> bool {
    if let Some(number) = port_name.strip_prefix("COM") {
        return !number.is_empty() && number.chars().all(|c| c.is_ascii_digit());
    }

    if port_name.starts_with("/dev/ttyUSB") || port_name.starts_with("/dev/ttyACM") {
        return true;
    }

    port_name.starts_with("/dev/cu.usbserial-") || port_name.starts_with("/dev/cu.usbmodem")
}

fn get_port_description(port: &serialport::SerialPortInfo) -> String {
    match &port.port_type {
        serialport::SerialPortType::UsbPort(usb_info) => {
            format!(
                "USB {} {}",
                usb_info.manufacturer.as_deref().unwrap_or("Device"),
                usb_info.product.as_deref().unwrap_or("Serial Port")
            )
        }
        serialport::SerialPortType::BluetoothPort => "Bluetooth Serial".to_string(),
        serialport::SerialPortType::PciPort => "PCI Serial".to_string(),
        _ => "Serial Port".to_string(),
    }
}

/// Transport over a native serial port
pub struct SerialTransport {
    port_name: String,
    port: Box<dyn serialport::SerialPort>,
    /// Bytes read from the port but not yet handed out as a line
    pending: Vec<u8>,
}

impl SerialTransport {
    /// Open a serial port.
    ///
    /// `read_timeout` is only the polling granularity of the underlying
    /// port; `read_line` keeps waiting across time-outs.
    pub fn open(
        port_name: &str,
        baud_rate: u32,
        read_timeout: Duration,
    ) -> Result<Self, ConnectionError> {
        if baud_rate == 0 {
            return Err(ConnectionError::UnsupportedBaudRate { baud: baud_rate });
        }

        let port = serialport::new(port_name, baud_rate)
            .timeout(read_timeout)
            .data_bits(serialport::DataBits::Eight)
            .stop_bits(serialport::StopBits::One)
            .parity(serialport::Parity::None)
            .flow_control(serialport::FlowControl::None)
            .open()
            .map_err(|e| {
                tracing::warn!("Failed to open serial port {}: {}", port_name, e);
                ConnectionError::FailedToOpen {
                    port: port_name.to_string(),
                    reason: e.to_string(),
                }
            })?;

        tracing::info!("Opened {} at {} baud", port_name, baud_rate);
        Ok(Self {
            port_name: port_name.to_string(),
            port,
            pending: Vec::new(),
        })
    }

    fn take_line(&mut self) -> Option<Vec<u8>> {
        let end = self.pending.iter().position(|&b| b == b'\n')?;
        Some(self.pending.drain(..=end).collect())
    }
}

impl Transport for SerialTransport {
    fn name(&self) -> String {
        self.port_name.clone()
    }

    fn write_all(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.port.write_all(data).map_err(TransportError::write)?;
        self.port.flush().map_err(TransportError::write)
    }

    fn read_line(&mut self) -> Result<Vec<u8>, TransportError> {
        let mut chunk = [0u8; 256];
        loop {
            if let Some(line) = self.take_line() {
                return Ok(line);
            }
            match self.port.read(&mut chunk) {
                Ok(n) => self.pending.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == ErrorKind::TimedOut => continue,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(TransportError::read(e)),
            }
        }
    }

    fn bytes_available(&mut self) -> Result<usize, TransportError> {
        let queued = self.port.bytes_to_read().map_err(TransportError::read)?;
        Ok(self.pending.len() + queued as usize)
    }

    fn discard_input(&mut self) -> Result<(), TransportError> {
        self.pending.clear();
        self.port
            .clear(serialport::ClearBuffer::Input)
            .map_err(TransportError::read)
    }

    fn close(&mut self) -> Result<(), TransportError> {
        // The OS handle is released when the port is dropped
        self.pending.clear();
        tracing::info!("Closed {}", self.port_name);
        Ok(())
    }
}
