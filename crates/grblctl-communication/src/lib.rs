//! # grblctl Communication
//!
//! Everything that touches the wire: the transport channel abstraction and
//! its serial implementation, the line codec, the two response collection
//! policies, the single-command send path and the acknowledgement-paced
//! file streaming engine.

pub mod communication;
pub mod firmware;
pub mod streaming;

pub use communication::{
    codec,
    collector::{CollectorConfig, ResponseCollector},
    link::{DeviceLink, DeviceResponse},
    scripted::{ScriptedTransport, TransportEvent},
    serial::{list_ports, SerialPortInfo, SerialTransport},
    Transport,
};

pub use firmware::grbl::{describe_response, is_error_response, is_ok_response, ResetBanner};

pub use streaming::{
    count_lines, percent_complete, LineProgress, StreamListener, StreamOutcome, StreamReport,
    Streamer,
};
