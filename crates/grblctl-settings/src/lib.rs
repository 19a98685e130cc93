//! grblctl Settings Crate
//!
//! Handles the configuration file: its model, validation and persistence.

pub mod config;
pub mod error;

pub use config::{
    Config, ConnectionSettings, FirmwareSettings, ProbeSettings, ResponseSettings,
};
pub use error::{SettingsError, SettingsResult};
