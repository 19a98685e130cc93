//! # grblctl
//!
//! A minimal interactive controller for GRBL CNC machines:
//! - Raw G-code, M-code and `$` system commands typed at a prompt
//! - Shortcuts for common operations (zeroing, homing, motor lock)
//! - Z probing against a touch plate
//! - Acknowledgement-paced streaming of arbitrarily large G-code files
//!
//! ## Architecture
//!
//! grblctl is organized as a workspace with multiple crates:
//!
//! 1. **grblctl-core** - Error types, session state, G-code macros
//! 2. **grblctl-communication** - Transport, response collection, streaming
//! 3. **grblctl-settings** - Configuration file handling
//! 4. **grblctl** - Main binary with the interactive console

pub mod console;

pub use console::{
    classify, Command, Console, Flow, Prompter, RustylinePrompter, ScriptedPrompter,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging
///
/// Sets up structured logging with:
/// - Output on stderr so it never mixes with console output
/// - RUST_LOG environment variable support
/// - `warn` by default, `debug` when `verbose` is set
pub fn init_logging(verbose: bool) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let default_level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_line_number(verbose);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
