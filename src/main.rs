use anyhow::Context;
use clap::Parser;
use grblctl::{init_logging, Console, RustylinePrompter};
use grblctl_communication::{
    list_ports, CollectorConfig, DeviceLink, ResetBanner, ResponseCollector, ScriptedTransport,
    SerialTransport, Transport,
};
use grblctl_core::{ConnectionError, MacroLibrary};
use grblctl_settings::Config;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "grblctl",
    about = "Interactive controller and G-code streamer for GRBL CNC machines",
    author,
    version
)]
struct Cli {
    #[arg(value_name = "FILE", help = "G-code file to stream right after connecting")]
    file: Option<PathBuf>,

    #[arg(long, short = 'p', value_name = "DEVICE", help = "Serial port of the controller")]
    port: Option<String>,

    #[arg(long, short = 'b', value_name = "RATE", help = "Serial baud rate")]
    baud: Option<u32>,

    #[arg(
        long,
        short = 'c',
        value_name = "PATH",
        help = "Configuration file (.toml or .json)"
    )]
    config: Option<PathBuf>,

    #[arg(long, short = 'v', help = "Log debug output to stderr")]
    verbose: bool,

    #[arg(
        long = "dry-run",
        help = "Talk to a simulated controller that acknowledges everything"
    )]
    dry_run: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;
    tracing::debug!("grblctl {} built {}", grblctl::VERSION, grblctl::BUILD_DATE);

    let config_path = cli.config.clone().or_else(Config::default_path);
    let file_config = match &config_path {
        Some(path) => Config::load_or_default(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };

    let mut config = file_config.clone();
    if let Some(port) = &cli.port {
        config.connection.port = port.clone();
    }
    if let Some(baud) = cli.baud {
        config.connection.baud_rate = baud;
    }
    config.validate().context("Invalid configuration")?;

    let mut link = match connect(&config, cli.dry_run) {
        Ok(link) => link,
        Err(e) => {
            report_connection_failure(&config, &e);
            std::process::exit(1);
        }
    };
    let settle = if cli.dry_run {
        Duration::ZERO
    } else {
        config.connection.settle()
    };
    if let Err(e) = link.wake_up(settle) {
        report_connection_failure(&config, &e);
        std::process::exit(1);
    }

    let macros = MacroLibrary::new(config.probe.params()).context("Invalid macro definitions")?;
    let prompter = RustylinePrompter::new().context("Failed to initialize line editor")?;
    let mut console = Console::new(link, macros, config, prompter, std::io::stdout());

    console.print_help()?;
    if let Some(file) = &cli.file {
        if let Err(e) = console.stream_file(file) {
            tracing::error!("Streaming {} failed: {}", file.display(), e);
            eprintln!("Cannot stream {}: {}", file.display(), e);
        }
    }
    console.run()?;

    if let Some(path) = &config_path {
        save_recent_files(file_config, console.config(), path);
    }
    Ok(())
}

fn connect(
    config: &Config,
    dry_run: bool,
) -> Result<DeviceLink<Box<dyn Transport>>, ConnectionError> {
    let transport: Box<dyn Transport> = if dry_run {
        tracing::info!("Dry run: using a simulated controller");
        Box::new(ScriptedTransport::always_ok())
    } else {
        Box::new(SerialTransport::open(
            &config.connection.port,
            config.connection.baud_rate,
            config.connection.read_timeout(),
        )?)
    };

    let collector = ResponseCollector::new(CollectorConfig {
        poll_interval: config.response.poll_interval(),
        quiescence: config.response.quiescence(),
    });
    let banner = ResetBanner::new(&config.firmware.banner_id, &config.firmware.banner_help);
    Ok(DeviceLink::new(transport, collector, banner))
}

fn report_connection_failure(config: &Config, error: &ConnectionError) {
    tracing::error!("{}", error);
    eprintln!(
        "Cannot open serial port '{}' (check location and permissions): {}",
        config.connection.port, error
    );

    let ports = list_ports();
    if ports.is_empty() {
        eprintln!("No CNC serial ports detected.");
    } else {
        eprintln!("Detected ports:");
        for port in ports {
            match &port.manufacturer {
                Some(mfg) => eprintln!("  {} - {} ({})", port.port_name, port.description, mfg),
                None => eprintln!("  {} - {}", port.port_name, port.description),
            }
        }
    }
}

/// Persist the recent files list without writing command-line overrides
fn save_recent_files(mut file_config: Config, session: &Config, path: &Path) {
    if file_config.recent_files == session.recent_files {
        return;
    }
    file_config.recent_files = session.recent_files.clone();
    if let Err(e) = file_config.save_to_file(path) {
        tracing::warn!("Failed to save configuration to {}: {}", path.display(), e);
    }
}
