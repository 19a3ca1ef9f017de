//! serial-tool binary entry point.
//!
//! # Usage
//!
//! ```bash
//! # List serial devices and exit
//! serial-tool --list
//!
//! # Start the TUI and open a port straight away
//! serial-tool --port /dev/ttyUSB0 --baud 9600 --log-file serial-tool.log
//! ```

use clap::Parser;
use serial_tool::config::{ConfigLoader, LoggingConfig};
use serial_tool::console::Console;
use serial_tool::logging;
use serial_tool::port::scan_ports;
use serial_tool::session::SerialSession;
use serial_tool::tui::App;
use std::path::PathBuf;
use tracing::info;

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    name = "serial-tool",
    version,
    about = "A terminal serial port tool: send text or hex, watch received data, resend from history."
)]
struct Args {
    /// Configuration file to use instead of the standard locations.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Device to open at startup, e.g. COM3 or /dev/ttyUSB0.
    #[arg(short, long)]
    port: Option<String>,

    /// Baud rate for the startup port.
    #[arg(short, long)]
    baud: Option<u32>,

    /// Print the available serial devices and exit.
    #[arg(short, long)]
    list: bool,

    /// Write logs to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.list {
        // no TUI on this path, so diagnostics can use the terminal
        logging::init_stderr(&LoggingConfig::default())?;
        let ports = match scan_ports() {
            Ok(ports) => ports,
            Err(e) => {
                eprintln!("Cannot list serial ports: {e}");
                std::process::exit(1);
            }
        };
        if ports.is_empty() {
            println!("No serial ports found");
        }
        for port in ports {
            println!("{}", port.label());
        }
        return Ok(());
    }

    // An explicit file must load; otherwise fall back to defaults
    let mut config = match &args.config {
        Some(path) => ConfigLoader::load_from(path)?.into_config(),
        None => match ConfigLoader::load() {
            Ok(loader) => loader.into_config(),
            Err(e) => {
                eprintln!("Warning: Failed to load config, using defaults: {}", e);
                ConfigLoader::with_defaults().into_config()
            }
        },
    };

    if let Some(port) = args.port {
        config.serial.port = Some(port);
    }
    if let Some(baud) = args.baud {
        config.serial.baud_rate = baud;
    }
    if let Some(log_file) = args.log_file {
        config.logging.file = Some(log_file);
    }
    config.validate()?;

    // Log to file only; the TUI owns the terminal
    logging::init(&config.logging)?;
    info!(version = env!("CARGO_PKG_VERSION"), "serial-tool starting");

    let session = SerialSession::system(config.serial.session_options());
    let console = Console::from_config(session, &config)?;
    let mut app = App::new(console, &config);

    if let Some(device) = config.serial.port.as_deref() {
        app.open_port(device);
    }

    app.run()?;
    info!("serial-tool exiting");
    Ok(())
}
