//! Serial Tool Library
//!
//! Core of a terminal serial-port tool: open one COM port, send text or hex,
//! watch the receive stream, and resend from a bounded history.
//!
//! # Modules
//!
//! - `port`: Serial backend abstraction, device enumeration and mocks
//! - `session`: The single open connection and its lifecycle
//! - `reader`: Background reader thread and its bounded hand-off queue
//! - `history`: Bounded, newest-first history of sent payloads
//! - `codec`: Hex, text, timestamp and JSON rendering helpers
//! - `console`: Front-end independent core the TUI drives
//! - `config`: Configuration management with TOML support
//! - `logging`: Tracing subscriber setup
//! - `error`: Error types
//! - `tui`: Terminal UI application (when `tui` feature is enabled)

pub mod codec;
pub mod config;
pub mod console;
pub mod error;
pub mod history;
pub mod logging;
pub mod port;
pub mod reader;
pub mod session;

// TUI module
#[cfg(feature = "tui")]
pub mod tui;

// Re-export commonly used types for convenience
pub use console::Console;
pub use error::{AppError, AppResult, HistoryError, OpenError, ParseError, WriteError};
pub use history::{HistoryEntry, HistoryLog};
pub use port::{
    DataBits, MockSerialPort, Parity, PortDescriptor, PortError, SerialConfig, SerialPortAdapter,
    StopBits, SyncSerialPort,
};
pub use reader::{ChunkQueue, ReaderEvent};
pub use session::{SerialSession, SessionOptions};

// Re-export config types
pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};
