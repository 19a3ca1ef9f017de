//! Terminal user interface for serial_tool.
//!
//! A ratatui front-end over [`crate::console::Console`]: port list, history
//! list, receive pane, send box, settings and help overlays, and `:` commands.
//!
//! # Example
//!
//! ```rust,no_run
//! use serial_tool::config::Config;
//! use serial_tool::console::Console;
//! use serial_tool::session::SerialSession;
//! use serial_tool::tui::App;
//!
//! let config = Config::default();
//! let session = SerialSession::system(config.serial.session_options());
//! let console = Console::from_config(session, &config)?;
//! App::new(console, &config).run()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod app;
mod command;
mod event;
mod theme;
mod ui;

pub use app::{App, FocusArea, Mode, Notice, SettingsRow};
pub use command::{Command, CommandError};
pub use event::{Event, EventHandler};
pub use theme::{Theme, THEMES};
pub use ui::render;
