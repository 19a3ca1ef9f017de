//! TUI Application state and main loop.

use crate::codec;
use crate::config::{Config, TIMESTAMP_FORMATS};
use crate::console::Console;
use crate::port::{DataBits, Parity, SerialConfig, StopBits, BAUD_RATES};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::collections::BTreeSet;
use std::fmt;
use std::io::{self, Stdout};
use std::time::Duration;
use tracing::{debug, warn};

use super::command::Command;
use super::event::{Event, EventHandler};
use super::theme::Theme;
use super::ui;

/// Application mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// Navigation between panes
    #[default]
    Normal,
    /// Typing into the send box
    Insert,
    /// Vim-like `:` commands
    Command,
    /// Help overlay
    Help,
    /// Port settings overlay
    Settings,
    /// Blocking message popup
    Notice,
}

/// Pane that receives navigation keys in normal mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FocusArea {
    Ports,
    Receive,
    History,
    #[default]
    Input,
}

impl FocusArea {
    fn next(self) -> Self {
        match self {
            Self::Ports => Self::Receive,
            Self::Receive => Self::History,
            Self::History => Self::Input,
            Self::Input => Self::Ports,
        }
    }
}

/// Message shown in a popup until dismissed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub message: String,
}

/// Rows of the settings overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsRow {
    Baud,
    DataBits,
    Parity,
    StopBits,
    HexDisplay,
    HexSend,
    Timestamps,
    TimestampFormat,
    AutoScroll,
    AppendNewline,
}

impl SettingsRow {
    pub const ALL: [SettingsRow; 10] = [
        Self::Baud,
        Self::DataBits,
        Self::Parity,
        Self::StopBits,
        Self::HexDisplay,
        Self::HexSend,
        Self::Timestamps,
        Self::TimestampFormat,
        Self::AutoScroll,
        Self::AppendNewline,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Baud => "Baud rate",
            Self::DataBits => "Data bits",
            Self::Parity => "Parity",
            Self::StopBits => "Stop bits",
            Self::HexDisplay => "Hex display",
            Self::HexSend => "Hex send",
            Self::Timestamps => "Timestamps",
            Self::TimestampFormat => "Timestamp format",
            Self::AutoScroll => "Auto scroll",
            Self::AppendNewline => "Append newline",
        }
    }
}

/// Main TUI application.
pub struct App {
    /// Serial core
    pub console: Console,
    /// Current mode
    pub mode: Mode,
    /// Current theme
    pub theme: Theme,
    /// Focus area
    pub focus: FocusArea,
    /// Cleared by `:quit`
    pub running: bool,

    /// Send box contents
    pub input: String,
    /// Cursor position in `input`, in characters
    pub cursor_pos: usize,
    /// `:` line being typed
    pub command_line: String,

    /// Selected row in the port list
    pub selected_port: usize,
    /// Selected row in the history list
    pub selected_history: usize,
    /// History rows marked for deletion
    pub marked_history: BTreeSet<usize>,
    /// Selected row in the settings overlay
    pub settings_row: usize,

    /// Popup shown in `Mode::Notice`
    pub notice: Option<Notice>,
    /// Status message to display
    pub status_message: Option<String>,
    /// Receive pane offset from the top when auto scroll is off
    pub scroll_offset: u16,
    /// Receive lines kept on screen
    pub scrollback_lines: usize,

    tick_rate: Duration,
}

impl App {
    /// Create a new application around `console`.
    pub fn new(console: Console, config: &Config) -> Self {
        Self {
            console,
            mode: Mode::Normal,
            theme: Theme::named(&config.tui.theme),
            focus: FocusArea::Input,
            running: true,
            input: String::new(),
            cursor_pos: 0,
            command_line: String::new(),
            selected_port: 0,
            selected_history: 0,
            marked_history: BTreeSet::new(),
            settings_row: 0,
            notice: None,
            status_message: None,
            scroll_offset: 0,
            scrollback_lines: config.tui.scrollback_lines,
            tick_rate: config.tui.tick_rate(),
        }
    }

    /// Run the application main loop until quit.
    pub fn run(&mut self) -> io::Result<()> {
        let mut terminal = ui::setup_terminal()?;
        let events = EventHandler::new(self.tick_rate);

        self.refresh_ports();
        let result = self.event_loop(&mut terminal, &events);

        self.console.close();
        ui::restore_terminal(terminal)?;
        result
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
        events: &EventHandler,
    ) -> io::Result<()> {
        while self.running {
            self.pump();
            terminal.draw(|frame| ui::render(self, frame))?;

            match events.next() {
                Ok(Event::Key(key)) => self.handle_key(key),
                Ok(Event::Tick) | Ok(Event::Resize(_, _)) => {}
                Ok(Event::Error(err)) => self.show_notice("Terminal error", err),
                Err(_) => self.running = false,
            }
        }
        Ok(())
    }

    /// Pull received data into the console; a reader failure becomes a popup.
    pub fn pump(&mut self) {
        if let Some(failure) = self.console.pump() {
            self.show_notice("Serial port closed", format!("Read failed: {failure}"));
        }
    }

    /// Show a blocking popup.
    pub fn show_notice(&mut self, title: impl Into<String>, message: impl fmt::Display) {
        let notice = Notice {
            title: title.into(),
            message: message.to_string(),
        };
        debug!(title = %notice.title, message = %notice.message, "notice");
        self.notice = Some(notice);
        self.mode = Mode::Notice;
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    /// Handle keyboard input.
    pub fn handle_key(&mut self, key: KeyEvent) {
        match self.mode {
            Mode::Normal => self.handle_normal_key(key),
            Mode::Insert => self.handle_insert_key(key),
            Mode::Command => self.handle_command_key(key),
            Mode::Help => self.handle_help_key(key),
            Mode::Settings => self.handle_settings_key(key),
            Mode::Notice => self.handle_notice_key(key),
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.running = false,
            KeyCode::Char('i') => self.mode = Mode::Insert,
            KeyCode::Char(':') => {
                self.mode = Mode::Command;
                self.command_line.clear();
            }
            KeyCode::Char('l') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.console.clear_receive();
                self.scroll_offset = 0;
            }
            KeyCode::F(1) | KeyCode::Char('?') => self.mode = Mode::Help,
            KeyCode::Char('s') => self.mode = Mode::Settings,
            KeyCode::Char('o') => self.toggle_open(),
            KeyCode::Char('r') => self.refresh_ports(),
            KeyCode::Char('x') => self.toggle_hex_display(),
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::Up | KeyCode::Char('k') => self.move_up(),
            KeyCode::Down | KeyCode::Char('j') => self.move_down(),
            KeyCode::PageUp => self.scroll_offset = self.scroll_offset.saturating_sub(10),
            KeyCode::PageDown => self.scroll_offset = self.scroll_offset.saturating_add(10),
            KeyCode::Char(' ') if self.focus == FocusArea::History => self.toggle_mark(),
            KeyCode::Char('d') if self.focus == FocusArea::History => self.delete_history(),
            KeyCode::Char('D') if self.focus == FocusArea::History => self.clear_history(),
            KeyCode::Enter => match self.focus {
                FocusArea::Ports => self.toggle_open(),
                FocusArea::History => self.resend_selected(),
                FocusArea::Receive | FocusArea::Input => self.mode = Mode::Insert,
            },
            _ => {}
        }
    }

    fn handle_insert_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.mode = Mode::Normal,
            KeyCode::Enter => self.send_input(),
            KeyCode::Backspace => {
                if self.cursor_pos > 0 {
                    self.cursor_pos -= 1;
                    let at = self.byte_index(self.cursor_pos);
                    self.input.remove(at);
                }
            }
            KeyCode::Delete => {
                if self.cursor_pos < self.input.chars().count() {
                    let at = self.byte_index(self.cursor_pos);
                    self.input.remove(at);
                }
            }
            KeyCode::Left => self.cursor_pos = self.cursor_pos.saturating_sub(1),
            KeyCode::Right => {
                if self.cursor_pos < self.input.chars().count() {
                    self.cursor_pos += 1;
                }
            }
            KeyCode::Home => self.cursor_pos = 0,
            KeyCode::End => self.cursor_pos = self.input.chars().count(),
            KeyCode::Char(c) => {
                let at = self.byte_index(self.cursor_pos);
                self.input.insert(at, c);
                self.cursor_pos += 1;
            }
            _ => {}
        }
    }

    fn handle_command_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.mode = Mode::Normal;
                self.command_line.clear();
            }
            KeyCode::Enter => {
                let line = std::mem::take(&mut self.command_line);
                self.mode = Mode::Normal;
                self.execute_command_line(&line);
            }
            KeyCode::Backspace => {
                if self.command_line.pop().is_none() {
                    self.mode = Mode::Normal;
                }
            }
            KeyCode::Char(c) => self.command_line.push(c),
            _ => {}
        }
    }

    fn handle_help_key(&mut self, key: KeyEvent) {
        if matches!(
            key.code,
            KeyCode::Esc | KeyCode::F(1) | KeyCode::Char('q') | KeyCode::Char('?')
        ) {
            self.mode = Mode::Normal;
        }
    }

    fn handle_settings_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('s') => self.mode = Mode::Normal,
            KeyCode::Up | KeyCode::Char('k') => {
                self.settings_row = self.settings_row.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.settings_row + 1 < SettingsRow::ALL.len() {
                    self.settings_row += 1;
                }
            }
            KeyCode::Left | KeyCode::Char('h') => self.cycle_setting(false),
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Enter | KeyCode::Char(' ') => {
                self.cycle_setting(true)
            }
            _ => {}
        }
    }

    fn handle_notice_key(&mut self, key: KeyEvent) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
            self.notice = None;
            self.mode = Mode::Normal;
        }
    }

    /// Char index → byte index in `input`.
    fn byte_index(&self, char_pos: usize) -> usize {
        self.input
            .char_indices()
            .nth(char_pos)
            .map(|(i, _)| i)
            .unwrap_or(self.input.len())
    }

    fn move_up(&mut self) {
        match self.focus {
            FocusArea::Ports => self.selected_port = self.selected_port.saturating_sub(1),
            FocusArea::History => self.selected_history = self.selected_history.saturating_sub(1),
            FocusArea::Receive => self.scroll_offset = self.scroll_offset.saturating_sub(1),
            FocusArea::Input => {}
        }
    }

    fn move_down(&mut self) {
        match self.focus {
            FocusArea::Ports => {
                if self.selected_port + 1 < self.console.ports().len() {
                    self.selected_port += 1;
                }
            }
            FocusArea::History => {
                if self.selected_history + 1 < self.console.history().len() {
                    self.selected_history += 1;
                }
            }
            FocusArea::Receive => self.scroll_offset = self.scroll_offset.saturating_add(1),
            FocusArea::Input => {}
        }
    }

    // Port actions

    /// Refresh the list of available ports.
    pub fn refresh_ports(&mut self) {
        let count = self.console.refresh_ports().len();
        if self.selected_port >= count {
            self.selected_port = count.saturating_sub(1);
        }
        if count == 0 {
            self.set_status("No serial ports found");
        } else {
            self.set_status(format!("Found {count} serial port(s)"));
        }
    }

    fn selected_device(&self) -> Option<String> {
        self.console
            .ports()
            .get(self.selected_port)
            .map(|p| p.device.clone())
    }

    /// Open the selected port, or close the open one.
    pub fn toggle_open(&mut self) {
        if self.console.is_open() {
            self.close_port();
        } else {
            let device = self.selected_device().unwrap_or_default();
            self.open_port(&device);
        }
    }

    pub fn open_port(&mut self, device: &str) {
        match self.console.open(device) {
            Ok(()) => {
                let framing = self.console.framing();
                self.set_status(format!("Opened {device} at {framing}"));
            }
            Err(e) => {
                warn!(device, error = %e, "open failed");
                self.show_notice("Cannot open port", e);
            }
        }
    }

    pub fn close_port(&mut self) {
        self.console.close();
        self.set_status("Port closed");
    }

    // Send / history actions

    /// Send the current input.
    pub fn send_input(&mut self) {
        let text = self.input.clone();
        match self.console.send(&text) {
            Ok(()) => {
                self.selected_history = 0;
                self.marked_history.clear();
                self.set_status("Sent");
            }
            Err(e) => self.show_notice("Send failed", e),
        }
    }

    pub fn resend_selected(&mut self) {
        if self.console.history().is_empty() {
            self.show_notice("Resend", "Select a history entry to resend");
            return;
        }
        match self.console.resend(self.selected_history) {
            Ok(()) => {
                self.selected_history = 0;
                self.marked_history.clear();
                self.set_status("Resent");
            }
            Err(e) => self.show_notice("Resend failed", e),
        }
    }

    fn toggle_mark(&mut self) {
        if self.console.history().is_empty() {
            return;
        }
        if !self.marked_history.remove(&self.selected_history) {
            self.marked_history.insert(self.selected_history);
        }
    }

    /// Delete marked entries, or the selected one when nothing is marked.
    pub fn delete_history(&mut self) {
        if self.console.history().is_empty() {
            self.show_notice("Delete", "Select history entries to delete");
            return;
        }
        let targets: Vec<usize> = if self.marked_history.is_empty() {
            vec![self.selected_history]
        } else {
            std::mem::take(&mut self.marked_history).into_iter().collect()
        };
        self.console.delete_history(targets);
        let len = self.console.history().len();
        if self.selected_history >= len {
            self.selected_history = len.saturating_sub(1);
        }
    }

    pub fn clear_history(&mut self) {
        self.console.clear_history();
        self.marked_history.clear();
        self.selected_history = 0;
    }

    // Display actions

    pub fn toggle_hex_display(&mut self) {
        let on = !self.console.display().hex_display;
        self.console.set_hex_display(on);
        if on {
            self.scroll_offset = 0;
        }
    }

    /// Replace the send box with its pretty-printed JSON.
    pub fn format_input_json(&mut self) {
        if self.input.is_empty() {
            return;
        }
        match codec::format_json(&self.input) {
            Ok(formatted) => {
                self.input = formatted;
                self.cursor_pos = self.input.chars().count();
            }
            Err(e) => self.show_notice("Format JSON", e),
        }
    }

    fn save_receive(&mut self, path: &std::path::Path) {
        match self.console.save_receive(path) {
            Ok(()) => self.show_notice("Saved", format!("Receive data saved to {}", path.display())),
            Err(e) => self.show_notice("Save failed", e),
        }
    }

    fn update_framing(&mut self, framing: SerialConfig) {
        self.console.set_framing(framing);
        if self.console.is_open() {
            self.set_status(format!("{framing} applies the next time a port is opened"));
        } else {
            self.set_status(format!("Port settings: {framing}"));
        }
    }

    fn cycle_setting(&mut self, forward: bool) {
        let framing = self.console.framing();
        let display = self.console.display().clone();
        match SettingsRow::ALL[self.settings_row.min(SettingsRow::ALL.len() - 1)] {
            SettingsRow::Baud => {
                let next = cycle(BAUD_RATES, &framing.baud_rate(), forward);
                match SerialConfig::new(next) {
                    Ok(base) => self.update_framing(
                        base.with_data_bits(framing.data_bits())
                            .with_parity(framing.parity())
                            .with_stop_bits(framing.stop_bits()),
                    ),
                    Err(e) => self.show_notice("Baud rate", e),
                }
            }
            SettingsRow::DataBits => {
                let next = cycle(&DataBits::ALL, &framing.data_bits(), forward);
                self.update_framing(framing.with_data_bits(next));
            }
            SettingsRow::Parity => {
                let next = cycle(&Parity::ALL, &framing.parity(), forward);
                self.update_framing(framing.with_parity(next));
            }
            SettingsRow::StopBits => {
                let next = cycle(&StopBits::ALL, &framing.stop_bits(), forward);
                self.update_framing(framing.with_stop_bits(next));
            }
            SettingsRow::HexDisplay => self.toggle_hex_display(),
            SettingsRow::HexSend => self.console.set_hex_send(!display.hex_send),
            SettingsRow::Timestamps => self.console.set_timestamps(!display.timestamps),
            SettingsRow::TimestampFormat => {
                let current = display.timestamp_format.as_str();
                let next = cycle(&TIMESTAMP_FORMATS, &current, forward);
                if let Err(e) = self.console.set_timestamp_format(next) {
                    self.show_notice("Timestamp format", e);
                }
            }
            SettingsRow::AutoScroll => self.console.set_auto_scroll(!display.auto_scroll),
            SettingsRow::AppendNewline => self.console.set_append_newline(!display.append_newline),
        }
    }

    /// Parse and run a `:` command, reporting failures in a popup.
    pub fn execute_command_line(&mut self, line: &str) {
        match line.parse::<Command>() {
            Ok(command) => self.execute(command),
            Err(e) => self.show_notice("Command", e),
        }
    }

    pub fn execute(&mut self, command: Command) {
        let display = self.console.display().clone();
        let framing = self.console.framing();
        match command {
            Command::Open(device) => {
                let device = device.or_else(|| self.selected_device()).unwrap_or_default();
                self.open_port(&device);
            }
            Command::Close => self.close_port(),
            Command::Refresh => self.refresh_ports(),
            Command::ToggleHexDisplay => self.toggle_hex_display(),
            Command::ToggleHexSend => self.console.set_hex_send(!display.hex_send),
            Command::ToggleTimestamps => self.console.set_timestamps(!display.timestamps),
            Command::TimestampFormat(pattern) => {
                if let Err(e) = self.console.set_timestamp_format(&pattern) {
                    self.show_notice("Timestamp format", e);
                }
            }
            Command::ToggleNewline => self.console.set_append_newline(!display.append_newline),
            Command::ToggleAutoScroll => self.console.set_auto_scroll(!display.auto_scroll),
            Command::Baud(baud) => match SerialConfig::new(baud) {
                Ok(base) => self.update_framing(
                    base.with_data_bits(framing.data_bits())
                        .with_parity(framing.parity())
                        .with_stop_bits(framing.stop_bits()),
                ),
                Err(e) => self.show_notice("Baud rate", e),
            },
            Command::DataBits(bits) => self.update_framing(framing.with_data_bits(bits)),
            Command::Parity(parity) => self.update_framing(framing.with_parity(parity)),
            Command::StopBits(bits) => self.update_framing(framing.with_stop_bits(bits)),
            Command::Save(path) => self.save_receive(&path),
            Command::ClearReceive => {
                self.console.clear_receive();
                self.scroll_offset = 0;
            }
            Command::ClearHistory => self.clear_history(),
            Command::FormatJson => self.format_input_json(),
            Command::Settings => self.mode = Mode::Settings,
            Command::Help => self.mode = Mode::Help,
            Command::Quit => self.running = false,
        }
    }

    /// Header text for the open connection. Settings changed while open are
    /// shown as pending.
    pub fn connection_summary(&self) -> String {
        let pending = self.console.framing();
        match (self.console.device(), self.console.session_config()) {
            (Some(device), Some(live)) if live == pending => format!("{device} @ {live}"),
            (Some(device), Some(live)) => {
                format!("{device} @ {live} (next open: {pending})")
            }
            _ => format!("Closed ({pending})"),
        }
    }
}

/// Step to the next (or previous) value in `values`, wrapping around.
fn cycle<T: PartialEq + Copy>(values: &[T], current: &T, forward: bool) -> T {
    let len = values.len();
    let pos = values.iter().position(|v| v == current).unwrap_or(0);
    let next = if forward {
        (pos + 1) % len
    } else {
        (pos + len - 1) % len
    };
    values[next]
}
