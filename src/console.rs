//! Front-end independent core of the tool.
//!
//! `Console` owns the session, the send history, the receive buffer and the
//! display toggles. A front-end feeds it user actions and calls [`Console::pump`]
//! regularly to move received bytes into the receive buffer.

use crate::codec::{self, bytes_to_hex_display, bytes_to_text, render_payload, timestamp_prefix};
use crate::config::{Config, ConfigResult, DisplayConfig};
use crate::error::{AppError, AppResult, ParseError};
use crate::history::HistoryLog;
use crate::port::{list_ports, PortDescriptor, SerialConfig};
use crate::reader::ReaderEvent;
use crate::session::SerialSession;
use chrono::Local;
use std::path::Path;
use tracing::{debug, info};

/// Source of the port list, swappable so tests do not touch the OS.
pub type PortScanner = fn() -> Vec<PortDescriptor>;

/// Complete lines kept in the receive buffer unless configured otherwise.
pub const DEFAULT_RECEIVE_LINES: usize = 10_000;

/// Size cap on the receive buffer, which also bounds hex mode where no
/// line breaks are shown.
pub const MAX_RECEIVE_BYTES: usize = 4 * 1024 * 1024;

#[derive(Debug)]
pub struct Console {
    session: SerialSession,
    history: HistoryLog,
    receive: String,
    // line breaks currently in `receive`
    receive_lines: usize,
    receive_limit: usize,
    display: DisplayConfig,
    framing: SerialConfig,
    ports: Vec<PortDescriptor>,
    scanner: PortScanner,
}

impl Console {
    pub fn new(
        session: SerialSession,
        framing: SerialConfig,
        display: DisplayConfig,
        history_size: usize,
    ) -> Self {
        Self {
            session,
            history: HistoryLog::new(history_size),
            receive: String::new(),
            receive_lines: 0,
            receive_limit: DEFAULT_RECEIVE_LINES,
            display,
            framing,
            ports: Vec::new(),
            scanner: list_ports,
        }
    }

    /// Build from a loaded configuration.
    pub fn from_config(session: SerialSession, config: &Config) -> ConfigResult<Self> {
        Ok(Self::new(
            session,
            config.serial.framing()?,
            config.display.clone(),
            config.history.size,
        )
        .with_receive_limit(config.tui.scrollback_lines))
    }

    /// Keep at most `lines` complete lines (plus the one still arriving) in
    /// the receive buffer; older text is discarded.
    pub fn with_receive_limit(mut self, lines: usize) -> Self {
        self.receive_limit = lines.max(1);
        self.trim_receive();
        self
    }

    pub fn with_port_scanner(mut self, scanner: PortScanner) -> Self {
        self.scanner = scanner;
        self
    }

    // Ports

    /// Rescan devices. An empty list is a valid answer.
    pub fn refresh_ports(&mut self) -> &[PortDescriptor] {
        self.ports = (self.scanner)();
        &self.ports
    }

    pub fn ports(&self) -> &[PortDescriptor] {
        &self.ports
    }

    /// Framing used by the next `open`.
    pub fn framing(&self) -> SerialConfig {
        self.framing
    }

    /// Framing of the open connection, which may differ from [`framing`](Self::framing)
    /// until the port is reopened.
    pub fn session_config(&self) -> Option<SerialConfig> {
        self.session.config()
    }

    pub fn set_framing(&mut self, framing: SerialConfig) {
        self.framing = framing;
    }

    pub fn open(&mut self, device: &str) -> AppResult<()> {
        self.session.open(device, self.framing)?;
        Ok(())
    }

    pub fn close(&mut self) {
        self.session.close();
    }

    pub fn is_open(&mut self) -> bool {
        self.session.is_open()
    }

    pub fn device(&self) -> Option<&str> {
        self.session.device()
    }

    pub fn dropped_chunks(&self) -> u64 {
        self.session.dropped_chunks()
    }

    // Sending

    /// Encode `text` per the current toggles, write it, and record it.
    pub fn send(&mut self, text: &str) -> AppResult<()> {
        if text.is_empty() {
            return Err(AppError::EmptyPayload);
        }

        let bytes = if self.display.hex_send {
            codec::hex_text_to_bytes(text)?
        } else {
            let mut text = text.to_string();
            if self.display.append_newline && !text.ends_with('\n') {
                text.push('\n');
            }
            text.into_bytes()
        };
        if bytes.is_empty() {
            return Err(AppError::EmptyPayload);
        }

        self.session.write(&bytes)?;
        self.record_sent(bytes);
        Ok(())
    }

    /// Write the stored bytes of history entry `index` again.
    pub fn resend(&mut self, index: usize) -> AppResult<()> {
        let raw = self.history.get(index)?.raw().to_vec();
        self.session.write(&raw)?;
        self.record_sent(raw);
        Ok(())
    }

    fn record_sent(&mut self, bytes: Vec<u8>) {
        let shown = if self.display.hex_send {
            bytes_to_hex_display(&bytes)
        } else {
            bytes_to_text(&bytes).trim().to_string()
        };
        let rendered = self.stamp(shown);
        self.history.add(bytes, rendered);
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn delete_history(&mut self, indices: impl IntoIterator<Item = usize>) {
        self.history.remove(indices);
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    // Receiving

    /// Move pending reader events into the receive buffer.
    ///
    /// Returns the failure message if the reader stopped on an error; by
    /// then the session is already closed.
    pub fn pump(&mut self) -> Option<String> {
        let mut failure = None;
        for event in self.session.drain_events() {
            match event {
                ReaderEvent::Chunk(bytes) => self.append_received(&bytes),
                ReaderEvent::Failed(message) => failure = Some(message),
            }
        }
        failure
    }

    fn append_received(&mut self, bytes: &[u8]) {
        let text = self.stamp(render_payload(bytes, self.display.hex_display));
        // keep hex pairs from separate chunks apart
        if self.display.hex_display
            && !self.receive.is_empty()
            && !self.receive.ends_with(char::is_whitespace)
        {
            self.receive.push(' ');
        }
        self.receive_lines += text.matches('\n').count();
        self.receive.push_str(&text);
        self.trim_receive();
    }

    fn trim_receive(&mut self) {
        let mut cut = 0;
        if self.receive_lines > self.receive_limit {
            let excess = self.receive_lines - self.receive_limit;
            if let Some((at, _)) = self.receive.match_indices('\n').nth(excess - 1) {
                cut = at + 1;
            }
        }
        if self.receive.len() - cut > MAX_RECEIVE_BYTES {
            cut = self.receive.len() - MAX_RECEIVE_BYTES;
            while !self.receive.is_char_boundary(cut) {
                cut += 1;
            }
        }
        if cut > 0 {
            self.receive_lines -= self.receive[..cut].matches('\n').count();
            self.receive.drain(..cut);
        }
    }

    pub fn receive_text(&self) -> &str {
        &self.receive
    }

    pub fn clear_receive(&mut self) {
        self.receive.clear();
        self.receive_lines = 0;
    }

    /// Write the receive buffer to `path` as UTF-8, replacing any existing file.
    pub fn save_receive(&self, path: impl AsRef<Path>) -> AppResult<()> {
        let path = path.as_ref();
        std::fs::write(path, self.receive.as_bytes()).map_err(|source| AppError::Save {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), bytes = self.receive.len(), "receive buffer saved");
        Ok(())
    }

    // Display toggles

    pub fn display(&self) -> &DisplayConfig {
        &self.display
    }

    /// Turning hex display on starts a fresh receive buffer.
    pub fn set_hex_display(&mut self, on: bool) {
        if on && !self.display.hex_display {
            self.clear_receive();
        }
        self.display.hex_display = on;
    }

    pub fn set_hex_send(&mut self, on: bool) {
        self.display.hex_send = on;
    }

    pub fn set_timestamps(&mut self, on: bool) {
        self.display.timestamps = on;
    }

    pub fn set_timestamp_format(&mut self, pattern: &str) -> Result<(), ParseError> {
        codec::validate_timestamp_format(pattern)?;
        debug!(pattern, "timestamp format changed");
        self.display.timestamp_format = pattern.to_string();
        Ok(())
    }

    pub fn set_auto_scroll(&mut self, on: bool) {
        self.display.auto_scroll = on;
    }

    pub fn set_append_newline(&mut self, on: bool) {
        self.display.append_newline = on;
    }

    fn stamp(&self, text: String) -> String {
        if !self.display.timestamps {
            return text;
        }
        match timestamp_prefix(&self.display.timestamp_format, &Local::now()) {
            Ok(prefix) => format!("{prefix} {text}"),
            Err(_) => text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{OpenError, WriteError};
    use crate::port::{MockPortOpener, MockSerialPort};
    use crate::session::SessionOptions;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn console() -> (Console, MockSerialPort) {
        let port = MockSerialPort::new("MOCK0");
        let session = SerialSession::new(
            MockPortOpener::new(port.clone()),
            SessionOptions {
                poll_interval: Duration::from_millis(1),
                ..SessionOptions::default()
            },
        );
        let console = Console::new(session, SerialConfig::default(), DisplayConfig::default(), 100)
            .with_port_scanner(|| vec![PortDescriptor::new("MOCK0", "Mock device")]);
        (console, port)
    }

    #[test]
    fn test_refresh_ports_uses_scanner() {
        let (mut console, _) = console();
        assert!(console.ports().is_empty());
        assert_eq!(console.refresh_ports().len(), 1);
        assert_eq!(console.ports()[0].label(), "MOCK0 - Mock device");
    }

    #[test]
    fn test_send_empty() {
        let (mut console, _) = console();
        console.open("MOCK0").unwrap();
        assert!(matches!(console.send(""), Err(AppError::EmptyPayload)));
        console.set_hex_send(true);
        assert!(matches!(console.send("  "), Err(AppError::EmptyPayload)));
        assert!(console.history().is_empty());
    }

    #[test]
    fn test_send_requires_open_port() {
        let (mut console, port) = console();
        assert!(matches!(
            console.send("AT"),
            Err(AppError::Write(WriteError::NotOpen))
        ));
        assert!(port.get_write_log().is_empty());
        assert!(console.history().is_empty());
    }

    #[test]
    fn test_open_without_device() {
        let (mut console, _) = console();
        assert!(matches!(
            console.open(""),
            Err(AppError::Open(OpenError::NoDeviceSelected))
        ));
    }

    #[test]
    fn test_send_text_appends_newline() {
        let (mut console, port) = console();
        console.set_append_newline(true);
        console.open("MOCK0").unwrap();

        console.send("AT").unwrap();
        console.send("AT+GMR\n").unwrap();

        assert_eq!(
            port.get_write_log(),
            vec![b"AT\n".to_vec(), b"AT+GMR\n".to_vec()]
        );
        assert_eq!(console.history().get(0).unwrap().rendered(), "AT+GMR");
        assert_eq!(console.history().get(1).unwrap().rendered(), "AT");
        assert_eq!(console.history().get(1).unwrap().raw(), b"AT\n");
    }

    #[test]
    fn test_send_hex() {
        let (mut console, port) = console();
        console.set_hex_send(true);
        console.open("MOCK0").unwrap();

        console.send("de ad\nbe ef").unwrap();
        assert_eq!(port.get_write_log(), vec![vec![0xDE, 0xAD, 0xBE, 0xEF]]);
        assert_eq!(console.history().get(0).unwrap().rendered(), "DE AD BE EF");

        assert!(matches!(
            console.send("zz"),
            Err(AppError::Parse(ParseError::InvalidCharacter('z')))
        ));
        assert_eq!(console.history().len(), 1);
    }

    #[test]
    fn test_resend_and_delete() {
        let (mut console, port) = console();
        console.open("MOCK0").unwrap();
        console.send("one").unwrap();
        console.send("two").unwrap();

        console.resend(1).unwrap();
        assert_eq!(port.get_write_log().last().unwrap(), b"one");
        assert_eq!(console.history().get(0).unwrap().rendered(), "one");
        assert_eq!(console.history().len(), 3);

        assert!(matches!(console.resend(9), Err(AppError::History(_))));

        console.delete_history([0, 2]);
        assert_eq!(console.history().len(), 1);
        assert_eq!(console.history().get(0).unwrap().rendered(), "two");

        console.clear_history();
        assert!(console.history().is_empty());
    }

    #[test]
    fn test_timestamped_history() {
        let (mut console, _) = console();
        console.set_timestamps(true);
        console.set_timestamp_format("<%Y>").unwrap();
        console.open("MOCK0").unwrap();
        console.send("ping").unwrap();

        let rendered = console.history().get(0).unwrap().rendered().to_string();
        assert!(rendered.starts_with('<'));
        assert!(rendered.ends_with("> ping"));
    }

    #[test]
    fn test_bad_timestamp_format_is_kept_out() {
        let (mut console, _) = console();
        assert!(console.set_timestamp_format("%Q").is_err());
        assert_eq!(console.display().timestamp_format, "[%H:%M:%S]");
    }

    #[test]
    fn test_hex_display_toggle_clears_receive() {
        let (mut console, _) = console();
        console.append_received(b"hello");
        assert_eq!(console.receive_text(), "hello");

        console.set_hex_display(true);
        assert_eq!(console.receive_text(), "");

        console.append_received(b"AT");
        console.append_received(b"\n");
        assert_eq!(console.receive_text(), "41 54 0A");

        // already on: nothing is cleared
        console.set_hex_display(true);
        assert_eq!(console.receive_text(), "41 54 0A");

        console.set_hex_display(false);
        console.append_received(b"ok");
        assert_eq!(console.receive_text(), "41 54 0Aok");
    }

    #[test]
    fn test_receive_keeps_last_lines() {
        let (console, _) = console();
        let mut console = console.with_receive_limit(2);
        console.append_received(b"a\nb\nc\nd");
        assert_eq!(console.receive_text(), "b\nc\nd");

        console.append_received(b"\ne");
        assert_eq!(console.receive_text(), "c\nd\ne");

        console.clear_receive();
        console.append_received(b"x\ny\n");
        assert_eq!(console.receive_text(), "x\ny\n");
    }

    #[test]
    fn test_receive_size_capped_in_hex_mode() {
        let (mut console, _) = console();
        console.set_hex_display(true);
        console.append_received(&vec![0x41; 2 * 1024 * 1024]);

        let text = console.receive_text();
        assert!(text.len() <= MAX_RECEIVE_BYTES);
        assert!(text.ends_with("41 41"));
    }

    #[test]
    fn test_save_receive() {
        let (mut console, _) = console();
        console.append_received("héllo\n".as_bytes());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rx.txt");
        std::fs::write(&path, "old contents that are longer").unwrap();
        console.save_receive(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "héllo\n");

        let bad = dir.path().join("no-such-dir").join("rx.txt");
        assert!(matches!(console.save_receive(&bad), Err(AppError::Save { .. })));

        console.clear_receive();
        assert_eq!(console.receive_text(), "");
    }
}
