//! Shared test utilities for serial_tool integration tests.
//!
//! This module provides:
//! - Mock-backed sessions and consoles (plain and loopback wiring)
//! - A polling helper for state produced by the reader thread

#![allow(dead_code)]

use serial_tool::config::DisplayConfig;
use serial_tool::console::Console;
use serial_tool::port::{MockPortOpener, MockSerialPort, PortDescriptor, SerialConfig};
use serial_tool::session::{SerialSession, SessionOptions};
use std::thread;
use std::time::{Duration, Instant};

/// Device name every mock harness uses.
pub const MOCK_DEVICE: &str = "MOCK0";

/// How long helpers wait for the reader before giving up.
pub const WAIT_TIMEOUT: Duration = Duration::from_secs(2);

/// Session options with a short poll so tests run quickly.
pub fn fast_options() -> SessionOptions {
    SessionOptions {
        poll_interval: Duration::from_millis(1),
        ..SessionOptions::default()
    }
}

/// A closed session over `port`, plus the opener for inspecting open calls.
pub fn mock_session(port: &MockSerialPort) -> (SerialSession, MockPortOpener) {
    let opener = MockPortOpener::new(port.clone());
    (SerialSession::new(opener.clone(), fast_options()), opener)
}

fn mock_ports() -> Vec<PortDescriptor> {
    vec![PortDescriptor::new(MOCK_DEVICE, "Mock loopback")]
}

/// Console wired to a loopback mock: every write comes back as received data.
pub struct LoopbackHarness {
    pub console: Console,
    pub port: MockSerialPort,
    pub opener: MockPortOpener,
}

impl LoopbackHarness {
    pub fn new() -> Self {
        Self::with_display(DisplayConfig::default())
    }

    pub fn with_display(display: DisplayConfig) -> Self {
        let port = MockSerialPort::loopback(MOCK_DEVICE);
        let (session, opener) = mock_session(&port);
        let console = Console::new(session, SerialConfig::default(), display, 100)
            .with_port_scanner(mock_ports);
        Self {
            console,
            port,
            opener,
        }
    }

    /// Pump the console until the receive buffer satisfies `done`.
    pub fn pump_until(&mut self, done: impl Fn(&str) -> bool) -> bool {
        let console = &mut self.console;
        wait_until(|| {
            console.pump();
            done(console.receive_text())
        })
    }
}

/// Poll `condition` every millisecond until it holds or [`WAIT_TIMEOUT`] passes.
pub fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + WAIT_TIMEOUT;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(1));
    }
}
