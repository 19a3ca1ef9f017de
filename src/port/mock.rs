//! Mock serial port implementation for testing.
//!
//! Provides a `MockSerialPort` that simulates serial port behavior without
//! requiring actual hardware, and a `MockPortOpener` that hands it to a
//! session. Clones share state, so a test can keep one clone to feed data
//! and inspect writes while the session owns another.

use super::error::PortError;
use super::traits::{PortOpener, SerialConfig, SerialPortAdapter};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

/// Inner state of the mock port, protected by a mutex for interior mutability.
#[derive(Debug, Default)]
struct MockPortState {
    /// Queue of bytes to be returned by read operations.
    read_queue: VecDeque<u8>,
    /// Log of all bytes written to the port.
    write_log: Vec<Vec<u8>>,
    /// Echo every write back into the read queue.
    loopback: bool,
    /// Simulate an unplugged device: every operation fails.
    disconnected: bool,
}

/// Mock serial port implementation for testing.
///
/// This implementation allows you to:
/// - Enqueue data to be returned by read operations
/// - Inspect what data was written
/// - Echo writes back (loopback wiring)
/// - Simulate a device that disappears mid-session
///
/// # Example
/// ```
/// use serial_tool::port::{MockSerialPort, SerialPortAdapter};
///
/// let mut port = MockSerialPort::new("MOCK0");
///
/// // Enqueue data to be read
/// port.enqueue_read(b"Hello, World!");
/// assert_eq!(port.bytes_to_read().unwrap(), 13);
///
/// let mut buffer = [0u8; 13];
/// let n = port.read_bytes(&mut buffer).unwrap();
/// assert_eq!(&buffer[..n], b"Hello, World!");
///
/// port.write_bytes(b"Response").unwrap();
/// assert_eq!(port.get_write_log(), vec![b"Response".to_vec()]);
/// ```
#[derive(Clone)]
pub struct MockSerialPort {
    /// The port name/identifier.
    name: String,
    /// The internal state, shared between clones.
    state: Arc<Mutex<MockPortState>>,
}

impl MockSerialPort {
    /// Create a new mock serial port with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(MockPortState::default())),
        }
    }

    /// Create a mock whose writes are echoed back as readable bytes, like a
    /// port with TX wired to RX.
    pub fn loopback(name: impl Into<String>) -> Self {
        let port = Self::new(name);
        port.state.lock().loopback = true;
        port
    }

    /// Enqueue bytes to be returned by subsequent read operations.
    pub fn enqueue_read(&self, data: &[u8]) {
        self.state.lock().read_queue.extend(data);
    }

    /// Get a copy of all data written to the port.
    pub fn get_write_log(&self) -> Vec<Vec<u8>> {
        self.state.lock().write_log.clone()
    }

    /// Clear the write log.
    pub fn clear_write_log(&self) {
        self.state.lock().write_log.clear();
    }

    /// Make every later operation fail as if the cable was pulled.
    pub fn set_disconnected(&self, disconnected: bool) {
        self.state.lock().disconnected = disconnected;
    }

    /// Get the number of bytes available to read.
    pub fn available_bytes(&self) -> usize {
        self.state.lock().read_queue.len()
    }

    fn unplugged() -> PortError {
        PortError::Io(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "device disconnected",
        ))
    }
}

impl SerialPortAdapter for MockSerialPort {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        let mut state = self.state.lock();
        if state.disconnected {
            return Err(Self::unplugged());
        }

        state.write_log.push(data.to_vec());
        if state.loopback {
            state.read_queue.extend(data);
        }

        Ok(data.len())
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        let mut state = self.state.lock();
        if state.disconnected {
            return Err(Self::unplugged());
        }

        let mut bytes_read = 0;
        for byte in buffer.iter_mut() {
            match state.read_queue.pop_front() {
                Some(queued) => {
                    *byte = queued;
                    bytes_read += 1;
                }
                None => break,
            }
        }

        if bytes_read == 0 {
            // Same shape as a real port whose read timed out with nothing pending
            Err(PortError::Io(std::io::Error::new(
                std::io::ErrorKind::WouldBlock,
                "No data available",
            )))
        } else {
            Ok(bytes_read)
        }
    }

    fn bytes_to_read(&self) -> Result<usize, PortError> {
        let state = self.state.lock();
        if state.disconnected {
            return Err(Self::unplugged());
        }
        Ok(state.read_queue.len())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for MockSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSerialPort")
            .field("name", &self.name)
            .field("available_bytes", &self.available_bytes())
            .finish()
    }
}

#[derive(Debug, Default)]
struct OpenerState {
    /// Error message returned by the next `open` calls, if set.
    failure: Option<String>,
    /// Every successful open: device and framing.
    opened: Vec<(String, SerialConfig)>,
}

/// `PortOpener` that hands out clones of one `MockSerialPort`.
///
/// Framing is checked the same way the real backend checks it, so
/// unsupported parity/stop bits fail here too.
#[derive(Debug, Clone)]
pub struct MockPortOpener {
    port: MockSerialPort,
    state: Arc<Mutex<OpenerState>>,
}

impl MockPortOpener {
    pub fn new(port: MockSerialPort) -> Self {
        Self {
            port,
            state: Arc::new(Mutex::new(OpenerState::default())),
        }
    }

    /// Make subsequent opens fail with a device error carrying `message`.
    pub fn fail_with(&self, message: impl Into<String>) {
        self.state.lock().failure = Some(message.into());
    }

    /// Allow opens to succeed again.
    pub fn clear_failure(&self) {
        self.state.lock().failure = None;
    }

    /// Devices and framing of every successful open, oldest first.
    pub fn opened(&self) -> Vec<(String, SerialConfig)> {
        self.state.lock().opened.clone()
    }

    /// A clone of the port this opener hands out.
    pub fn port(&self) -> MockSerialPort {
        self.port.clone()
    }
}

impl PortOpener for MockPortOpener {
    fn open(
        &self,
        device: &str,
        config: &SerialConfig,
        _timeout: Duration,
    ) -> Result<Box<dyn SerialPortAdapter>, PortError> {
        let _: serialport::Parity = config.parity().try_into()?;
        let _: serialport::StopBits = config.stop_bits().try_into()?;

        let mut state = self.state.lock();
        if let Some(message) = &state.failure {
            return Err(PortError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                message.clone(),
            )));
        }
        state.opened.push((device.to_string(), *config));
        Ok(Box::new(self.port.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::{Parity, StopBits};

    #[test]
    fn test_enqueue_and_read() {
        let mut port = MockSerialPort::new("MOCK0");
        port.enqueue_read(b"Hello");

        let mut buffer = [0u8; 10];
        let n = port.read_bytes(&mut buffer).unwrap();
        assert_eq!(n, 5);
        assert_eq!(&buffer[..n], b"Hello");
    }

    #[test]
    fn test_write_logging() {
        let mut port = MockSerialPort::new("MOCK0");
        port.write_bytes(b"Test1").unwrap();
        port.write_bytes(b"Test2").unwrap();

        let log = port.get_write_log();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0], b"Test1");
        assert_eq!(log[1], b"Test2");
    }

    #[test]
    fn test_loopback_echoes_writes() {
        let mut port = MockSerialPort::loopback("LOOP0");
        port.write_all_bytes(b"AT\n").unwrap();
        assert_eq!(port.bytes_to_read().unwrap(), 3);

        let mut buffer = [0u8; 8];
        let n = port.read_bytes(&mut buffer).unwrap();
        assert_eq!(&buffer[..n], b"AT\n");
    }

    #[test]
    fn test_clones_share_state() {
        let port = MockSerialPort::new("MOCK0");
        let mut owned = port.clone();
        port.enqueue_read(b"xy");
        assert_eq!(owned.bytes_to_read().unwrap(), 2);
        owned.write_bytes(b"z").unwrap();
        assert_eq!(port.get_write_log(), vec![b"z".to_vec()]);
    }

    #[test]
    fn test_disconnected_port_fails() {
        let mut port = MockSerialPort::new("MOCK0");
        port.set_disconnected(true);
        assert!(port.bytes_to_read().is_err());
        assert!(port.write_bytes(b"x").is_err());
        port.set_disconnected(false);
        assert_eq!(port.bytes_to_read().unwrap(), 0);
    }

    #[test]
    fn test_empty_read() {
        let mut port = MockSerialPort::new("MOCK0");
        let mut buffer = [0u8; 10];

        let result = port.read_bytes(&mut buffer);
        if let Err(PortError::Io(e)) = result {
            assert_eq!(e.kind(), std::io::ErrorKind::WouldBlock);
        } else {
            panic!("Expected WouldBlock error");
        }
    }

    #[test]
    fn test_partial_read() {
        let mut port = MockSerialPort::new("MOCK0");
        port.enqueue_read(b"Hello, World!");

        let mut buffer = [0u8; 5];
        let n = port.read_bytes(&mut buffer).unwrap();
        assert_eq!(&buffer[..n], b"Hello");
        assert_eq!(port.available_bytes(), 8);
    }

    #[test]
    fn test_opener_records_and_fails() {
        let opener = MockPortOpener::new(MockSerialPort::new("MOCK0"));
        let config = SerialConfig::default();
        opener
            .open("MOCK0", &config, Duration::from_secs(1))
            .unwrap();
        assert_eq!(opener.opened(), vec![("MOCK0".to_string(), config)]);

        opener.fail_with("Access is denied");
        let err = opener
            .open("MOCK0", &config, Duration::from_secs(1))
            .unwrap_err();
        assert!(err.to_string().contains("Access is denied"));
        assert_eq!(opener.opened().len(), 1);
    }

    #[test]
    fn test_opener_mirrors_backend_framing() {
        let opener = MockPortOpener::new(MockSerialPort::new("MOCK0"));
        let mark = SerialConfig::default().with_parity(Parity::Mark);
        let half = SerialConfig::default().with_stop_bits(StopBits::OnePointFive);
        assert!(matches!(
            opener.open("MOCK0", &mark, Duration::from_secs(1)),
            Err(PortError::Unsupported(_))
        ));
        assert!(matches!(
            opener.open("MOCK0", &half, Duration::from_secs(1)),
            Err(PortError::Unsupported(_))
        ));
    }
}
