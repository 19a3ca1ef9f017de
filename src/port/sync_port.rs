//! Synchronous serial port implementation.
//!
//! Wraps the `serialport` crate's `SerialPort` trait with our own `SerialPortAdapter`
//! trait for dependency injection and testing.

use super::error::PortError;
use super::traits::{PortOpener, SerialConfig, SerialPortAdapter};
use std::io::{Read, Write};
use std::time::Duration;

/// Synchronous serial port implementation wrapping `serialport::SerialPort`.
pub struct SyncSerialPort {
    /// The underlying serial port implementation.
    port: Box<dyn serialport::SerialPort>,
    /// The port name/path for identification.
    name: String,
}

impl SyncSerialPort {
    /// Open a serial port with the given framing and read timeout.
    ///
    /// Framing values the backend cannot represent fail with
    /// [`PortError::Unsupported`] before the device is touched.
    ///
    /// # Example
    /// ```no_run
    /// use serial_tool::port::{SerialConfig, SyncSerialPort};
    /// use std::time::Duration;
    ///
    /// let config = SerialConfig::new(115200)?;
    /// let port = SyncSerialPort::open("/dev/ttyUSB0", &config, Duration::from_secs(1))?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(
        port_name: &str,
        config: &SerialConfig,
        timeout: Duration,
    ) -> Result<Self, PortError> {
        let parity: serialport::Parity = config.parity().try_into()?;
        let stop_bits: serialport::StopBits = config.stop_bits().try_into()?;

        let port = serialport::new(port_name, config.baud_rate())
            .data_bits(config.data_bits().into())
            .flow_control(serialport::FlowControl::None)
            .parity(parity)
            .stop_bits(stop_bits)
            .timeout(timeout)
            .open()
            .map_err(|e| match e.kind() {
                serialport::ErrorKind::NoDevice => PortError::not_found(port_name),
                serialport::ErrorKind::InvalidInput => PortError::config(e.to_string()),
                _ => PortError::Serial(e),
            })?;

        Ok(Self {
            port,
            name: port_name.to_string(),
        })
    }
}

impl SerialPortAdapter for SyncSerialPort {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        self.port.write(data).map_err(PortError::Io)
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        self.port.read(buffer).map_err(PortError::Io)
    }

    fn bytes_to_read(&self) -> Result<usize, PortError> {
        self.port
            .bytes_to_read()
            .map(|n| n as usize)
            .map_err(PortError::Serial)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn write_all_bytes(&mut self, data: &[u8]) -> Result<(), PortError> {
        self.port.write_all(data)?;
        self.port.flush().map_err(PortError::Io)
    }
}

impl std::fmt::Debug for SyncSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncSerialPort")
            .field("name", &self.name)
            .field("baud_rate", &self.port.baud_rate())
            .finish()
    }
}

/// Opens real OS serial devices through `serialport`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPortOpener;

impl PortOpener for SystemPortOpener {
    fn open(
        &self,
        device: &str,
        config: &SerialConfig,
        timeout: Duration,
    ) -> Result<Box<dyn SerialPortAdapter>, PortError> {
        let port = SyncSerialPort::open(device, config, timeout)?;
        Ok(Box::new(port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::Parity;

    #[test]
    fn test_port_not_found_error() {
        let config = SerialConfig::default();
        let result = SyncSerialPort::open(
            "/dev/nonexistent_port_12345",
            &config,
            Duration::from_secs(1),
        );

        assert!(result.is_err());
        if let Err(e) = result {
            match e {
                PortError::NotFound(name) => {
                    assert!(name.contains("nonexistent"));
                }
                // Some platforms report a missing node as a plain I/O failure.
                PortError::Serial(_) | PortError::Io(_) => {}
                _ => panic!("Expected NotFound error, got: {:?}", e),
            }
        }
    }

    #[test]
    fn test_unsupported_parity_rejected_before_open() {
        let config = SerialConfig::default().with_parity(Parity::Mark);
        let result = SystemPortOpener.open(
            "/dev/nonexistent_port_12345",
            &config,
            Duration::from_secs(1),
        );
        assert!(matches!(result, Err(PortError::Unsupported(_))));
    }
}
