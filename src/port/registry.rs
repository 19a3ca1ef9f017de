//! Serial device enumeration.
//!
//! [`list_ports`] never fails from the caller's point of view: a backend
//! error is logged and reported as "no devices". [`scan_ports`] returns the
//! error for callers that can show it directly, like `--list`.

use super::PortError;
use serialport::{SerialPortInfo, SerialPortType};
use tracing::{debug, warn};

/// One serial device as seen by the last scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortDescriptor {
    /// System path or name, e.g. `/dev/ttyUSB0` or `COM3`.
    pub device: String,
    /// Human-readable description; may be empty.
    pub description: String,
}

impl PortDescriptor {
    pub fn new(device: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            description: description.into(),
        }
    }

    /// `"<device> - <description>"`, or just the device when there is no
    /// description.
    pub fn label(&self) -> String {
        if self.description.is_empty() {
            self.device.clone()
        } else {
            format!("{} - {}", self.device, self.description)
        }
    }
}

impl From<SerialPortInfo> for PortDescriptor {
    fn from(info: SerialPortInfo) -> Self {
        let description = match &info.port_type {
            SerialPortType::UsbPort(usb) => usb
                .product
                .clone()
                .or_else(|| usb.manufacturer.clone())
                .unwrap_or_else(|| format!("USB {:04X}:{:04X}", usb.vid, usb.pid)),
            SerialPortType::BluetoothPort => "Bluetooth".to_string(),
            SerialPortType::PciPort => "PCI".to_string(),
            SerialPortType::Unknown => String::new(),
        };
        Self {
            device: info.port_name,
            description,
        }
    }
}

/// Scan the OS for attached serial devices.
pub fn list_ports() -> Vec<PortDescriptor> {
    collect_ports(serialport::available_ports())
}

/// Scan the OS, keeping a backend failure as an error.
pub fn scan_ports() -> Result<Vec<PortDescriptor>, PortError> {
    describe_ports(serialport::available_ports())
}

/// Turn a backend scan result into descriptors, logging failures instead of
/// returning them.
pub fn collect_ports(result: serialport::Result<Vec<SerialPortInfo>>) -> Vec<PortDescriptor> {
    describe_ports(result).unwrap_or_else(|e| {
        warn!(error = %e, "serial port enumeration failed");
        Vec::new()
    })
}

/// Turn a backend scan result into descriptors.
pub fn describe_ports(
    result: serialport::Result<Vec<SerialPortInfo>>,
) -> Result<Vec<PortDescriptor>, PortError> {
    let ports = result?;
    if ports.is_empty() {
        debug!("no serial devices detected");
    }
    Ok(ports.into_iter().map(PortDescriptor::from).collect())
}
