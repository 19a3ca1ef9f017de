//! Port abstraction layer for serial communication.
//!
//! Provides the adapter/opener traits, the `serialport`-backed
//! implementation, device enumeration, and mocks for testing.

pub mod error;
pub mod mock;
pub mod registry;
pub mod sync_port;
pub mod traits;

pub use error::PortError;
pub use mock::{MockPortOpener, MockSerialPort};
pub use registry::{collect_ports, describe_ports, list_ports, scan_ports, PortDescriptor};
pub use sync_port::*;
pub use traits::*;
