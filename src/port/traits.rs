//! Core traits and framing types for serial port abstraction.
//!
//! Defines the `SerialPortAdapter` trait that allows both real serial ports
//! and mock implementations to be used interchangeably, the `PortOpener`
//! seam the session uses to acquire handles, and the validated
//! `SerialConfig` framing parameters.

use super::error::PortError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Baud rates offered to the user. Anything else is rejected.
pub const BAUD_RATES: &[u32] = &[9600, 19200, 38400, 57600, 115200, 230400, 460800, 921600];

/// Baud rate used when nothing else is configured.
pub const DEFAULT_BAUD_RATE: u32 = 115200;

/// Returns true if `baud_rate` is one of [`BAUD_RATES`].
pub fn is_supported_baud(baud_rate: u32) -> bool {
    BAUD_RATES.contains(&baud_rate)
}

/// Framing parameters for a serial connection.
///
/// The baud rate is checked against [`BAUD_RATES`] on construction, so a
/// `SerialConfig` value is always valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialConfig {
    baud_rate: u32,
    data_bits: DataBits,
    parity: Parity,
    stop_bits: StopBits,
}

impl SerialConfig {
    /// 8-N-1 framing at the given baud rate.
    pub fn new(baud_rate: u32) -> Result<Self, PortError> {
        if !is_supported_baud(baud_rate) {
            return Err(PortError::config(format!(
                "baud rate {baud_rate} is not one of {BAUD_RATES:?}"
            )));
        }
        Ok(Self {
            baud_rate,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        })
    }

    pub fn with_data_bits(mut self, data_bits: DataBits) -> Self {
        self.data_bits = data_bits;
        self
    }

    pub fn with_parity(mut self, parity: Parity) -> Self {
        self.parity = parity;
        self
    }

    pub fn with_stop_bits(mut self, stop_bits: StopBits) -> Self {
        self.stop_bits = stop_bits;
        self
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    pub fn data_bits(&self) -> DataBits {
        self.data_bits
    }

    pub fn parity(&self) -> Parity {
        self.parity
    }

    pub fn stop_bits(&self) -> StopBits {
        self.stop_bits
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

/// Short form such as `115200-8-N-1`.
impl fmt::Display for SerialConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}",
            self.baud_rate,
            self.data_bits,
            self.parity.letter(),
            self.stop_bits
        )
    }
}

/// Number of data bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataBits {
    Five,
    Six,
    Seven,
    Eight,
}

impl DataBits {
    pub const ALL: [DataBits; 4] = [Self::Five, Self::Six, Self::Seven, Self::Eight];

    pub fn bits(self) -> u8 {
        match self {
            Self::Five => 5,
            Self::Six => 6,
            Self::Seven => 7,
            Self::Eight => 8,
        }
    }
}

impl TryFrom<u8> for DataBits {
    type Error = PortError;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        match bits {
            5 => Ok(Self::Five),
            6 => Ok(Self::Six),
            7 => Ok(Self::Seven),
            8 => Ok(Self::Eight),
            other => Err(PortError::config(format!(
                "data bits must be 5, 6, 7 or 8 (got {other})"
            ))),
        }
    }
}

impl fmt::Display for DataBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

impl FromStr for DataBits {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bits: u8 = s
            .trim()
            .parse()
            .map_err(|_| PortError::config(format!("invalid data bits: {s:?}")))?;
        Self::try_from(bits)
    }
}

impl From<DataBits> for serialport::DataBits {
    fn from(bits: DataBits) -> Self {
        match bits {
            DataBits::Five => serialport::DataBits::Five,
            DataBits::Six => serialport::DataBits::Six,
            DataBits::Seven => serialport::DataBits::Seven,
            DataBits::Eight => serialport::DataBits::Eight,
        }
    }
}

/// Parity checking modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parity {
    None,
    Odd,
    Even,
    Mark,
    Space,
}

impl Parity {
    pub const ALL: [Parity; 5] = [Self::None, Self::Odd, Self::Even, Self::Mark, Self::Space];

    /// Human-facing label, as shown in the settings panel.
    pub fn label(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Odd => "Odd",
            Self::Even => "Even",
            Self::Mark => "Mark",
            Self::Space => "Space",
        }
    }

    /// Single letter used in `8-N-1` style notation.
    pub fn letter(self) -> char {
        match self {
            Self::None => 'N',
            Self::Odd => 'O',
            Self::Even => 'E',
            Self::Mark => 'M',
            Self::Space => 'S',
        }
    }
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Parity {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| PortError::config(format!("invalid parity: {s:?}")))
    }
}

/// `serialport` only knows None/Odd/Even; Mark and Space are refused rather
/// than mapped onto something else.
impl TryFrom<Parity> for serialport::Parity {
    type Error = PortError;

    fn try_from(parity: Parity) -> Result<Self, Self::Error> {
        match parity {
            Parity::None => Ok(serialport::Parity::None),
            Parity::Odd => Ok(serialport::Parity::Odd),
            Parity::Even => Ok(serialport::Parity::Even),
            Parity::Mark | Parity::Space => Err(PortError::unsupported(format!(
                "{parity} parity is not supported by the serial backend"
            ))),
        }
    }
}

/// Number of stop bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopBits {
    One,
    OnePointFive,
    Two,
}

impl StopBits {
    pub const ALL: [StopBits; 3] = [Self::One, Self::OnePointFive, Self::Two];

    pub fn label(self) -> &'static str {
        match self {
            Self::One => "1",
            Self::OnePointFive => "1.5",
            Self::Two => "2",
        }
    }
}

impl fmt::Display for StopBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for StopBits {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|b| b.label() == wanted)
            .ok_or_else(|| PortError::config(format!("invalid stop bits: {s:?}")))
    }
}

impl TryFrom<StopBits> for serialport::StopBits {
    type Error = PortError;

    fn try_from(bits: StopBits) -> Result<Self, Self::Error> {
        match bits {
            StopBits::One => Ok(serialport::StopBits::One),
            StopBits::Two => Ok(serialport::StopBits::Two),
            StopBits::OnePointFive => Err(PortError::unsupported(
                "1.5 stop bits are not supported by the serial backend",
            )),
        }
    }
}

/// Trait for serial port I/O operations.
///
/// This trait abstracts over synchronous serial port operations, allowing both
/// real hardware ports and mock implementations for testing.
pub trait SerialPortAdapter: Send + fmt::Debug {
    /// Write bytes to the serial port.
    ///
    /// Returns the number of bytes actually written.
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError>;

    /// Read bytes from the serial port into the provided buffer.
    ///
    /// Returns the number of bytes actually read.
    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError>;

    /// Number of bytes the OS reports as received and not yet read.
    ///
    /// An error here usually means the device went away.
    fn bytes_to_read(&self) -> Result<usize, PortError>;

    /// Get the name/path of this serial port.
    fn name(&self) -> &str;

    /// Write the whole buffer, looping over short writes.
    fn write_all_bytes(&mut self, mut data: &[u8]) -> Result<(), PortError> {
        while !data.is_empty() {
            match self.write_bytes(data)? {
                0 => {
                    return Err(PortError::Io(std::io::Error::new(
                        std::io::ErrorKind::WriteZero,
                        "serial port accepted no bytes",
                    )))
                }
                n => data = &data[n..],
            }
        }
        Ok(())
    }
}

/// Acquires serial handles for the session.
///
/// The real implementation is [`SystemPortOpener`](super::SystemPortOpener);
/// tests inject [`MockPortOpener`](super::MockPortOpener).
pub trait PortOpener: Send + fmt::Debug {
    /// Open `device` with the given framing and read timeout.
    fn open(
        &self,
        device: &str,
        config: &SerialConfig,
        timeout: Duration,
    ) -> Result<Box<dyn SerialPortAdapter>, PortError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configuration() {
        let config = SerialConfig::default();
        assert_eq!(config.baud_rate(), 115200);
        assert_eq!(config.data_bits(), DataBits::Eight);
        assert_eq!(config.parity(), Parity::None);
        assert_eq!(config.stop_bits(), StopBits::One);
        assert_eq!(config.to_string(), "115200-8-N-1");
    }

    #[test]
    fn test_baud_allow_list() {
        for baud in BAUD_RATES {
            assert!(SerialConfig::new(*baud).is_ok());
        }
        assert!(matches!(SerialConfig::new(0), Err(PortError::Config(_))));
        assert!(matches!(SerialConfig::new(14400), Err(PortError::Config(_))));
    }

    #[test]
    fn test_builder_notation() {
        let config = SerialConfig::new(9600)
            .unwrap()
            .with_data_bits(DataBits::Seven)
            .with_parity(Parity::Even)
            .with_stop_bits(StopBits::OnePointFive);
        assert_eq!(config.to_string(), "9600-7-E-1.5");
    }

    #[test]
    fn test_labels_round_trip() {
        for parity in Parity::ALL {
            assert_eq!(parity.to_string().parse::<Parity>().unwrap(), parity);
        }
        for bits in StopBits::ALL {
            assert_eq!(bits.to_string().parse::<StopBits>().unwrap(), bits);
        }
        for bits in DataBits::ALL {
            assert_eq!(bits.to_string().parse::<DataBits>().unwrap(), bits);
        }
        assert_eq!("space".parse::<Parity>().unwrap(), Parity::Space);
        assert!("4".parse::<DataBits>().is_err());
        assert!("1.25".parse::<StopBits>().is_err());
    }

    #[test]
    fn test_data_bits_conversion() {
        let bits = DataBits::Five;
        let serialport_bits: serialport::DataBits = bits.into();
        assert_eq!(serialport_bits, serialport::DataBits::Five);
    }

    #[test]
    fn test_parity_conversion() {
        let parity: serialport::Parity = Parity::Odd.try_into().unwrap();
        assert_eq!(parity, serialport::Parity::Odd);
        let parity: serialport::Parity = Parity::Even.try_into().unwrap();
        assert_eq!(parity, serialport::Parity::Even);

        let mark: Result<serialport::Parity, _> = Parity::Mark.try_into();
        assert!(matches!(mark, Err(PortError::Unsupported(_))));
        let space: Result<serialport::Parity, _> = Parity::Space.try_into();
        assert!(matches!(space, Err(PortError::Unsupported(_))));
    }

    #[test]
    fn test_stop_bits_conversion() {
        let stop_bits: serialport::StopBits = StopBits::Two.try_into().unwrap();
        assert_eq!(stop_bits, serialport::StopBits::Two);

        let half: Result<serialport::StopBits, _> = StopBits::OnePointFive.try_into();
        assert!(matches!(half, Err(PortError::Unsupported(_))));
    }
}
