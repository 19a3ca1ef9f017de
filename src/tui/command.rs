//! `:` command line parsing.

use crate::port::{is_supported_baud, DataBits, Parity, StopBits, BAUD_RATES};
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// A command typed after `:`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Open the named device, or the selected one.
    Open(Option<String>),
    Close,
    Refresh,
    ToggleHexDisplay,
    ToggleHexSend,
    ToggleTimestamps,
    TimestampFormat(String),
    ToggleNewline,
    ToggleAutoScroll,
    Baud(u32),
    DataBits(DataBits),
    Parity(Parity),
    StopBits(StopBits),
    Save(PathBuf),
    ClearReceive,
    ClearHistory,
    FormatJson,
    Settings,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Empty command")]
    Empty,

    #[error("Unknown command: {0}")]
    Unknown(String),

    #[error(":{0} needs an argument")]
    MissingArgument(&'static str),

    #[error(":{command}: {message}")]
    InvalidArgument {
        command: &'static str,
        message: String,
    },
}

impl CommandError {
    fn invalid(command: &'static str, message: impl ToString) -> Self {
        Self::InvalidArgument {
            command,
            message: message.to_string(),
        }
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };
        let arg = (!rest.is_empty()).then_some(rest);

        let command = match name.to_ascii_lowercase().as_str() {
            "" => return Err(CommandError::Empty),
            "open" | "o" => Self::Open(arg.map(str::to_string)),
            "close" => Self::Close,
            "refresh" => Self::Refresh,
            "hex" => Self::ToggleHexDisplay,
            "hexsend" => Self::ToggleHexSend,
            "ts" => Self::ToggleTimestamps,
            "tsfmt" => Self::TimestampFormat(
                arg.ok_or(CommandError::MissingArgument("tsfmt"))?.to_string(),
            ),
            "nl" => Self::ToggleNewline,
            "scroll" => Self::ToggleAutoScroll,
            "baud" => {
                let value = arg.ok_or(CommandError::MissingArgument("baud"))?;
                let baud: u32 = value
                    .parse()
                    .map_err(|_| CommandError::invalid("baud", format!("{value:?} is not a number")))?;
                if !is_supported_baud(baud) {
                    return Err(CommandError::invalid(
                        "baud",
                        format!("{baud} is not one of {BAUD_RATES:?}"),
                    ));
                }
                Self::Baud(baud)
            }
            "databits" => Self::DataBits(
                arg.ok_or(CommandError::MissingArgument("databits"))?
                    .parse()
                    .map_err(|e| CommandError::invalid("databits", e))?,
            ),
            "parity" => Self::Parity(
                arg.ok_or(CommandError::MissingArgument("parity"))?
                    .parse()
                    .map_err(|e| CommandError::invalid("parity", e))?,
            ),
            "stopbits" => Self::StopBits(
                arg.ok_or(CommandError::MissingArgument("stopbits"))?
                    .parse()
                    .map_err(|e| CommandError::invalid("stopbits", e))?,
            ),
            "save" | "w" => Self::Save(PathBuf::from(
                arg.ok_or(CommandError::MissingArgument("save"))?,
            )),
            "clear" => Self::ClearReceive,
            "clearhistory" => Self::ClearHistory,
            "json" => Self::FormatJson,
            "settings" | "set" => Self::Settings,
            "help" | "h" => Self::Help,
            "quit" | "q" => Self::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<Command, CommandError> {
        line.parse()
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(parse("quit"), Ok(Command::Quit));
        assert_eq!(parse(" q "), Ok(Command::Quit));
        assert_eq!(parse("HEX"), Ok(Command::ToggleHexDisplay));
        assert_eq!(parse("clearhistory"), Ok(Command::ClearHistory));
        assert_eq!(parse("open"), Ok(Command::Open(None)));
        assert_eq!(
            parse("open /dev/ttyUSB0"),
            Ok(Command::Open(Some("/dev/ttyUSB0".into())))
        );
    }

    #[test]
    fn test_arguments_keep_spaces() {
        assert_eq!(
            parse("tsfmt %Y-%m-%d %H:%M:%S"),
            Ok(Command::TimestampFormat("%Y-%m-%d %H:%M:%S".into()))
        );
        assert_eq!(
            parse("save  my capture.txt"),
            Ok(Command::Save(PathBuf::from("my capture.txt")))
        );
    }

    #[test]
    fn test_framing_commands() {
        assert_eq!(parse("baud 9600"), Ok(Command::Baud(9600)));
        assert_eq!(parse("databits 7"), Ok(Command::DataBits(DataBits::Seven)));
        assert_eq!(parse("parity even"), Ok(Command::Parity(Parity::Even)));
        assert_eq!(parse("stopbits 1.5"), Ok(Command::StopBits(StopBits::OnePointFive)));
    }

    #[test]
    fn test_errors() {
        assert_eq!(parse(""), Err(CommandError::Empty));
        assert_eq!(
            parse("frobnicate"),
            Err(CommandError::Unknown("frobnicate".into()))
        );
        assert_eq!(
            parse("baud"),
            Err(CommandError::MissingArgument("baud"))
        );
        assert!(matches!(
            parse("baud 1234"),
            Err(CommandError::InvalidArgument { command: "baud", .. })
        ));
        assert!(matches!(
            parse("databits 9"),
            Err(CommandError::InvalidArgument { command: "databits", .. })
        ));
        assert!(matches!(
            parse("parity sometimes"),
            Err(CommandError::InvalidArgument { command: "parity", .. })
        ));
    }
}
