//! Operator command parsing
//!
//! One command per stdin line. Keywords are case-insensitive; arguments are
//! whitespace separated.

use codec::proto::{Mode, Pos};
use thiserror::Error;

/// Usage text printed by `help`
pub const HELP: &str = "\
commands:
  connect <host[:port]>            set the runtime target and connect
  disconnect                       close the link and stop reconnecting
  mode <idle|auto|teleop|estop>    change the robot run mode
  start <left|right>               set the starting position
  status                           show link state and latest telemetry
  quit                             shut down the station";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorCommand {
    Connect(String),
    Disconnect,
    Mode(Mode),
    Start(Pos),
    Status,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command '{0}' (try 'help')")]
    Unknown(String),

    #[error("'{command}' expects {expected}")]
    MissingArgument {
        command: &'static str,
        expected: &'static str,
    },

    #[error("'{command}' takes no argument after '{extra}'")]
    TrailingArgument { command: &'static str, extra: String },

    #[error("Invalid {what} '{value}'")]
    InvalidValue { what: &'static str, value: String },
}

/// Parse one input line. Blank lines yield `None`.
pub fn parse_command(line: &str) -> Result<Option<OperatorCommand>, CommandError> {
    let mut words = line.split_whitespace();
    let Some(keyword) = words.next() else {
        return Ok(None);
    };

    let command = match keyword.to_ascii_lowercase().as_str() {
        "connect" => {
            let address = required(&mut words, "connect", "an address")?;
            OperatorCommand::Connect(address.to_string())
        }
        "disconnect" => OperatorCommand::Disconnect,
        "mode" => {
            let name = required(&mut words, "mode", "idle, auto, teleop or estop")?;
            // Challenge mode has no station-side flow
            match Mode::from_name(name) {
                Some(Mode::Challenge) | None => {
                    return Err(CommandError::InvalidValue {
                        what: "mode",
                        value: name.to_string(),
                    })
                }
                Some(mode) => OperatorCommand::Mode(mode),
            }
        }
        "start" => {
            let name = required(&mut words, "start", "left or right")?;
            let pos = Pos::from_name(name).ok_or_else(|| CommandError::InvalidValue {
                what: "start position",
                value: name.to_string(),
            })?;
            OperatorCommand::Start(pos)
        }
        "status" => OperatorCommand::Status,
        "help" | "?" => OperatorCommand::Help,
        "quit" | "exit" => OperatorCommand::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };

    if let Some(extra) = words.next() {
        return Err(CommandError::TrailingArgument {
            command: command.keyword(),
            extra: extra.to_string(),
        });
    }
    Ok(Some(command))
}

fn required<'a>(
    words: &mut impl Iterator<Item = &'a str>,
    command: &'static str,
    expected: &'static str,
) -> Result<&'a str, CommandError> {
    words
        .next()
        .ok_or(CommandError::MissingArgument { command, expected })
}

impl OperatorCommand {
    fn keyword(&self) -> &'static str {
        match self {
            OperatorCommand::Connect(_) => "connect",
            OperatorCommand::Disconnect => "disconnect",
            OperatorCommand::Mode(_) => "mode",
            OperatorCommand::Start(_) => "start",
            OperatorCommand::Status => "status",
            OperatorCommand::Help => "help",
            OperatorCommand::Quit => "quit",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(
            parse_command("connect 192.168.0.100:8101").unwrap(),
            Some(OperatorCommand::Connect("192.168.0.100:8101".to_string()))
        );
        assert_eq!(
            parse_command("  DISCONNECT  ").unwrap(),
            Some(OperatorCommand::Disconnect)
        );
        assert_eq!(
            parse_command("mode teleop").unwrap(),
            Some(OperatorCommand::Mode(Mode::Teleop))
        );
        assert_eq!(
            parse_command("mode Autonomous").unwrap(),
            Some(OperatorCommand::Mode(Mode::Auto))
        );
        assert_eq!(
            parse_command("start left").unwrap(),
            Some(OperatorCommand::Start(Pos::Left))
        );
        assert_eq!(parse_command("status").unwrap(), Some(OperatorCommand::Status));
        assert_eq!(parse_command("exit").unwrap(), Some(OperatorCommand::Quit));
    }

    #[test]
    fn test_blank_line_is_ignored() {
        assert_eq!(parse_command("").unwrap(), None);
        assert_eq!(parse_command("   \t").unwrap(), None);
    }

    #[test]
    fn test_argument_errors() {
        assert_eq!(
            parse_command("connect").unwrap_err(),
            CommandError::MissingArgument {
                command: "connect",
                expected: "an address"
            }
        );
        assert!(matches!(
            parse_command("mode sideways"),
            Err(CommandError::InvalidValue { what: "mode", .. })
        ));
        assert!(matches!(
            parse_command("mode challenge"),
            Err(CommandError::InvalidValue { what: "mode", .. })
        ));
        assert!(matches!(
            parse_command("start center"),
            Err(CommandError::InvalidValue { .. })
        ));
        assert_eq!(
            parse_command("status now").unwrap_err(),
            CommandError::TrailingArgument {
                command: "status",
                extra: "now".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_command() {
        let err = parse_command("launch").unwrap_err();
        assert_eq!(err, CommandError::Unknown("launch".to_string()));
        assert!(err.to_string().contains("help"));
    }
}
