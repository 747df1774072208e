//! Interactive commands read from stdin.

use std::time::Duration;
use thiserror::Error;

/// Errors for a single unparseable command line
#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("Unknown command {0:?} (type \"help\" for a list)")]
    Unknown(String),

    #[error("{command} needs {expected}")]
    MissingArgument {
        command: &'static str,
        expected: &'static str,
    },

    #[error("{command}: {value:?} is not a valid {expected}")]
    InvalidArgument {
        command: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// A parsed stdin command. Page and line numbers are 1-based as typed.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlCommand {
    Next,
    Prev,
    GoToPage(i64),
    JumpToLine(i64),
    Play,
    Pause,
    Seek(Duration),
    Resize(f32),
    FontScale(f32),
    State,
    Help,
    Quit,
}

pub const HELP: &str = "\
Commands:
  n | next            next page
  p | prev            previous page
  g | page <N>        go to page N
  j | line <N>        show the page holding line N
  play | pause        resume or pause playback
  seek <SECONDS>      move the playback clock
  resize <PX>         simulate a window resize
  font <SCALE>        change the font scale (1.0 = default)
  state               print the page state as JSON
  q | quit            exit";

/// Parse one line of input. Empty lines are not commands.
///
/// # Errors
///
/// Returns a [`CommandError`] describing why the line is not a command.
pub fn parse_command(line: &str) -> Result<Option<ControlCommand>, CommandError> {
    let mut parts = line.split_whitespace();
    let Some(name) = parts.next() else {
        return Ok(None);
    };
    let arg = parts.next();

    let command = match name.to_lowercase().as_str() {
        "n" | "next" => ControlCommand::Next,
        "p" | "prev" => ControlCommand::Prev,
        "g" | "page" => ControlCommand::GoToPage(parse_number(arg, "page", "page number")?),
        "j" | "line" => ControlCommand::JumpToLine(parse_number(arg, "line", "line number")?),
        "play" => ControlCommand::Play,
        "pause" => ControlCommand::Pause,
        "seek" => {
            let seconds: f64 = parse_number(arg, "seek", "position in seconds")?;
            let position = Duration::try_from_secs_f64(seconds).map_err(|_| {
                CommandError::InvalidArgument {
                    command: "seek",
                    expected: "position in seconds",
                    value: arg.unwrap_or_default().to_string(),
                }
            })?;
            ControlCommand::Seek(position)
        }
        "resize" => ControlCommand::Resize(parse_number(arg, "resize", "height in pixels")?),
        "font" => ControlCommand::FontScale(parse_number(arg, "font", "font scale")?),
        "state" => ControlCommand::State,
        "h" | "help" | "?" => ControlCommand::Help,
        "q" | "quit" | "exit" => ControlCommand::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };

    Ok(Some(command))
}

fn parse_number<T: std::str::FromStr>(
    arg: Option<&str>,
    command: &'static str,
    expected: &'static str,
) -> Result<T, CommandError> {
    let value = arg.ok_or(CommandError::MissingArgument { command, expected })?;
    value.parse().map_err(|_| CommandError::InvalidArgument {
        command,
        expected,
        value: value.to_string(),
    })
}
