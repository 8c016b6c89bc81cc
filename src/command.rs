//! Line commands for driving a session interactively.
//!
//! Each command maps onto one session operation, so a terminal user can
//! walk through the same flow a graphical front end offers: pick a mode,
//! choose a file or type a URL, generate, clear.

use crate::input::InputMode;
use std::path::PathBuf;
use thiserror::Error;

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `mode upload|url`
    Mode(InputMode),
    /// `file <path>`
    File(PathBuf),
    /// `url [<link>]`; an empty link empties the URL input.
    Url(String),
    /// `generate`
    Generate,
    /// `clear`
    Clear,
    /// `show`
    Show,
    /// `help`
    Help,
    /// `quit`
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),

    #[error("'{command}' needs an argument: {usage}")]
    MissingArgument {
        command: &'static str,
        usage: &'static str,
    },

    #[error("{0}")]
    InvalidMode(String),
}

pub const HELP: &str = "\
commands:
  mode upload|url   switch input mode
  file <path>       select a local image
  url [<link>]      set the image URL (no argument empties it)
  generate          send the current input to the backend
  clear             reset inputs, preview, caption and error
  show              print the current state
  help              this text
  quit              leave";

/// Parse one line. Blank lines and `#` comments yield `Ok(None)`.
pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "mode" | "tab" => {
            if rest.is_empty() {
                return Err(CommandError::MissingArgument {
                    command: "mode",
                    usage: "mode upload|url",
                });
            }
            Command::Mode(rest.parse::<InputMode>().map_err(CommandError::InvalidMode)?)
        }
        "file" | "open" => {
            if rest.is_empty() {
                return Err(CommandError::MissingArgument {
                    command: "file",
                    usage: "file <path>",
                });
            }
            Command::File(PathBuf::from(rest))
        }
        "url" | "link" => Command::Url(rest.to_string()),
        "generate" | "gen" | "go" => Command::Generate,
        "clear" | "reset" => Command::Clear,
        "show" | "state" => Command::Show,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_and_comment_lines() {
        assert_eq!(parse("").unwrap(), None);
        assert_eq!(parse("   ").unwrap(), None);
        assert_eq!(parse("# note").unwrap(), None);
    }

    #[test]
    fn mode_command() {
        assert_eq!(parse("mode url").unwrap(), Some(Command::Mode(InputMode::Url)));
        assert_eq!(parse("MODE Upload").unwrap(), Some(Command::Mode(InputMode::Upload)));
        assert!(matches!(parse("mode"), Err(CommandError::MissingArgument { .. })));
        assert!(matches!(parse("mode camera"), Err(CommandError::InvalidMode(_))));
    }

    #[test]
    fn file_keeps_spaces_in_path() {
        assert_eq!(
            parse("file  my photos/cat 1.jpg ").unwrap(),
            Some(Command::File(PathBuf::from("my photos/cat 1.jpg")))
        );
        assert!(parse("file").is_err());
    }

    #[test]
    fn url_with_and_without_argument() {
        assert_eq!(
            parse("url https://x/y.jpg").unwrap(),
            Some(Command::Url("https://x/y.jpg".into()))
        );
        assert_eq!(parse("url").unwrap(), Some(Command::Url(String::new())));
    }

    #[test]
    fn simple_commands_and_aliases() {
        assert_eq!(parse("generate").unwrap(), Some(Command::Generate));
        assert_eq!(parse("go").unwrap(), Some(Command::Generate));
        assert_eq!(parse("clear").unwrap(), Some(Command::Clear));
        assert_eq!(parse("show").unwrap(), Some(Command::Show));
        assert_eq!(parse("?").unwrap(), Some(Command::Help));
        assert_eq!(parse("exit").unwrap(), Some(Command::Quit));
    }

    #[test]
    fn unknown_command() {
        let err = parse("caption please").unwrap_err();
        assert_eq!(err.to_string(), "unknown command 'caption' (try 'help')");
    }
}
