//! Command-line argument parsing.
//!
//! ```text
//! uistream [OPTIONS] [QUESTION...]      ask once, or chat interactively
//! uistream [OPTIONS] abort <SESSION>    ask the backend to stop a session
//! uistream [OPTIONS] status <SESSION>   show a session's abort flag
//! uistream [OPTIONS] reset <SESSION>    clear a session's abort flag
//! ```

use thiserror::Error;

use crate::client::ChatMode;

pub const USAGE: &str = "\
Usage: uistream [OPTIONS] [QUESTION...]
       uistream [OPTIONS] abort <SESSION> [--reason <REASON>]
       uistream [OPTIONS] status <SESSION>
       uistream [OPTIONS] reset <SESSION>

Without a question, reads questions from stdin one per line.

Options:
  -m, --mode <MODE>        lite, base or net
      --base-url <URL>     backend base URL
      --session <ID>       session id to ask under
      --progress <LABEL>   show a progress bar labelled LABEL
  -h, --help               print this help
  -V, --version            print version

Environment:
  UISTREAM_BASE_URL, UISTREAM_MODE, UISTREAM_BATCH, UISTREAM_LOG";

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    Version,
    Help,
    /// Ask `question`, or read questions from stdin when `None`
    Ask {
        question: Option<String>,
        progress_label: Option<String>,
    },
    Abort {
        session_id: String,
        reason: Option<String>,
    },
    Status { session_id: String },
    Reset { session_id: String },
}

/// Command plus the options shared by every command.
#[derive(Debug, Clone, PartialEq)]
pub struct CliArgs {
    pub command: CliCommand,
    pub mode: Option<ChatMode>,
    pub base_url: Option<String>,
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgsError {
    #[error("{flag} requires a value")]
    MissingValue { flag: String },

    #[error("unknown option {0}")]
    UnknownOption(String),

    #[error("{command} requires a session id")]
    MissingSession { command: &'static str },

    #[error("unexpected argument {0}")]
    Unexpected(String),

    #[error("invalid mode {0:?} (expected lite, base or net)")]
    InvalidMode(String),
}

/// Parse command-line arguments, program name included.
///
/// ```
/// use uistream::cli::{parse_args, CliCommand};
///
/// let args = vec!["uistream".to_string(), "--version".to_string()];
/// assert_eq!(parse_args(args.into_iter()).unwrap().command, CliCommand::Version);
/// ```
pub fn parse_args<I>(args: I) -> Result<CliArgs, ArgsError>
where
    I: Iterator<Item = String>,
{
    let mut mode = None;
    let mut base_url = None;
    let mut session_id = None;
    let mut reason = None;
    let mut progress_label = None;
    let mut positional = Vec::new();

    let mut args = args.skip(1);
    while let Some(arg) = args.next() {
        let mut value = |flag: &str| {
            args.next().ok_or_else(|| ArgsError::MissingValue {
                flag: flag.to_string(),
            })
        };
        match arg.as_str() {
            "--version" | "-V" => return Ok(CliArgs::bare(CliCommand::Version)),
            "--help" | "-h" => return Ok(CliArgs::bare(CliCommand::Help)),
            "--mode" | "-m" => {
                let raw = value(&arg)?;
                mode = Some(
                    raw.parse::<ChatMode>()
                        .map_err(|_| ArgsError::InvalidMode(raw))?,
                );
            }
            "--base-url" => base_url = Some(value(&arg)?),
            "--session" => session_id = Some(value(&arg)?),
            "--reason" => reason = Some(value(&arg)?),
            "--progress" => progress_label = Some(value(&arg)?),
            "--" => {
                positional.extend(args.by_ref());
            }
            flag if flag.starts_with('-') && flag.len() > 1 => {
                return Err(ArgsError::UnknownOption(flag.to_string()));
            }
            _ => positional.push(arg),
        }
    }

    let command = match positional.first().map(String::as_str) {
        Some("abort") => CliCommand::Abort {
            session_id: session_arg(&positional, "abort")?,
            reason,
        },
        Some("status") => CliCommand::Status {
            session_id: session_arg(&positional, "status")?,
        },
        Some("reset") => CliCommand::Reset {
            session_id: session_arg(&positional, "reset")?,
        },
        Some(_) => CliCommand::Ask {
            question: Some(positional.join(" ")),
            progress_label,
        },
        None => CliCommand::Ask {
            question: None,
            progress_label,
        },
    };

    Ok(CliArgs {
        command,
        mode,
        base_url,
        session_id,
    })
}

fn session_arg(positional: &[String], command: &'static str) -> Result<String, ArgsError> {
    match positional {
        [_, session] => Ok(session.clone()),
        [_] => Err(ArgsError::MissingSession { command }),
        [_, _, extra, ..] => Err(ArgsError::Unexpected(extra.clone())),
        [] => Err(ArgsError::MissingSession { command }),
    }
}

impl CliArgs {
    fn bare(command: CliCommand) -> Self {
        Self {
            command,
            mode: None,
            base_url: None,
            session_id: None,
        }
    }
}
