//! Command-line front end.
//!
//! `main` parses the arguments, builds a [`ClientConfig`] from the
//! environment plus flags, and hands both to [`run_cli_command`] inside a
//! tokio runtime.
//!
//! ```ignore
//! use uistream::cli::{parse_args, run_cli_command};
//!
//! let args = parse_args(std::env::args())?;
//! let config = uistream::cli::resolve_config(&args)?;
//! runtime.block_on(run_cli_command(args, config, interrupts))?;
//! ```

pub mod args;
pub mod commands;
pub mod output;

pub use args::{parse_args, ArgsError, CliArgs, CliCommand, USAGE};
pub use commands::Interrupts;
pub use output::AnswerPrinter;

use color_eyre::eyre::eyre;
use color_eyre::Result;

use crate::client::ChatClient;
use crate::config::ClientConfig;
use crate::error::ConfigError;
use crate::session::ChatSession;

/// The current version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment configuration with command-line overrides applied.
pub fn resolve_config(args: &CliArgs) -> Result<ClientConfig, ConfigError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = &args.base_url {
        config = config.with_base_url(url.clone());
    }
    if let Some(mode) = args.mode {
        config = config.with_mode(mode);
    }
    config.validate()?;
    Ok(config)
}

/// Run a parsed command to completion.
pub async fn run_cli_command(
    args: CliArgs,
    config: ClientConfig,
    mut interrupts: Interrupts,
) -> Result<()> {
    match args.command {
        CliCommand::Version => {
            println!("uistream {}", VERSION);
            Ok(())
        }
        CliCommand::Help => {
            println!("{}", USAGE);
            Ok(())
        }
        CliCommand::Abort { session_id, reason } => {
            let client = ChatClient::from_config(&config)?;
            commands::handle_abort_command(&client, &session_id, reason.as_deref()).await
        }
        CliCommand::Status { session_id } => {
            let client = ChatClient::from_config(&config)?;
            commands::handle_status_command(&client, &session_id).await
        }
        CliCommand::Reset { session_id } => {
            let client = ChatClient::from_config(&config)?;
            commands::handle_reset_command(&client, &session_id).await
        }
        CliCommand::Ask {
            question,
            progress_label,
        } => {
            let mut session = ChatSession::from_config(&config)?;
            if let Some(id) = args.session_id {
                session = session.with_id(id);
            }
            match question {
                Some(question) => {
                    let result = commands::ask(
                        &mut session,
                        &question,
                        None,
                        progress_label.as_deref(),
                        &mut interrupts,
                    )
                    .await;
                    session.shutdown();
                    result.map_err(|e| eyre!(e.user_message()))
                }
                None => {
                    commands::handle_interactive(
                        &mut session,
                        None,
                        progress_label.as_deref(),
                        &mut interrupts,
                    )
                    .await
                }
            }
        }
    }
}
