use uistream::cli::{self, parse_args, CliCommand, USAGE};

use color_eyre::Result;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// Log filter variable; defaults to `warn` so logs never mix into answers.
const ENV_LOG: &str = "UISTREAM_LOG";

fn init_tracing() {
    let filter = EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = match parse_args(std::env::args()) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("uistream: {}\n\n{}", e, USAGE);
            std::process::exit(2);
        }
    };

    // Handle --version and --help before any initialization
    match args.command {
        CliCommand::Version => {
            println!("uistream {}", cli::VERSION);
            return Ok(());
        }
        CliCommand::Help => {
            println!("{}", USAGE);
            return Ok(());
        }
        _ => {}
    }

    color_eyre::install()?;
    init_tracing();

    let config = cli::resolve_config(&args)?;
    tracing::debug!(base_url = %config.base_url, mode = %config.mode, "Configuration loaded");

    // Ctrl+C stops the running generation instead of killing the process
    let (interrupt_tx, interrupts) = mpsc::unbounded_channel();
    let _ = ctrlc::set_handler(move || {
        let _ = interrupt_tx.send(());
    });

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(cli::run_cli_command(args, config, interrupts))
}
