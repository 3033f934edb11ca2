//! Pomodoro cycle timer CLI
//!
//! Alternates fixed-length Focus and Break sessions:
//! - `daemon` runs the timer and listens on a Unix socket
//! - every other subcommand talks to that daemon

use std::time::Duration;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use tokio::time::MissedTickBehavior;

use pomodoro_cycle::cli::{Cli, Commands, Display, IpcClient};
use pomodoro_cycle::daemon;
use pomodoro_cycle::types::default_socket_path;

/// Poll interval of the `watch` subcommand
const WATCH_INTERVAL: Duration = Duration::from_secs(1);

/// Main entry point
#[tokio::main]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_tracing(cli.verbose);

    // Execute command
    if let Err(e) = execute(cli).await {
        Display::show_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
///
/// `RUST_LOG` wins; otherwise `--verbose` selects `debug` and the default is `warn`.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    let socket_path = cli.socket.unwrap_or_else(default_socket_path);
    tracing::debug!(socket = %socket_path.display(), "using control socket");

    let Some(command) = cli.command else {
        // No command provided, show help
        Cli::command().print_help()?;
        return Ok(());
    };

    let client = IpcClient::with_socket_path(socket_path.clone());

    match command {
        Commands::Start => Display::show_outcome(&client.start().await?),
        Commands::Pause => Display::show_outcome(&client.pause().await?),
        Commands::Resume => Display::show_outcome(&client.resume().await?),
        Commands::Reset => Display::show_outcome(&client.reset().await?),
        Commands::Skip => Display::show_outcome(&client.skip().await?),
        Commands::Toggle => Display::show_outcome(&client.toggle().await?),
        Commands::Status => Display::show_status(&client.status().await?),
        Commands::Watch => watch(&client).await?,
        Commands::Daemon => daemon::run(&socket_path).await?,
        Commands::Completions { shell } => generate_completions(shell),
    }

    Ok(())
}

/// Polls the daemon once per second and redraws a single status line
/// until Ctrl-C.
async fn watch(client: &IpcClient) -> Result<()> {
    let mut interval = tokio::time::interval(WATCH_INTERVAL);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let result = loop {
        tokio::select! {
            _ = interval.tick() => {
                match client.status().await {
                    Ok(response) => {
                        if let Some(data) = &response.data {
                            Display::show_watch_line(data);
                        }
                    }
                    Err(e) => break Err(e),
                }
            }
            _ = tokio::signal::ctrl_c() => break Ok(()),
        }
    };

    Display::finish_watch();
    result
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}
