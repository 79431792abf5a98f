// Bridge daemon entry point.
//
// Loads the TOML/env configuration, builds the accessory façade with a
// logging state sink, starts the drift pollers, and runs until Ctrl-C.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use guardlink_core::{ReadOutcome, SecuritySystemAccessory, StateSink};

#[derive(Debug, Parser)]
#[command(name = "guardlink", version, about)]
struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "guardlink.toml")]
    config: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Sink used when no hub integration is attached: every pushed state
/// lands in the log, which is enough to observe the bridge standalone.
struct LoggingSink;

impl StateSink for LoggingSink {
    fn push_current_state(&self, code: i64) {
        info!(code, "current state pushed");
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(&cli).await {
        error!(error = %err, "bridge failed");
        std::process::exit(1);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}

async fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = guardlink_config::load_file(&cli.config)?;
    info!(name = %config.name, config = %cli.config.display(), "starting bridge");

    let accessory = SecuritySystemAccessory::new(config, Arc::new(LoggingSink))?;

    // Prime the state caches so the first poll or hub read logs against
    // a known baseline. Failures here are not fatal.
    match accessory.current_state().await {
        Ok(ReadOutcome::Code(code)) => info!(code, "initial current state"),
        Ok(_) => {}
        Err(err) => error!(error = %err, "initial current-state read failed"),
    }

    accessory.start_polling();

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");
    accessory.shutdown().await;

    Ok(())
}
