//! prefkit entry point.

use clap::Parser;
use prefkit_cli::cli::Cli;
use prefkit_cli::commands;
use prefkit_cli::config::CliConfig;
use prefkit_cli::error::CliError;
use prefkit_datastore::ReactivePreferencesDataStore;
use prefkit_storage::LmdbSettings;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,prefkit=info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = CliConfig::load(cli.config)?;
    debug!(path = %config.store_path.display(), map_size_mb = config.map_size_mb, "Opening store");

    let settings = LmdbSettings::open(&config.store_path, config.map_size_mb)?;
    let store = ReactivePreferencesDataStore::new(settings, config.datastore)?;

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    let mut stdout = std::io::stdout().lock();
    commands::run(&store, cli.command, &mut stdout, shutdown).await
}
