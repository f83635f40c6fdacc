pub mod cli;
pub mod core;
pub mod page;
pub mod providers;

pub use crate::core::config;

use crate::cli::RunOptions;
use anyhow::Result;
use tracing::{debug, info};

pub enum AppCommand {
    Show(RunOptions),
    Watch(RunOptions),
    Currencies,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("cnprice starting...");

    let config = config::AppConfig::load_or_default(config_path)?;
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Show(options) => cli::show::run(&config, &options).await,
        AppCommand::Watch(options) => {
            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!(error = %e, "Failed to listen for Ctrl-C");
                    std::future::pending::<()>().await;
                }
            };
            cli::watch::run(&config, &options, shutdown).await
        }
        AppCommand::Currencies => cli::currencies::run(&config).await,
    }
}
