// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Omniverse Flow Simulator
//!
//! Entry point for the `omniverse-sim` binary. Parses flags, initializes
//! logging, resolves settings, builds the account registry and the Flow
//! REST dispatcher, then runs exactly one operation:
//!
//! - `--set-members <json>`      replace the member-chain table
//! - `--check-members`           print the member-chain table
//! - `--set-lock-period <ufix>`  update the cooling-off period
//! - `--check-lock-period`       print the cooling-off period
//! - `--check-accounts`          print the test accounts and their keys
//! - `--mint`                    print a mint payload for the owner (not submitted)

mod cli;
mod logging;
mod operations;
mod settings;

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;

use omniverse_protocol::dispatch::FlowRestDispatcher;
use omniverse_protocol::identity::AccountRegistry;

use cli::SimulatorCli;
use logging::LogFormat;
use operations::Simulator;
use settings::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = SimulatorCli::parse();
    logging::init_logging(
        logging::DEFAULT_DIRECTIVES,
        LogFormat::from_str_lossy(&cli.log_format),
    );

    let Some(operation) = cli.operation() else {
        println!("No operation given. Run with --help to list the available operations.");
        return Ok(());
    };

    let settings = Settings::resolve(&cli).context("failed to load settings")?;
    tracing::info!(
        access_node = %settings.access_node,
        profile = %settings.profile,
        cadence_root = %settings.cadence_root.display(),
        "starting omniverse-sim"
    );

    let registry = AccountRegistry::new(settings.registry_config())
        .context("failed to build the account registry")?;
    let source = settings
        .cadence_source()
        .context("failed to configure Cadence imports")?;
    let dispatcher = FlowRestDispatcher::new(settings.rest_config(), source)
        .with_context(|| format!("failed to connect to {}", settings.access_node))?;
    let nft_contract = settings.nft_contract()?;

    let simulator = Simulator::new(registry, dispatcher, settings.profile.clone(), nft_contract);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    simulator
        .run(operation.clone(), &mut out)
        .await
        .with_context(|| format!("{operation:?} failed"))?;
    out.flush().context("failed to flush stdout")?;

    Ok(())
}
