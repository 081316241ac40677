//! # iris-node
//!
//! Runs one object adapter until Ctrl-C. Settings come from
//! `~/.iris/settings.json` (or `--settings`), `IRIS_*` variables and the
//! command-line overrides below, in increasing priority.

#![deny(unsafe_code)]

mod node;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use iris_settings::IrisSettings;
use tracing::info;

use crate::node::Node;

/// Iris object adapter.
#[derive(Parser, Debug)]
#[command(name = "iris-node", about = "Iris object adapter")]
struct Cli {
    /// Settings file (defaults to `~/.iris/settings.json`).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Listening endpoint, e.g. `tcp -h 0.0.0.0 -p 4061` (overrides settings).
    #[arg(long)]
    endpoint: Option<String>,

    /// Adapter name (overrides settings).
    #[arg(long)]
    name: Option<String>,

    /// Log filter, e.g. `info` or `iris_adapter=debug` (overrides settings).
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn load_settings(&self) -> Result<IrisSettings> {
        let path = self
            .settings
            .clone()
            .unwrap_or_else(iris_settings::settings_path);
        let mut settings = iris_settings::load_settings_from_path(&path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?;

        if let Some(endpoint) = &self.endpoint {
            settings.adapter.endpoint.clone_from(endpoint);
        }
        if let Some(name) = &self.name {
            settings.adapter.name.clone_from(name);
        }
        if let Some(level) = &self.log_level {
            settings.logging.level.clone_from(level);
        }
        settings.validate()?;
        Ok(settings)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = cli.load_settings()?;
    if iris_settings::init_settings(settings).is_err() {
        anyhow::bail!("settings were initialized twice");
    }
    let settings = iris_settings::get_settings();
    iris_core::logging::init_subscriber(&settings.logging.level);

    let node = Node::start(settings).await?;
    info!(
        endpoint = %node.describe(),
        servants = node.registry().len(),
        "ready, press Ctrl-C to stop"
    );
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    info!("shutdown signal received");
    node.stop().await;
    Ok(())
}
