use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use forecast_core::{
    Config, CwaProvider, ForecastController, ViewStatus, controller::EMPTY_PROMPT,
};
use inquire::{Password, PasswordDisplayMode, Text};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "forecast", version, about = "36-hour forecast from CWA open data")]
pub struct Cli {
    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the CWA API key and endpoint.
    Configure,

    /// Show the forecast for a city or county.
    Show {
        /// Location name as CWA spells it, e.g. "臺北市".
        location: String,

        /// Print records as JSON.
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { location, json } => show(&location, json).await,
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("CWA API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    let base_url = Text::new("API base URL:")
        .with_default(&config.base_url)
        .prompt()
        .context("Failed to read base URL")?;

    config.set_api_key(api_key.trim().to_string());
    config.base_url = base_url.trim().to_string();
    config.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show(location: &str, json: bool) -> anyhow::Result<()> {
    let config = Config::load()?;
    debug!(base_url = %config.base_url, timeout_secs = config.timeout_secs, "loaded config");

    let controller = ForecastController::new(CwaProvider::from_config(&config)?);

    let mut updates = controller.subscribe();
    let progress = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            if updates.borrow_and_update().is_loading {
                eprintln!("Loading forecast...");
            }
        }
    });

    controller.submit_query(location).await;
    let state = controller.snapshot();

    drop(controller);
    wait_for_progress(progress).await;

    match state.status() {
        ViewStatus::Results(records) if json => println!("{}", render::records_json(records)?),
        ViewStatus::Results(records) => print!("{}", render::records_text(records)),
        ViewStatus::Empty => println!("{EMPTY_PROMPT}"),
        ViewStatus::Error(message) => return Err(anyhow!("{message}")),
        ViewStatus::Loading => return Err(anyhow!("Query ended while still loading")),
    }

    Ok(())
}

/// Join the loading-line watcher. Returns `false` if it panicked or was cancelled.
async fn wait_for_progress(progress: JoinHandle<()>) -> bool {
    match progress.await {
        Ok(()) => true,
        Err(err) => {
            debug!(error = %err, "progress watcher ended abnormally");
            false
        }
    }
}
