#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs Castle Defence headless.

mod config;
mod session;

use std::path::PathBuf;

use anyhow::{Context, Result};
use castle_defence_core::{Bonuses, WELCOME_BANNER};
use castle_defence_system_campaign::{Campaign, FileStore};
use castle_defence_system_path_planning::{PathConfig, PathPlanner};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::SessionConfig;
use session::Session;

const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Parser)]
#[command(name = "castle-defence", version, about = "Headless Castle Defence sessions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Generates a path layout and prints it as JSON.
    Paths(PathsArgs),
    /// Runs a headless session and prints its summary as JSON.
    Simulate(SimulateArgs),
    /// Shows campaign progress or buys an unlockable.
    Campaign(CampaignArgs),
}

#[derive(Debug, Args)]
struct PathsArgs {
    /// Seed for path generation.
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Map width in pixels.
    #[arg(long, default_value_t = 1280.0)]
    width: f32,
    /// Map height in pixels.
    #[arg(long, default_value_t = 720.0)]
    height: f32,
}

#[derive(Debug, Args)]
struct SimulateArgs {
    /// TOML session config; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides the configured seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Overrides the configured wave cap.
    #[arg(long)]
    waves: Option<u32>,
    /// Campaign save directory; earned points are credited there.
    #[arg(long)]
    save_dir: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct CampaignArgs {
    /// Campaign save directory.
    #[arg(long)]
    save_dir: PathBuf,
    /// Identifier of the tower or skill to buy, e.g. `tower_frost`.
    #[arg(long, conflicts_with = "reset")]
    unlock: Option<String>,
    /// Discards all progress.
    #[arg(long)]
    reset: bool,
}

/// Entry point for the Castle Defence command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    info!("{WELCOME_BANNER}");

    match cli.command {
        Commands::Paths(args) => paths(&args),
        Commands::Simulate(args) => simulate(args),
        Commands::Campaign(args) => campaign(args),
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn paths(args: &PathsArgs) -> Result<()> {
    let layout = PathPlanner::from_seed(PathConfig::default(), args.seed)
        .generate_paths(args.width, args.height)
        .with_context(|| format!("failed to generate paths for a {}x{} map", args.width, args.height))?;
    println!("{}", serde_json::to_string_pretty(&layout)?);
    Ok(())
}

fn simulate(args: SimulateArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(waves) = args.waves {
        config.waves = waves;
    }

    let mut campaign = args
        .save_dir
        .map(|dir| Campaign::open(FileStore::new(dir)))
        .transpose()
        .context("failed to open campaign save")?;
    let (bonuses, unlocked_towers) = match &campaign {
        Some(campaign) => (
            campaign.progress().bonuses(),
            campaign.progress().unlocked_towers().collect(),
        ),
        None => (Bonuses::default(), Vec::new()),
    };

    let summary = Session::new(config, bonuses, unlocked_towers)?.run();
    if let Some(campaign) = campaign.as_mut() {
        campaign
            .award(summary.campaign_points)
            .context("failed to save campaign progress")?;
        info!(
            earned = summary.campaign_points,
            available = campaign.progress().campaign_points(),
            "campaign points credited"
        );
    }

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn campaign(args: CampaignArgs) -> Result<()> {
    let mut campaign = Campaign::open(FileStore::new(args.save_dir))
        .context("failed to open campaign save")?;
    if args.reset {
        campaign.reset().context("failed to reset campaign")?;
    }
    if let Some(id) = args.unlock {
        let _ = campaign
            .unlock(&id)
            .with_context(|| format!("failed to unlock `{id}`"))?;
    }

    println!(
        "{}",
        serde_json::to_string_pretty(&campaign.progress().statistics())?
    );
    Ok(())
}
