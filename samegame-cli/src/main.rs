//! SameGame CLI - Command-line interface
//!
//! Commands:
//! - play: Play a level interactively on the terminal
//! - bench: Compare autoplay strategies over many seeded levels
//! - generate: Write a level configuration (and preview its layout)

mod bench;
mod generate;
mod play;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use samegame_core::{LevelConfig, TileType};

#[derive(Parser)]
#[command(name = "samegame")]
#[command(about = "SameGame tile-matching puzzle", version)]
struct Cli {
    /// Random seed (overrides the config file)
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Level configuration JSON file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a level in the terminal
    Play(play::PlayArgs),
    /// Benchmark autoplay strategies
    Bench(bench::BenchArgs),
    /// Generate a level configuration
    Generate(generate::GenerateArgs),
}

/// Level overrides shared by every command
#[derive(Args, Clone, Debug, Default)]
pub struct LevelArgs {
    /// Cells per row
    #[arg(long)]
    pub width: Option<usize>,

    /// Cells per column
    #[arg(long)]
    pub height: Option<usize>,

    /// Number of tile types
    #[arg(long)]
    pub tile_types: Option<TileType>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Play(args) => {
            let config = resolve_config(cli.config.as_deref(), &args.level, cli.seed)?;
            play::run(args, config)
        }
        Commands::Bench(args) => {
            let config = resolve_config(cli.config.as_deref(), &args.level, cli.seed)?;
            bench::run(args, config)
        }
        Commands::Generate(args) => {
            let config = resolve_config(cli.config.as_deref(), &args.level, cli.seed)?;
            generate::run(args, config)
        }
    }
}

/// Install the tracing subscriber; `RUST_LOG` wins over `--verbose`
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Build the level config: file (or defaults), then command-line overrides.
/// Without a seed from either source a fresh one is drawn and logged.
fn resolve_config(path: Option<&Path>, level: &LevelArgs, seed: Option<u64>) -> Result<LevelConfig> {
    let mut config = match path {
        Some(path) => LevelConfig::load(path)?,
        None => LevelConfig::default(),
    };

    if let Some(width) = level.width {
        config.width = width;
    }
    if let Some(height) = level.height {
        config.height = height;
    }
    if let Some(tile_types) = level.tile_types {
        config.tile_types = tile_types;
    }

    match (seed, path) {
        (Some(seed), _) => config.seed = seed,
        (None, None) => {
            config.seed = rand::random();
            tracing::info!("Using random seed {}", config.seed);
        }
        (None, Some(_)) => {}
    }

    config.validate().context("Invalid level configuration")?;
    Ok(config)
}
