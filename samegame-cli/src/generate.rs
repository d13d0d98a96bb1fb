//! Generate command - write a level configuration
//!
//! The config (size, tile set, seed, scoring) fully determines the level, so
//! the written file replays the same board with `samegame --config FILE play`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use samegame_core::{
    evaluate_for, legal_groups, Grid, LevelConfig, LevelState, NullPresenter, PenaltyCurve,
};

use crate::LevelArgs;

#[derive(Args)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub level: LevelArgs,

    /// Output JSON file (stdout if omitted)
    #[arg(long, short, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Loss penalty curve: linear or quadratic
    #[arg(long, value_parser = parse_penalty)]
    pub penalty: Option<PenaltyCurve>,

    /// Print the generated layout
    #[arg(long)]
    pub show: bool,

    /// Also write the layout in text form
    #[arg(long, value_name = "FILE")]
    pub layout_output: Option<PathBuf>,
}

/// Run generate command
pub fn run(args: GenerateArgs, mut config: LevelConfig) -> Result<()> {
    if let Some(penalty) = args.penalty {
        config.scoring.loss_penalty = penalty;
    }

    match &args.output {
        Some(path) => {
            config
                .save(path)
                .with_context(|| format!("Failed to write level config: {}", path.display()))?;
            tracing::info!("Saved level config to {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&config)?),
    }

    if args.show || args.layout_output.is_some() {
        let preview = describe_layout(&config)?;
        if args.show {
            eprintln!("{}", preview);
        }
        if let Some(path) = &args.layout_output {
            std::fs::write(path, format!("{}\n", config.generate_layout()))
                .with_context(|| format!("Failed to write layout: {}", path.display()))?;
            tracing::info!("Saved layout to {}", path.display());
        }
    }

    Ok(())
}

/// Layout text followed by a one-line summary of the starting position
fn describe_layout(config: &LevelConfig) -> Result<String> {
    let layout = config.generate_layout();
    let grid = Grid::from_layout(&layout, config.geometry(), NullPresenter)?;
    let groups = legal_groups(&grid, config.scoring.min_group);
    let largest = groups.iter().map(Vec::len).max().unwrap_or(0);

    let status = match evaluate_for(&grid, config.scoring.min_group) {
        LevelState::Playable => format!("{} legal groups, largest {}", groups.len(), largest),
        LevelState::Stuck => "no legal moves".to_string(),
        LevelState::Cleared => "empty board".to_string(),
    };

    Ok(format!("{}\nSeed {}: {}", layout, config.seed, status))
}

fn parse_penalty(name: &str) -> Result<PenaltyCurve, String> {
    match name.to_ascii_lowercase().as_str() {
        "linear" => Ok(PenaltyCurve::Linear),
        "quadratic" => Ok(PenaltyCurve::Quadratic),
        _ => Err(format!("unknown penalty curve '{}' (expected linear or quadratic)", name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_penalty() {
        assert_eq!(parse_penalty("Quadratic"), Ok(PenaltyCurve::Quadratic));
        assert_eq!(parse_penalty("linear"), Ok(PenaltyCurve::Linear));
        assert!(parse_penalty("cubic").is_err());
    }

    #[test]
    fn test_describe_layout() {
        let config = LevelConfig {
            width: 4,
            height: 3,
            tile_types: 1,
            ..LevelConfig::default()
        };
        let text = describe_layout(&config).unwrap();
        assert!(text.starts_with("AAAA\nAAAA\nAAAA\n"));
        assert!(text.ends_with("Seed 0: 1 legal groups, largest 12"));
    }

    #[test]
    fn test_run_writes_config_and_layout() {
        let dir = std::env::temp_dir();
        let config_path = dir.join(format!("samegame-generate-{}.json", std::process::id()));
        let layout_path = dir.join(format!("samegame-generate-{}.txt", std::process::id()));
        let config = LevelConfig {
            width: 5,
            height: 4,
            tile_types: 3,
            seed: 8,
            ..LevelConfig::default()
        };
        let args = GenerateArgs {
            level: LevelArgs::default(),
            output: Some(config_path.clone()),
            penalty: Some(PenaltyCurve::Quadratic),
            show: false,
            layout_output: Some(layout_path.clone()),
        };

        run(args, config.clone()).unwrap();

        let loaded = LevelConfig::load(&config_path).unwrap();
        let layout_text = std::fs::read_to_string(&layout_path).unwrap();
        std::fs::remove_file(&config_path).ok();
        std::fs::remove_file(&layout_path).ok();

        assert_eq!(loaded.seed, 8);
        assert_eq!(loaded.scoring.loss_penalty, PenaltyCurve::Quadratic);
        let layout: samegame_core::Layout = layout_text.parse().unwrap();
        assert_eq!(layout, config.generate_layout());
    }
}
