//! Bench command - compare autoplay strategies over seeded levels
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: run_strategy(), report_results()
//! - Level 3: play_single_level(), compute_statistics()
//! - Level 4: seeding, timing and formatting utilities

use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use samegame_core::{play_out, Level, LevelConfig, LevelState, NullPresenter, PlaySummary, Strategy};

use crate::LevelArgs;

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct BenchArgs {
    #[command(flatten)]
    pub level: LevelArgs,

    /// Number of levels per strategy
    #[arg(long, default_value = "100")]
    pub games: usize,

    /// Strategy to run (repeatable; default: all)
    #[arg(long = "strategy", value_parser = parse_strategy)]
    pub strategies: Vec<Strategy>,

    /// Maximum moves per level
    #[arg(long, default_value = "10000")]
    pub max_moves: u32,

    /// Hide the progress bar
    #[arg(long)]
    pub quiet: bool,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Aggregated results of one strategy
#[derive(Clone, Debug)]
struct StrategyResult {
    name: String,
    games: usize,
    cleared: usize,
    stuck: usize,
    avg_score: f64,
    best_score: i64,
    avg_moves: f64,
    avg_remaining: f64,
    total_time: Duration,
    games_per_second: f64,
}

/// All benchmark results
#[derive(Clone, Debug)]
struct AllResults {
    results: Vec<StrategyResult>,
    board: String,
    base_seed: u64,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run bench command
///
/// 1. Play every requested strategy on the same seeded levels
/// 2. Report all results
pub fn run(args: BenchArgs, config: LevelConfig) -> Result<()> {
    let strategies = if args.strategies.is_empty() {
        Strategy::ALL.to_vec()
    } else {
        args.strategies.clone()
    };

    tracing::info!(
        "Starting bench: {} levels of {}x{} ({} types), base seed {}",
        args.games,
        config.width,
        config.height,
        config.tile_types,
        config.seed
    );

    let mut all_results = AllResults {
        results: Vec::with_capacity(strategies.len()),
        board: format!("{}x{}, {} tile types", config.width, config.height, config.tile_types),
        base_seed: config.seed,
    };

    for strategy in strategies {
        let result = run_strategy(strategy, &config, &args)?;
        all_results.results.push(result);
    }

    report_results(&all_results, &args);

    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Play `args.games` levels with one strategy, in parallel
fn run_strategy(strategy: Strategy, config: &LevelConfig, args: &BenchArgs) -> Result<StrategyResult> {
    tracing::info!("Benchmarking strategy '{}'...", strategy.name());

    let progress = create_progress_bar(args.games as u64, strategy, args.quiet);
    let start = Instant::now();

    let summaries = (0..args.games)
        .into_par_iter()
        .map(|game_index| {
            let summary = play_single_level(strategy, config, game_index, args.max_moves);
            progress.inc(1);
            summary
        })
        .collect::<Result<Vec<_>>>()?;

    let elapsed = start.elapsed();
    progress.finish_and_clear();

    Ok(compute_statistics(strategy.name(), &summaries, elapsed))
}

/// Report benchmark results
fn report_results(results: &AllResults, args: &BenchArgs) {
    if args.json {
        print_json_results(results);
    } else {
        print_text_results(results);
    }
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

/// Play one level to the end
fn play_single_level(strategy: Strategy, config: &LevelConfig, game_index: usize, max_moves: u32) -> Result<PlaySummary> {
    let seed = level_seed(config.seed, game_index);
    let level_config = config.clone().with_seed(seed);
    let mut level = Level::new(&level_config, NullPresenter)?;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let summary = play_out(&mut level, strategy, &mut rng, max_moves);
    tracing::debug!(
        "{} level {} (seed {}): {:?} in {} moves, score {}",
        strategy.name(),
        game_index,
        seed,
        summary.state,
        summary.moves,
        summary.score
    );

    Ok(summary)
}

/// Aggregate play-outs of one strategy
fn compute_statistics(name: &str, summaries: &[PlaySummary], total_time: Duration) -> StrategyResult {
    let games = summaries.len();
    let n = games.max(1) as f64;

    let cleared = summaries.iter().filter(|s| s.state == LevelState::Cleared).count();
    let stuck = summaries.iter().filter(|s| s.state == LevelState::Stuck).count();
    let total_score: i64 = summaries.iter().map(|s| s.score).sum();
    let total_moves: u64 = summaries.iter().map(|s| s.moves as u64).sum();
    let total_remaining: usize = summaries.iter().map(|s| s.remaining).sum();

    let secs = total_time.as_secs_f64();
    let games_per_second = if secs > 0.0 { games as f64 / secs } else { 0.0 };

    StrategyResult {
        name: name.to_string(),
        games,
        cleared,
        stuck,
        avg_score: total_score as f64 / n,
        best_score: summaries.iter().map(|s| s.score).max().unwrap_or(0),
        avg_moves: total_moves as f64 / n,
        avg_remaining: total_remaining as f64 / n,
        total_time,
        games_per_second,
    }
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

/// Seed of the `game_index`-th level; identical across strategies
fn level_seed(base_seed: u64, game_index: usize) -> u64 {
    base_seed.wrapping_add(game_index as u64)
}

fn parse_strategy(name: &str) -> Result<Strategy, String> {
    Strategy::from_name(name).ok_or_else(|| {
        let known: Vec<&str> = Strategy::ALL.iter().map(|s| s.name()).collect();
        format!("unknown strategy '{}' (expected one of: {})", name, known.join(", "))
    })
}

fn create_progress_bar(len: u64, strategy: Strategy, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len);
    match ProgressStyle::with_template("{prefix:>10} [{bar:40}] {pos}/{len} ({eta})") {
        Ok(style) => bar.set_style(style.progress_chars("=> ")),
        Err(e) => tracing::warn!("Progress bar template rejected: {}", e),
    }
    bar.set_prefix(strategy.name());
    bar
}

/// Short human-readable duration; benchmark runs never reach minutes
fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs >= 1.0 {
        format!("{:.2}s", secs)
    } else if secs >= 1e-3 {
        format!("{:.1}ms", secs * 1e3)
    } else {
        format!("{:.0}us", secs * 1e6)
    }
}

/// Print results as JSON
fn print_json_results(results: &AllResults) {
    #[derive(serde::Serialize)]
    struct JsonStrategy {
        strategy: String,
        games: usize,
        cleared: usize,
        stuck: usize,
        avg_score: f64,
        best_score: i64,
        avg_moves: f64,
        avg_remaining: f64,
        total_time_ms: u64,
        games_per_second: f64,
    }

    #[derive(serde::Serialize)]
    struct JsonOutput {
        board: String,
        base_seed: u64,
        strategies: Vec<JsonStrategy>,
    }

    let output = JsonOutput {
        board: results.board.clone(),
        base_seed: results.base_seed,
        strategies: results
            .results
            .iter()
            .map(|r| JsonStrategy {
                strategy: r.name.clone(),
                games: r.games,
                cleared: r.cleared,
                stuck: r.stuck,
                avg_score: r.avg_score,
                best_score: r.best_score,
                avg_moves: r.avg_moves,
                avg_remaining: r.avg_remaining,
                total_time_ms: r.total_time.as_millis() as u64,
                games_per_second: r.games_per_second,
            })
            .collect(),
    };

    match serde_json::to_string_pretty(&output) {
        Ok(json) => println!("{}", json),
        Err(e) => tracing::warn!("Failed to serialize results: {}", e),
    }
}

/// Print results as text table
fn print_text_results(results: &AllResults) {
    println!("\n=== SameGame Strategy Benchmark ===");
    println!("Board: {}, base seed {}\n", results.board, results.base_seed);

    println!(
        "{:<10} {:>7} {:>8} {:>10} {:>8} {:>8} {:>10} {:>10}",
        "Strategy", "Games", "Cleared", "Avg Score", "Best", "Moves", "Left", "Time"
    );
    println!("{}", "-".repeat(80));

    for r in &results.results {
        println!(
            "{:<10} {:>7} {:>7.1}% {:>10.1} {:>8} {:>8.1} {:>10.1} {:>10}",
            r.name,
            r.games,
            100.0 * r.cleared as f64 / r.games.max(1) as f64,
            r.avg_score,
            r.best_score,
            r.avg_moves,
            r.avg_remaining,
            format_duration(r.total_time)
        );
    }

    if let Some(best) = results
        .results
        .iter()
        .max_by(|a, b| a.avg_score.total_cmp(&b.avg_score))
    {
        println!("\nBest average score: {} ({:.1})", best.name, best.avg_score);
    }
}

// ============================================================================
// TESTS
// ============================================================================
