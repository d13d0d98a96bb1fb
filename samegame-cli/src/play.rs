//! Play command - interactive level on the terminal
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: create_level(), run_session()
//! - Level 3: parse_command(), execute(), report_outcome()
//! - Level 4: board rendering, presenter event formatting

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use samegame_core::{
    Geometry, Layout, Level, LevelConfig, Point, PresenterEvent, RecordingPresenter, SelectOutcome, Settlement,
};

use crate::LevelArgs;

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct PlayArgs {
    #[command(flatten)]
    pub level: LevelArgs,

    /// Text layout file (one line per row, top row first) instead of a random level
    #[arg(long, value_name = "FILE")]
    pub layout: Option<PathBuf>,

    /// Print every presenter call (spawn, move, release)
    #[arg(long)]
    pub visuals: bool,
}

/// One line of player input
#[derive(Clone, Copy, Debug, PartialEq)]
enum Command {
    /// Click at a world-space position
    Click(Point),
    /// Click the centre of a cell
    Cell { col: usize, row: usize },
    Hover(Point),
    Show,
    Help,
    Quit,
}

const HELP: &str = "Commands:
  X Y            click at world position (X, Y)
  cell COL ROW   click the cell at column COL, row ROW (row 0 is the bottom)
  hover X Y      show the group under world position (X, Y)
  show           print the board
  help           print this help
  quit           leave the game";

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run play command
///
/// 1. Build the level from the config (or a layout file)
/// 2. Run the input loop on stdin/stdout
pub fn run(args: PlayArgs, config: LevelConfig) -> Result<()> {
    let mut level = create_level(&args, &config)?;

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    run_session(&mut level, stdin.lock(), &mut out, args.visuals)?;

    level.destroy();
    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Create the level with a recording presenter standing in for the renderer
fn create_level(args: &PlayArgs, config: &LevelConfig) -> Result<Level<RecordingPresenter>> {
    let level = match &args.layout {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read layout: {}", path.display()))?;
            let layout: Layout = text
                .parse()
                .with_context(|| format!("Failed to parse layout: {}", path.display()))?;
            tracing::info!(
                "Loaded {}x{} layout with {} tile types from {}",
                layout.width(),
                layout.height(),
                layout.tile_type_bound(),
                path.display()
            );
            let geometry = match config.origin {
                Some(origin) => Geometry::new(origin, config.cell_size),
                None => Geometry::centered(layout.width(), layout.height(), config.cell_size),
            };
            Level::from_layout(&layout, geometry, config.scoring, RecordingPresenter::new())?
        }
        None => {
            tracing::info!("Level seed: {}", config.seed);
            Level::new(config, RecordingPresenter::new())?
        }
    };
    Ok(level)
}

/// Read commands until the player quits, input ends or the level is over
pub fn run_session<R: BufRead, W: Write>(
    level: &mut Level<RecordingPresenter>,
    input: R,
    out: &mut W,
    show_visuals: bool,
) -> Result<()> {
    if show_visuals {
        write_events(out, level.grid().presenter().events())?;
    }
    level.presenter_mut().clear_events();
    write_board(out, level)?;

    if let Some(settlement) = level.settlement() {
        write_settlement(out, settlement, level.score())?;
        return Ok(());
    }
    writeln!(out, "Type 'help' for commands.")?;

    for line in input.lines() {
        let line = line.context("Failed to read input")?;
        if line.trim().is_empty() {
            continue;
        }

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(message) => {
                writeln!(out, "{}", message)?;
                continue;
            }
        };

        if command == Command::Quit {
            writeln!(out, "Final score: {}", level.score())?;
            break;
        }

        execute(level, command, out, show_visuals)?;

        if level.is_finished() {
            break;
        }
    }

    Ok(())
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

/// Parse one input line
fn parse_command(line: &str) -> Result<Command, String> {
    let words: Vec<&str> = line.split_whitespace().collect();

    match words.as_slice() {
        ["quit"] | ["q"] | ["exit"] => Ok(Command::Quit),
        ["show"] => Ok(Command::Show),
        ["help"] | ["?"] => Ok(Command::Help),
        ["cell", col, row] => Ok(Command::Cell {
            col: parse_number(col)?,
            row: parse_number(row)?,
        }),
        ["hover", x, y] => Ok(Command::Hover(Point::new(parse_number(x)?, parse_number(y)?))),
        [x, y] => Ok(Command::Click(Point::new(parse_number(x)?, parse_number(y)?))),
        _ => Err(format!("Unknown command: '{}' (type 'help')", line.trim())),
    }
}

/// Apply a command to the level and print the result
fn execute<W: Write>(
    level: &mut Level<RecordingPresenter>,
    command: Command,
    out: &mut W,
    show_visuals: bool,
) -> Result<()> {
    match command {
        Command::Click(point) => {
            let outcome = level.on_player_select(point);
            report_outcome(level, outcome, out, show_visuals)?;
        }
        Command::Cell { col, row } => {
            let outcome = match level.grid().index_of(col, row) {
                Some(index) => level.select_index(index),
                None => SelectOutcome::Missed,
            };
            report_outcome(level, outcome, out, show_visuals)?;
        }
        Command::Hover(point) => match level.on_hover(point) {
            None => writeln!(out, "Outside the grid")?,
            Some(index) => {
                let (col, row) = level.grid().coords(index);
                let group = level.hover_group(point);
                if group.is_empty() {
                    writeln!(out, "Cell ({}, {}): no move", col, row)?;
                } else {
                    writeln!(
                        out,
                        "Cell ({}, {}): removes {} tiles for {} points",
                        col,
                        row,
                        group.len(),
                        level.scoring().points_for_move(group.len())
                    )?;
                }
            }
        },
        Command::Show => write_board(out, level)?,
        Command::Help => writeln!(out, "{}", HELP)?,
        Command::Quit => {}
    }
    Ok(())
}

/// Print what a click did
fn report_outcome<W: Write>(
    level: &mut Level<RecordingPresenter>,
    outcome: SelectOutcome,
    out: &mut W,
    show_visuals: bool,
) -> Result<()> {
    match outcome {
        SelectOutcome::Missed => writeln!(out, "No tile there")?,
        SelectOutcome::Rejected { size, .. } => {
            writeln!(out, "Group of {} is too small (need {})", size, level.scoring().min_group)?
        }
        SelectOutcome::Finished => writeln!(out, "The level is over")?,
        SelectOutcome::Removed(report) => {
            writeln!(out, "Removed {} tiles (+{} points)", report.removed, report.points)?;
            if show_visuals {
                write_events(out, level.grid().presenter().events())?;
            }
            level.presenter_mut().clear_events();
            write_board(out, level)?;
            if let Some(settlement) = report.settlement {
                write_settlement(out, settlement, level.score())?;
            }
        }
    }
    Ok(())
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

fn parse_number<T: std::str::FromStr>(word: &str) -> Result<T, String> {
    word.parse().map_err(|_| format!("Not a number: '{}'", word))
}

/// Board with column digits on top and row numbers on the left
fn render_board(layout: &Layout) -> String {
    let label_width = layout.height().saturating_sub(1).to_string().len();
    let digits: String = (0..layout.width()).map(|c| char::from(b'0' + (c % 10) as u8)).collect();

    let mut text = format!("{:>w$} {}\n", "", digits, w = label_width);
    for (line, row_text) in layout.to_string().lines().enumerate() {
        let row = layout.height() - 1 - line;
        text.push_str(&format!("{:>w$} {}\n", row, row_text, w = label_width));
    }
    text
}

fn write_board<W: Write>(out: &mut W, level: &Level<RecordingPresenter>) -> Result<()> {
    write!(out, "{}", render_board(&level.grid().layout()))?;
    writeln!(
        out,
        "Score: {} | Moves: {} | {:?}",
        level.score(),
        level.moves(),
        level.state()
    )?;
    Ok(())
}

fn write_settlement<W: Write>(out: &mut W, settlement: Settlement, score: i64) -> Result<()> {
    match settlement {
        Settlement::Won { bonus } => {
            writeln!(out, "*** You Solved it! ***")?;
            writeln!(out, "Bonus: +{}", bonus)?;
        }
        Settlement::Lost { remaining, penalty } => {
            writeln!(out, "*** No more moves possible! ***")?;
            writeln!(out, "{} tiles left, penalty: -{}", remaining, penalty)?;
        }
    }
    writeln!(out, "Final score: {}", score)?;
    Ok(())
}

fn write_events<W: Write>(out: &mut W, events: &[PresenterEvent]) -> Result<()> {
    for event in events {
        match event {
            PresenterEvent::Spawned { id, tile, center } => {
                writeln!(out, "  spawn #{} type {} at ({:.2}, {:.2})", id, tile, center.x, center.y)?
            }
            PresenterEvent::Moved { id, center } => {
                writeln!(out, "  move #{} to ({:.2}, {:.2})", id, center.x, center.y)?
            }
            PresenterEvent::Released { id } => writeln!(out, "  release #{}", id)?,
        }
    }
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
