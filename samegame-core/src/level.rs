//! Level - one game on one grid
//!
//! Turns player input into moves: resolve the clicked cell, select its group,
//! reject groups that are too small, score, remove and compact, then
//! re-evaluate the level state. The first terminal state settles the level
//! once (clear bonus or loss penalty); input after that is ignored.

use serde::{Deserialize, Serialize};

use crate::config::LevelConfig;
use crate::connectivity::select_group;
use crate::error::GridError;
use crate::grid::{CellIndex, Geometry, Grid, Point};
use crate::layout::Layout;
use crate::presenter::Presenter;
use crate::scoring::ScoringPolicy;
use crate::state::{evaluate_for, LevelState};

// ============================================================================
// OUTCOMES
// ============================================================================

/// How a finished level was scored
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Settlement {
    Won { bonus: i64 },
    Lost { remaining: usize, penalty: i64 },
}

/// A move that removed tiles
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveReport {
    /// Cell that was selected
    pub index: CellIndex,
    /// Tiles removed
    pub removed: usize,
    /// Points gained by the move (before settlement)
    pub points: i64,
    /// Level state after the move
    pub state: LevelState,
    /// Set when this move ended the level
    pub settlement: Option<Settlement>,
}

/// Result of a player click
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectOutcome {
    /// Outside the grid or on an empty cell
    Missed,
    /// Group too small to be a move
    Rejected { index: CellIndex, size: usize },
    Removed(MoveReport),
    /// The level has already been settled
    Finished,
}

// ============================================================================
// LEVEL
// ============================================================================

/// A running level: grid, score and state
pub struct Level<P: Presenter> {
    grid: Grid<P>,
    scoring: ScoringPolicy,
    score: i64,
    state: LevelState,
    moves: u32,
    settlement: Option<Settlement>,
}

impl<P: Presenter> Level<P> {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    /// Create a level with a random layout from the config's seed
    pub fn new(config: &LevelConfig, presenter: P) -> Result<Self, GridError> {
        config.validate()?;
        let layout = config.generate_layout();
        Self::from_layout(&layout, config.geometry(), config.scoring, presenter)
    }

    /// Create a level from an explicit layout
    pub fn from_layout(
        layout: &Layout,
        geometry: Geometry,
        scoring: ScoringPolicy,
        presenter: P,
    ) -> Result<Self, GridError> {
        scoring.validate()?;
        let grid = Grid::from_layout(layout, geometry, presenter)?;
        let state = evaluate_for(&grid, scoring.min_group);

        let mut level = Self {
            grid,
            scoring,
            score: 0,
            state,
            moves: 0,
            settlement: None,
        };

        tracing::info!(
            "Level started: {}x{}, {} tiles, {:?}",
            level.grid.width(),
            level.grid.height(),
            level.grid.occupied_count(),
            state
        );
        level.settle_if_terminal();

        Ok(level)
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn grid(&self) -> &Grid<P> {
        &self.grid
    }

    /// Mutable access to the visual collaborator (e.g. to drain recorded events)
    pub fn presenter_mut(&mut self) -> &mut P {
        self.grid.presenter_mut()
    }

    pub fn scoring(&self) -> &ScoringPolicy {
        &self.scoring
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    /// Adjust the score from outside the rules (e.g. a front-end bonus)
    pub fn add_points(&mut self, delta: i64) {
        self.score += delta;
    }

    pub fn state(&self) -> LevelState {
        self.state
    }

    /// Number of accepted moves so far
    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn settlement(&self) -> Option<Settlement> {
        self.settlement
    }

    pub fn is_finished(&self) -> bool {
        self.settlement.is_some()
    }

    // ========================================================================
    // PLAYER INPUT
    // ========================================================================

    /// Cell under the cursor, for highlighting. `None` when outside the grid.
    pub fn on_hover(&self, point: Point) -> Option<CellIndex> {
        self.grid.cell_index_of(point)
    }

    /// The group a click at `point` would remove; empty if it is not a move
    pub fn hover_group(&self, point: Point) -> Vec<CellIndex> {
        if self.is_finished() {
            return Vec::new();
        }
        self.on_hover(point)
            .and_then(|index| self.check_move(index).ok())
            .unwrap_or_default()
    }

    /// Handle a click at a world-space position
    pub fn on_player_select(&mut self, point: Point) -> SelectOutcome {
        if self.is_finished() {
            return SelectOutcome::Finished;
        }
        match self.grid.cell_index_of(point) {
            Some(index) => self.select_index(index),
            None => {
                tracing::trace!("Click at ({}, {}) is outside the grid", point.x, point.y);
                SelectOutcome::Missed
            }
        }
    }

    /// Handle a click on a resolved cell index
    pub fn select_index(&mut self, index: CellIndex) -> SelectOutcome {
        if self.is_finished() {
            return SelectOutcome::Finished;
        }

        let group = match self.check_move(index) {
            Ok(group) => group,
            Err(GridError::DegenerateSelection { index, size, .. }) => {
                tracing::debug!("Rejected group of {} at cell {}", size, index);
                return SelectOutcome::Rejected { index, size };
            }
            Err(e) => {
                tracing::trace!("Ignored click: {}", e);
                return SelectOutcome::Missed;
            }
        };

        let compaction = match self.grid.remove_and_compact(&group) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!("Level::select_index -> {}", e);
                return SelectOutcome::Missed;
            }
        };

        let points = self.scoring.points_for_move(compaction.removed);
        self.score += points;
        self.moves += 1;
        self.state = evaluate_for(&self.grid, self.scoring.min_group);

        tracing::debug!(
            "Move {}: removed {} at cell {} for {} points, {:?}",
            self.moves,
            compaction.removed,
            index,
            points,
            self.state
        );

        let settlement = self.settle_if_terminal();

        SelectOutcome::Removed(MoveReport {
            index,
            removed: compaction.removed,
            points,
            state: self.state,
            settlement,
        })
    }

    /// The group at `index` if selecting it is a legal move
    pub fn check_move(&self, index: CellIndex) -> Result<Vec<CellIndex>, GridError> {
        if !self.grid.is_valid(index) {
            return Err(GridError::OutOfRange {
                index,
                len: self.grid.len(),
            });
        }

        let group = select_group(&self.grid, index);
        if group.is_empty() {
            return Err(GridError::EmptyCell(index));
        }
        if !self.scoring.is_move(group.len()) {
            return Err(GridError::DegenerateSelection {
                index,
                size: group.len(),
                min: self.scoring.min_group,
            });
        }

        Ok(group)
    }

    // ========================================================================
    // SETTLEMENT AND TEARDOWN
    // ========================================================================

    /// Apply the clear bonus or loss penalty the first time the level is terminal
    fn settle_if_terminal(&mut self) -> Option<Settlement> {
        if self.settlement.is_some() {
            return None;
        }

        let settlement = match self.state {
            LevelState::Playable => return None,
            LevelState::Cleared => {
                let bonus = self.scoring.clear_bonus;
                self.score += bonus;
                tracing::info!("*** You Solved it! *** Score: {}", self.score);
                Settlement::Won { bonus }
            }
            LevelState::Stuck => {
                let remaining = self.grid.occupied_count();
                let penalty = self.scoring.penalty_for_loss(remaining);
                self.score -= penalty;
                tracing::info!(
                    "*** No more moves possible! *** {} tiles left, score: {}",
                    remaining,
                    self.score
                );
                Settlement::Lost { remaining, penalty }
            }
        };

        self.settlement = Some(settlement);
        Some(settlement)
    }

    /// End the level: release every visual and hand the presenter back
    pub fn destroy(mut self) -> P {
        let released = self.grid.release_all();
        tracing::debug!("Level destroyed, released {} visuals", released);
        self.grid.into_presenter()
    }
}

// ============================================================================
// TESTS
// ============================================================================
