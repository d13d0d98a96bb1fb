//! Coarse level state derived from the grid

use serde::{Deserialize, Serialize};

use crate::connectivity::legal_groups;
use crate::grid::Grid;
use crate::presenter::Presenter;
use crate::scoring::MIN_GROUP_SIZE;

/// Level state, recomputed from scratch after every player action
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LevelState {
    /// No tiles left
    Cleared,
    /// Tiles left but no two adjacent tiles share a type
    Stuck,
    /// At least one move remains
    Playable,
}

impl LevelState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, LevelState::Playable)
    }
}

/// Scan the whole grid. Each adjacent pair is tested once, from its left or
/// lower cell, by looking right and up.
pub fn evaluate<P: Presenter>(grid: &Grid<P>) -> LevelState {
    let mut any_tile = false;

    for (index, tile) in grid.tiles() {
        any_tile = true;

        let (col, row) = grid.coords(index);
        let right = grid.index_of(col + 1, row).and_then(|i| grid.tile(i));
        let up = grid.index_of(col, row + 1).and_then(|i| grid.tile(i));

        if right == Some(tile) || up == Some(tile) {
            return LevelState::Playable;
        }
    }

    if any_tile {
        LevelState::Stuck
    } else {
        LevelState::Cleared
    }
}

/// Like [`evaluate`], but a level needing groups of `min_group` or more is
/// stuck once no such group is left, even if equal pairs remain.
pub fn evaluate_for<P: Presenter>(grid: &Grid<P>, min_group: usize) -> LevelState {
    let state = evaluate(grid);
    if state == LevelState::Playable && min_group > MIN_GROUP_SIZE && legal_groups(grid, min_group).is_empty() {
        return LevelState::Stuck;
    }
    state
}
