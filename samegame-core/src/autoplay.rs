//! Autoplay - scripted players for benchmarks and tests
//!
//! A strategy picks one legal group per turn; `play_out` drives a level
//! through `Level::select_index` until it settles or runs out of moves.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::connectivity::legal_groups;
use crate::grid::{CellIndex, Grid};
use crate::level::{Level, SelectOutcome};
use crate::presenter::Presenter;
use crate::state::LevelState;

/// How a scripted player chooses its next group
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Group containing the lowest occupied index
    First,
    Largest,
    Smallest,
    /// Uniformly random legal group
    Random,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [Strategy::First, Strategy::Largest, Strategy::Smallest, Strategy::Random];

    pub fn name(self) -> &'static str {
        match self {
            Strategy::First => "first",
            Strategy::Largest => "largest",
            Strategy::Smallest => "smallest",
            Strategy::Random => "random",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name().eq_ignore_ascii_case(name))
    }

    /// Pick a cell of the chosen group, `None` when no legal group exists.
    /// Ties go to the group with the lowest index.
    pub fn choose<P: Presenter, R: Rng>(self, grid: &Grid<P>, min_group: usize, rng: &mut R) -> Option<CellIndex> {
        let groups = legal_groups(grid, min_group);
        let group = match self {
            Strategy::First => groups.first(),
            Strategy::Largest => groups.iter().rev().max_by_key(|g| g.len()),
            Strategy::Smallest => groups.iter().min_by_key(|g| g.len()),
            Strategy::Random => groups.choose(rng),
        }?;
        group.first().copied()
    }
}

/// Result of an automated play-out
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaySummary {
    pub moves: u32,
    pub score: i64,
    pub state: LevelState,
    /// Tiles left on the board
    pub remaining: usize,
}

/// Play until the level settles or `max_moves` moves have been made
pub fn play_out<P: Presenter, R: Rng>(
    level: &mut Level<P>,
    strategy: Strategy,
    rng: &mut R,
    max_moves: u32,
) -> PlaySummary {
    let min_group = level.scoring().min_group;
    let mut played = 0;

    while played < max_moves && !level.is_finished() {
        let Some(index) = strategy.choose(level.grid(), min_group, rng) else {
            break;
        };
        match level.select_index(index) {
            SelectOutcome::Removed(_) => played += 1,
            outcome => {
                tracing::warn!("play_out: {} chose cell {} but got {:?}", strategy.name(), index, outcome);
                break;
            }
        }
    }

    PlaySummary {
        moves: level.moves(),
        score: level.score(),
        state: level.state(),
        remaining: level.grid().occupied_count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LevelConfig;
    use crate::grid::Geometry;
    use crate::layout::Layout;
    use crate::presenter::NullPresenter;
    use crate::scoring::ScoringPolicy;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn grid(text: &str) -> Grid<NullPresenter> {
        let layout: Layout = text.parse().unwrap();
        Grid::from_layout(&layout, Geometry::default(), NullPresenter).unwrap()
    }

    #[test]
    fn test_strategy_names() {
        for strategy in Strategy::ALL {
            assert_eq!(Strategy::from_name(strategy.name()), Some(strategy));
        }
        assert_eq!(Strategy::from_name("LARGEST"), Some(Strategy::Largest));
        assert_eq!(Strategy::from_name("greedy"), None);
    }

    #[test]
    fn test_choose() {
        // Groups: {0,3} (A), {1,2} (B), {4,6,7} (C)
        let g = grid("CCD\nACE\nABB");
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(Strategy::First.choose(&g, 2, &mut rng), Some(0));
        assert_eq!(Strategy::Largest.choose(&g, 2, &mut rng), Some(4));
        assert_eq!(Strategy::Smallest.choose(&g, 2, &mut rng), Some(0));
        let random = Strategy::Random.choose(&g, 2, &mut rng).unwrap();
        assert!([0, 1, 4].contains(&random));
        assert_eq!(Strategy::First.choose(&grid("AB\nBA"), 2, &mut rng), None);
    }

    #[test]
    fn test_play_out_settles() {
        let config = LevelConfig { width: 8, height: 8, tile_types: 3, seed: 5, ..LevelConfig::default() };
        for strategy in Strategy::ALL {
            let mut level = Level::new(&config, NullPresenter).unwrap();
            let mut rng = ChaCha8Rng::seed_from_u64(1);
            let summary = play_out(&mut level, strategy, &mut rng, 1000);
            assert!(summary.state.is_terminal(), "{:?} did not finish", strategy);
            assert!(level.is_finished());
            assert_eq!(summary.remaining, level.grid().occupied_count());
            assert!(level.grid().check_invariants().is_ok());
        }
    }

    #[test]
    fn test_play_out_respects_move_limit() {
        let layout: Layout = "AABB\nCCDD".parse().unwrap();
        let mut level =
            Level::from_layout(&layout, Geometry::default(), ScoringPolicy::default(), NullPresenter).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let summary = play_out(&mut level, Strategy::First, &mut rng, 1);
        assert_eq!(summary.moves, 1);
        assert_eq!(summary.remaining, 6);
        assert_eq!(summary.state, LevelState::Playable);
    }

    #[test]
    fn test_play_out_is_deterministic() {
        let config = LevelConfig { width: 10, height: 10, tile_types: 4, seed: 12, ..LevelConfig::default() };
        let run = || {
            let mut level = Level::new(&config, NullPresenter).unwrap();
            let mut rng = ChaCha8Rng::seed_from_u64(3);
            play_out(&mut level, Strategy::Random, &mut rng, u32::MAX)
        };
        assert_eq!(run(), run());
    }
}
