//! Move scoring, loss penalty and clear bonus

use serde::{Deserialize, Serialize};

use crate::error::GridError;

/// Smallest group that counts as a move
pub const MIN_GROUP_SIZE: usize = 2;

/// Bonus for clearing the whole board
pub const CLEAR_BONUS: i64 = 1000;

/// Points for removing a group of `group_size` tiles: `(n - 2)^2`
pub fn points_for_move(group_size: usize) -> i64 {
    debug_assert!(group_size >= MIN_GROUP_SIZE, "singletons are not moves");
    let over = group_size.saturating_sub(2) as i64;
    over * over
}

/// Shape of the penalty applied when a level gets stuck
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PenaltyCurve {
    /// One point per remaining tile
    #[default]
    Linear,
    /// Square of the remaining tile count
    Quadratic,
}

impl PenaltyCurve {
    /// Nonnegative and increasing in `remaining`
    pub fn penalty(self, remaining: usize) -> i64 {
        let n = remaining as i64;
        match self {
            PenaltyCurve::Linear => n,
            PenaltyCurve::Quadratic => n.saturating_mul(n),
        }
    }
}

/// Scoring rules of a level
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringPolicy {
    /// Smallest group size accepted as a move
    pub min_group: usize,
    pub loss_penalty: PenaltyCurve,
    pub clear_bonus: i64,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            min_group: MIN_GROUP_SIZE,
            loss_penalty: PenaltyCurve::Linear,
            clear_bonus: CLEAR_BONUS,
        }
    }
}

impl ScoringPolicy {
    pub fn validate(&self) -> Result<(), GridError> {
        if self.min_group < MIN_GROUP_SIZE {
            return Err(GridError::InvalidConfig(format!(
                "minimum group size must be at least {}, got {}",
                MIN_GROUP_SIZE, self.min_group
            )));
        }
        if self.clear_bonus < 0 {
            return Err(GridError::InvalidConfig(format!(
                "clear bonus must be nonnegative, got {}",
                self.clear_bonus
            )));
        }
        Ok(())
    }

    pub fn is_move(&self, group_size: usize) -> bool {
        group_size >= self.min_group
    }

    pub fn points_for_move(&self, group_size: usize) -> i64 {
        points_for_move(group_size)
    }

    pub fn penalty_for_loss(&self, remaining: usize) -> i64 {
        self.loss_penalty.penalty(remaining)
    }
}
