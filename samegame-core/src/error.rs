//! Error types for grid operations and the presenter boundary

use crate::grid::CellIndex;

/// Errors raised by grid primitives and level construction
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("cell index {index} out of range (grid has {len} cells)")]
    OutOfRange { index: CellIndex, len: usize },

    #[error("column {column} out of range (grid has {width} columns)")]
    ColumnOutOfRange { column: usize, width: usize },

    #[error("cell {0} is empty")]
    EmptyCell(CellIndex),

    #[error("group of {size} at cell {index} is below the minimum move size {min}")]
    DegenerateSelection { index: CellIndex, size: usize, min: usize },

    #[error("grid invariant violated: {0}")]
    InvariantViolation(String),

    #[error("invalid level configuration: {0}")]
    InvalidConfig(String),

    #[error("could not spawn tile visual: {0}")]
    Spawn(#[from] PresenterError),
}

/// Failure reported by the visual collaborator. Never aborts a grid mutation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("presenter failure: {0}")]
pub struct PresenterError(pub String);

/// Errors raised while parsing a text layout
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("layout has no rows")]
    Empty,

    #[error("row {line} has {found} cells, expected {expected}")]
    Ragged { line: usize, expected: usize, found: usize },

    #[error("unknown tile character '{ch}' in row {line}")]
    InvalidChar { ch: char, line: usize },

    #[error("layout needs {expected} cells, got {found}")]
    CellCount { expected: usize, found: usize },
}
