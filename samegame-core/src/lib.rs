//! SameGame Core - Rules engine for the tile-matching puzzle
//!
//! This crate provides the game logic behind a SameGame level:
//! - Grid storage with gravity and column packing after removals
//! - Same-type group selection over the 4-neighbourhood
//! - Level state (cleared, stuck, playable) and scoring
//! - The level orchestrator turning clicks into moves
//! - The presenter boundary for tile visuals
//! - Scripted autoplay strategies

pub mod error;
pub mod presenter;
pub mod grid;
pub mod layout;
pub mod connectivity;
pub mod state;
pub mod scoring;
pub mod config;
pub mod level;
pub mod autoplay;

// Re-exports for convenient access
pub use error::{GridError, LayoutError, PresenterError};
pub use presenter::{Element, NullPresenter, Presenter, PresenterEvent, RecordingPresenter, VisualId};
pub use grid::{CellIndex, CellSize, Compaction, Geometry, Grid, Point, TileType};
pub use layout::{Layout, MAX_TILE_TYPES};
pub use connectivity::{legal_groups, select_group};
pub use state::{evaluate, evaluate_for, LevelState};
pub use scoring::{points_for_move, PenaltyCurve, ScoringPolicy, CLEAR_BONUS, MIN_GROUP_SIZE};
pub use config::LevelConfig;
pub use level::{Level, MoveReport, SelectOutcome, Settlement};
pub use autoplay::{play_out, PlaySummary, Strategy};
