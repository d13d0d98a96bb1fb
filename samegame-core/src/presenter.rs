//! Boundary to the visual collaborator
//!
//! Every occupied cell carries an opaque handle owned by the presenter. The
//! grid calls back into the presenter to spawn a handle when a tile is
//! created, move it to a cell centre whenever the tile changes slot, and
//! release it when the tile is removed. Calls are synchronous and
//! fire-and-forget: a failing presenter is logged and ignored.

use crate::error::PresenterError;
use crate::grid::{Point, TileType};
use serde::{Deserialize, Serialize};

/// Visual collaborator of the grid
pub trait Presenter {
    /// Opaque reference to the visual object of one tile
    type Handle;

    /// Create the visual for a new tile at `center`
    fn spawn(&mut self, tile: TileType, center: Point) -> Result<Self::Handle, PresenterError>;

    /// Move an existing visual to `center`
    fn reposition(&mut self, handle: &mut Self::Handle, center: Point) -> Result<(), PresenterError>;

    /// Destroy a visual
    fn release(&mut self, handle: Self::Handle) -> Result<(), PresenterError>;
}

/// A tile occupying one grid cell together with its visual handle
#[derive(Clone, Debug, PartialEq)]
pub struct Element<H> {
    pub tile: TileType,
    pub visual: H,
}

impl<H> Element<H> {
    pub fn new(tile: TileType, visual: H) -> Self {
        Self { tile, visual }
    }
}

// ============================================================================
// NULL PRESENTER
// ============================================================================

/// Presenter without visuals (headless play, benchmarks)
#[derive(Clone, Copy, Debug, Default)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    type Handle = ();

    fn spawn(&mut self, _tile: TileType, _center: Point) -> Result<(), PresenterError> {
        Ok(())
    }

    fn reposition(&mut self, _handle: &mut (), _center: Point) -> Result<(), PresenterError> {
        Ok(())
    }

    fn release(&mut self, _handle: ()) -> Result<(), PresenterError> {
        Ok(())
    }
}

// ============================================================================
// RECORDING PRESENTER
// ============================================================================

/// Identifier of a visual created by [`RecordingPresenter`]
pub type VisualId = u32;

/// One call received by [`RecordingPresenter`]
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum PresenterEvent {
    Spawned { id: VisualId, tile: TileType, center: Point },
    Moved { id: VisualId, center: Point },
    Released { id: VisualId },
}

/// Presenter that records every call it receives
#[derive(Clone, Debug, Default)]
pub struct RecordingPresenter {
    next_id: VisualId,
    live: usize,
    events: Vec<PresenterEvent>,
    failing: bool,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Presenter whose reposition and release calls fail after being recorded
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// All calls received so far, in order
    pub fn events(&self) -> &[PresenterEvent] {
        &self.events
    }

    /// Number of visuals spawned and not yet released
    pub fn live_visuals(&self) -> usize {
        self.live
    }

    /// Number of `Moved` events recorded
    pub fn move_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, PresenterEvent::Moved { .. }))
            .count()
    }

    /// Number of `Released` events recorded
    pub fn release_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, PresenterEvent::Released { .. }))
            .count()
    }

    /// Forget recorded events (live visual count is kept)
    pub fn clear_events(&mut self) {
        self.events.clear();
    }
}

impl Presenter for RecordingPresenter {
    type Handle = VisualId;

    fn spawn(&mut self, tile: TileType, center: Point) -> Result<VisualId, PresenterError> {
        let id = self.next_id;
        self.next_id += 1;
        self.live += 1;
        self.events.push(PresenterEvent::Spawned { id, tile, center });
        Ok(id)
    }

    fn reposition(&mut self, handle: &mut VisualId, center: Point) -> Result<(), PresenterError> {
        self.events.push(PresenterEvent::Moved { id: *handle, center });
        if self.failing {
            return Err(PresenterError(format!("visual {} could not be moved", handle)));
        }
        Ok(())
    }

    fn release(&mut self, handle: VisualId) -> Result<(), PresenterError> {
        self.events.push(PresenterEvent::Released { id: handle });
        self.live = self.live.saturating_sub(1);
        if self.failing {
            return Err(PresenterError(format!("visual {} could not be released", handle)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_presenter_tracks_live_visuals() {
        let mut presenter = RecordingPresenter::new();
        let a = presenter.spawn(0, Point::new(0.5, 0.5)).unwrap();
        let mut b = presenter.spawn(1, Point::new(1.5, 0.5)).unwrap();
        assert_ne!(a, b);
        assert_eq!(presenter.live_visuals(), 2);

        presenter.reposition(&mut b, Point::new(0.5, 0.5)).unwrap();
        presenter.release(a).unwrap();

        assert_eq!(presenter.live_visuals(), 1);
        assert_eq!(presenter.move_count(), 1);
        assert_eq!(presenter.release_count(), 1);
        assert_eq!(presenter.events().len(), 4);
    }

    #[test]
    fn test_failing_presenter_still_records() {
        let mut presenter = RecordingPresenter::failing();
        let mut id = presenter.spawn(2, Point::new(0.0, 0.0)).unwrap();
        assert!(presenter.reposition(&mut id, Point::new(1.0, 1.0)).is_err());
        assert!(presenter.release(id).is_err());
        assert_eq!(presenter.live_visuals(), 0);
        assert_eq!(presenter.events().len(), 3);
    }
}
