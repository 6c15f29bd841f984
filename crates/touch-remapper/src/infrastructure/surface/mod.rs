//! Target surface infrastructure.
//!
//! The *target surface* is the on-screen window that owns the touch display's
//! content.  It is created and destroyed by its UI host, not by the pipeline,
//! so the pipeline reaches it only through a [`SurfaceSlot`] holding a weak
//! handle.  A surface that has gone away is the normal "unavailable" outcome.
//!
//! # Delivery contract
//!
//! [`TargetSurface::deliver`] hands a synthetic pointer event straight to the
//! surface's own event handling, bypassing the host's window routing: the
//! shared pointer does not move, focus does not change and no window is
//! reordered.  It must only be called on the surface's own execution context.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use touch_core::{EventKind, Frame, Point};

pub mod headless;
pub mod mock;

/// Stable handle of a target surface.
pub type SurfaceId = Uuid;

/// A pointer event built for direct delivery to a surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SyntheticEvent {
    pub sequence_id: u64,
    pub kind: EventKind,
    /// Location in the surface's own coordinates (bottom-left origin).
    pub window_location: Point,
    pub timestamp_ns: u64,
    pub click_count: i64,
}

/// Error type for surface delivery.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("surface {0} has been closed")]
    Closed(SurfaceId),
    #[error("surface rejected event: {0}")]
    Rejected(String),
}

/// The window that receives remapped touches.
pub trait TargetSurface: Send + Sync {
    fn id(&self) -> SurfaceId;

    /// Window frame in the natural (bottom-left origin) convention.
    fn frame(&self) -> Frame;

    /// `true` if the surface already receives key/pointer input within its process.
    fn is_active_recipient(&self) -> bool;

    /// Makes the surface the active input recipient without changing which
    /// process owns foreground focus.
    fn become_active_recipient(&self);

    /// Suppresses the compositor's window-reordering side effect for the next
    /// delivered event.
    fn suppress_window_reordering(&self);

    /// Hands `event` to the surface's own event handling.
    fn deliver(&self, event: SyntheticEvent) -> Result<(), SurfaceError>;
}

/// Weak, replaceable reference to the current target surface.
#[derive(Default)]
pub struct SurfaceSlot {
    current: Mutex<Option<Weak<dyn TargetSurface>>>,
}

impl SurfaceSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Points the slot at `surface` without extending its lifetime.
    pub fn attach(&self, surface: &Arc<dyn TargetSurface>) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(Arc::downgrade(surface));
    }

    pub fn detach(&self) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// The surface, if one is attached and still alive.
    pub fn upgrade(&self) -> Option<Arc<dyn TargetSurface>> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(Weak::upgrade)
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockSurface;
    use super::*;

    #[test]
    fn test_empty_slot_upgrades_to_none() {
        assert!(SurfaceSlot::new().upgrade().is_none());
    }

    #[test]
    fn test_slot_does_not_keep_surface_alive() {
        // Arrange
        let slot = SurfaceSlot::new();
        let surface: Arc<dyn TargetSurface> = Arc::new(MockSurface::default());
        slot.attach(&surface);
        assert!(slot.upgrade().is_some());

        // Act
        drop(surface);

        // Assert
        assert!(slot.upgrade().is_none());
    }

    #[test]
    fn test_detach_clears_live_surface() {
        let slot = SurfaceSlot::new();
        let surface: Arc<dyn TargetSurface> = Arc::new(MockSurface::default());
        slot.attach(&surface);
        slot.detach();
        assert!(slot.upgrade().is_none());
    }
}
