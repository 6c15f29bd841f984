//! A target surface with no window behind it.
//!
//! The standalone binary uses this when no UI host has attached a real
//! surface: every delivered event is logged at `debug` and otherwise
//! discarded, which is enough to observe the pipeline end to end.
//!
//! The frame is read through a callback on every query, so the surface
//! follows the target display when displays are rearranged.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tracing::debug;
use uuid::Uuid;

use touch_core::Frame;

use super::{SurfaceError, SurfaceId, SyntheticEvent, TargetSurface};

type FrameSource = Box<dyn Fn() -> Option<Frame> + Send + Sync>;

pub struct HeadlessSurface {
    id: SurfaceId,
    frame: FrameSource,
    active: AtomicBool,
    delivered: AtomicU64,
}

impl HeadlessSurface {
    /// A surface fixed at `frame` (natural convention).
    pub fn new(frame: Frame) -> Self {
        Self::with_frame_source(move || Some(frame))
    }

    /// A surface whose frame is `source()` at the time of each query.  A
    /// `None` (target display gone) reports an empty frame.
    pub fn with_frame_source<F>(source: F) -> Self
    where
        F: Fn() -> Option<Frame> + Send + Sync + 'static,
    {
        Self {
            id: Uuid::new_v4(),
            frame: Box::new(source),
            active: AtomicBool::new(false),
            delivered: AtomicU64::new(0),
        }
    }

    /// Events accepted since creation.
    pub fn delivered_count(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }
}

impl TargetSurface for HeadlessSurface {
    fn id(&self) -> SurfaceId {
        self.id
    }

    fn frame(&self) -> Frame {
        (self.frame)().unwrap_or_default()
    }

    fn is_active_recipient(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    fn become_active_recipient(&self) {
        self.active.store(true, Ordering::Relaxed);
    }

    fn suppress_window_reordering(&self) {}

    fn deliver(&self, event: SyntheticEvent) -> Result<(), SurfaceError> {
        self.delivered.fetch_add(1, Ordering::Relaxed);
        debug!(
            surface = %self.id,
            sequence_id = event.sequence_id,
            kind = ?event.kind,
            x = event.window_location.x,
            y = event.window_location.y,
            "headless surface received event"
        );
        Ok(())
    }
}
