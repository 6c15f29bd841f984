//! Recording target surface for tests.

use std::sync::{
    atomic::{AtomicBool, AtomicU32, Ordering},
    Mutex,
};

use uuid::Uuid;

use touch_core::Frame;

use super::{SurfaceError, SurfaceId, SyntheticEvent, TargetSurface};

/// One call observed by [`MockSurface`], in order.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCall {
    SuppressReordering,
    BecomeActive,
    Deliver(SyntheticEvent),
}

/// A target surface that records every call.
pub struct MockSurface {
    id: SurfaceId,
    frame: Frame,
    active: AtomicBool,
    reject: AtomicBool,
    calls: Mutex<Vec<SurfaceCall>>,
    activations: AtomicU32,
}

impl MockSurface {
    /// A surface covering `frame` (natural convention).
    pub fn with_frame(frame: Frame) -> Self {
        Self {
            id: Uuid::new_v4(),
            frame,
            active: AtomicBool::new(false),
            reject: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
            activations: AtomicU32::new(0),
        }
    }

    /// Every call so far.
    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.calls.lock().expect("lock poisoned").clone()
    }

    /// Only the delivered events.
    pub fn delivered(&self) -> Vec<SyntheticEvent> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SurfaceCall::Deliver(event) => Some(event),
                _ => None,
            })
            .collect()
    }

    pub fn activations(&self) -> u32 {
        self.activations.load(Ordering::SeqCst)
    }

    /// Makes `deliver` fail.
    pub fn reject_deliveries(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }

    fn push(&self, call: SurfaceCall) {
        self.calls.lock().expect("lock poisoned").push(call);
    }
}

impl Default for MockSurface {
    /// Covers the 2560x720 touch display of
    /// [`MockDisplayGeometry::primary_and_touch_display`](crate::infrastructure::display::mock::MockDisplayGeometry::primary_and_touch_display).
    fn default() -> Self {
        Self::with_frame(Frame::new(1920.0, 360.0, 2560.0, 720.0))
    }
}

impl TargetSurface for MockSurface {
    fn id(&self) -> SurfaceId {
        self.id
    }

    fn frame(&self) -> Frame {
        self.frame
    }

    fn is_active_recipient(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn become_active_recipient(&self) {
        self.active.store(true, Ordering::SeqCst);
        self.activations.fetch_add(1, Ordering::SeqCst);
        self.push(SurfaceCall::BecomeActive);
    }

    fn suppress_window_reordering(&self) {
        self.push(SurfaceCall::SuppressReordering);
    }

    fn deliver(&self, event: SyntheticEvent) -> Result<(), SurfaceError> {
        if self.reject.load(Ordering::SeqCst) {
            return Err(SurfaceError::Rejected("mock rejection".to_string()));
        }
        self.push(SurfaceCall::Deliver(event));
        Ok(())
    }
}
