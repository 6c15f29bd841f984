//! Event Interception Point: the per-event state machine.
//!
//! Every pointer event the tap observes is routed through
//! [`InterceptionPoint::on_tap_input`], on the interception context, and must
//! be decided within a few milliseconds.
//!
//! # Decision table
//!
//! | Situation                                   | Decision     | Diagnostics |
//! |---------------------------------------------|--------------|-------------|
//! | pipeline stopped                            | pass through | none        |
//! | learning, `Down`                            | learn, pass  | none        |
//! | identity set empty or identity not a member | pass through | none        |
//! | member `Move` with no live sequence (hover) | suppress     | Suppressed  |
//! | member `Drag`/`Up` of a host-routed contact | pass through | none        |
//! | any other member `Drag`/`Up` with no live sequence | suppress | Dropped |
//! | target display absent                       | pass through | Dropped     |
//! | `Up` outside the source, sequence live      | close at last location, suppress | by the worker |
//! | point outside the source display            | suppress     | Dropped     |
//! | otherwise                                   | deliver, suppress | by the worker |
//!
//! A *host-routed contact* is one whose `Down` the host already saw: the
//! learning `Down`, or a contact in progress when interception started.  Its
//! `Drag`/`Up` events go to the host too, up to and including the `Up`.
//!
//! A live sequence always ends on `Up`.  If the `Up` itself cannot be
//! remapped, the surface receives it at the last delivered location so it
//! never sees a press without a release.
//!
//! # Known fragility
//!
//! A location that already lies inside the target display is used as-is
//! rather than remapped.  After the first delivery in a sequence the host's
//! own reporting for later `Drag`/`Up` events can drift into target space;
//! remapping those again would throw them off-screen.  This is a heuristic
//! matched to observed host behaviour and is not guaranteed to hold.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, trace, warn};

use touch_core::{
    remap, DeliveryStatus, DeviceIdentitySet, DiagnosticsEntry, DiagnosticsRecorder, EventKind,
    Point, PointerEvent, SequenceTransition, TouchSequence,
};

use crate::application::deliver::{DeliveryChannel, DeliveryRequest};
use crate::application::error::TouchError;
use crate::application::frames::{resolve_frames, RemapFrames, TargetDisplay};
use crate::infrastructure::display::DisplayGeometry;
use crate::infrastructure::event_tap::{TapControl, TapDecision, TapHandler, TapInput};

/// Externally visible state of the interception point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelinePhase {
    /// Not started, or stopped.
    Idle,
    /// Waiting for the next `Down` to learn the device identity.
    Learning,
    /// Classifying events; no touch in progress.
    Filtering,
    /// A member touch sequence is live.
    TouchActive,
}

#[derive(Default)]
struct InterceptState {
    running: bool,
    learning: bool,
    identities: DeviceIdentitySet,
    sequence: TouchSequence,
    delivery: Option<DeliveryChannel>,
    /// The host saw this contact's `Down`; its remainder passes through.
    host_contact: bool,
    /// Target location and primary height of the last posted delivery in
    /// the live sequence.
    last_delivered: Option<(Point, f64)>,
}

/// Outcome of the first, lock-held classification step.
enum Classification {
    PassThrough,
    Suppress,
    Remap,
}

/// The long-lived interception state machine.
pub struct InterceptionPoint {
    state: Mutex<InterceptState>,
    displays: Arc<dyn DisplayGeometry>,
    target: TargetDisplay,
    recorder: Arc<DiagnosticsRecorder>,
}

impl InterceptionPoint {
    pub fn new(
        displays: Arc<dyn DisplayGeometry>,
        target: TargetDisplay,
        recorder: Arc<DiagnosticsRecorder>,
    ) -> Self {
        Self {
            state: Mutex::new(InterceptState::default()),
            displays,
            target,
            recorder,
        }
    }

    // The tap callback must keep working even if a calibration caller
    // panicked while holding the lock.
    fn lock(&self) -> MutexGuard<'_, InterceptState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────────

    /// Begins classifying events; remapped touches go to `delivery`.
    pub fn start(&self, delivery: DeliveryChannel) {
        let mut state = self.lock();
        state.running = true;
        state.delivery = Some(delivery);
        // A contact may already be in progress.
        state.host_contact = true;
        info!(identities = %state.identities, learning = state.learning, "interception started");
    }

    /// Stops classifying, drops the delivery sender and clears sequence and
    /// learning state.  Idempotent.
    pub fn stop(&self) {
        let mut state = self.lock();
        if !state.running && state.delivery.is_none() {
            return;
        }
        state.running = false;
        state.learning = false;
        state.delivery = None;
        state.sequence.reset();
        state.host_contact = false;
        state.last_delivered = None;
        info!("interception stopped");
    }

    pub fn phase(&self) -> PipelinePhase {
        let state = self.lock();
        if !state.running {
            PipelinePhase::Idle
        } else if state.learning {
            PipelinePhase::Learning
        } else if state.sequence.is_active {
            PipelinePhase::TouchActive
        } else {
            PipelinePhase::Filtering
        }
    }

    // ── Calibration ───────────────────────────────────────────────────────────

    /// Makes the next `Down` define the identity set.  Any live sequence is
    /// abandoned.
    pub fn enter_learning_mode(&self) {
        let mut state = self.lock();
        state.learning = true;
        state.sequence.reset();
        info!("learning mode: touch the secondary display once");
    }

    /// Replaces the identity set and leaves learning mode.
    ///
    /// # Errors
    ///
    /// Returns [`TouchError::TouchInProgress`] while a sequence is live.
    pub fn set_identities(&self, identities: DeviceIdentitySet) -> Result<(), TouchError> {
        let mut state = self.lock();
        if state.sequence.is_active {
            return Err(TouchError::TouchInProgress);
        }
        info!(identities = %identities, "device identities set");
        state.identities = identities;
        state.learning = false;
        Ok(())
    }

    /// Empties the identity set, so every event passes through.
    ///
    /// # Errors
    ///
    /// Returns [`TouchError::TouchInProgress`] while a sequence is live.
    pub fn clear_identities(&self) -> Result<(), TouchError> {
        let mut state = self.lock();
        if state.sequence.is_active {
            return Err(TouchError::TouchInProgress);
        }
        state.identities.clear();
        info!("device identities cleared");
        Ok(())
    }

    pub fn identities(&self) -> DeviceIdentitySet {
        self.lock().identities.clone()
    }

    pub fn sequence(&self) -> TouchSequence {
        self.lock().sequence
    }

    // ── Per-event handling ────────────────────────────────────────────────────

    /// Decides what happens to one pointer event.
    pub fn handle(&self, event: PointerEvent) -> TapDecision {
        let intercepted_at = Instant::now();

        match self.classify(&event) {
            Classification::PassThrough => return TapDecision::PassThrough,
            Classification::Suppress => return TapDecision::Suppress,
            Classification::Remap => {}
        }

        // Queried per event and outside the lock: displays can change at any time.
        let frames = match self.displays.displays() {
            Ok(displays) => resolve_frames(&displays, self.target),
            Err(e) => {
                debug!(error = %e, "display query failed");
                None
            }
        };
        let Some(frames) = frames else {
            let sequence_id = self.lock().sequence.sequence_id;
            warn!(target_display = ?self.target, "target display absent; touch passed through");
            self.record(&event, sequence_id, None, DeliveryStatus::Dropped);
            return TapDecision::PassThrough;
        };

        match target_location(event.location, &frames) {
            Some(location) => self.dispatch(event, location, frames.primary_height, intercepted_at),
            None => self.reject(event, intercepted_at),
        }
    }

    /// Handles a member event whose location cannot be remapped.
    fn reject(&self, event: PointerEvent, intercepted_at: Instant) -> TapDecision {
        let rejected = TouchError::TransformRejected {
            x: event.location.x,
            y: event.location.y,
        };

        let mut state = self.lock();
        if event.kind == EventKind::Up && state.sequence.is_active {
            if let Some((location, primary_height)) = state.last_delivered {
                drop(state);
                debug!("{rejected}; closing sequence at last delivered location");
                return self.dispatch(event, location, primary_height, intercepted_at);
            }
            state.sequence.end();
        }
        let sequence_id = state.sequence.sequence_id;
        drop(state);

        debug!(sequence_id, "{rejected}; touch dropped");
        self.record(&event, sequence_id, None, DeliveryStatus::Dropped);
        TapDecision::Suppress
    }

    /// Lock-held first step: learning, membership and hover filtering.
    fn classify(&self, event: &PointerEvent) -> Classification {
        let mut state = self.lock();
        if !state.running {
            return Classification::PassThrough;
        }

        if state.learning {
            if event.kind == EventKind::Down {
                state.identities = DeviceIdentitySet::singleton(event.device_identity);
                state.learning = false;
                state.host_contact = true;
                info!(
                    device_identity = event.device_identity,
                    "learned touch device identity"
                );
            }
            return Classification::PassThrough;
        }

        if state.identities.is_empty() || !state.identities.contains(event.device_identity) {
            return Classification::PassThrough;
        }

        if !state.sequence.is_active {
            match event.kind {
                EventKind::Move => {
                    let sequence_id = state.sequence.sequence_id;
                    drop(state);
                    trace!(device_identity = event.device_identity, "hover noise suppressed");
                    self.record(event, sequence_id, None, DeliveryStatus::Suppressed);
                    return Classification::Suppress;
                }
                EventKind::Drag | EventKind::Up if state.host_contact => {
                    if event.kind == EventKind::Up {
                        state.host_contact = false;
                    }
                    trace!(kind = ?event.kind, "host-routed contact passed through");
                    return Classification::PassThrough;
                }
                EventKind::Drag | EventKind::Up => {
                    let sequence_id = state.sequence.sequence_id;
                    drop(state);
                    debug!(kind = ?event.kind, "contact without a live sequence dropped");
                    self.record(event, sequence_id, None, DeliveryStatus::Dropped);
                    return Classification::Suppress;
                }
                EventKind::Down => state.host_contact = false,
            }
        }
        Classification::Remap
    }

    /// Lock-held second step: advance the sequence and post the delivery.
    fn dispatch(
        &self,
        event: PointerEvent,
        location: Point,
        primary_height: f64,
        intercepted_at: Instant,
    ) -> TapDecision {
        let mut state = self.lock();
        if !state.running {
            return TapDecision::PassThrough;
        }

        let transition = match event.kind {
            EventKind::Down => state.sequence.begin(),
            EventKind::Drag => state.sequence.extend(),
            EventKind::Up => state.sequence.end(),
            EventKind::Move => SequenceTransition::Continued,
        };
        if transition == SequenceTransition::Started {
            debug!(sequence_id = state.sequence.sequence_id, "touch sequence started");
        }
        state.last_delivered = match event.kind {
            EventKind::Up => None,
            _ => Some((location, primary_height)),
        };

        let request = DeliveryRequest {
            sequence_id: state.sequence.sequence_id,
            device_identity: event.device_identity,
            kind: event.kind,
            location,
            original_point: event.location,
            timestamp_ns: event.timestamp_ns,
            click_count: event.click_count,
            primary_height,
            intercepted_at,
        };

        let sent = match &state.delivery {
            Some(channel) => channel.dispatch(request),
            None => Err(TouchError::DeliveryUnavailable),
        };
        drop(state);

        if let Err(e) = sent {
            warn!(sequence_id = request.sequence_id, "{e}; touch dropped");
            self.recorder
                .record(request.diagnostics(DeliveryStatus::Dropped, None));
        }
        TapDecision::Suppress
    }

    fn record(
        &self,
        event: &PointerEvent,
        sequence_id: u64,
        remapped_point: Option<Point>,
        status: DeliveryStatus,
    ) {
        self.recorder.record(DiagnosticsEntry {
            recorded_at: Instant::now(),
            sequence_id,
            device_identity: event.device_identity,
            kind: event.kind,
            original_point: event.location,
            remapped_point,
            delivery_status: status,
            latency_ms: None,
        });
    }
}

/// Target-space location for `point`, or `None` if it lies outside the source.
fn target_location(point: Point, frames: &RemapFrames) -> Option<Point> {
    if frames.target.contains(point) {
        return Some(point);
    }
    remap(point, frames.source, frames.target)
}

impl TapHandler for InterceptionPoint {
    fn on_tap_input(&self, input: TapInput, control: &dyn TapControl) -> TapDecision {
        match input {
            TapInput::Pointer(event) => self.handle(event),
            TapInput::DisabledByTimeout | TapInput::DisabledByUserInput => {
                warn!(reason = ?input, "{}; re-enabling", TouchError::InterceptionDisabled);
                control.set_enabled(true);
                if !control.is_enabled() {
                    error!("event tap could not be re-enabled; touch remapping is offline");
                }
                TapDecision::PassThrough
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::display::mock::MockDisplayGeometry;
    use crate::infrastructure::event_tap::mock::MockTapControl;
    use tokio::sync::mpsc::UnboundedReceiver;

    const TOUCH: i64 = 42;
    const MOUSE: i64 = 7;

    fn started(
        identities: &[i64],
    ) -> (
        InterceptionPoint,
        UnboundedReceiver<DeliveryRequest>,
        Arc<DiagnosticsRecorder>,
    ) {
        let recorder = Arc::new(DiagnosticsRecorder::new(64));
        let point = InterceptionPoint::new(
            Arc::new(MockDisplayGeometry::primary_and_touch_display()),
            TargetDisplay::FirstSecondary,
            Arc::clone(&recorder),
        );
        point
            .set_identities(identities.iter().copied().collect())
            .expect("no touch in progress");
        let (channel, rx) = DeliveryChannel::new();
        point.start(channel);
        (point, rx, recorder)
    }

    fn ev(id: i64, kind: EventKind, x: f64, y: f64) -> PointerEvent {
        PointerEvent::new(id, kind, x, y)
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────────

    #[test]
    fn test_unstarted_point_is_idle_and_passes_everything() {
        let point = InterceptionPoint::new(
            Arc::new(MockDisplayGeometry::primary_and_touch_display()),
            TargetDisplay::FirstSecondary,
            Arc::new(DiagnosticsRecorder::new(4)),
        );
        assert_eq!(point.phase(), PipelinePhase::Idle);
        assert_eq!(
            point.handle(ev(TOUCH, EventKind::Down, 960.0, 540.0)),
            TapDecision::PassThrough
        );
    }

    #[test]
    fn test_stop_is_idempotent_and_resets_sequence() {
        let (point, _rx, _rec) = started(&[TOUCH]);
        point.handle(ev(TOUCH, EventKind::Down, 960.0, 540.0));
        assert_eq!(point.phase(), PipelinePhase::TouchActive);

        point.stop();
        point.stop();

        assert_eq!(point.phase(), PipelinePhase::Idle);
        assert!(!point.sequence().is_active);
    }

    // ── Filtering ─────────────────────────────────────────────────────────────

    #[test]
    fn test_non_member_passes_through_for_every_kind() {
        // Arrange
        let (point, mut rx, recorder) = started(&[TOUCH]);

        // Act / Assert
        for kind in [EventKind::Down, EventKind::Drag, EventKind::Up, EventKind::Move] {
            assert_eq!(
                point.handle(ev(MOUSE, kind, 960.0, 540.0)),
                TapDecision::PassThrough
            );
        }
        assert!(rx.try_recv().is_err());
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_empty_identity_set_passes_member_touches() {
        let (point, mut rx, _rec) = started(&[]);
        assert_eq!(
            point.handle(ev(TOUCH, EventKind::Down, 960.0, 540.0)),
            TapDecision::PassThrough
        );
        assert!(rx.try_recv().is_err());
        assert_eq!(point.phase(), PipelinePhase::Filtering);
    }

    #[test]
    fn test_hover_move_is_suppressed_and_never_delivered() {
        // Arrange
        let (point, mut rx, recorder) = started(&[TOUCH]);

        // Act
        let decision = point.handle(ev(TOUCH, EventKind::Move, 960.0, 540.0));

        // Assert
        assert_eq!(decision, TapDecision::Suppress);
        assert!(rx.try_recv().is_err());
        assert_eq!(
            recorder.snapshot()[0].delivery_status,
            DeliveryStatus::Suppressed
        );
    }

    // ── Remapping ─────────────────────────────────────────────────────────────

    #[test]
    fn test_down_is_remapped_into_touch_display_and_suppressed() {
        // Arrange
        let (point, mut rx, _rec) = started(&[TOUCH]);

        // Act
        let decision = point.handle(ev(TOUCH, EventKind::Down, 960.0, 540.0));

        // Assert: Scenario A geometry.
        assert_eq!(decision, TapDecision::Suppress);
        let request = rx.try_recv().expect("delivery posted");
        assert_eq!(request.location, Point::new(3200.0, 360.0));
        assert_eq!(request.original_point, Point::new(960.0, 540.0));
        assert_eq!(request.sequence_id, 1);
        assert_eq!(request.primary_height, 1080.0);
    }

    #[test]
    fn test_location_already_in_target_is_used_as_is() {
        let (point, mut rx, _rec) = started(&[TOUCH]);
        point.handle(ev(TOUCH, EventKind::Down, 960.0, 540.0));
        rx.try_recv().expect("down");

        point.handle(ev(TOUCH, EventKind::Drag, 3300.0, 400.0));

        assert_eq!(rx.try_recv().expect("drag").location, Point::new(3300.0, 400.0));
    }

    #[test]
    fn test_point_outside_source_is_dropped_and_suppressed() {
        // Arrange: below the primary display and outside the touch display.
        let (point, mut rx, recorder) = started(&[TOUCH]);

        // Act
        let decision = point.handle(ev(TOUCH, EventKind::Down, 100.0, 1500.0));

        // Assert
        assert_eq!(decision, TapDecision::Suppress);
        assert!(rx.try_recv().is_err());
        assert_eq!(recorder.total_dropped(), 1);
        assert!(!point.sequence().is_active);
    }

    #[test]
    fn test_missing_target_display_passes_through_and_records_drop() {
        let recorder = Arc::new(DiagnosticsRecorder::new(8));
        let displays = Arc::new(MockDisplayGeometry::primary_and_touch_display());
        let point = InterceptionPoint::new(
            displays.clone(),
            TargetDisplay::FirstSecondary,
            Arc::clone(&recorder),
        );
        point
            .set_identities(DeviceIdentitySet::singleton(TOUCH))
            .unwrap();
        let (channel, _rx) = DeliveryChannel::new();
        point.start(channel);
        displays.set_displays(vec![crate::infrastructure::display::DisplayInfo {
            id: 1,
            frame: touch_core::Frame::new(0.0, 0.0, 1920.0, 1080.0),
            is_primary: true,
        }]);

        let decision = point.handle(ev(TOUCH, EventKind::Down, 960.0, 540.0));

        assert_eq!(decision, TapDecision::PassThrough);
        assert_eq!(recorder.total_dropped(), 1);
    }

    #[test]
    fn test_contact_in_progress_at_start_finishes_on_host() {
        // Arrange: the Down happened before interception started.
        let (point, mut rx, recorder) = started(&[TOUCH]);

        // Act
        let drag = point.handle(ev(TOUCH, EventKind::Drag, 960.0, 540.0));
        let up = point.handle(ev(TOUCH, EventKind::Up, 960.0, 540.0));
        let stray = point.handle(ev(TOUCH, EventKind::Drag, 960.0, 540.0));

        // Assert
        assert_eq!(drag, TapDecision::PassThrough);
        assert_eq!(up, TapDecision::PassThrough);
        assert_eq!(stray, TapDecision::Suppress);
        assert!(rx.try_recv().is_err());
        assert_eq!(recorder.total_dropped(), 1);
    }

    #[test]
    fn test_orphaned_member_drag_after_sequence_is_suppressed() {
        // Arrange
        let (point, mut rx, recorder) = started(&[TOUCH]);
        point.handle(ev(TOUCH, EventKind::Down, 960.0, 540.0));
        point.handle(ev(TOUCH, EventKind::Up, 960.0, 540.0));
        let delivered = std::iter::from_fn(|| rx.try_recv().ok()).count();

        // Act
        let drag = point.handle(ev(TOUCH, EventKind::Drag, 960.0, 540.0));
        let up = point.handle(ev(TOUCH, EventKind::Up, 960.0, 540.0));

        // Assert
        assert_eq!(delivered, 2);
        assert_eq!(drag, TapDecision::Suppress);
        assert_eq!(up, TapDecision::Suppress);
        assert!(rx.try_recv().is_err());
        assert_eq!(recorder.total_dropped(), 2);
    }

    #[test]
    fn test_rejected_up_still_ends_sequence_at_last_location() {
        // Arrange
        let (point, mut rx, _rec) = started(&[TOUCH]);
        point.handle(ev(TOUCH, EventKind::Down, 960.0, 540.0));
        rx.try_recv().expect("down");

        // Act: below the primary and outside the touch display.
        let decision = point.handle(ev(TOUCH, EventKind::Up, 100.0, 1500.0));

        // Assert
        assert_eq!(decision, TapDecision::Suppress);
        let up = rx.try_recv().expect("closing up posted");
        assert_eq!(up.kind, EventKind::Up);
        assert_eq!(up.sequence_id, 1);
        assert_eq!(up.location, Point::new(3200.0, 360.0));
        assert!(!point.sequence().is_active);
        assert_eq!(point.phase(), PipelinePhase::Filtering);
        assert!(point.set_identities(DeviceIdentitySet::singleton(TOUCH)).is_ok());
    }

    #[test]
    fn test_rejected_drag_keeps_sequence_live() {
        // Arrange
        let (point, mut rx, recorder) = started(&[TOUCH]);
        point.handle(ev(TOUCH, EventKind::Down, 960.0, 540.0));
        rx.try_recv().expect("down");

        // Act
        let drag = point.handle(ev(TOUCH, EventKind::Drag, 100.0, 1500.0));
        let live_after_drag = point.sequence().is_active;
        point.handle(ev(TOUCH, EventKind::Up, 970.0, 540.0));

        // Assert
        assert_eq!(drag, TapDecision::Suppress);
        assert!(live_after_drag);
        assert_eq!(recorder.total_dropped(), 1);
        let up = rx.try_recv().expect("up delivered");
        assert_eq!(up.kind, EventKind::Up);
        assert_eq!(up.sequence_id, 1);
        assert!(!point.sequence().is_active);
    }

    #[test]
    fn test_delivery_failure_is_recorded_as_dropped() {
        let (point, rx, recorder) = started(&[TOUCH]);
        drop(rx);
        let decision = point.handle(ev(TOUCH, EventKind::Down, 960.0, 540.0));
        assert_eq!(decision, TapDecision::Suppress);
        assert_eq!(recorder.total_dropped(), 1);
    }

    // ── Sequences ─────────────────────────────────────────────────────────────

    #[test]
    fn test_sequence_ids_follow_down_drag_up() {
        // Arrange
        let (point, mut rx, _rec) = started(&[TOUCH]);

        // Act
        point.handle(ev(TOUCH, EventKind::Down, 960.0, 540.0));
        point.handle(ev(TOUCH, EventKind::Drag, 970.0, 540.0));
        point.handle(ev(TOUCH, EventKind::Drag, 980.0, 540.0));
        point.handle(ev(TOUCH, EventKind::Up, 980.0, 540.0));
        point.handle(ev(TOUCH, EventKind::Down, 960.0, 540.0));

        // Assert
        let ids: Vec<u64> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|r| r.sequence_id)
            .collect();
        assert_eq!(ids, vec![1, 1, 1, 1, 2]);
    }

    #[test]
    fn test_move_inside_live_sequence_is_delivered() {
        let (point, mut rx, _rec) = started(&[TOUCH]);
        point.handle(ev(TOUCH, EventKind::Down, 960.0, 540.0));
        let decision = point.handle(ev(TOUCH, EventKind::Move, 965.0, 540.0));
        assert_eq!(decision, TapDecision::Suppress);
        assert_eq!(std::iter::from_fn(|| rx.try_recv().ok()).count(), 2);
    }

    // ── Calibration ───────────────────────────────────────────────────────────

    #[test]
    fn test_learning_takes_identity_from_next_down_and_passes_it() {
        // Arrange
        let (point, mut rx, _rec) = started(&[]);
        point.enter_learning_mode();
        assert_eq!(point.phase(), PipelinePhase::Learning);

        // Act
        let ignored = point.handle(ev(99, EventKind::Move, 10.0, 10.0));
        let learned = point.handle(ev(TOUCH, EventKind::Down, 960.0, 540.0));

        // Assert
        assert_eq!(ignored, TapDecision::PassThrough);
        assert_eq!(learned, TapDecision::PassThrough);
        assert!(rx.try_recv().is_err());
        assert_eq!(point.identities().to_vec(), vec![TOUCH]);
        assert_eq!(point.phase(), PipelinePhase::Filtering);
    }

    #[test]
    fn test_set_identities_rejected_during_live_touch() {
        let (point, _rx, _rec) = started(&[TOUCH]);
        point.handle(ev(TOUCH, EventKind::Down, 960.0, 540.0));

        let result = point.set_identities(DeviceIdentitySet::singleton(1));

        assert!(matches!(result, Err(TouchError::TouchInProgress)));
        assert!(matches!(
            point.clear_identities(),
            Err(TouchError::TouchInProgress)
        ));
        assert_eq!(point.identities().to_vec(), vec![TOUCH]);
    }

    #[test]
    fn test_enter_learning_mode_abandons_live_sequence() {
        let (point, _rx, _rec) = started(&[TOUCH]);
        point.handle(ev(TOUCH, EventKind::Down, 960.0, 540.0));
        point.enter_learning_mode();
        assert!(!point.sequence().is_active);
        assert!(point.clear_identities().is_ok());
    }

    // ── Disable notices ───────────────────────────────────────────────────────

    #[test]
    fn test_disable_notice_reenables_tap_inline() {
        // Arrange
        let (point, _rx, _rec) = started(&[TOUCH]);
        let control = MockTapControl::default();

        // Act
        let decision = point.on_tap_input(TapInput::DisabledByTimeout, &control);

        // Assert
        assert_eq!(decision, TapDecision::PassThrough);
        assert!(control.is_enabled());
        assert_eq!(control.enable_calls(), 1);
    }

    #[test]
    fn test_refused_reenable_does_not_panic() {
        let (point, _rx, _rec) = started(&[TOUCH]);
        let control = MockTapControl::default();
        control.refuse_enable(true);
        point.on_tap_input(TapInput::DisabledByUserInput, &control);
        assert!(!control.is_enabled());
    }
}
