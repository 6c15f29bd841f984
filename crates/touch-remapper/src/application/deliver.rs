//! Delivery Channel: hands remapped touches to the target surface.
//!
//! Delivery spans the two execution contexts of the pipeline:
//!
//! - On the **interception context**, [`DeliveryChannel::dispatch`] captures
//!   every value the synthetic event needs into a [`DeliveryRequest`] and
//!   posts it on an unbounded channel.  Posting never blocks, so the tap
//!   callback stays within its budget.  The host's event reference is not
//!   valid after the callback returns, so nothing refers back to it.
//! - On the **surface context**, [`DeliveryWorker::run`] drains the channel
//!   and performs the delivery.  The surface's UI framework may re-enter its
//!   own event loop while handling the event, which is why the delivery is
//!   never a direct call from the tap callback.
//!
//! Before each delivery the worker suppresses window reordering and makes the
//! surface the active recipient (without touching process-level focus).  A
//! surface that has gone away turns the request into a `Dropped` entry; it is
//! never an error.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use touch_core::{
    to_window_local, DeliveryStatus, DeviceIdentity, DiagnosticsEntry, DiagnosticsRecorder,
    EventKind, Point,
};

use crate::application::error::TouchError;
use crate::infrastructure::surface::{SurfaceSlot, SyntheticEvent};

/// Everything needed to synthesize one event, captured at interception time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeliveryRequest {
    pub sequence_id: u64,
    pub device_identity: DeviceIdentity,
    pub kind: EventKind,
    /// Target-space location in the interception convention.
    pub location: Point,
    /// Location as the host reported it.
    pub original_point: Point,
    pub timestamp_ns: u64,
    pub click_count: i64,
    /// Primary display height at interception time, for the convention flip.
    pub primary_height: f64,
    pub intercepted_at: Instant,
}

impl DeliveryRequest {
    pub(crate) fn diagnostics(
        &self,
        status: DeliveryStatus,
        latency_ms: Option<f64>,
    ) -> DiagnosticsEntry {
        DiagnosticsEntry {
            recorded_at: Instant::now(),
            sequence_id: self.sequence_id,
            device_identity: self.device_identity,
            kind: self.kind,
            original_point: self.original_point,
            remapped_point: Some(self.location),
            delivery_status: status,
            latency_ms,
        }
    }
}

/// Sending half, owned by the interception point.
#[derive(Debug, Clone)]
pub struct DeliveryChannel {
    tx: mpsc::UnboundedSender<DeliveryRequest>,
}

impl DeliveryChannel {
    /// Creates a channel and the receiver the worker drains.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DeliveryRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Posts `request` to the surface context without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`TouchError::DeliveryUnavailable`] if the worker has exited.
    pub fn dispatch(&self, request: DeliveryRequest) -> Result<(), TouchError> {
        self.tx
            .send(request)
            .map_err(|_| TouchError::DeliveryUnavailable)
    }
}

/// Receiving half, run on the surface context.
pub struct DeliveryWorker {
    rx: mpsc::UnboundedReceiver<DeliveryRequest>,
    slot: Arc<SurfaceSlot>,
    recorder: Arc<DiagnosticsRecorder>,
}

impl DeliveryWorker {
    pub fn new(
        rx: mpsc::UnboundedReceiver<DeliveryRequest>,
        slot: Arc<SurfaceSlot>,
        recorder: Arc<DiagnosticsRecorder>,
    ) -> Self {
        Self { rx, slot, recorder }
    }

    /// Delivers requests until every [`DeliveryChannel`] clone is dropped.
    ///
    /// Requests already queued when the pipeline stops are still delivered.
    pub async fn run(mut self) {
        while let Some(request) = self.rx.recv().await {
            self.deliver_one(&request);
        }
        debug!("delivery channel closed; worker exiting");
    }

    /// Delivers one request and records the outcome.
    pub fn deliver_one(&self, request: &DeliveryRequest) -> DeliveryStatus {
        let latency = || request.intercepted_at.elapsed().as_secs_f64() * 1000.0;

        let Some(surface) = self.slot.upgrade() else {
            debug!(
                sequence_id = request.sequence_id,
                "{}; touch dropped",
                TouchError::DeliveryUnavailable
            );
            self.recorder
                .record(request.diagnostics(DeliveryStatus::Dropped, None));
            return DeliveryStatus::Dropped;
        };

        let event = SyntheticEvent {
            sequence_id: request.sequence_id,
            kind: request.kind,
            window_location: to_window_local(
                request.location,
                surface.frame(),
                request.primary_height,
            ),
            timestamp_ns: request.timestamp_ns,
            click_count: request.click_count,
        };

        surface.suppress_window_reordering();
        if !surface.is_active_recipient() {
            surface.become_active_recipient();
        }

        let status = match surface.deliver(event) {
            Ok(()) => {
                trace!(
                    sequence_id = request.sequence_id,
                    kind = ?request.kind,
                    x = event.window_location.x,
                    y = event.window_location.y,
                    "delivered"
                );
                DeliveryStatus::Delivered
            }
            Err(e) => {
                warn!(sequence_id = request.sequence_id, error = %e, "surface refused touch");
                DeliveryStatus::Dropped
            }
        };
        self.recorder
            .record(request.diagnostics(status, Some(latency())));
        status
    }
}
