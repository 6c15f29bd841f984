//! Pointer events as delivered by the host's global event stream.

use serde::{Deserialize, Serialize};

use super::geometry::Point;

/// Integer label the host attaches to every pointer event.
///
/// The same physical device may be reported under several different values
/// depending on which internal layer produced the event.
pub type DeviceIdentity = i64;

/// The closed set of pointer event kinds the pipeline observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// Contact started (left button down).
    Down,
    /// Contact ended (left button up).
    Up,
    /// Contact moved while pressed.
    Drag,
    /// Pointer moved without contact.
    Move,
}

impl EventKind {
    /// Returns `true` for kinds that belong to a press sequence.
    pub fn is_contact(self) -> bool {
        matches!(self, EventKind::Down | EventKind::Up | EventKind::Drag)
    }
}

/// A pointer event observed at the interception point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    /// Identity label reported by the host for this event.
    pub device_identity: DeviceIdentity,
    pub kind: EventKind,
    /// Location in global interception coordinates (origin top-left of primary).
    pub location: Point,
    /// Host timestamp in nanoseconds since boot.
    pub timestamp_ns: u64,
    /// Click count reported by the host (1 for a single tap).
    pub click_count: i64,
}

impl PointerEvent {
    /// Convenience constructor used heavily by tests and mocks.
    pub fn new(device_identity: DeviceIdentity, kind: EventKind, x: f64, y: f64) -> Self {
        Self {
            device_identity,
            kind,
            location: Point::new(x, y),
            timestamp_ns: 0,
            click_count: if kind.is_contact() { 1 } else { 0 },
        }
    }
}
