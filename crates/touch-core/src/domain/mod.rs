//! Domain entities for touch remapping.
//!
//! Pure logic only: nothing in this module talks to a display server, a
//! hardware registry or an event tap, so all of it can be tested on any
//! platform without a touch screen attached.

/// Coordinate conventions, frames and the remap transform.
pub mod geometry;

/// Pointer events observed at the interception point.
pub mod event;

/// The identity set that singles out one physical digitizer.
pub mod identity;

/// Down/Drag/Up sequencing.
pub mod sequence;
