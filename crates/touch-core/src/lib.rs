//! # touch-core
//!
//! Shared foundation for remapping a secondary display's touch digitizer.
//!
//! The host reports touches from a secondary touch screen in the coordinate
//! space of the *primary* display.  Everything needed to reason about that,
//! without touching any OS API, lives here:
//!
//! - **`domain::geometry`** – the Coordinate Transformer: convention flips,
//!   `remap` between frames, and window-local conversion.
//! - **`domain::event`** – the closed set of pointer event kinds and the event
//!   record observed at the interception point.
//! - **`domain::identity`** – the set of host identity values that all denote
//!   the one physical digitizer.
//! - **`domain::sequence`** – single-contact Down/Drag/Up tracking.
//! - **`diagnostics`** – the fixed-capacity ring buffer of pipeline decisions.

pub mod diagnostics;
pub mod domain;

pub use diagnostics::{DeliveryStatus, DiagnosticsEntry, DiagnosticsRecorder, RecorderStatistics};
pub use domain::event::{DeviceIdentity, EventKind, PointerEvent};
pub use domain::geometry::{flip_frame, flip_point, remap, to_window_local, Frame, Point, Size};
pub use domain::identity::DeviceIdentitySet;
pub use domain::sequence::{SequenceTransition, TouchSequence};
