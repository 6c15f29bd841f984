//! Diagnostics: an in-memory record of what the pipeline decided and why.
//!
//! The recorder is the only place where user-visible failure shows up.  A
//! dropped touch never interrupts the host application; it becomes a
//! `Dropped` entry here that the status bridge can surface.

pub mod recorder;

pub use recorder::{
    DeliveryStatus, DiagnosticsEntry, DiagnosticsRecorder, RecorderStatistics, DEFAULT_CAPACITY,
    THROUGHPUT_WINDOW,
};
