//! Infrastructure layer for the touch remapper.
//!
//! Contains OS-facing adapters, each behind a trait with an in-memory mock:
//! the event tap, the hardware registry, display geometry, the target
//! surface and the permission gate.  Native macOS backends sit next to each
//! mock behind `#[cfg(target_os = "macos")]`.  Also here: TOML config
//! storage and the status/calibration bridge.
//!
//! **Dependency rule**: `application` may name the traits declared in these
//! module roots, but never a native backend.

pub mod display;
pub mod event_tap;
pub mod permission;
pub mod registry;
pub mod storage;
pub mod surface;
pub mod ui_bridge;
