//! Display geometry infrastructure.
//!
//! Reports every active display's bounds in the *natural* convention (origin
//! at the bottom-left of the primary display, Y up) and which display is
//! primary.  Callers must query on every use: displays can be connected,
//! disconnected or rearranged at any moment, and nothing here caches.

use thiserror::Error;

use touch_core::Frame;

pub mod mock;

#[cfg(target_os = "macos")]
pub mod macos;

/// One active display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayInfo {
    /// Host display ID.
    pub id: u32,
    /// Bounds in the natural (bottom-left origin) convention.
    pub frame: Frame,
    pub is_primary: bool,
}

/// Error type for display enumeration.
#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("display enumeration failed: {0}")]
    PlatformError(String),
    #[error("no active displays")]
    NoDisplays,
}

/// Live source of display geometry.
pub trait DisplayGeometry: Send + Sync {
    /// Returns every active display.
    ///
    /// # Errors
    ///
    /// Returns [`DisplayError`] if the host refuses the query or reports no
    /// displays at all.
    fn displays(&self) -> Result<Vec<DisplayInfo>, DisplayError>;
}
