//! macOS display enumeration via Core Graphics (`CGDisplay`).
//!
//! Uses `CGGetActiveDisplayList` to enumerate all active displays and
//! `CGDisplayBounds` (through `CGDisplay::bounds`) to obtain each display's position and size.
//!
//! # Implementation notes
//!
//! `CGDisplayBounds` reports rectangles in the global display space, whose
//! origin is the top-left of the primary display with Y increasing downward.
//! The [`DisplayGeometry`] contract is the natural bottom-left convention, so
//! each rectangle is flipped against the primary display's height.

#![cfg(target_os = "macos")]

use core_graphics::display::CGDisplay;
use touch_core::{flip_frame, Frame};

use super::{DisplayError, DisplayGeometry, DisplayInfo};

/// macOS implementation of [`DisplayGeometry`] via Core Graphics.
#[derive(Default)]
pub struct MacosDisplayGeometry;

impl MacosDisplayGeometry {
    pub fn new() -> Self {
        Self
    }
}

impl DisplayGeometry for MacosDisplayGeometry {
    fn displays(&self) -> Result<Vec<DisplayInfo>, DisplayError> {
        let active =
            CGDisplay::active_displays().map_err(|e| DisplayError::PlatformError(e.to_string()))?;
        if active.is_empty() {
            return Err(DisplayError::NoDisplays);
        }

        let primary_id = CGDisplay::main().id;
        let primary_height = CGDisplay::main().bounds().size.height;

        let mut displays: Vec<DisplayInfo> = active
            .iter()
            .map(|&id| {
                let bounds = CGDisplay::new(id).bounds();
                let global = Frame::new(
                    bounds.origin.x,
                    bounds.origin.y,
                    bounds.size.width,
                    bounds.size.height,
                );
                DisplayInfo {
                    id,
                    frame: flip_frame(global, primary_height),
                    is_primary: id == primary_id,
                }
            })
            .collect();

        // Primary first.
        displays.sort_by_key(|d| !d.is_primary);
        Ok(displays)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// Smoke-test: on a macOS machine with at least one display this must succeed.
    #[test]
    fn test_macos_display_geometry_returns_primary_first() {
        let displays = MacosDisplayGeometry::new().displays().expect("displays");
        assert!(displays[0].is_primary, "first entry must be the primary display");
    }

    #[test]
    fn test_primary_display_sits_at_natural_origin() {
        let displays = MacosDisplayGeometry::new().displays().expect("displays");
        assert_eq!(displays[0].frame.origin.x, 0.0);
        assert_eq!(displays[0].frame.origin.y, 0.0);
    }
}
