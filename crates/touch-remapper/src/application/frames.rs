//! Per-event frame resolution.
//!
//! Turns a live display list into the two rectangles the remap needs, both in
//! the interception convention (top-left origin of the primary, Y down):
//!
//! - **source**: the primary display, whose space the host wrongly reports
//!   the digitizer's touches in;
//! - **target**: the display the digitizer is physically attached to.
//!
//! Nothing is cached.  The display list is re-queried for every event, so a
//! rearrangement takes effect on the very next touch.

use serde::{Deserialize, Serialize};

use touch_core::{flip_frame, Frame};

use crate::infrastructure::display::DisplayInfo;

/// Which display receives remapped touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetDisplay {
    /// The first display that is not primary.
    FirstSecondary,
    /// A specific host display ID.
    Id(u32),
}

/// Frames for one remap, in the interception convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RemapFrames {
    pub source: Frame,
    pub target: Frame,
    /// Height of the primary display, needed to flip back to natural.
    pub primary_height: f64,
}

impl RemapFrames {
    /// The target display's frame back in the natural convention.
    pub fn target_natural(&self) -> Frame {
        flip_frame(self.target, self.primary_height)
    }
}

/// Picks source and target from `displays`.
///
/// Returns `None` when there is no primary display, when the selected target
/// is absent, or when the target would be the primary itself.
pub fn resolve_frames(displays: &[DisplayInfo], target: TargetDisplay) -> Option<RemapFrames> {
    let primary = displays.iter().find(|d| d.is_primary)?;
    let target = match target {
        TargetDisplay::FirstSecondary => displays.iter().find(|d| !d.is_primary)?,
        TargetDisplay::Id(id) => displays.iter().find(|d| d.id == id && !d.is_primary)?,
    };

    let primary_height = primary.frame.size.height;
    Some(RemapFrames {
        source: flip_frame(primary.frame, primary_height),
        target: flip_frame(target.frame, primary_height),
        primary_height,
    })
}
