//! Mock display geometry for testing.
//!
//! Holds a mutable display list so tests can reconfigure displays between
//! events and check that nothing downstream caches frames.

use std::sync::Mutex;

use touch_core::Frame;

use super::{DisplayError, DisplayGeometry, DisplayInfo};

/// A configurable display list.
pub struct MockDisplayGeometry {
    displays: Mutex<Vec<DisplayInfo>>,
}

impl MockDisplayGeometry {
    pub fn new(displays: Vec<DisplayInfo>) -> Self {
        Self {
            displays: Mutex::new(displays),
        }
    }

    /// A 1920x1080 primary with a 2560x720 touch display to its right.
    ///
    /// Both displays share a top edge, so in the natural convention the
    /// secondary sits at y = 1080 - 720 = 360.
    pub fn primary_and_touch_display() -> Self {
        Self::new(vec![
            DisplayInfo {
                id: 1,
                frame: Frame::new(0.0, 0.0, 1920.0, 1080.0),
                is_primary: true,
            },
            DisplayInfo {
                id: 2,
                frame: Frame::new(1920.0, 360.0, 2560.0, 720.0),
                is_primary: false,
            },
        ])
    }

    /// Replaces the display list, as when the user rearranges displays.
    pub fn set_displays(&self, displays: Vec<DisplayInfo>) {
        *self.displays.lock().expect("lock poisoned") = displays;
    }
}

impl DisplayGeometry for MockDisplayGeometry {
    fn displays(&self) -> Result<Vec<DisplayInfo>, DisplayError> {
        let displays = self.displays.lock().expect("lock poisoned").clone();
        if displays.is_empty() {
            return Err(DisplayError::NoDisplays);
        }
        Ok(displays)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_has_one_primary() {
        let geometry = MockDisplayGeometry::primary_and_touch_display();
        let displays = geometry.displays().expect("displays");
        assert_eq!(displays.iter().filter(|d| d.is_primary).count(), 1);
    }

    #[test]
    fn test_empty_layout_reports_no_displays() {
        let geometry = MockDisplayGeometry::new(Vec::new());
        assert!(matches!(geometry.displays(), Err(DisplayError::NoDisplays)));
    }

    #[test]
    fn test_set_displays_is_visible_on_next_query() {
        // Arrange
        let geometry = MockDisplayGeometry::primary_and_touch_display();

        // Act
        geometry.set_displays(vec![DisplayInfo {
            id: 1,
            frame: Frame::new(0.0, 0.0, 1920.0, 1080.0),
            is_primary: true,
        }]);

        // Assert
        assert_eq!(geometry.displays().expect("displays").len(), 1);
    }
}
