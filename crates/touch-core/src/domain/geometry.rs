//! Coordinate geometry for remapping touches between displays.
//!
//! Two coordinate conventions meet in this system:
//!
//! - **Natural** (origin bottom-left of the primary display, Y grows upward).
//!   Display bounds and window frames reported by the windowing layer use it.
//! - **Interception** (origin top-left of the primary display, Y grows
//!   downward).  Locations carried by intercepted pointer events use it.
//!
//! Converting between them only needs the height of the primary display,
//! because both conventions share the same X axis and the primary display is
//! the anchor of both.
//!
//! Every function here is pure: no display is queried, nothing is cached.
//! Callers recompute frames from live display geometry on every event.

use serde::{Deserialize, Serialize};

/// A point in some coordinate convention.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Creates a new point.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Width and height of a rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// A rectangle (origin + size) expressed in one coordinate convention.
///
/// Frames are derived values.  They are rebuilt from live display geometry
/// whenever they are needed and never persisted across events, because a
/// display can be connected, disconnected or rearranged at any time.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Frame {
    pub origin: Point,
    pub size: Size,
}

impl Frame {
    /// Creates a frame from its origin and size components.
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: Point { x, y },
            size: Size { width, height },
        }
    }

    pub fn min_x(&self) -> f64 {
        self.origin.x
    }

    pub fn max_x(&self) -> f64 {
        self.origin.x + self.size.width
    }

    pub fn min_y(&self) -> f64 {
        self.origin.y
    }

    pub fn max_y(&self) -> f64 {
        self.origin.y + self.size.height
    }

    /// Returns `true` when the frame has a positive, finite area.
    pub fn has_area(&self) -> bool {
        self.size.width > 0.0
            && self.size.height > 0.0
            && self.size.width.is_finite()
            && self.size.height.is_finite()
    }

    /// Returns `true` if `point` lies inside the frame.
    ///
    /// The minimum edges are inclusive and the maximum edges exclusive, so two
    /// displays that share an edge never both claim the same point.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.min_x()
            && point.x < self.max_x()
            && point.y >= self.min_y()
            && point.y < self.max_y()
    }
}

/// Converts a frame between the natural and interception conventions.
///
/// The conversion is its own inverse: applying it twice with the same
/// `primary_height` returns the original frame.
pub fn flip_frame(frame: Frame, primary_height: f64) -> Frame {
    Frame {
        origin: Point {
            x: frame.origin.x,
            y: primary_height - frame.origin.y - frame.size.height,
        },
        size: frame.size,
    }
}

/// Converts a single point between the natural and interception conventions.
pub fn flip_point(point: Point, primary_height: f64) -> Point {
    Point {
        x: point.x,
        y: primary_height - point.y,
    }
}

/// Expresses `point` as a fraction of `frame`'s width and height.
///
/// Returns `None` when either fraction falls outside `[0, 1]`, or when the
/// frame has no area to normalise against.
pub fn normalize(point: Point, frame: Frame) -> Option<Point> {
    if !frame.has_area() {
        return None;
    }
    let nx = (point.x - frame.origin.x) / frame.size.width;
    let ny = (point.y - frame.origin.y) / frame.size.height;
    let in_unit = |v: f64| (0.0..=1.0).contains(&v);
    if in_unit(nx) && in_unit(ny) {
        Some(Point::new(nx, ny))
    } else {
        None
    }
}

/// Scales a normalised fraction back into `frame`.
pub fn denormalize(fraction: Point, frame: Frame) -> Point {
    Point {
        x: frame.origin.x + fraction.x * frame.size.width,
        y: frame.origin.y + fraction.y * frame.size.height,
    }
}

/// Remaps `point` from `source` into the proportionally equivalent position
/// inside `target`.
///
/// Returns `None` when `point` lies outside `source` (the transform is
/// rejected rather than clamped).
pub fn remap(point: Point, source: Frame, target: Frame) -> Option<Point> {
    if !target.has_area() {
        return None;
    }
    normalize(point, source).map(|fraction| denormalize(fraction, target))
}

/// Converts a point in the interception convention into coordinates local to
/// a window whose frame is given in the natural convention.
pub fn to_window_local(point: Point, window_frame: Frame, primary_height: f64) -> Point {
    let natural = flip_point(point, primary_height);
    Point {
        x: natural.x - window_frame.origin.x,
        y: natural.y - window_frame.origin.y,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn source() -> Frame {
        Frame::new(0.0, 0.0, 1920.0, 1080.0)
    }

    fn target() -> Frame {
        Frame::new(1920.0, 0.0, 2560.0, 720.0)
    }

    fn assert_close(a: Point, b: Point) {
        assert!(
            (a.x - b.x).abs() < EPS && (a.y - b.y).abs() < EPS,
            "expected {b:?}, got {a:?}"
        );
    }

    // ── remap ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_remap_center_of_primary_lands_at_center_of_target() {
        // Arrange
        let input = Point::new(960.0, 540.0);

        // Act
        let out = remap(input, source(), target()).expect("inside source frame");

        // Assert
        assert_close(out, Point::new(3200.0, 360.0));
    }

    #[test]
    fn test_remap_rejects_point_beyond_source_width() {
        // Arrange
        let input = Point::new(2000.0, 540.0);

        // Act
        let out = remap(input, source(), target());

        // Assert
        assert!(out.is_none());
    }

    #[test]
    fn test_remap_rejects_negative_coordinates() {
        assert!(remap(Point::new(-1.0, 10.0), source(), target()).is_none());
        assert!(remap(Point::new(10.0, -0.5), source(), target()).is_none());
    }

    #[test]
    fn test_remap_accepts_source_edges() {
        // Normalised fractions of exactly 0 and 1 are inside [0, 1].
        assert_close(
            remap(Point::new(0.0, 0.0), source(), target()).expect("origin"),
            Point::new(1920.0, 0.0),
        );
        assert_close(
            remap(Point::new(1920.0, 1080.0), source(), target()).expect("far corner"),
            Point::new(4480.0, 720.0),
        );
    }

    #[test]
    fn test_remap_interior_points_stay_strictly_inside_target_and_round_trip() {
        // Arrange: a grid of points strictly inside the source frame
        let src = source();
        let dst = target();
        for i in 1..20 {
            for j in 1..20 {
                let p = Point::new(src.size.width * i as f64 / 20.0, src.size.height * j as f64 / 20.0);

                // Act
                let out = remap(p, src, dst).expect("interior point must remap");
                let fraction = normalize(out, dst).expect("remapped point is inside target");
                let back = denormalize(fraction, src);

                // Assert
                assert!(out.x > dst.min_x() && out.x < dst.max_x());
                assert!(out.y > dst.min_y() && out.y < dst.max_y());
                assert_close(back, p);
            }
        }
    }

    #[test]
    fn test_remap_rejects_zero_sized_frames() {
        let empty = Frame::new(0.0, 0.0, 0.0, 1080.0);
        assert!(remap(Point::new(0.0, 0.0), empty, target()).is_none());
        assert!(remap(Point::new(10.0, 10.0), source(), empty).is_none());
    }

    // ── Convention conversion ─────────────────────────────────────────────────

    #[test]
    fn test_flip_frame_is_self_inverse() {
        // Arrange
        let frames = [
            Frame::new(0.0, 0.0, 1920.0, 1080.0),
            Frame::new(1920.0, 360.0, 2560.0, 720.0),
            Frame::new(-1280.0, -800.0, 1280.0, 800.0),
        ];

        for f in frames {
            // Act
            let twice = flip_frame(flip_frame(f, 1080.0), 1080.0);

            // Assert
            assert_eq!(twice, f);
        }
    }

    #[test]
    fn test_flip_frame_of_primary_is_identity() {
        let primary = source();
        assert_eq!(flip_frame(primary, primary.size.height), primary);
    }

    #[test]
    fn test_flip_frame_moves_display_below_primary_to_positive_y() {
        // A 720-tall display directly below a 1080-tall primary sits at
        // natural y = -720 and interception y = 1080.
        let below = Frame::new(0.0, -720.0, 2560.0, 720.0);
        let flipped = flip_frame(below, 1080.0);
        assert_eq!(flipped.origin, Point::new(0.0, 1080.0));
    }

    #[test]
    fn test_to_window_local_flips_and_subtracts_origin() {
        // Arrange: a window occupying the natural frame (1920, 360, 2560, 720)
        let window = Frame::new(1920.0, 360.0, 2560.0, 720.0);

        // Act: interception point near the top-left of that window
        let local = to_window_local(Point::new(1930.0, 10.0), window, 1080.0);

        // Assert: natural y = 1070, local y = 1070 - 360 = 710 (near the window top)
        assert_close(local, Point::new(10.0, 710.0));
    }

    #[test]
    fn test_contains_is_half_open() {
        let f = source();
        assert!(f.contains(Point::new(0.0, 0.0)));
        assert!(!f.contains(Point::new(1920.0, 10.0)));
        assert!(!f.contains(Point::new(10.0, 1080.0)));
    }
}
