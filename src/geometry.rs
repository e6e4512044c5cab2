//! Structures used to map areas on the screen

use serde::{Deserialize, Serialize};
use std::fmt;
use x11rb::protocol::xproto::ConfigureWindowAux;

// =============================== Point ==============================
// ====================================================================

/// A location on the screen. When this is used with a [`Rectangle`], it
/// represents the top-left corner
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub(crate) struct Point {
    /// X-coordinate
    pub(crate) x: i32,
    /// Y-coordinate
    pub(crate) y: i32,
}

impl Point {
    /// Create a new [`Point`]
    pub(crate) const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Return the `x` and `y` coordinates as a tuple
    pub(crate) const fn as_tuple(self) -> (i32, i32) {
        (self.x, self.y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "x: {}, y: {}", self.x, self.y)
    }
}

// ============================= Dimension ===========================
// ====================================================================

/// A `width` and a `height`. The area of a [`Rectangle`]
#[derive(
    Debug, Default, Copy, Clone, PartialOrd, Ord, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub(crate) struct Dimension {
    /// The width of the [`Rectangle`]
    pub(crate) width:  u32,
    /// The height of the [`Rectangle`]
    pub(crate) height: u32,
}

impl Dimension {
    /// Create a new [`Dimension`]
    pub(crate) const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "width: {}, height: {}", self.width, self.height)
    }
}

// ============================= Rectangle ============================
// ====================================================================

/// Equivalent to `xcb_rectangle_t`
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub(crate) struct Rectangle {
    /// Represents the top-left corner of the rectangle
    pub(crate) point:     Point,
    /// The width and height of the rectangle
    pub(crate) dimension: Dimension,
}

impl Rectangle {
    /// Create a new [`Rectangle`]
    pub(crate) const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            point:     Point::new(x, y),
            dimension: Dimension::new(width, height),
        }
    }

    /// Left edge
    pub(crate) const fn x(&self) -> i32 {
        self.point.x
    }

    /// Top edge
    pub(crate) const fn y(&self) -> i32 {
        self.point.y
    }

    /// Width of the [`Rectangle`]
    pub(crate) const fn width(&self) -> u32 {
        self.dimension.width
    }

    /// Height of the [`Rectangle`]
    pub(crate) const fn height(&self) -> u32 {
        self.dimension.height
    }

    /// One past the right-most column
    pub(crate) const fn right(&self) -> i32 {
        self.point.x + self.dimension.width as i32
    }

    /// One past the bottom-most row
    pub(crate) const fn bottom(&self) -> i32 {
        self.point.y + self.dimension.height as i32
    }

    /// Test whether the given [`Point`] is contained within the [`Rectangle`]
    pub(crate) const fn is_inside(&self, point: Point) -> bool {
        point.x >= self.point.x
            && point.x < self.right()
            && point.y >= self.point.y
            && point.y < self.bottom()
    }

    /// Test whether the given [`Rectangle`] is contained within another
    pub(crate) const fn contains(&self, rect: Self) -> bool {
        rect.point.x >= self.point.x
            && rect.point.y >= self.point.y
            && rect.right() <= self.right()
            && rect.bottom() <= self.bottom()
    }

    /// Area shared by the two [`Rectangle`]s
    pub(crate) fn intersection_area(&self, rect: Self) -> u64 {
        let w = self.right().min(rect.right()) - self.point.x.max(rect.point.x);
        let h = self.bottom().min(rect.bottom()) - self.point.y.max(rect.point.y);

        if w <= 0 || h <= 0 {
            0
        } else {
            w as u64 * h as u64
        }
    }

    /// Do the two [`Rectangle`]s share any pixel?
    pub(crate) fn overlaps(&self, rect: Self) -> bool {
        self.intersection_area(rect) > 0
    }

    /// Return a copy moved by the given offset
    pub(crate) const fn translated(self, dx: i32, dy: i32) -> Self {
        Self::new(
            self.point.x + dx,
            self.point.y + dy,
            self.dimension.width,
            self.dimension.height,
        )
    }

    /// Shrink each side by `amount`, as used when removing a border
    pub(crate) const fn shrink(self, amount: u32) -> Self {
        Self::new(
            self.point.x,
            self.point.y,
            self.dimension.width.saturating_sub(2 * amount),
            self.dimension.height.saturating_sub(2 * amount),
        )
    }

    /// Create a [`ConfigureWindowAux`] from a [`Rectangle`]. The dimension is
    /// the inner size of the window, excluding the border
    pub(crate) fn to_aux(self, border_width: u32) -> ConfigureWindowAux {
        ConfigureWindowAux::new()
            .x(self.point.x)
            .y(self.point.y)
            .width(self.dimension.width.max(1))
            .height(self.dimension.height.max(1))
            .border_width(border_width)
    }
}

impl fmt::Display for Rectangle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}), ({})", self.point, self.dimension)
    }
}

#[cfg(test)]
mod tests {
    use super::{Point, Rectangle};

    #[test]
    fn containment() {
        let outer = Rectangle::new(0_i32, 0_i32, 100_u32, 100_u32);
        assert!(outer.contains(Rectangle::new(10_i32, 10_i32, 90_u32, 90_u32)));
        assert!(!outer.contains(Rectangle::new(10_i32, 10_i32, 91_u32, 90_u32)));
        assert!(outer.is_inside(Point::new(99_i32, 0_i32)));
        assert!(!outer.is_inside(Point::new(100_i32, 0_i32)));
    }

    #[test]
    fn intersection() {
        let a = Rectangle::new(0_i32, 0_i32, 50_u32, 50_u32);
        let b = Rectangle::new(40_i32, 40_i32, 50_u32, 50_u32);
        let c = Rectangle::new(50_i32, 0_i32, 50_u32, 50_u32);

        assert_eq!(a.intersection_area(b), 100_u64);
        assert!(a.overlaps(b));
        // Touching edges do not overlap
        assert!(!a.overlaps(c));
    }

    #[test]
    fn shrink_saturates() {
        let r = Rectangle::new(5_i32, 5_i32, 3_u32, 10_u32).shrink(2);
        assert_eq!(r, Rectangle::new(5_i32, 5_i32, 0_u32, 6_u32));
    }
}
