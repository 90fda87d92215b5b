//! Regions addressed by bulk field writes
//!
//! Regions are expressed in signed coordinates so callers can pass positions
//! that lie partly or entirely outside the field. Every write clips a region
//! to the field bounds before touching a cell.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Axis-aligned rectangle with inclusive corners, in cell coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    /// Smallest x coordinate covered
    pub min_x: i64,
    /// Smallest y coordinate covered
    pub min_y: i64,
    /// Largest x coordinate covered
    pub max_x: i64,
    /// Largest y coordinate covered
    pub max_y: i64,
}

/// A [`Rect`] clipped to a field, in unsigned cell coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClippedRect {
    pub min_x: usize,
    pub min_y: usize,
    pub max_x: usize,
    pub max_y: usize,
}

impl ClippedRect {
    pub fn columns(&self) -> RangeInclusive<usize> {
        self.min_x..=self.max_x
    }

    pub fn rows(&self) -> RangeInclusive<usize> {
        self.min_y..=self.max_y
    }
}

impl Rect {
    /// Create a rectangle from inclusive corner coordinates
    pub const fn new(min_x: i64, min_y: i64, max_x: i64, max_y: i64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Square of side `2 * radius + 1` centered on `(cx, cy)`
    ///
    /// Corners saturate at the `i64` range.
    pub fn around(cx: i64, cy: i64, radius: u32) -> Self {
        let r = i64::from(radius);
        Self::new(
            cx.saturating_sub(r),
            cy.saturating_sub(r),
            cx.saturating_add(r),
            cy.saturating_add(r),
        )
    }

    /// Clip to a `width` x `height` field.
    ///
    /// Returns `None` when the rectangle does not overlap the field at all.
    pub fn clip(&self, width: usize, height: usize) -> Option<ClippedRect> {
        let last_x = i64::try_from(width).ok()? - 1;
        let last_y = i64::try_from(height).ok()? - 1;

        let min_x = self.min_x.max(0);
        let min_y = self.min_y.max(0);
        let max_x = self.max_x.min(last_x);
        let max_y = self.max_y.min(last_y);

        if min_x > max_x || min_y > max_y {
            return None;
        }

        Some(ClippedRect {
            min_x: min_x as usize,
            min_y: min_y as usize,
            max_x: max_x as usize,
            max_y: max_y as usize,
        })
    }
}

/// Shape of a bulk write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Region {
    /// Every cell of the rectangle
    Rect(Rect),
    /// Every cell whose squared distance to the center is at most `radius²`
    Disk {
        cx: i64,
        cy: i64,
        radius: u32,
    },
}

impl Region {
    pub const fn disk(cx: i64, cy: i64, radius: u32) -> Self {
        Self::Disk { cx, cy, radius }
    }

    /// Bounding rectangle of the region (unclipped)
    pub fn bounds(&self) -> Rect {
        match *self {
            Self::Rect(rect) => rect,
            Self::Disk { cx, cy, radius } => Rect::around(cx, cy, radius),
        }
    }

    /// Whether the cell `(x, y)` belongs to the region
    #[inline]
    pub fn contains(&self, x: i64, y: i64) -> bool {
        match *self {
            Self::Rect(rect) => {
                (rect.min_x..=rect.max_x).contains(&x) && (rect.min_y..=rect.max_y).contains(&y)
            }
            Self::Disk { cx, cy, radius } => {
                // |dx| < 2^64, so each square fits in u128
                let dx = (i128::from(x) - i128::from(cx)).unsigned_abs();
                let dy = (i128::from(y) - i128::from(cy)).unsigned_abs();
                let r = u128::from(radius);
                (dx * dx).saturating_add(dy * dy) <= r * r
            }
        }
    }
}

impl From<Rect> for Region {
    fn from(rect: Rect) -> Self {
        Self::Rect(rect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_inside() {
        let clipped = Rect::new(1, 2, 3, 4).clip(10, 10).unwrap();
        assert_eq!(
            clipped,
            ClippedRect {
                min_x: 1,
                min_y: 2,
                max_x: 3,
                max_y: 4
            }
        );
    }

    #[test]
    fn test_clip_partially_outside() {
        let clipped = Rect::around(0, 9, 3).clip(10, 10).unwrap();
        assert_eq!(clipped.columns(), 0..=3);
        assert_eq!(clipped.rows(), 6..=9);
    }

    #[test]
    fn test_clip_fully_outside() {
        assert!(Rect::new(20, 20, 30, 30).clip(10, 10).is_none());
        assert!(Rect::new(-10, 0, -1, 5).clip(10, 10).is_none());
    }

    #[test]
    fn test_disk_contains() {
        let disk = Region::disk(5, 5, 2);
        assert!(disk.contains(5, 5));
        assert!(disk.contains(7, 5));
        assert!(disk.contains(5, 3));
        // (2, 2) offset has squared distance 8 > 4
        assert!(!disk.contains(7, 7));
        assert!(!disk.contains(8, 5));
    }

    #[test]
    fn test_disk_bounds() {
        assert_eq!(Region::disk(0, 0, 20).bounds(), Rect::new(-20, -20, 20, 20));
    }

    #[test]
    fn test_around_saturates_at_extremes() {
        let rect = Rect::around(i64::MAX, i64::MIN, u32::MAX);
        assert_eq!(rect.max_x, i64::MAX);
        assert_eq!(rect.min_y, i64::MIN);
        assert_eq!(rect.min_x, i64::MAX - i64::from(u32::MAX));
        assert_eq!(rect.max_y, i64::MIN + i64::from(u32::MAX));
    }

    #[test]
    fn test_disk_contains_with_extreme_values() {
        let huge = Region::disk(5, 5, u32::MAX);
        assert!(huge.contains(0, 0));
        assert!(huge.contains(i64::from(u32::MAX) + 5, 5));
        assert!(!huge.contains(i64::from(u32::MAX) + 6, 5));

        let far = Region::disk(i64::MAX, 0, 20);
        assert!(!far.contains(0, 0));
        assert!(far.contains(i64::MAX, 0));

        let opposite = Region::disk(i64::MIN, i64::MIN, u32::MAX);
        assert!(!opposite.contains(i64::MAX, i64::MAX));
    }

    #[test]
    fn test_rect_region_contains() {
        let region = Region::from(Rect::new(1, 1, 2, 3));
        assert!(region.contains(1, 3));
        assert!(!region.contains(3, 3));
        assert!(!region.contains(1, 0));
    }
}
