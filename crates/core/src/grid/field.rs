//! Scalar temperature field
//!
//! The field stores one integer temperature per cell in column-major order
//! (`x * height + y`), so a contiguous run of the backing slice is a contiguous
//! range of columns. Parallel stepping relies on this layout to hand each worker
//! a disjoint `&mut` chunk of whole columns.

use super::region::Region;
use crate::error::GridError;
use serde::Serialize;

/// Temperature of a single cell
pub type Temperature = u8;

/// Hottest representable temperature, written by heat injection
pub const MAX_TEMP: Temperature = 255;

/// Fixed-size 2-D grid of temperatures
///
/// Dimensions never change after construction; resizing a simulation builds a
/// new field instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ScalarField {
    /// Cell values in column-major order (x * height + y)
    data: Vec<Temperature>,
    /// Grid width in cells
    width: usize,
    /// Grid height in cells
    height: usize,
}

impl ScalarField {
    /// Create a new field with given dimensions, initialized to zero
    ///
    /// # Errors
    ///
    /// [`GridError::InvalidDimensions`] if either dimension is zero.
    pub fn new(width: usize, height: usize) -> Result<Self, GridError> {
        Self::with_value(width, height, 0)
    }

    /// Create a new field with every cell set to `value`
    pub fn with_value(width: usize, height: usize, value: Temperature) -> Result<Self, GridError> {
        let len = checked_len(width, height)?;
        Ok(Self {
            data: vec![value; len],
            width,
            height,
        })
    }

    /// Build a field from column-major cell values
    ///
    /// # Errors
    ///
    /// [`GridError::InvalidDimensions`] for a zero dimension, and
    /// [`GridError::LengthMismatch`] when `data` does not hold exactly
    /// `width * height` values.
    pub fn from_columns(
        width: usize,
        height: usize,
        data: Vec<Temperature>,
    ) -> Result<Self, GridError> {
        let len = checked_len(width, height)?;
        if data.len() != len {
            return Err(GridError::LengthMismatch {
                expected: len,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Zeroed field with the same dimensions, used as a step's write buffer
    pub(crate) fn zeroed_like(&self) -> Self {
        Self {
            data: vec![0; self.data.len()],
            width: self.width,
            height: self.height,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// `(width, height)`
    #[inline]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Number of cells
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false: a field has at least one cell
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Column-major view of every cell
    pub fn as_slice(&self) -> &[Temperature] {
        &self.data
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [Temperature] {
        &mut self.data
    }

    /// All cells of column `x`, top to bottom
    ///
    /// # Panics
    ///
    /// Panics if `x >= width`
    pub fn column(&self, x: usize) -> &[Temperature] {
        assert!(x < self.width, "Coordinates out of bounds");
        let start = x * self.height;
        &self.data[start..start + self.height]
    }

    /// Get value at grid position
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds
    pub fn get(&self, x: usize, y: usize) -> Temperature {
        assert!(
            x < self.width && y < self.height,
            "Coordinates out of bounds"
        );
        self.data[self.index(x, y)]
    }

    /// Get value at grid position, or `None` outside the field
    pub fn try_get(&self, x: usize, y: usize) -> Option<Temperature> {
        (x < self.width && y < self.height).then(|| self.data[self.index(x, y)])
    }

    /// Set value at grid position
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds
    pub fn set(&mut self, x: usize, y: usize, value: Temperature) {
        assert!(
            x < self.width && y < self.height,
            "Coordinates out of bounds"
        );
        let idx = self.index(x, y);
        self.data[idx] = value;
    }

    /// Read used by the stencil kernel: every caller derives `(x, y)` from the
    /// field's own bounds, so the check only runs in debug builds.
    #[inline(always)]
    pub(crate) fn at(&self, x: usize, y: usize) -> Temperature {
        debug_assert!(
            x < self.width && y < self.height,
            "stencil read ({x}, {y}) outside {}x{} field",
            self.width,
            self.height
        );
        self.data[self.index(x, y)]
    }

    #[inline(always)]
    fn index(&self, x: usize, y: usize) -> usize {
        x * self.height + y
    }

    /// Fill entire field with a value
    pub fn fill(&mut self, value: Temperature) {
        self.data.fill(value);
    }

    /// Set every cell of `region` that lies inside the field to `value`
    ///
    /// Returns the number of cells written.
    pub fn fill_region(&mut self, region: &Region, value: Temperature) -> usize {
        let Some(clipped) = region.bounds().clip(self.width, self.height) else {
            return 0;
        };

        let mut written = 0;
        for x in clipped.columns() {
            for y in clipped.rows() {
                if region.contains(x as i64, y as i64) {
                    let idx = self.index(x, y);
                    self.data[idx] = value;
                    written += 1;
                }
            }
        }
        written
    }

    /// Whether `(x, y)` lies on the outer ring of the field
    #[inline]
    pub fn is_border(&self, x: usize, y: usize) -> bool {
        x == 0 || y == 0 || x == self.width - 1 || y == self.height - 1
    }

    /// Whether every cell holds the same temperature (thermal equilibrium)
    pub fn is_uniform(&self) -> bool {
        let first = self.data[0];
        self.data.iter().all(|&t| t == first)
    }

    /// Sum of all cell temperatures
    pub fn total_heat(&self) -> u64 {
        self.data.iter().map(|&t| u64::from(t)).sum()
    }

    /// Hottest cell temperature
    pub fn max_temperature(&self) -> Temperature {
        self.data.iter().copied().max().unwrap_or(0)
    }
}

fn checked_len(width: usize, height: usize) -> Result<usize, GridError> {
    if width == 0 || height == 0 {
        return Err(GridError::InvalidDimensions { width, height });
    }
    width
        .checked_mul(height)
        .ok_or(GridError::InvalidDimensions { width, height })
}
