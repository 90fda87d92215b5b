//! 3x3 averaging stencil
//!
//! ```text
//! T'(x, y) = 0                                       on the outer ring
//! T'(x, y) = ⌊ Σ T(x+dx, y+dy) / n ⌋                 otherwise
//! ```
//!
//! where the sum runs over the cell itself and its in-bounds neighbours and `n`
//! counts the cells actually summed. Interior cells always have 8 neighbours so
//! `n == 9` in practice, but the divisor is still counted rather than assumed.

use crate::grid::{ScalarField, Temperature};

/// Offsets of the 8 surrounding cells
const NEIGHBOR_OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// New temperature of cell `(x, y)` computed from the `current` field
#[inline]
pub fn cell_temperature(current: &ScalarField, x: usize, y: usize) -> Temperature {
    // Absorbing boundary: heat is lost at the edges
    if current.is_border(x, y) {
        return 0;
    }

    let (width, height) = current.dimensions();
    let mut total = u32::from(current.at(x, y));
    let mut count = 1_u32;

    for (dx, dy) in NEIGHBOR_OFFSETS {
        let (Some(nx), Some(ny)) = (x.checked_add_signed(dx), y.checked_add_signed(dy)) else {
            continue;
        };
        if nx < width && ny < height {
            total += u32::from(current.at(nx, ny));
            count += 1;
        }
    }

    // Mean of values in [0, MAX_TEMP] stays in [0, MAX_TEMP]
    (total / count) as Temperature
}

/// Fill `out` with the stepped values of consecutive whole columns
///
/// `out` holds the column-major cells of columns `first_column..` of the next
/// field; its length must be a multiple of the field height.
pub fn compute_columns(current: &ScalarField, first_column: usize, out: &mut [Temperature]) {
    let height = current.height();
    debug_assert_eq!(out.len() % height, 0, "chunk must hold whole columns");

    for (offset, column) in out.chunks_mut(height).enumerate() {
        let x = first_column + offset;
        for (y, cell) in column.iter_mut().enumerate() {
            *cell = cell_temperature(current, x, y);
        }
    }
}
