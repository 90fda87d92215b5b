//! Error types for the heat simulation core.
//!
//! Split by subsystem: [`GridError`] for the field and its store,
//! [`SimulationError`] for the engine's stepping and injection operations.

use std::error::Error;
use std::fmt;

/// Errors raised by [`ScalarField`](crate::grid::ScalarField) construction and
/// the [`GridStore`](crate::grid::GridStore).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GridError {
    /// Width or height was zero.
    InvalidDimensions {
        /// Requested width in cells.
        width: usize,
        /// Requested height in cells.
        height: usize,
    },
    /// A replacement field does not match the dimensions of the field it replaces.
    DimensionMismatch {
        /// Dimensions of the live field `(width, height)`.
        expected: (usize, usize),
        /// Dimensions of the offered field `(width, height)`.
        actual: (usize, usize),
    },
    /// Raw cell data does not hold `width * height` values.
    LengthMismatch {
        /// Cells required by the requested dimensions.
        expected: usize,
        /// Cells actually supplied.
        actual: usize,
    },
    /// The store lock was poisoned by a panic in another thread.
    LockPoisoned,
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDimensions { width, height } => write!(
                f,
                "invalid grid dimensions {width}x{height}: width and height must be greater than 0"
            ),
            Self::DimensionMismatch { expected, actual } => write!(
                f,
                "field dimensions {}x{} do not match live field {}x{}",
                actual.0, actual.1, expected.0, expected.1
            ),
            Self::LengthMismatch { expected, actual } => write!(
                f,
                "field data holds {actual} cells but the dimensions require {expected}"
            ),
            Self::LockPoisoned => {
                write!(f, "grid lock was poisoned by a panic in another thread")
            }
        }
    }
}

impl Error for GridError {}

/// Errors from the simulation engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SimulationError {
    /// A grid store operation failed.
    Grid(GridError),
    /// One or more column workers failed during a parallel step.
    ///
    /// The field keeps its pre-step value when this is returned.
    WorkerFailed {
        /// Panic message of the failing worker.
        reason: String,
    },
    /// The worker pool could not be started.
    PoolBuildFailed {
        /// Message reported by the pool builder.
        reason: String,
    },
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Grid(err) => write!(f, "grid error: {err}"),
            Self::WorkerFailed { reason } => write!(f, "step worker failed: {reason}"),
            Self::PoolBuildFailed { reason } => {
                write!(f, "failed to start worker pool: {reason}")
            }
        }
    }
}

impl Error for SimulationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Grid(err) => Some(err),
            _ => None,
        }
    }
}

impl From<GridError> for SimulationError {
    fn from(err: GridError) -> Self {
        Self::Grid(err)
    }
}
