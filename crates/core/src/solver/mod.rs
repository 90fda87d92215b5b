//! Diffusion solver module
//!
//! This module provides the stencil and the kernels that apply it to a whole
//! field. The core abstraction is the `DiffusionKernel` trait, which has a
//! sequential and a column-parallel implementation.
//!
//! # Backend Selection
//!
//! [`create_kernel`] builds the kernel for a configured [`ExecutionMode`]:
//! 1. `Parallel` starts a dedicated Rayon pool sized from the configuration or
//!    the available parallelism
//! 2. `Sequential` runs on the calling thread
//!
//! # Example
//!
//! ```rust
//! use heat_sim_core::solver::{create_kernel, ExecutionMode};
//! use heat_sim_core::ScalarField;
//!
//! let kernel = create_kernel(ExecutionMode::Parallel, Some(2)).unwrap();
//! let field = ScalarField::with_value(8, 8, 90).unwrap();
//! let next = kernel.step(&field).unwrap();
//! assert_eq!(next.get(0, 0), 0);
//! ```

mod cpu;
pub mod profiler;
pub mod stencil;
#[allow(clippy::module_name_repetitions)]
mod r#trait;

// Re-exports
pub use cpu::{ParallelKernel, SequentialKernel};
pub use profiler::{FrameTimer, ProfilerScope};
pub use r#trait::DiffusionKernel;
pub use stencil::{cell_temperature, compute_columns};

use crate::error::SimulationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// How a step distributes work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Every column on the calling thread
    Sequential,
    /// Disjoint column ranges on a worker pool
    #[default]
    Parallel,
}

impl ExecutionMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Parallel => "parallel",
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown [`ExecutionMode`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseModeError(String);

impl fmt::Display for ParseModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == "distributed" {
            write!(f, "distributed execution is not supported")
        } else {
            write!(
                f,
                "unknown execution mode '{}', expected 'sequential' or 'parallel'",
                self.0
            )
        }
    }
}

impl std::error::Error for ParseModeError {}

impl FromStr for ExecutionMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sequential" => Ok(Self::Sequential),
            "parallel" => Ok(Self::Parallel),
            other => Err(ParseModeError(other.to_string())),
        }
    }
}

/// Create the kernel for `mode`
///
/// # Arguments
///
/// * `mode` - Sequential or parallel execution
/// * `workers` - Pool size for the parallel kernel; `None` uses the available
///   parallelism. Ignored by the sequential kernel.
///
/// # Errors
///
/// [`SimulationError::PoolBuildFailed`] if the parallel pool cannot start.
pub fn create_kernel(
    mode: ExecutionMode,
    workers: Option<usize>,
) -> Result<Box<dyn DiffusionKernel>, SimulationError> {
    match mode {
        ExecutionMode::Sequential => {
            info!("Using sequential diffusion kernel");
            Ok(Box::new(SequentialKernel))
        }
        ExecutionMode::Parallel => {
            let kernel = ParallelKernel::new(workers)?;
            info!(
                "Using parallel diffusion kernel with {} workers",
                kernel.workers()
            );
            Ok(Box::new(kernel))
        }
    }
}
