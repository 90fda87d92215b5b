//! Diffusion kernel trait definition
//!
//! This module defines the `DiffusionKernel` trait, the backend-agnostic seam
//! between the simulation engine and the code that evaluates the stencil.
//! The sequential and the Rayon-parallel kernels both implement it.

use super::ExecutionMode;
use crate::error::SimulationError;
use crate::grid::ScalarField;

/// Computes one diffusion step from an immutable snapshot
///
/// Implementations read only from `current` and return a freshly allocated
/// field of the same dimensions. They never mutate shared state, so the engine
/// can run them without holding any lock.
pub trait DiffusionKernel: Send + Sync {
    /// Evaluate the stencil for every cell of `current`
    ///
    /// # Errors
    ///
    /// [`SimulationError::WorkerFailed`] if a worker could not finish its
    /// columns. No partial result is returned.
    fn step(&self, current: &ScalarField) -> Result<ScalarField, SimulationError>;

    /// Execution mode this kernel implements
    fn mode(&self) -> ExecutionMode;

    /// Number of workers that share a step (1 for sequential kernels)
    fn workers(&self) -> usize;
}
