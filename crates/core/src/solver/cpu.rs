//! CPU diffusion kernels
//!
//! Both kernels evaluate the same per-column stencil into a fresh write buffer.
//! The parallel kernel splits the buffer into disjoint chunks of whole columns
//! with `par_chunks_mut` and runs them on a dedicated Rayon pool, so no two
//! workers can ever write the same cell. The sequential kernel walks the same
//! columns in order on the calling thread; results are bit-identical.

use super::stencil::compute_columns;
use super::{DiffusionKernel, ExecutionMode};
use crate::error::SimulationError;
use crate::grid::{ScalarField, Temperature};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::any::Any;
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};

/// Signature of the per-chunk column routine run by each worker
type ColumnFn = fn(&ScalarField, usize, &mut [Temperature]);

/// Single-threaded kernel, always available
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialKernel;

impl DiffusionKernel for SequentialKernel {
    fn step(&self, current: &ScalarField) -> Result<ScalarField, SimulationError> {
        let mut next = current.zeroed_like();
        compute_columns(current, 0, next.as_mut_slice());
        Ok(next)
    }

    fn mode(&self) -> ExecutionMode {
        ExecutionMode::Sequential
    }

    fn workers(&self) -> usize {
        1
    }
}

/// Column-parallel kernel backed by its own Rayon thread pool
pub struct ParallelKernel {
    pool: ThreadPool,
    workers: usize,
}

impl ParallelKernel {
    /// Start a pool of `workers` threads (available parallelism when `None`)
    ///
    /// # Errors
    ///
    /// [`SimulationError::PoolBuildFailed`] if the threads cannot be spawned.
    pub fn new(workers: Option<usize>) -> Result<Self, SimulationError> {
        let workers = workers.unwrap_or_else(available_workers).max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|index| format!("heat-step-{index}"))
            .build()
            .map_err(|err| SimulationError::PoolBuildFailed {
                reason: err.to_string(),
            })?;

        Ok(Self { pool, workers })
    }

    /// Columns handed to each chunk: `width / workers`, at least one
    pub fn chunk_columns(&self, width: usize) -> usize {
        (width / self.workers).max(1)
    }

    fn run_chunks(
        &self,
        current: &ScalarField,
        column_fn: ColumnFn,
    ) -> Result<ScalarField, SimulationError> {
        let mut next = current.zeroed_like();
        let chunk_columns = self.chunk_columns(current.width());
        let chunk_len = chunk_columns * current.height();

        // A panicking worker unwinds out of `install` once every chunk has
        // been joined; the half-written buffer is dropped with it.
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.pool.install(|| {
                next.as_mut_slice()
                    .par_chunks_mut(chunk_len)
                    .enumerate()
                    .for_each(|(chunk, out)| column_fn(current, chunk * chunk_columns, out));
            });
        }));

        match outcome {
            Ok(()) => Ok(next),
            Err(payload) => Err(SimulationError::WorkerFailed {
                reason: panic_message(payload.as_ref()),
            }),
        }
    }
}

impl DiffusionKernel for ParallelKernel {
    fn step(&self, current: &ScalarField) -> Result<ScalarField, SimulationError> {
        self.run_chunks(current, compute_columns)
    }

    fn mode(&self) -> ExecutionMode {
        ExecutionMode::Parallel
    }

    fn workers(&self) -> usize {
        self.workers
    }
}

fn available_workers() -> usize {
    std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "worker panicked".to_string()
    }
}
