//! Heat diffusion simulation engine
//!
//! `Simulation` ties the shared [`GridStore`] to a [`DiffusionKernel`]:
//! - `step` snapshots the live field, runs the kernel outside any store lock,
//!   and commits the result in one swap
//! - `inject` writes a disk of maximum temperature into the live field and may
//!   run on any thread while a step is computing
//! - `done` reports thermal equilibrium of the committed field
//!
//! Steps are serialized by an internal lock that also guards resize and the
//! step counters. Injections never take that lock.

pub mod config;

pub use config::{EngineConfig, DEFAULT_BRUSH_SIZE, DEFAULT_SEED};

use crate::error::{GridError, SimulationError};
use crate::grid::{GridStore, Region, ScalarField, Temperature, MAX_TEMP};
use crate::solver::{create_kernel, DiffusionKernel, ExecutionMode, FrameTimer, ProfilerScope};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Step bookkeeping, guarded by the step lock
#[derive(Debug, Default)]
struct StepState {
    steps: u64,
    timer: FrameTimer,
}

/// Snapshot of simulation statistics
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimulationStats {
    pub width: usize,
    pub height: usize,
    /// Steps committed since creation or the last resize
    pub steps: u64,
    pub last_step_ms: f64,
    pub average_step_ms: f64,
    /// Sum of all cell temperatures
    pub total_heat: u64,
    pub max_temperature: Temperature,
    pub converged: bool,
}

/// Outcome of [`Simulation::run_until_done`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Steps taken by this run
    pub steps: u64,
    /// Whether the field reached equilibrium within the budget
    pub converged: bool,
    /// Wall-clock time spent stepping
    pub elapsed: Duration,
}

/// Heat diffusion engine over one live temperature field
///
/// All operations take `&self`; share it between a stepping driver and any
/// number of injecting threads through an [`EngineHandle`](crate::EngineHandle).
pub struct Simulation {
    store: GridStore,
    kernel: Box<dyn DiffusionKernel>,
    config: EngineConfig,
    stepping: Mutex<StepState>,
}

impl Simulation {
    /// Create a simulation over a zeroed `width` x `height` field
    ///
    /// # Errors
    ///
    /// - [`GridError::InvalidDimensions`] if either dimension is zero
    /// - [`SimulationError::PoolBuildFailed`] if the parallel pool cannot start
    pub fn new(width: usize, height: usize, config: EngineConfig) -> Result<Self, SimulationError> {
        let store = GridStore::new(width, height)?;
        let kernel = create_kernel(config.mode, config.workers)?;
        Ok(Self::from_parts(store, kernel, config))
    }

    /// Create a simulation that steps with a caller-supplied kernel
    ///
    /// `config.mode` and `config.workers` are replaced by what the kernel
    /// reports, so [`Simulation::config`] describes the kernel actually used.
    pub fn with_kernel(
        width: usize,
        height: usize,
        config: EngineConfig,
        kernel: Box<dyn DiffusionKernel>,
    ) -> Result<Self, SimulationError> {
        let store = GridStore::new(width, height)?;
        Ok(Self::from_parts(store, kernel, config))
    }

    fn from_parts(
        store: GridStore,
        kernel: Box<dyn DiffusionKernel>,
        mut config: EngineConfig,
    ) -> Self {
        config.mode = kernel.mode();
        config.workers = Some(kernel.workers());
        let sim = Self {
            store,
            kernel,
            config,
            stepping: Mutex::new(StepState::default()),
        };

        if let Ok((width, height)) = sim.store.dimensions() {
            info!(
                "Heat simulation initialized: {}x{} grid, mode={}, workers={}, brush={}",
                width,
                height,
                sim.kernel.mode(),
                sim.kernel.workers(),
                sim.config.brush_size
            );
        }
        sim
    }

    /// Wrap in an `Arc` for sharing between driver threads
    pub fn into_handle(self) -> crate::EngineHandle {
        Arc::new(self)
    }

    fn lock_stepping(&self) -> Result<MutexGuard<'_, StepState>, SimulationError> {
        self.stepping
            .lock()
            .map_err(|_| SimulationError::from(GridError::LockPoisoned))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Execution mode of the active kernel
    pub fn mode(&self) -> ExecutionMode {
        self.kernel.mode()
    }

    pub fn workers(&self) -> usize {
        self.kernel.workers()
    }

    /// `(width, height)` of the live field
    pub fn dimensions(&self) -> Result<(usize, usize), SimulationError> {
        Ok(self.store.dimensions()?)
    }

    /// Read-only view of the live field, for renderers and queries
    pub fn snapshot(&self) -> Result<Arc<ScalarField>, SimulationError> {
        Ok(self.store.snapshot()?)
    }

    /// Set every cell within `brush_size` of `(x, y)` to [`MAX_TEMP`]
    ///
    /// Coordinates outside the field are allowed; the disk is clipped to the
    /// field bounds. Safe to call while another thread is inside [`step`]:
    /// the write is either wholly before or wholly after that step.
    ///
    /// Returns the number of cells written.
    ///
    /// [`step`]: Simulation::step
    pub fn inject(&self, x: i64, y: i64) -> Result<usize, SimulationError> {
        let brush = self.config.brush_size;
        let written = self.store.set_region(&Region::disk(x, y, brush), MAX_TEMP)?;
        debug!(x, y, brush, cells = written, "Injected heat");
        Ok(written)
    }

    /// Inject heat at `points` positions drawn from a seeded RNG
    ///
    /// Positions are uniform over the field, so the same seed and dimensions
    /// always heat the same cells. Returns the positions used.
    pub fn scatter(&self, points: usize, seed: u64) -> Result<Vec<(i64, i64)>, SimulationError> {
        let (width, height) = self.dimensions()?;
        let mut rng = StdRng::seed_from_u64(seed);

        let mut positions = Vec::with_capacity(points);
        for _ in 0..points {
            let x = rng.random_range(0..width) as i64;
            let y = rng.random_range(0..height) as i64;
            self.inject(x, y)?;
            positions.push((x, y));
        }

        info!("Scattered {} heat sources (seed {})", points, seed);
        Ok(positions)
    }

    /// Advance the field by one diffusion step
    ///
    /// Blocks until every worker has finished. Returns whether the committed
    /// field is in equilibrium.
    ///
    /// # Errors
    ///
    /// [`SimulationError::WorkerFailed`] if the kernel failed; the live field
    /// keeps its pre-step value (plus any injections made meanwhile).
    pub fn step(&self) -> Result<bool, SimulationError> {
        let mut state = self.lock_stepping()?;
        let scope = ProfilerScope::new("step");

        let snapshot = self.store.begin_step()?;
        let next = match self.kernel.step(&snapshot) {
            Ok(next) => next,
            Err(err) => {
                if let Err(abort_err) = self.store.abort_step() {
                    warn!(
                        "Could not stop injection journal after failed step: {}",
                        abort_err
                    );
                }
                warn!(
                    "Step {} failed, field left unchanged: {}",
                    state.steps + 1,
                    err
                );
                return Err(err);
            }
        };
        drop(snapshot);
        self.store.commit_step(next)?;

        let converged = self.done()?;
        let elapsed_ms = scope.elapsed_ms();
        state.steps += 1;
        state.timer.record(elapsed_ms);

        debug!(
            step = state.steps,
            elapsed_ms, converged, "Committed diffusion step"
        );
        Ok(converged)
    }

    /// Whether every cell of the live field holds the same temperature
    pub fn done(&self) -> Result<bool, SimulationError> {
        Ok(self.store.snapshot()?.is_uniform())
    }

    /// Step until equilibrium or until `max_steps` steps have run
    pub fn run_until_done(&self, max_steps: Option<u64>) -> Result<RunReport, SimulationError> {
        let budget = max_steps.unwrap_or(u64::MAX);
        let start = Instant::now();

        let mut steps = 0;
        let mut converged = self.done()?;
        while !converged && steps < budget {
            converged = self.step()?;
            steps += 1;
        }

        let report = RunReport {
            steps,
            converged,
            elapsed: start.elapsed(),
        };
        info!(
            "Run finished after {} steps in {:.1}ms (converged={})",
            report.steps,
            report.elapsed.as_secs_f64() * 1000.0,
            report.converged
        );
        Ok(report)
    }

    /// Replace the live field with `field` of the same dimensions
    pub fn load(&self, field: ScalarField) -> Result<(), SimulationError> {
        let _state = self.lock_stepping()?;
        self.store.replace(field)?;
        Ok(())
    }

    /// Discard the field and start over with a zeroed `width` x `height` field
    ///
    /// # Errors
    ///
    /// [`GridError::InvalidDimensions`] for a zero dimension; the current
    /// field is kept.
    pub fn resize(&self, width: usize, height: usize) -> Result<(), SimulationError> {
        let mut state = self.lock_stepping()?;
        self.store.reset(width, height)?;
        *state = StepState::default();
        info!("Heat simulation resized to {}x{}", width, height);
        Ok(())
    }

    pub fn stats(&self) -> Result<SimulationStats, SimulationError> {
        let (steps, last_step_ms, average_step_ms) = {
            let state = self.lock_stepping()?;
            (
                state.steps,
                state.timer.last_frame_time_ms(),
                state.timer.average_frame_time_ms(),
            )
        };
        let field = self.snapshot()?;

        Ok(SimulationStats {
            width: field.width(),
            height: field.height(),
            steps,
            last_step_ms,
            average_step_ms,
            total_heat: field.total_heat(),
            max_temperature: field.max_temperature(),
            converged: field.is_uniform(),
        })
    }
}
