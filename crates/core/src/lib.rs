//! Heat Simulation Core Library
//!
//! A 2-D temperature grid that diffuses under a 3x3 averaging stencil with an
//! absorbing boundary, and that can be heated by disk-shaped injections at any
//! time, including while a step is being computed on other threads.
//!
//! ## Layout
//!
//! - [`grid`]: the temperature field, region shapes, and the lock-guarded
//!   store that swaps whole fields on commit
//! - [`solver`]: the stencil plus sequential and column-parallel kernels
//! - [`simulation`]: the engine that drives stepping, injection, and the
//!   equilibrium check
//!
//! ## Example
//!
//! ```rust
//! use heat_sim_core::{EngineConfig, Simulation};
//!
//! let sim = Simulation::new(10, 10, EngineConfig::default()).unwrap();
//! sim.inject(5, 5).unwrap();
//! assert!(sim.snapshot().unwrap().as_slice().iter().all(|&t| t == 255));
//!
//! sim.step().unwrap();
//! assert_eq!(sim.snapshot().unwrap().get(0, 0), 0);
//! ```

pub mod error;
pub mod grid;
pub mod simulation;
pub mod solver;

use std::sync::Arc;

// Re-export core types
pub use error::{GridError, SimulationError};
pub use grid::{GridStore, Rect, Region, ScalarField, Temperature, MAX_TEMP};
pub use simulation::{
    EngineConfig, RunReport, Simulation, SimulationStats, DEFAULT_BRUSH_SIZE, DEFAULT_SEED,
};
pub use solver::{DiffusionKernel, ExecutionMode};

/// Shared handle to a simulation, passed to every driver thread
pub type EngineHandle = Arc<Simulation>;
