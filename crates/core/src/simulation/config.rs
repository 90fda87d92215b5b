//! Engine configuration

use crate::solver::ExecutionMode;
use serde::{Deserialize, Serialize};

/// Radius of the heat injection disk, in cells
pub const DEFAULT_BRUSH_SIZE: u32 = 20;

/// Seed used for reproducible heat scatter
pub const DEFAULT_SEED: u64 = 5_318_008;

/// Tunables of a [`Simulation`](super::Simulation)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Radius of the disk written by `inject`
    pub brush_size: u32,
    /// Sequential or column-parallel stepping
    pub mode: ExecutionMode,
    /// Worker pool size for parallel stepping (`None` = available parallelism)
    pub workers: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            brush_size: DEFAULT_BRUSH_SIZE,
            mode: ExecutionMode::default(),
            workers: None,
        }
    }
}

impl EngineConfig {
    /// Sequential stepping with default brush
    pub fn sequential() -> Self {
        Self::default().with_mode(ExecutionMode::Sequential)
    }

    /// Parallel stepping with default brush
    pub fn parallel() -> Self {
        Self::default().with_mode(ExecutionMode::Parallel)
    }

    pub fn with_brush_size(mut self, brush_size: u32) -> Self {
        self.brush_size = brush_size;
        self
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }
}
