//! Injection racing with stepping
//!
//! These tests drive one engine from several threads at once. A gated kernel
//! pins an injection inside a step to check it is ordered wholly after that
//! step, a failing kernel checks that a failed step leaves the field alone,
//! and a seeded fuzz run hammers `inject` and `step` concurrently.

use heat_sim_core::solver::SequentialKernel;
use heat_sim_core::{
    DiffusionKernel, EngineConfig, ExecutionMode, ScalarField, Simulation, SimulationError,
    MAX_TEMP,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

/// Sequential kernel that parks mid-step until the test releases it
struct GatedKernel {
    entered: Arc<Barrier>,
    release: Arc<Barrier>,
    seen_heat: Arc<AtomicU64>,
}

impl DiffusionKernel for GatedKernel {
    fn step(&self, current: &ScalarField) -> Result<ScalarField, SimulationError> {
        self.seen_heat.store(current.total_heat(), Ordering::SeqCst);
        self.entered.wait();
        self.release.wait();
        SequentialKernel.step(current)
    }

    fn mode(&self) -> ExecutionMode {
        ExecutionMode::Sequential
    }

    fn workers(&self) -> usize {
        1
    }
}

/// Kernel whose first step fails as if a worker had died
struct FlakyKernel {
    failed_once: AtomicBool,
}

impl DiffusionKernel for FlakyKernel {
    fn step(&self, current: &ScalarField) -> Result<ScalarField, SimulationError> {
        if self.failed_once.swap(true, Ordering::SeqCst) {
            SequentialKernel.step(current)
        } else {
            Err(SimulationError::WorkerFailed {
                reason: "simulated worker crash".to_string(),
            })
        }
    }

    fn mode(&self) -> ExecutionMode {
        ExecutionMode::Parallel
    }

    fn workers(&self) -> usize {
        2
    }
}

#[test]
fn test_injection_during_step_is_ordered_after_it() {
    let entered = Arc::new(Barrier::new(2));
    let release = Arc::new(Barrier::new(2));
    let seen_heat = Arc::new(AtomicU64::new(u64::MAX));

    let kernel = GatedKernel {
        entered: Arc::clone(&entered),
        release: Arc::clone(&release),
        seen_heat: Arc::clone(&seen_heat),
    };
    let sim = Simulation::with_kernel(
        30,
        30,
        EngineConfig::sequential().with_brush_size(3),
        Box::new(kernel),
    )
    .unwrap()
    .into_handle();

    let stepper = {
        let sim = Arc::clone(&sim);
        thread::spawn(move || sim.step())
    };

    entered.wait();
    let written = sim.inject(15, 15).unwrap();
    release.wait();

    let converged = stepper.join().unwrap().unwrap();

    // The stencil ran on the pre-injection snapshot...
    assert_eq!(seen_heat.load(Ordering::SeqCst), 0);
    // ...and the injection survived the commit in full
    let field = sim.snapshot().unwrap();
    assert_eq!(field.total_heat(), written as u64 * u64::from(MAX_TEMP));
    assert_eq!(field.get(15, 15), MAX_TEMP);
    assert_eq!(field.get(18, 15), MAX_TEMP);
    assert_eq!(field.get(19, 15), 0);
    assert!(!converged);
}

#[test]
fn test_failed_step_leaves_field_unchanged() {
    let kernel = FlakyKernel {
        failed_once: AtomicBool::new(false),
    };
    let sim = Simulation::with_kernel(
        20,
        20,
        EngineConfig::default().with_brush_size(4),
        Box::new(kernel),
    )
    .unwrap();
    sim.inject(10, 10).unwrap();
    let before = sim.snapshot().unwrap();

    match sim.step() {
        Err(SimulationError::WorkerFailed { reason }) => {
            assert_eq!(reason, "simulated worker crash");
        }
        other => panic!("expected worker failure, got {other:?}"),
    }
    assert_eq!(*sim.snapshot().unwrap(), *before);
    assert_eq!(sim.stats().unwrap().steps, 0);

    // The driver may retry
    sim.step().unwrap();
    assert_eq!(sim.stats().unwrap().steps, 1);
    assert_ne!(*sim.snapshot().unwrap(), *before);
}

#[test]
fn test_racing_inject_and_step_fuzz() {
    const WIDTH: usize = 64;
    const HEIGHT: usize = 48;
    const INJECTORS: u64 = 4;
    const STEPS: usize = 150;

    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    for (round, mode) in [ExecutionMode::Parallel, ExecutionMode::Sequential]
        .into_iter()
        .enumerate()
    {
        let config = EngineConfig::default()
            .with_mode(mode)
            .with_workers(3)
            .with_brush_size(4);
        let sim = Simulation::new(WIDTH, HEIGHT, config).unwrap().into_handle();
        let stop = Arc::new(AtomicBool::new(false));

        let injectors: Vec<_> = (0..INJECTORS)
            .map(|id| {
                let sim = Arc::clone(&sim);
                let stop = Arc::clone(&stop);
                thread::spawn(move || {
                    let mut rng = StdRng::seed_from_u64(round as u64 * 100 + id);
                    let mut injections = 0_u64;
                    while !stop.load(Ordering::Relaxed) {
                        let x = rng.random_range(-10..WIDTH as i64 + 10);
                        let y = rng.random_range(-10..HEIGHT as i64 + 10);
                        sim.inject(x, y).unwrap();
                        injections += 1;
                        if rng.random_bool(0.3) {
                            thread::yield_now();
                        }
                    }
                    injections
                })
            })
            .collect();

        let steppers: Vec<_> = (0..2)
            .map(|_| {
                let sim = Arc::clone(&sim);
                thread::spawn(move || {
                    for _ in 0..STEPS {
                        sim.step().unwrap();
                        let field = sim.snapshot().unwrap();
                        assert_eq!(field.dimensions(), (WIDTH, HEIGHT));
                    }
                })
            })
            .collect();

        for stepper in steppers {
            stepper.join().unwrap();
        }
        stop.store(true, Ordering::Relaxed);
        let injections: u64 = injectors.into_iter().map(|h| h.join().unwrap()).sum();
        assert!(injections > 0);

        let stats = sim.stats().unwrap();
        assert_eq!(stats.steps, 2 * STEPS as u64);
        assert_eq!((stats.width, stats.height), (WIDTH, HEIGHT));

        // Only whole injections ever write the border, and they write MAX_TEMP
        let field = sim.snapshot().unwrap();
        for x in 0..WIDTH {
            for y in [0, HEIGHT - 1] {
                let t = field.get(x, y);
                assert!(t == 0 || t == MAX_TEMP, "border ({x}, {y}) = {t}");
            }
        }
        for y in 0..HEIGHT {
            for x in [0, WIDTH - 1] {
                let t = field.get(x, y);
                assert!(t == 0 || t == MAX_TEMP, "border ({x}, {y}) = {t}");
            }
        }

        // One more quiet step clears the border entirely
        sim.step().unwrap();
        let field = sim.snapshot().unwrap();
        assert!((0..WIDTH).all(|x| field.get(x, 0) == 0 && field.get(x, HEIGHT - 1) == 0));
    }
}
