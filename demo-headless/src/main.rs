use anyhow::Context;
use clap::Parser;
use heat_sim_core::{EngineConfig, ExecutionMode, Simulation, DEFAULT_BRUSH_SIZE, DEFAULT_SEED};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Headless heat diffusion benchmark
#[derive(Parser, Debug)]
#[command(name = "heat-bench")]
#[command(about = "Runs the heat diffusion grid to equilibrium and reports timing", long_about = None)]
struct Args {
    /// Grid width in cells
    #[arg(long, default_value_t = 800)]
    width: usize,

    /// Grid height in cells
    #[arg(long, default_value_t = 600)]
    height: usize,

    /// Number of seeded heat sources
    #[arg(short, long, default_value_t = 3)]
    points: usize,

    /// Execution mode (sequential, parallel)
    #[arg(short, long, default_value_t = ExecutionMode::Sequential)]
    mode: ExecutionMode,

    /// Worker threads for parallel mode (default: available parallelism)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Radius of each heat source in cells
    #[arg(short, long, default_value_t = DEFAULT_BRUSH_SIZE)]
    brush_size: u32,

    /// Seed for heat source placement
    #[arg(short, long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Stop after this many steps even if not converged
    #[arg(long)]
    max_steps: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = EngineConfig::default()
        .with_mode(args.mode)
        .with_brush_size(args.brush_size);
    if let Some(workers) = args.workers {
        config = config.with_workers(workers);
    }

    let sim = Simulation::new(args.width, args.height, config)
        .context("failed to create simulation")?;

    let sources = sim.scatter(args.points, args.seed)?;
    for (x, y) in &sources {
        info!("Heat source at ({}, {})", x, y);
    }

    println!("=== Heat Diffusion Benchmark ===\n");
    println!(
        "Benchmarking simulation in {} ({} workers)...",
        sim.mode(),
        sim.workers()
    );

    let report = sim
        .run_until_done(args.max_steps)
        .context("simulation step failed")?;
    let stats = sim.stats()?;

    println!("Time taken: {}ms", report.elapsed.as_millis());
    println!(
        "Steps: {} ({})",
        report.steps,
        if report.converged {
            "converged"
        } else {
            "step budget exhausted"
        }
    );
    println!(
        "Average step: {:.3}ms, final heat: {}, hottest cell: {}",
        stats.average_step_ms, stats.total_heat, stats.max_temperature
    );

    Ok(())
}
