use anyhow::{ensure, Context, Result};
use clap::Parser;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use std::time::Instant;
use urban_growth_core::{
    build_distance_field, DistanceMode, Grid, SettlementModel, SimConfig, Stage,
};

/// Compare distance-field modes and truncation on a synthetic settlement grid.
#[derive(Parser, Debug)]
struct Args {
    /// Grid side length.
    #[arg(long, default_value_t = 64)]
    size: usize,
    /// Fraction of occupied cells.
    #[arg(long, default_value_t = 0.15)]
    density: f64,
    #[arg(long, default_value_t = 5.0)]
    threshold: f64,
    /// Truncation cutoff for the truncated runs.
    #[arg(long, default_value_t = 10.0)]
    truncation: f64,
    #[arg(long, default_value_t = 5)]
    steps: usize,
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn synthetic_grid(size: usize, density: f64, seed: u64) -> Result<Grid<bool>> {
    let mut rng = ChaCha12Rng::seed_from_u64(seed);
    let cells = (0..size * size).map(|_| rng.random::<f64>() < density).collect();
    Ok(Grid::from_vec(size, size, cells)?)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let args = Args::parse();
    ensure!((0.0..=1.0).contains(&args.density), "density must lie in [0, 1]");

    let grid = synthetic_grid(args.size, args.density, args.seed)?;
    println!(
        "Benchmarking {}x{} grid with {} occupied cells",
        args.size,
        args.size,
        grid.occupied_count()
    );

    for (mode, truncation) in [
        (DistanceMode::Full, None),
        (DistanceMode::Full, Some(args.truncation)),
        (DistanceMode::Centroid, None),
        (DistanceMode::Centroid, Some(args.truncation)),
    ] {
        let start = Instant::now();
        let field = build_distance_field(&grid, args.threshold, mode, truncation);
        println!(
            "{:?} truncation={:?}: {} unsettled cells in {:?}",
            mode,
            truncation,
            field.len(),
            start.elapsed()
        );
    }

    let config = SimConfig {
        threshold: args.threshold,
        seed: args.seed,
        ..SimConfig::default()
    };
    let mut model =
        SettlementModel::new(grid, None, config).context("building settlement model")?;

    let start = Instant::now();
    model.probabilities(Stage::Initial);
    let cold = start.elapsed();
    let start = Instant::now();
    model.probabilities(Stage::Initial);
    println!("Initial-stage probabilities: cold {:?}, cached {:?}", cold, start.elapsed());

    let start = Instant::now();
    let summary = model.run_dynamics(args.steps)?;
    println!(
        "{} growth steps in {:?}: {} new cells, {} occupied",
        args.steps,
        start.elapsed(),
        summary.total_new_settlements(),
        summary.final_occupied
    );
    Ok(())
}
