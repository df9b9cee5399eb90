use anyhow::Context;
use clap::Parser;
use galaxy_sim::app::simulation_loop::report_non_finite;
use galaxy_sim::diagnostics::EnergyDiagnostics;
use galaxy_sim::{SimConfig, Simulation};
use std::path::PathBuf;
use std::time::Instant;

/// Headless Barnes-Hut galaxy run that prints conserved quantities as it goes.
#[derive(Parser, Debug)]
#[command(name = "galaxy_sim", version, about)]
struct Args {
    /// TOML configuration file; defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the number of bodies
    #[arg(short = 'n', long)]
    bodies: Option<usize>,

    /// Steps to run
    #[arg(short, long, default_value_t = 1000)]
    steps: usize,

    /// Override the RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the Barnes-Hut opening angle
    #[arg(long)]
    theta: Option<f64>,

    /// Print a diagnostics line every N steps (0 disables)
    #[arg(long, default_value_t = 100)]
    report_every: usize,

    /// Worker threads for force evaluation (defaults to all cores)
    #[arg(long)]
    threads: Option<usize>,
}

fn load_config(args: &Args) -> anyhow::Result<SimConfig> {
    let mut config = match &args.config {
        Some(path) => SimConfig::load_from_file(path)?,
        None => SimConfig::default(),
    };
    if let Some(n) = args.bodies {
        config.body_count = n;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(theta) = args.theta {
        config.theta = theta;
    }
    config.validate().context("invalid command-line override")?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .build_global()
            .context("failed to configure rayon thread pool")?;
    }

    let config = load_config(&args)?;
    println!(
        "galaxy_sim: {} bodies, theta {}, epsilon {}, dt {}, seed {}",
        config.body_count, config.theta, config.epsilon, config.dt, config.seed
    );

    let mut sim = Simulation::new(config)?;
    let mut diagnostics = EnergyDiagnostics::new();
    diagnostics.update(&sim);

    let started = Instant::now();
    for _ in 0..args.steps {
        sim.step();
        report_non_finite(&sim);

        if args.report_every > 0 && sim.frame() % args.report_every == 0 {
            let record = diagnostics.update(&sim);
            println!(
                "frame {:>6}  t {:>9.3}  E {:>14.6e}  |p| {:>10.3e}  com ({:.3}, {:.3})  contacts {:>4}  nodes {}",
                record.frame,
                record.time,
                record.total_energy(),
                record.momentum.mag(),
                record.center_of_mass.x,
                record.center_of_mass.y,
                sim.last_collisions(),
                sim.quadtree().len(),
            );
        }
    }

    let elapsed = started.elapsed();
    if args.report_every > 0 {
        println!("max relative energy drift: {:.3e}", diagnostics.max_relative_drift());
    }
    println!(
        "{} steps in {:.2?} ({:.2} ms/step)",
        args.steps,
        elapsed,
        elapsed.as_secs_f64() * 1e3 / args.steps.max(1) as f64
    );

    #[cfg(feature = "profiling")]
    galaxy_sim::PROFILER.lock().print_and_clear();

    Ok(())
}
