//! BLOBSIM - CLI Entry Point
//!
//! Real-time team dynamics simulator.

use blobsim::{benchmark, Config, World};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "blobsim")]
#[command(version)]
#[command(about = "Real-time team dynamics simulator with steering-based agents")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a headless simulation
    Run {
        /// Configuration file (YAML)
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Number of steps to simulate
        #[arg(short, long, default_value = "10000")]
        steps: u64,

        /// Output directory for stats history
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,

        /// Quiet mode (minimal output)
        #[arg(short, long)]
        quiet: bool,
    },

    /// Run performance benchmark
    Benchmark {
        /// Number of steps
        #[arg(short, long, default_value = "1000")]
        steps: u64,

        /// Population size
        #[arg(short, long, default_value = "200")]
        population: usize,
    },

    /// Generate default configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "config.yaml")]
        output: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            steps,
            output,
            seed,
            quiet,
        } => run_simulation(config, steps, output, seed, quiet),

        Commands::Benchmark { steps, population } => run_benchmark(steps, population),

        Commands::Init { output } => generate_config(output),
    }
}

fn run_simulation(
    config_path: PathBuf,
    steps: u64,
    output: PathBuf,
    seed: Option<u64>,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    // Load or create config
    let config = if config_path.exists() {
        println!("Loading config from: {:?}", config_path);
        Config::from_file(&config_path)?
    } else {
        println!("Using default configuration");
        Config::default()
    };

    // Create output directory
    std::fs::create_dir_all(&output)?;

    // Create world
    let mut world = if let Some(s) = seed {
        println!("Using seed: {}", s);
        World::new_with_seed(config.clone(), s)
    } else {
        World::new(config.clone())
    };

    println!("Starting simulation");
    println!("  Initial population: {}", world.population());
    println!(
        "  World: {}x{}",
        config.world.width, config.world.height
    );
    println!("  Steps: {}", steps);
    println!();

    let start = Instant::now();
    let stats_interval = config.logging.stats_interval;

    for i in 0..steps {
        world.step();

        if !quiet && i % stats_interval == 0 {
            println!("{}", world.stats.summary());
        }
    }

    let elapsed = start.elapsed();
    let steps_per_sec = world.tick as f64 / elapsed.as_secs_f64();

    println!();
    println!("=== Simulation Complete ===");
    println!("Time: {:.2}s", elapsed.as_secs_f64());
    println!("Steps: {}", world.tick);
    println!("Speed: {:.1} steps/s", steps_per_sec);
    println!("Final population: {}", world.population());
    println!("Teams: {}", world.team_count());
    println!("Seed: {}", world.seed());

    // Save stats history
    let stats_path = output.join("stats_history.json");
    world
        .stats_history
        .save(stats_path.to_str().ok_or("invalid stats path")?)?;
    println!("Stats history: {:?}", stats_path);

    Ok(())
}

fn run_benchmark(steps: u64, population: usize) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== BLOBSIM Benchmark ===");
    println!("Steps: {}", steps);
    println!("Population: {}", population);
    println!();

    let result = benchmark(steps, population);
    println!("{}", result);

    Ok(())
}

fn generate_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    config.save(&output)?;
    println!("Configuration saved to: {:?}", output);
    Ok(())
}
