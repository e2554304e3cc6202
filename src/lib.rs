//! # BLOBSIM
//!
//! Real-time team dynamics simulator: autonomous agents steer, flock, and
//! cluster into teams that cooperate, merge, fight, and rebel.
//!
//! ## Features
//!
//! - **Steering core**: seek/wander/separation/cohesion/attachment/formation
//!   forces with role-dependent weighting (leader, follower, combat)
//! - **Team lifecycle**: aggression/life dynamics, merging, rebellion, and
//!   coordinated team-vs-team combat
//! - **Conserved population**: team deaths replace their members one for one
//! - **Configurable**: YAML configuration files
//! - **Reproducible**: seeded random number generation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use blobsim::{Config, World};
//!
//! // Create world with default config
//! let config = Config::default();
//! let mut world = World::new(config);
//!
//! // Run simulation
//! world.run(1000);
//!
//! // Check results
//! println!("Population: {}", world.population());
//! println!("Teams: {}", world.team_count());
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use blobsim::Config;
//!
//! let mut config = Config::default();
//! config.lifecycle.initial_population = 200;
//! config.combat.base_damage = 10.0;
//! ```
//!
//! ## Driving from a host
//!
//! ```rust,no_run
//! use blobsim::shared::{SimCommand, SimulationHandle};
//! use blobsim::Config;
//!
//! let mut handle = SimulationHandle::spawn(Config::default());
//! handle.send(SimCommand::Resume);
//! if let Some(snapshot) = handle.try_recv_snapshot() {
//!     println!("tick {} with {} agents", snapshot.tick, snapshot.agents.len());
//! }
//! ```

pub mod agent;
pub mod color;
pub mod config;
pub mod shared;
pub mod stats;
pub mod team;
pub mod world;

// Re-export main types
pub use agent::Agent;
pub use config::Config;
pub use team::Team;
pub use world::World;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run a quick benchmark
pub fn benchmark(steps: u64, population: usize) -> BenchmarkResult {
    use std::time::Instant;

    let mut config = Config::default();
    config.lifecycle.initial_population = population;
    config.lifecycle.max_population = config.lifecycle.max_population.max(population);

    let mut world = World::new(config);

    let start = Instant::now();
    world.run(steps);
    let elapsed = start.elapsed();

    BenchmarkResult {
        steps,
        initial_population: population,
        final_population: world.population(),
        final_teams: world.team_count(),
        elapsed_secs: elapsed.as_secs_f64(),
        steps_per_second: steps as f64 / elapsed.as_secs_f64(),
    }
}

/// Benchmark result
#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    pub steps: u64,
    pub initial_population: usize,
    pub final_population: usize,
    pub final_teams: usize,
    pub elapsed_secs: f64,
    pub steps_per_second: f64,
}

impl std::fmt::Display for BenchmarkResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Benchmark Results ===")?;
        writeln!(f, "Steps: {}", self.steps)?;
        writeln!(
            f,
            "Population: {} -> {}",
            self.initial_population, self.final_population
        )?;
        writeln!(f, "Teams: {}", self.final_teams)?;
        writeln!(f, "Time: {:.3}s", self.elapsed_secs)?;
        writeln!(f, "Speed: {:.1} steps/s", self.steps_per_second)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_quick_simulation() {
        let mut config = Config::default();
        config.lifecycle.initial_population = 20;
        let mut world = World::new(config);

        world.run(100);

        assert_eq!(world.tick, 100);
        assert!(world.population() > 0);
    }

    #[test]
    fn test_benchmark() {
        let result = benchmark(50, 20);

        assert_eq!(result.steps, 50);
        assert!(result.steps_per_second > 0.0);
    }
}
