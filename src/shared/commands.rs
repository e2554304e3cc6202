//! Commands for controlling the simulation from a host shell.

use crate::agent::AgentId;
use serde::{Deserialize, Serialize};

/// Commands sent from the host (renderer/UI) to the simulation thread
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SimCommand {
    /// Pause the simulation
    Pause,
    /// Resume the simulation
    Resume,
    /// Execute a single step
    Step,
    /// Set simulation speed multiplier (0.1 - 10.0)
    SetSpeed(f32),
    /// Spawn an agent at a world position (e.g. mouse click)
    SpawnAgent { x: f32, y: f32 },
    /// Remove the agent nearest to a world position, if close enough
    RemoveNearest { x: f32, y: f32 },
    /// Select an agent by id for the detail panel
    SelectAgent(Option<AgentId>),
    /// Reset simulation with current config
    Reset,
    /// Reset simulation with new settings
    ResetWithSettings(SimSettings),
    /// Shutdown the simulation thread
    Shutdown,
}

/// Simulation settings that can be modified from the host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimSettings {
    /// Maximum population limit
    pub max_population: usize,
    /// Maximum simulation steps (0 = unlimited)
    pub max_steps: u64,
    /// Initial/target population
    pub initial_population: usize,
    /// World width
    pub world_width: f32,
    /// World height
    pub world_height: f32,
    /// Starting aggression range
    pub start_aggression_min: f32,
    pub start_aggression_max: f32,
    /// Team capacity range
    pub team_size_min: usize,
    pub team_size_max: usize,
    /// Base duel damage
    pub base_damage: f32,
    /// Coordinated combat duration in ticks
    pub combat_duration: u64,
    /// Chance a defeated agent changes sides
    pub absorption_chance: f32,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self::from_config(&crate::config::Config::default())
    }
}

impl SimSettings {
    /// Create settings from a Config
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            max_population: config.lifecycle.max_population,
            max_steps: 0,
            initial_population: config.lifecycle.initial_population,
            world_width: config.world.width,
            world_height: config.world.height,
            start_aggression_min: config.teams.start_aggression_min,
            start_aggression_max: config.teams.start_aggression_max,
            team_size_min: config.teams.max_size_min,
            team_size_max: config.teams.max_size_max,
            base_damage: config.combat.base_damage,
            combat_duration: config.combat.combat_duration,
            absorption_chance: config.combat.absorption_chance,
        }
    }

    /// Apply settings to a Config
    pub fn apply_to_config(&self, config: &mut crate::config::Config) {
        config.lifecycle.max_population = self.max_population;
        config.lifecycle.initial_population = self.initial_population;
        config.world.width = self.world_width;
        config.world.height = self.world_height;
        config.teams.start_aggression_min = self.start_aggression_min;
        config.teams.start_aggression_max = self.start_aggression_max;
        config.teams.max_size_min = self.team_size_min;
        config.teams.max_size_max = self.team_size_max;
        config.combat.base_damage = self.base_damage;
        config.combat.combat_duration = self.combat_duration;
        config.combat.absorption_chance = self.absorption_chance;
    }
}

/// Current simulation state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SimState {
    /// Simulation is running
    Running,
    /// Simulation is paused
    #[default]
    Paused,
    /// Simulation has stopped (shutdown)
    Stopped,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_settings_roundtrip() {
        let config = Config::default();
        let mut settings = SimSettings::from_config(&config);
        settings.initial_population = 42;
        settings.base_damage = 12.0;

        let mut applied = Config::default();
        settings.apply_to_config(&mut applied);

        assert_eq!(applied.lifecycle.initial_population, 42);
        assert_eq!(applied.combat.base_damage, 12.0);
        assert!(applied.validate().is_ok());
    }
}
