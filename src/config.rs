//! Configuration system for the BLOBSIM simulation.
//!
//! Supports YAML configuration files with sensible defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub world: WorldConfig,
    #[serde(default)]
    pub agents: AgentConfig,
    #[serde(default)]
    pub teams: TeamConfig,
    #[serde(default)]
    pub combat: CombatConfig,
    #[serde(default)]
    pub lifecycle: LifecycleConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// World bounds and spawning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    /// World width in units
    pub width: f32,
    /// World height in units
    pub height: f32,
    /// Margin kept from the edges when spawning or picking waypoints
    pub spawn_margin: f32,
}

/// Per-agent behavior knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Extra reach added to an agent's size for interaction checks
    pub interaction_padding: f32,
    /// Ticks between interactions for a single agent
    pub interaction_cooldown: u64,
    /// Distance at which a leader considers its waypoint reached
    pub target_radius: f32,
    /// Minimum ticks before a leader picks a new waypoint
    pub retarget_interval_min: u64,
    /// Maximum ticks before a leader picks a new waypoint
    pub retarget_interval_max: u64,
}

/// Team creation and morale dynamics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamConfig {
    /// Lower bound of starting aggression
    pub start_aggression_min: f32,
    /// Upper bound of starting aggression
    pub start_aggression_max: f32,
    /// Smallest possible roster capacity
    pub max_size_min: usize,
    /// Largest possible roster capacity
    pub max_size_max: usize,
    /// Life gained when recruiting a member
    pub growth_bonus: f32,
    /// Passive aggression decay per dynamics sweep while not in combat
    pub aggression_decay: f32,
    /// Passive life regeneration per dynamics sweep while not in combat
    pub life_regen: f32,
    /// Ticks of grace before age-based life erosion reaches full rate
    pub aging_grace: u64,
}

/// Combat resolution constants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatConfig {
    /// Flat damage applied in every duel
    pub base_damage: f32,
    /// Damage reduction per extra member of the loser's roster
    pub team_size_protection: f32,
    /// Roster size beyond which protection turns into a penalty
    pub large_penalty_threshold: usize,
    /// Extra damage multiplier per member over the threshold
    pub large_penalty_rate: f32,
    /// Fraction of dealt damage returned to the winner as life
    pub winner_life_gain: f32,
    /// Aggression gained by the duel winner
    pub aggression_winner_increase: f32,
    /// Aggression gained by the duel loser
    pub aggression_loser_increase: f32,
    /// Ticks a coordinated engagement lasts before disengaging
    pub combat_duration: u64,
    /// Chance that a defeated agent is absorbed by the winning team
    pub absorption_chance: f32,
}

/// Population management and sweep cadences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// Agents created at world construction
    pub initial_population: usize,
    /// Hard cap on the live agent count
    pub max_population: usize,
    /// Ticks between dead-team sweeps and population top-ups
    pub replacement_interval: u64,
    /// Ticks between rebellion/morale/combat-timeout sweeps
    pub dynamics_interval: u64,
}

/// Logging and stats cadence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Steps between stats history records
    pub stats_interval: u64,
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            agents: AgentConfig::default(),
            teams: TeamConfig::default(),
            combat: CombatConfig::default(),
            lifecycle: LifecycleConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
            spawn_margin: 50.0,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            interaction_padding: 15.0,
            interaction_cooldown: 120,
            target_radius: 20.0,
            retarget_interval_min: 180,
            retarget_interval_max: 480,
        }
    }
}

impl Default for TeamConfig {
    fn default() -> Self {
        Self {
            start_aggression_min: 10.0,
            start_aggression_max: 50.0,
            max_size_min: 6,
            max_size_max: 14,
            growth_bonus: 5.0,
            aggression_decay: 0.2,
            life_regen: 0.8,
            aging_grace: 18_000,
        }
    }
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            base_damage: 8.0,
            team_size_protection: 0.05,
            large_penalty_threshold: 6,
            large_penalty_rate: 0.15,
            winner_life_gain: 0.4,
            aggression_winner_increase: 4.0,
            aggression_loser_increase: 10.0,
            combat_duration: 180,
            absorption_chance: 0.08,
        }
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            initial_population: 100,
            max_population: 500,
            replacement_interval: 60,
            dynamics_interval: 120,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            stats_interval: 60,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.world.width <= 0.0 || self.world.height <= 0.0 {
            return Err("world dimensions must be positive".to_string());
        }
        if self.world.spawn_margin * 2.0 >= self.world.width.min(self.world.height) {
            return Err("spawn_margin too large for the world size".to_string());
        }
        if self.lifecycle.initial_population == 0 {
            return Err("initial_population must be > 0".to_string());
        }
        if self.lifecycle.initial_population > self.lifecycle.max_population {
            return Err("initial_population cannot exceed max_population".to_string());
        }
        if self.teams.max_size_min == 0 || self.teams.max_size_min > self.teams.max_size_max {
            return Err("team max_size range is invalid".to_string());
        }
        if self.teams.start_aggression_min < 0.0
            || self.teams.start_aggression_max > 100.0
            || self.teams.start_aggression_min > self.teams.start_aggression_max
        {
            return Err("start aggression range must lie within 0-100".to_string());
        }
        if self.agents.retarget_interval_min == 0
            || self.agents.retarget_interval_min > self.agents.retarget_interval_max
        {
            return Err("retarget interval range is invalid".to_string());
        }
        if self.combat.combat_duration == 0 {
            return Err("combat_duration must be > 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.combat.absorption_chance) {
            return Err("absorption_chance must lie within 0-1".to_string());
        }
        if self.lifecycle.replacement_interval == 0 || self.lifecycle.dynamics_interval == 0 {
            return Err("sweep intervals must be > 0".to_string());
        }
        Ok(())
    }
}
