//! Statistics tracking for the simulation.

use crate::agent::{Agent, TeamId};
use crate::team::Team;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Statistics snapshot for a simulation step
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Stats {
    /// Current simulation tick
    pub tick: u64,
    /// Total agent count
    pub population: usize,
    /// Non-empty teams
    pub team_count: usize,
    /// Teams with a single member
    pub solo_count: usize,
    /// Teams currently in coordinated combat
    pub combats_active: usize,
    /// Mean aggression across non-empty teams
    pub aggression_mean: f32,
    /// Mean life across non-empty teams
    pub life_mean: f32,
    /// Sum of all agent strengths
    pub strength_total: u32,
    /// Largest roster
    pub largest_team: usize,
    /// Agents spawned this step
    pub spawns: usize,
    /// Agents destroyed this step
    pub deaths: usize,
    /// Team merges this step
    pub merges: usize,
    /// Duels resolved this step
    pub fights: usize,
    /// Rebellions this step
    pub rebellions: usize,
}

impl Stats {
    /// Create new empty stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Update stats from current simulation state
    pub fn update(&mut self, agents: &[Agent], teams: &BTreeMap<TeamId, Team>) {
        self.population = agents.len();
        self.strength_total = agents.iter().map(|a| a.strength as u32).sum();

        let active: Vec<&Team> = teams.values().filter(|t| !t.members.is_empty()).collect();
        self.team_count = active.len();
        self.solo_count = active.iter().filter(|t| t.is_individual).count();
        self.combats_active = active.iter().filter(|t| t.is_in_combat).count();
        self.largest_team = active.iter().map(|t| t.members.len()).max().unwrap_or(0);

        if active.is_empty() {
            self.aggression_mean = 0.0;
            self.life_mean = 0.0;
        } else {
            self.aggression_mean =
                active.iter().map(|t| t.aggression).sum::<f32>() / active.len() as f32;
            self.life_mean = active.iter().map(|t| t.life).sum::<f32>() / active.len() as f32;
        }
    }

    /// Save stats to JSON file
    pub fn save_json(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }

    /// Load stats from JSON file
    pub fn load_json(path: &str) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Format stats as a one-line summary
    pub fn summary(&self) -> String {
        format!(
            "T:{:6} | Pop:{:4} | Teams:{:3} | Solo:{:3} | Combat:{:2} | Aggr:{:5.1} | Life:{:5.1} | Big:{:2}",
            self.tick,
            self.population,
            self.team_count,
            self.solo_count,
            self.combats_active,
            self.aggression_mean,
            self.life_mean,
            self.largest_team,
        )
    }
}

/// Historical statistics tracker
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StatsHistory {
    /// All recorded stats snapshots
    pub snapshots: Vec<Stats>,
    /// Recording interval
    pub interval: u64,
}

impl StatsHistory {
    /// Create new history with recording interval
    pub fn new(interval: u64) -> Self {
        Self {
            snapshots: Vec::new(),
            interval,
        }
    }

    /// Record a stats snapshot
    pub fn record(&mut self, stats: Stats) {
        self.snapshots.push(stats);
    }

    /// Get stats at a specific tick (approximate)
    pub fn get_at(&self, tick: u64) -> Option<&Stats> {
        if self.interval == 0 {
            return None;
        }
        let index = (tick / self.interval) as usize;
        self.snapshots.get(index)
    }

    /// Population over time
    pub fn population_series(&self) -> Vec<(u64, usize)> {
        self.snapshots.iter().map(|s| (s.tick, s.population)).collect()
    }

    /// Team count over time
    pub fn team_series(&self) -> Vec<(u64, usize)> {
        self.snapshots.iter().map(|s| (s.tick, s.team_count)).collect()
    }

    /// Mean team life over time
    pub fn life_series(&self) -> Vec<(u64, f32)> {
        self.snapshots.iter().map(|s| (s.tick, s.life_mean)).collect()
    }

    /// Mean aggression over time
    pub fn aggression_series(&self) -> Vec<(u64, f32)> {
        self.snapshots
            .iter()
            .map(|s| (s.tick, s.aggression_mean))
            .collect()
    }

    /// Save history to file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json)
    }

    /// Load history from file
    pub fn load(path: &str) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}
