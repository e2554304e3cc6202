//! World simulation engine - main simulation loop.
//!
//! The world owns the agent and team collections; every structural mutation
//! (spawning, membership, merges, splits, combat) goes through a world method
//! that updates both sides before returning.

use crate::agent::{self, remap, Agent, AgentId, TeamId, WANDER_JITTER};
use crate::config::Config;
use crate::stats::{Stats, StatsHistory};
use crate::team::{self, Team};
use glam::Vec2;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::collections::{BTreeMap, HashSet};

/// The simulation world
pub struct World {
    // Population
    pub agents: Vec<Agent>,
    pub teams: BTreeMap<TeamId, Team>,

    // State
    pub tick: u64,

    // Configuration
    pub config: Config,

    // Statistics
    pub stats: Stats,
    pub stats_history: StatsHistory,

    // ID generation
    next_agent_id: u64,
    next_team_id: u64,

    // Random number generator (seeded for reproducibility)
    rng: ChaCha8Rng,
    seed: u64,

    // Per-step bookkeeping
    spawns_this_step: usize,
    deaths_this_step: usize,
    merges_this_step: usize,
    fights_this_step: usize,
    rebellions_this_step: usize,
}

/// Motion computed for one agent during the steering pass
struct Motion {
    accel: Vec2,
    wander_angle: f32,
    retarget: Option<(Vec2, u64)>,
}

impl World {
    /// Create a new world with the given configuration
    pub fn new(config: Config) -> Self {
        let seed = rand::thread_rng().gen();
        Self::new_with_seed(config, seed)
    }

    /// Create a new world with a specific seed for reproducibility
    pub fn new_with_seed(config: Config, seed: u64) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(seed);
        let initial = config.lifecycle.initial_population;
        let stats_interval = config.logging.stats_interval;

        let mut world = Self {
            agents: Vec::with_capacity(config.lifecycle.max_population),
            teams: BTreeMap::new(),
            tick: 0,
            config,
            stats: Stats::new(),
            stats_history: StatsHistory::new(stats_interval),
            next_agent_id: 0,
            next_team_id: 0,
            rng,
            seed,
            spawns_this_step: 0,
            deaths_this_step: 0,
            merges_this_step: 0,
            fights_this_step: 0,
            rebellions_this_step: 0,
        };

        for _ in 0..initial {
            let position = world.random_spawn_position();
            world.spawn_agent(position);
        }
        world.spawns_this_step = 0;

        world
    }

    /// Main simulation step
    pub fn step(&mut self) {
        self.spawns_this_step = 0;
        self.deaths_this_step = 0;
        self.merges_this_step = 0;
        self.fights_this_step = 0;
        self.rebellions_this_step = 0;

        // Phase 1: hard collision resolution
        self.resolve_collisions();

        // Phase 2: agent interactions (merges, duels, combat declarations)
        self.check_interactions();

        // Phase 3: steering forces and integration
        self.update_agents();

        // Phase 4: fix any overlap introduced by movement
        self.resolve_collisions();

        // Phase 5: coarse team dynamics (combat timeout, rebellion, morale)
        if self.tick % self.config.lifecycle.dynamics_interval == 0 {
            self.update_team_dynamics();
        }

        // Phase 6: dissolution, replacement, and population top-up
        if self.tick % self.config.lifecycle.replacement_interval == 0 {
            self.sweep_dead_teams();
            self.top_up_population();
        }
        self.prune_empty_teams();

        // Phase 7: statistics
        self.update_stats();

        self.tick += 1;
    }

    /// Run simulation for specified number of steps
    pub fn run(&mut self, steps: u64) {
        for _ in 0..steps {
            self.step();
        }
    }

    /// Run simulation with callback for progress updates
    pub fn run_with_callback<F>(&mut self, steps: u64, mut callback: F)
    where
        F: FnMut(&World, u64),
    {
        for i in 0..steps {
            self.step();
            callback(self, i);
        }
    }

    /// Get current population count
    pub fn population(&self) -> usize {
        self.agents.len()
    }

    /// Number of non-empty teams
    pub fn team_count(&self) -> usize {
        self.teams.values().filter(|t| !t.members.is_empty()).count()
    }

    /// Get seed for reproducibility
    pub fn seed(&self) -> u64 {
        self.seed
    }

    // ------------------------------------------------------------------
    // Structural mutations
    // ------------------------------------------------------------------

    /// Spawn a new agent with a fresh singleton team.
    ///
    /// Declined (returns None) when the population cap is reached.
    pub fn spawn_agent(&mut self, position: Vec2) -> Option<AgentId> {
        if self.agents.len() >= self.config.lifecycle.max_population {
            log::debug!(
                "spawn declined: population cap {} reached",
                self.config.lifecycle.max_population
            );
            return None;
        }

        let agent_id = self.next_agent_id;
        self.next_agent_id += 1;
        let team_id = self.next_team_id;
        self.next_team_id += 1;

        let mut agent = Agent::new(agent_id, team_id, position, &self.config, &mut self.rng);
        agent.last_retarget = self.tick;
        agent.is_team_leader = true;

        let mut team = Team::new(
            team_id,
            format!("Solo-{agent_id}"),
            agent.color,
            true,
            self.tick,
            &self.config.teams,
            &mut self.rng,
        );
        team.members.push(agent_id);
        team.leader = Some(agent_id);

        self.agents.push(agent);
        self.teams.insert(team_id, team);
        self.spawns_this_step += 1;
        Some(agent_id)
    }

    /// Remove an agent from the world entirely
    pub fn remove_agent(&mut self, agent_id: AgentId) -> bool {
        let Some(idx) = self.agent_index(agent_id) else {
            return false;
        };
        let team_id = self.agents[idx].team;
        self.remove_member(agent_id);
        self.agents.remove(idx);
        if self.teams.get(&team_id).is_some_and(|t| t.members.is_empty()) {
            self.teams.remove(&team_id);
        }
        true
    }

    /// The agent closest to `position`, if any lies within `max_distance`
    pub fn nearest_agent(&self, position: Vec2, max_distance: f32) -> Option<AgentId> {
        self.agents
            .iter()
            .map(|a| (a.position.distance(position), a.id))
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .filter(|(d, _)| *d < max_distance)
            .map(|(_, id)| id)
    }

    /// Add an agent to a team's roster.
    ///
    /// Rejected without side effects for duplicates or a full roster.
    pub fn add_member(&mut self, team_id: TeamId, agent_id: AgentId) -> bool {
        let Some(agent_idx) = self.agent_index(agent_id) else {
            return false;
        };
        let growth_bonus = self.config.teams.growth_bonus;
        let Some(team) = self.teams.get_mut(&team_id) else {
            return false;
        };
        if team.members.contains(&agent_id) || team.members.len() >= team.max_size {
            return false;
        }

        self.agents[agent_idx].is_team_leader = false;
        self.agents[agent_idx].team = team_id;
        team.members.push(agent_id);

        // Recruiting strengthens a team and mellows it out
        team.add_life(growth_bonus);
        team.add_aggression(-3.0);

        if team.is_individual && team.members.len() > 1 {
            team.is_individual = false;
            team.name = format!("Team-{team_id}");
        }

        self.select_leader(team_id);
        self.harmonize_colors(team_id);
        true
    }

    /// Detach an agent from its team's roster.
    ///
    /// The loss hurts: the team pays a life penalty and turns more
    /// aggressive. An emptied roster marks the team dead.
    pub fn remove_member(&mut self, agent_id: AgentId) {
        let Some(agent_idx) = self.agent_index(agent_id) else {
            return;
        };
        let team_id = self.agents[agent_idx].team;
        let Some(team) = self.teams.get_mut(&team_id) else {
            return;
        };
        let Some(pos) = team.members.iter().position(|&m| m == agent_id) else {
            return;
        };

        team.members.remove(pos);
        self.agents[agent_idx].is_team_leader = false;

        let penalty = (20.0f32 + if team.members.is_empty() { 20.0 } else { 10.0 }).min(30.0);
        team.add_life(-penalty);
        team.add_aggression(10.0);
        log::debug!("team {} lost a member, life {:.0}", team_id, team.life);

        if team.members.len() == 1 {
            team.is_individual = true;
            team.name = format!("Solo-{}", team.members[0]);
        }
        if team.members.is_empty() {
            team.life = 0.0;
            log::debug!("team {team_id} wiped out");
        }

        self.select_leader(team_id);
    }

    /// Merge two teams into a fresh one.
    ///
    /// The new team inherits the larger input's color, averages aggression,
    /// and caps capacity at min(12, first + second/2). Members that do not
    /// fit spin off into fresh singleton teams instead of being orphaned.
    /// Invalid inputs are logged no-ops returning the first id unchanged.
    pub fn merge_teams(&mut self, a_id: TeamId, b_id: TeamId) -> TeamId {
        if a_id == b_id {
            return a_id;
        }
        let (dominant_color, aggression, max_size, all_members) =
            match (self.teams.get(&a_id), self.teams.get(&b_id)) {
                (Some(a), Some(b)) if !a.members.is_empty() && !b.members.is_empty() => {
                    let color = if a.members.len() >= b.members.len() {
                        a.color
                    } else {
                        b.color
                    };
                    let members: Vec<AgentId> =
                        a.members.iter().chain(b.members.iter()).copied().collect();
                    (
                        color,
                        (a.aggression + b.aggression) / 2.0,
                        (a.max_size + b.max_size / 2).min(12),
                        members,
                    )
                }
                _ => {
                    log::warn!("invalid merge attempt between teams {a_id} and {b_id}");
                    return a_id;
                }
            };

        let merged_id = self.next_team_id;
        self.next_team_id += 1;
        let mut merged = Team::new(
            merged_id,
            format!("Team-{merged_id}"),
            dominant_color,
            false,
            self.tick,
            &self.config.teams,
            &mut self.rng,
        );
        merged.aggression = aggression;
        merged.max_size = max_size;

        self.teams.remove(&a_id);
        self.teams.remove(&b_id);

        let mut overflow = Vec::new();
        for id in all_members {
            if merged.members.len() < merged.max_size {
                merged.members.push(id);
                if let Some(idx) = self.agent_index(id) {
                    self.agents[idx].team = merged_id;
                    self.agents[idx].is_team_leader = false;
                }
            } else {
                overflow.push(id);
            }
        }

        self.teams.insert(merged_id, merged);
        self.select_leader(merged_id);
        self.harmonize_colors(merged_id);

        for id in overflow {
            self.spin_off_singleton(id);
        }

        self.merges_this_step += 1;
        log::info!("cooperation: teams {a_id} + {b_id} merged into {merged_id}");
        merged_id
    }

    /// Roll for an aggression-driven split and execute it.
    ///
    /// The last half of the roster leaves for a new, more aggressive team
    /// with a darker shade; the original calms down.
    pub fn check_rebellion(&mut self, team_id: TeamId) -> Option<TeamId> {
        let wants = {
            let team = self.teams.get(&team_id)?;
            team.rebellion_roll(&mut self.rng)
        };
        if !wants {
            return None;
        }

        let (rebels, rebel_aggression, rebel_color) = {
            let team = self.teams.get_mut(&team_id)?;
            let split = team.members.len() / 2;
            let rebels = team.members.split_off(team.members.len() - split);
            let aggression = (team.aggression + 20.0).min(100.0);
            let color = team.color.darkened(0.7);
            team.add_aggression(-15.0);
            (rebels, aggression, color)
        };
        if rebels.is_empty() {
            return None;
        }

        let rebel_id = self.next_team_id;
        self.next_team_id += 1;
        let mut rebel_team = Team::new(
            rebel_id,
            format!("Rebel-{rebel_id}"),
            rebel_color,
            false,
            self.tick,
            &self.config.teams,
            &mut self.rng,
        );
        rebel_team.aggression = rebel_aggression;

        for &id in &rebels {
            if let Some(idx) = self.agent_index(id) {
                self.agents[idx].team = rebel_id;
                self.agents[idx].is_team_leader = false;
                self.agents[idx].color = rebel_color;
            }
        }
        rebel_team.members = rebels;

        self.teams.insert(rebel_id, rebel_team);
        self.select_leader(rebel_id);
        self.select_leader(team_id);

        self.rebellions_this_step += 1;
        log::info!("rebellion: team {rebel_id} split from team {team_id}");
        Some(rebel_id)
    }

    /// Put both teams into coordinated combat against each other.
    ///
    /// Each side that can fight records the shared rally point halfway
    /// between the two centroids.
    pub fn start_team_combat(&mut self, a_id: TeamId, b_id: TeamId) {
        let rally = match (self.teams.get(&a_id), self.teams.get(&b_id)) {
            (Some(a), Some(b)) => match (a.centroid(&self.agents), b.centroid(&self.agents)) {
                (Some(ca), Some(cb)) => Some((ca + cb) / 2.0),
                _ => None,
            },
            _ => return,
        };

        let tick = self.tick;
        let mut any = false;
        if let Some(a) = self.teams.get_mut(&a_id) {
            any |= a.start_combat(b_id, rally, tick);
        }
        if let Some(b) = self.teams.get_mut(&b_id) {
            any |= b.start_combat(a_id, rally, tick);
        }
        if any {
            log::info!("teams {a_id} and {b_id} enter coordinated combat");
        }
    }

    /// Resolve a one-off duel between two representative agents by id
    pub fn fight(&mut self, a: AgentId, b: AgentId) {
        if let (Some(i), Some(j)) = (self.agent_index(a), self.agent_index(b)) {
            self.resolve_fight(i, j);
        }
    }

    /// Resolve a duel between the agents at the given indices.
    ///
    /// Team strength rolls pick the winner; the loser's team takes damage
    /// and either surrenders the agent (absorption) or the agent retreats.
    fn resolve_fight(&mut self, a_idx: usize, b_idx: usize) {
        let a_team_id = self.agents[a_idx].team;
        let b_team_id = self.agents[b_idx].team;
        if a_team_id == b_team_id {
            return;
        }
        let (a_strength, b_strength) =
            match (self.teams.get(&a_team_id), self.teams.get(&b_team_id)) {
                (Some(a), Some(b)) => (
                    a.total_strength(&self.agents) as f32,
                    b.total_strength(&self.agents) as f32,
                ),
                _ => return,
            };

        let a_roll = a_strength * self.rng.gen_range(0.8..1.2);
        let b_roll = b_strength * self.rng.gen_range(0.8..1.2);
        let (winner_idx, loser_idx) = if a_roll > b_roll {
            (a_idx, b_idx)
        } else {
            (b_idx, a_idx)
        };

        let winner_team_id = self.agents[winner_idx].team;
        let loser_team_id = self.agents[loser_idx].team;
        let loser_size = self
            .teams
            .get(&loser_team_id)
            .map(|t| t.members.len())
            .unwrap_or(1);

        let damage = team::duel_damage(
            self.agents[winner_idx].strength,
            self.agents[loser_idx].strength,
            loser_size,
            &self.config.combat,
            self.rng.gen::<f32>(),
        );
        let gain = team::winner_life_gain(damage, &self.config.combat);

        if let Some(winner) = self.teams.get_mut(&winner_team_id) {
            winner.add_life(gain);
            winner.add_aggression(self.config.combat.aggression_winner_increase);
        }
        if let Some(loser) = self.teams.get_mut(&loser_team_id) {
            loser.add_life(-damage);
            loser.add_aggression(self.config.combat.aggression_loser_increase);
        }
        self.fights_this_step += 1;
        log::debug!(
            "duel: team {winner_team_id} defeats team {loser_team_id} for {damage:.0} damage"
        );

        let (can_absorb, winner_aggression) = self
            .teams
            .get(&winner_team_id)
            .map(|t| (t.members.len() < t.max_size, t.aggression))
            .unwrap_or((false, 0.0));
        let loser_aggression = self
            .teams
            .get(&loser_team_id)
            .map(|t| t.aggression)
            .unwrap_or(0.0);
        let should_absorb = winner_aggression > 65.0
            && loser_aggression < 35.0
            && self.rng.gen::<f32>() < self.config.combat.absorption_chance;

        if can_absorb && should_absorb {
            let loser_id = self.agents[loser_idx].id;
            log::info!(
                "absorption: agent {loser_id} transfers from team {loser_team_id} to {winner_team_id}"
            );
            self.remove_member(loser_id);
            if !self.add_member(winner_team_id, loser_id) {
                // Never leave the agent team-less
                self.spin_off_singleton(loser_id);
            }
            if self
                .teams
                .get(&loser_team_id)
                .is_some_and(|t| t.members.is_empty())
            {
                self.teams.remove(&loser_team_id);
            }
        } else {
            let away = (self.agents[loser_idx].position - self.agents[winner_idx].position)
                .normalize_or_zero()
                * 5.0;
            self.agents[loser_idx].velocity += away;
        }
    }

    /// Re-elect the member with the highest leadership (first in roster wins
    /// ties) and keep exactly one leader flag set
    fn select_leader(&mut self, team_id: TeamId) {
        let Some(team) = self.teams.get(&team_id) else {
            return;
        };
        let roster = team.members.clone();

        let mut best: Option<(AgentId, u8)> = None;
        for &member_id in &roster {
            if let Some(idx) = self.agent_index(member_id) {
                self.agents[idx].is_team_leader = false;
                let leadership = self.agents[idx].leadership;
                match best {
                    Some((_, current)) if leadership > current => {
                        best = Some((member_id, leadership))
                    }
                    None => best = Some((member_id, leadership)),
                    _ => {}
                }
            }
        }

        if let Some(team) = self.teams.get_mut(&team_id) {
            team.leader = best.map(|(id, _)| id);
        }
        if let Some((leader_id, _)) = best {
            if let Some(idx) = self.agent_index(leader_id) {
                self.agents[idx].is_team_leader = true;
            }
        }
    }

    /// Give every member the leader's color and adopt it as the team color
    fn harmonize_colors(&mut self, team_id: TeamId) {
        let (roster, base_id) = match self.teams.get(&team_id) {
            Some(t) if t.members.len() > 1 => {
                (t.members.clone(), t.leader.unwrap_or(t.members[0]))
            }
            _ => return,
        };
        let Some(base) = self.agent_index(base_id).map(|i| self.agents[i].color) else {
            return;
        };
        for member_id in roster {
            if let Some(idx) = self.agent_index(member_id) {
                self.agents[idx].color = base;
            }
        }
        if let Some(team) = self.teams.get_mut(&team_id) {
            team.color = base;
        }
    }

    /// Wrap an agent into a fresh singleton team of its own
    fn spin_off_singleton(&mut self, agent_id: AgentId) {
        let Some(idx) = self.agent_index(agent_id) else {
            return;
        };
        let team_id = self.next_team_id;
        self.next_team_id += 1;

        let mut team = Team::new(
            team_id,
            format!("Solo-{agent_id}"),
            self.agents[idx].color,
            true,
            self.tick,
            &self.config.teams,
            &mut self.rng,
        );
        team.members.push(agent_id);
        team.leader = Some(agent_id);

        self.agents[idx].team = team_id;
        self.agents[idx].is_team_leader = true;
        self.teams.insert(team_id, team);
    }

    // ------------------------------------------------------------------
    // Step phases
    // ------------------------------------------------------------------

    /// Push apart every overlapping pair and impart a small separating
    /// impulse. Corrective, distinct from the soft separation force.
    fn resolve_collisions(&mut self) {
        let agents = &mut self.agents;
        let rng = &mut self.rng;
        let n = agents.len();

        for i in 0..n {
            for j in (i + 1)..n {
                let (left, right) = agents.split_at_mut(j);
                let a = &mut left[i];
                let b = &mut right[0];

                let distance = a.position.distance(b.position);
                let min_distance = (a.size + b.size) / 2.0 + 2.0;
                if distance >= min_distance {
                    continue;
                }

                let overlap = min_distance - distance;
                let mut axis = a.position - b.position;
                if axis == Vec2::ZERO {
                    axis = Vec2::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0));
                }
                let axis = axis.normalize_or_zero();
                let axis = if axis == Vec2::ZERO { Vec2::X } else { axis };

                let shift = axis * (overlap / 2.0 + 1.0);
                a.position += shift;
                b.position -= shift;
                a.velocity += axis * 0.5;
                b.velocity -= axis * 0.5;
            }
        }
    }

    /// Scan for cross-team encounters and resolve them immediately.
    ///
    /// Effects (merges, combat declarations) are visible to agents processed
    /// later in the same step; with a single thread that ordering is
    /// deliberate, not a race.
    fn check_interactions(&mut self) {
        let cooldown = self.config.agents.interaction_cooldown;
        let padding = self.config.agents.interaction_padding;
        let tick = self.tick;

        for i in 0..self.agents.len() {
            if !self.agents[i].interaction_ready(tick, cooldown) {
                continue;
            }

            let candidate = {
                let a = &self.agents[i];
                let reach = a.interaction_radius(padding);
                self.agents
                    .iter()
                    .enumerate()
                    .find(|(j, b)| {
                        *j != i
                            && b.team != a.team
                            && a.position.distance(b.position)
                                < reach + b.interaction_radius(padding)
                    })
                    .map(|(j, _)| j)
            };
            let Some(j) = candidate else {
                continue;
            };
            if !self.agents[j].interaction_ready(tick, cooldown) {
                continue;
            }

            self.agents[i].last_interaction = Some(tick);
            self.agents[j].last_interaction = Some(tick);
            self.handle_interaction(i, j);
        }
    }

    /// Decide the outcome of one encounter: coordinated combat for two
    /// established groups, otherwise cooperation (merge) or a duel.
    fn handle_interaction(&mut self, i: usize, j: usize) {
        let a_team_id = self.agents[i].team;
        let b_team_id = self.agents[j].team;
        if a_team_id == b_team_id {
            return;
        }

        let (a_coop, a_aggression, b_coop, b_aggression, attack) = {
            let (a_team, b_team) = match (self.teams.get(&a_team_id), self.teams.get(&b_team_id)) {
                (Some(a), Some(b)) => (a, b),
                _ => return,
            };
            let both_groups = !a_team.is_individual
                && !b_team.is_individual
                && a_team.members.len() >= 3
                && b_team.members.len() >= 3;
            let attack = both_groups
                && (a_team.should_attack(b_team, &mut self.rng)
                    || b_team.should_attack(a_team, &mut self.rng));
            (
                a_team.cooperation_probability(),
                a_team.aggression,
                b_team.cooperation_probability(),
                b_team.aggression,
                attack,
            )
        };

        if attack {
            self.start_team_combat(a_team_id, b_team_id);
            return;
        }

        let my_wants = self.rng.gen::<f32>() < a_coop;
        let other_wants = self.rng.gen::<f32>() < b_coop;
        let can_cooperate = (my_wants && b_aggression < 70.0)
            || (other_wants && a_aggression < 70.0)
            || (my_wants && other_wants);

        if can_cooperate {
            self.merge_teams(a_team_id, b_team_id);
        } else {
            self.resolve_fight(i, j);
        }
    }

    /// Mirror team combat state, compose role-weighted steering forces, and
    /// integrate every agent
    fn update_agents(&mut self) {
        for agent in &mut self.agents {
            match self.teams.get(&agent.team) {
                Some(team) => {
                    agent.is_in_combat = team.is_in_combat;
                    agent.combat_target = team.combat_target;
                }
                None => {
                    agent.is_in_combat = false;
                    agent.combat_target = None;
                }
            }
        }

        let mut centroids: BTreeMap<TeamId, Vec2> = BTreeMap::new();
        for (id, team) in &self.teams {
            if let Some(centroid) = team.centroid(&self.agents) {
                centroids.insert(*id, centroid);
            }
        }

        let mut motions = Vec::with_capacity(self.agents.len());
        for i in 0..self.agents.len() {
            motions.push(self.compute_motion(i, &centroids));
        }

        let width = self.config.world.width;
        let height = self.config.world.height;
        let tick = self.tick;
        for (agent, motion) in self.agents.iter_mut().zip(motions) {
            agent.wander_angle = motion.wander_angle;
            if let Some((target, interval)) = motion.retarget {
                agent.target = target;
                agent.last_retarget = tick;
                agent.retarget_interval = interval;
            }
            agent.acceleration += motion.accel;
            agent.integrate();
            agent.wrap_edges(width, height);
        }
    }

    /// Role-dependent force composition for one agent
    fn compute_motion(&mut self, i: usize, centroids: &BTreeMap<TeamId, Vec2>) -> Motion {
        let agent = &self.agents[i];
        let wander_angle = agent.wander_angle + self.rng.gen_range(-WANDER_JITTER..WANDER_JITTER);

        let Some(team) = self.teams.get(&agent.team) else {
            return Motion {
                accel: Vec2::ZERO,
                wander_angle,
                retarget: None,
            };
        };

        let roster_len = team.members.len();
        let slot = team.slot_index(agent.id).unwrap_or(0);
        let centroid = centroids.get(&agent.team).copied().unwrap_or(agent.position);

        let mut accel = Vec2::ZERO;
        let mut retarget = None;

        if agent.is_in_combat {
            let nearest_enemy = agent.combat_target.and_then(|enemy_id| {
                self.agents
                    .iter()
                    .filter(|e| e.team == enemy_id)
                    .map(|e| (agent.position.distance(e.position), e.position))
                    .min_by(|a, b| a.0.total_cmp(&b.0))
                    .map(|(_, position)| position)
            });
            accel += agent.combat_movement(team.rally_point, nearest_enemy) * 1.8;
            accel += agent.formation(slot, roster_len, centroid) * 2.0;
            accel += agent.attachment(&self.agents, roster_len) * 2.5;
            accel += agent.separate(&self.agents, &mut self.rng) * 1.8;
            accel += agent.wander_at(wander_angle) * 0.1;
        } else {
            let is_leading = agent.is_team_leader || team.is_individual || team.leader.is_none();
            if is_leading {
                let arrived =
                    agent.position.distance(agent.target) < self.config.agents.target_radius;
                let elapsed =
                    self.tick.saturating_sub(agent.last_retarget) > agent.retarget_interval;
                if arrived || elapsed {
                    let new_target = agent::random_target(&self.config, &mut self.rng);
                    let interval = self.rng.gen_range(
                        self.config.agents.retarget_interval_min
                            ..=self.config.agents.retarget_interval_max,
                    );
                    retarget = Some((new_target, interval));
                }
                let seek_target = retarget.map(|(t, _)| t).unwrap_or(agent.target);

                accel += agent.seek(seek_target) * 0.6;
                accel += agent.wander_at(wander_angle) * 0.2;
                accel += agent.separate(&self.agents, &mut self.rng) * 1.2;
                accel += agent.attachment(&self.agents, roster_len) * 1.2;
                if roster_len >= 3 && !team.is_individual {
                    let weight = remap(roster_len as f32, 3.0, 12.0, 1.5, 2.5);
                    accel += agent.formation(slot, roster_len, centroid) * weight;
                } else {
                    let weight = remap(agent.leadership as f32, 1.0, 100.0, 0.3, 0.8);
                    accel += agent.cohesion(&self.agents) * weight;
                }
            } else {
                let leader_position = team
                    .leader
                    .and_then(|leader_id| self.agents.iter().find(|a| a.id == leader_id))
                    .map(|l| l.position);
                match leader_position {
                    Some(leader_position) => {
                        let offset = agent::follow_offset(slot, roster_len);
                        accel += agent.seek(leader_position + offset) * 2.5;
                        accel += agent.formation(slot, roster_len, centroid) * 3.0;
                        accel += agent.attachment(&self.agents, roster_len) * 2.0;
                        accel += agent.separate(&self.agents, &mut self.rng) * 0.8;
                    }
                    None => {
                        // Elected leader not resolvable mid-mutation: steer solo
                        accel += agent.seek(agent.target) * 0.6;
                        accel += agent.wander_at(wander_angle) * 0.1;
                        accel += agent.separate(&self.agents, &mut self.rng) * 1.2;
                    }
                }
            }
        }

        Motion {
            accel,
            wander_angle,
            retarget,
        }
    }

    /// Coarse-cadence team lifecycle: combat timeout, rebellion, morale
    fn update_team_dynamics(&mut self) {
        let team_ids: Vec<TeamId> = self.teams.keys().copied().collect();
        let duration = self.config.combat.combat_duration;

        for team_id in team_ids {
            let disengage = match self.teams.get(&team_id) {
                Some(team) if team.is_in_combat => {
                    let enemy_alive = team
                        .combat_target
                        .and_then(|enemy_id| self.teams.get(&enemy_id))
                        .map(|enemy| !enemy.members.is_empty())
                        .unwrap_or(false);
                    team.combat_expired(self.tick, duration) || !enemy_alive
                }
                _ => false,
            };
            if disengage {
                if let Some(team) = self.teams.get_mut(&team_id) {
                    team.end_combat();
                }
            }

            self.check_rebellion(team_id);

            if let Some(team) = self.teams.get_mut(&team_id) {
                team.update_morale(self.tick, &self.config.teams, &mut self.rng);
            }
        }
    }

    /// Remove every team whose life hit zero, destroy its members, and spawn
    /// replacement singletons while the population cap allows
    fn sweep_dead_teams(&mut self) {
        let dead: Vec<TeamId> = self
            .teams
            .iter()
            .filter(|(_, t)| t.life <= 0.0 && !t.members.is_empty())
            .map(|(id, _)| *id)
            .collect();

        let mut lost = 0usize;
        for team_id in dead {
            let Some(team) = self.teams.remove(&team_id) else {
                continue;
            };
            log::info!(
                "team {} ({}) died with {} members",
                team_id,
                team.name,
                team.members.len()
            );
            lost += team.members.len();
            let members: HashSet<AgentId> = team.members.iter().copied().collect();
            self.agents.retain(|a| !members.contains(&a.id));
        }
        if lost == 0 {
            return;
        }
        self.deaths_this_step += lost;

        let capacity = self
            .config
            .lifecycle
            .max_population
            .saturating_sub(self.agents.len());
        let replacements = lost.min(capacity);
        log::info!("spawning {replacements} replacements for {lost} lost agents");
        for _ in 0..replacements {
            let position = self.random_spawn_position();
            self.spawn_agent(position);
        }
    }

    /// Refill toward the target population after attrition
    fn top_up_population(&mut self) {
        let target = self
            .config
            .lifecycle
            .initial_population
            .min(self.config.lifecycle.max_population);
        while self.agents.len() < target {
            let position = self.random_spawn_position();
            if self.spawn_agent(position).is_none() {
                break;
            }
        }
    }

    fn prune_empty_teams(&mut self) {
        self.teams.retain(|_, t| !t.members.is_empty());
    }

    fn update_stats(&mut self) {
        self.stats.tick = self.tick;
        self.stats.spawns = self.spawns_this_step;
        self.stats.deaths = self.deaths_this_step;
        self.stats.merges = self.merges_this_step;
        self.stats.fights = self.fights_this_step;
        self.stats.rebellions = self.rebellions_this_step;
        self.stats.update(&self.agents, &self.teams);

        if self.tick % self.config.logging.stats_interval == 0 {
            self.stats_history.record(self.stats.clone());
        }
    }

    fn random_spawn_position(&mut self) -> Vec2 {
        agent::random_target(&self.config, &mut self.rng)
    }

    fn agent_index(&self, id: AgentId) -> Option<usize> {
        self.agents.iter().position(|a| a.id == id)
    }
}
