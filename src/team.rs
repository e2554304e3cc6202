//! Team structure: roster metadata, aggression/life dynamics, combat state.
//!
//! Structural mutations (membership, merges, splits) live on the world so
//! both rosters and agent back-references update atomically; this module
//! keeps the state a team can maintain on its own.

use crate::agent::{Agent, AgentId, TeamId};
use crate::color::Color;
use crate::config::{CombatConfig, TeamConfig};
use glam::Vec2;
use rand::Rng;

/// A dynamic group of agents sharing life and aggression
#[derive(Clone, Debug)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub color: Color,

    /// Ordered roster; order drives formation-slot assignment
    pub members: Vec<AgentId>,
    /// True iff the team has exactly one member
    pub is_individual: bool,

    /// Propensity to fight vs. cooperate, 0-100
    pub aggression: f32,
    /// Health; reaching 0 marks the team for dissolution
    pub life: f32,
    /// Roster capacity, fixed at creation
    pub max_size: usize,

    /// Member with the highest leadership, if any
    pub leader: Option<AgentId>,
    /// Tick the team was created at
    pub created_at: u64,

    // Coordinated combat state
    pub is_in_combat: bool,
    pub combat_target: Option<TeamId>,
    pub combat_started: u64,
    pub rally_point: Option<Vec2>,
}

impl Team {
    /// Create an empty team with randomized aggression and capacity
    pub fn new(
        id: TeamId,
        name: String,
        color: Color,
        is_individual: bool,
        tick: u64,
        cfg: &TeamConfig,
        rng: &mut impl Rng,
    ) -> Self {
        Self {
            id,
            name,
            color,
            members: Vec::new(),
            is_individual,
            aggression: rng.gen_range(cfg.start_aggression_min..=cfg.start_aggression_max),
            life: 100.0,
            max_size: rng.gen_range(cfg.max_size_min..=cfg.max_size_max),
            leader: None,
            created_at: tick,
            is_in_combat: false,
            combat_target: None,
            combat_started: 0,
            rally_point: None,
        }
    }

    /// Adjust life, clamped to [0, 100]
    #[inline]
    pub fn add_life(&mut self, amount: f32) {
        self.life = (self.life + amount).clamp(0.0, 100.0);
    }

    /// Adjust aggression, clamped to [0, 100]
    #[inline]
    pub fn add_aggression(&mut self, amount: f32) {
        self.aggression = (self.aggression + amount).clamp(0.0, 100.0);
    }

    /// Probability of cooperating with another team
    #[inline]
    pub fn cooperation_probability(&self) -> f32 {
        (100.0 - self.aggression) / 100.0
    }

    /// Combined strength of all members
    pub fn total_strength(&self, agents: &[Agent]) -> u32 {
        agents
            .iter()
            .filter(|a| a.team == self.id)
            .map(|a| a.strength as u32)
            .sum()
    }

    /// Mean position of all members, or None for an empty roster
    pub fn centroid(&self, agents: &[Agent]) -> Option<Vec2> {
        let mut sum = Vec2::ZERO;
        let mut count = 0u32;
        for agent in agents.iter().filter(|a| a.team == self.id) {
            sum += agent.position;
            count += 1;
        }
        if count > 0 {
            Some(sum / count as f32)
        } else {
            None
        }
    }

    /// Position of a member in the roster, used for formation slots
    #[inline]
    pub fn slot_index(&self, id: AgentId) -> Option<usize> {
        self.members.iter().position(|&m| m == id)
    }

    /// Decide whether to open coordinated combat against `other`.
    ///
    /// Individuals and near-empty teams never coordinate an attack; beyond
    /// that, aggression, size advantage, and roster fullness all raise the
    /// odds.
    pub fn should_attack(&self, other: &Team, rng: &mut impl Rng) -> bool {
        if self.is_individual || self.members.len() < 2 {
            return false;
        }
        if other.is_individual || other.members.len() < 2 {
            return false;
        }

        let aggression_factor = self.aggression / 100.0;
        let size_factor = self.members.len() as f32 / (other.members.len() as f32 + 1.0);
        let capacity_factor = self.members.len() as f32 / self.max_size as f32;

        let attack_probability =
            aggression_factor * 0.4 + size_factor.min(1.0) * 0.4 + capacity_factor * 0.2;

        rng.gen::<f32>() < attack_probability * 0.3
    }

    /// Roll for an aggression-driven split; only rosters above 3 are eligible
    pub fn rebellion_roll(&self, rng: &mut impl Rng) -> bool {
        if self.members.len() <= 3 {
            return false;
        }
        let rebellion_chance = (self.aggression / 100.0) * 0.002;
        rng.gen::<f32>() < rebellion_chance
    }

    /// Enter coordinated combat. No-op for teams already fighting,
    /// individuals, or rosters below 2.
    pub fn start_combat(&mut self, enemy: TeamId, rally: Option<Vec2>, tick: u64) -> bool {
        if self.is_in_combat || self.is_individual || self.members.len() < 2 {
            return false;
        }
        self.is_in_combat = true;
        self.combat_target = Some(enemy);
        self.combat_started = tick;
        self.rally_point = rally;
        true
    }

    /// Leave coordinated combat and clear the rally point
    pub fn end_combat(&mut self) {
        self.is_in_combat = false;
        self.combat_target = None;
        self.rally_point = None;
    }

    /// Whether the engagement has exceeded the configured duration
    #[inline]
    pub fn combat_expired(&self, tick: u64, duration: u64) -> bool {
        self.is_in_combat && tick.saturating_sub(self.combat_started) > duration
    }

    /// Periodic aggression/life drift, aging, regeneration, and random events.
    ///
    /// Invoked on the dynamics sweep, not every frame.
    pub fn update_morale(&mut self, tick: u64, cfg: &TeamConfig, rng: &mut impl Rng) {
        // A team at zero life is marked for dissolution; it no longer drifts,
        // regenerates, or draws events while awaiting the sweep
        if self.life <= 0.0 {
            return;
        }
        let size = self.members.len();

        // Large teams drift hostile and strain under coordination costs
        if size > 5 {
            self.add_aggression(2.0);
            self.add_life(-(size as f32) * 0.05);
        } else if size < 3 {
            self.add_aggression(-3.0);
        }

        if !self.is_in_combat {
            self.add_aggression(-cfg.aggression_decay);
        }

        // Aging erodes life proportionally to age, amplified for large rosters
        let age = tick.saturating_sub(self.created_at);
        let aging_rate = age as f32 / cfg.aging_grace as f32;
        if aging_rate > 0.0 {
            let size_multiplier = 1.0 + if size > 4 { (size - 4) as f32 * 0.2 } else { 0.0 };
            self.add_life(-aging_rate * 0.05 * size_multiplier);
        }

        if !self.is_in_combat && self.life < 100.0 {
            self.add_life(cfg.life_regen);
        }
        if self.is_in_combat {
            self.add_life(-0.2);
        }

        // Stochastic crisis/fortune events
        if rng.gen::<f32>() < 0.02 {
            let event = rng.gen::<f32>();
            if event < 0.4 {
                self.add_life(-12.0);
                self.add_aggression(8.0);
                log::debug!("team {} suffered a crisis, life {:.0}", self.id, self.life);
            } else if event > 0.8 {
                self.add_life(8.0);
                self.add_aggression(-4.0);
                log::debug!("team {} had good fortune, life {:.0}", self.id, self.life);
            }
        }

        if self.life <= 10.0 && !self.members.is_empty() {
            log::debug!("team {} critically low on life: {:.0}", self.id, self.life);
        }
    }
}

/// Damage dealt to the loser of a duel.
///
/// `roll` is the raw uniform draw in [0,1) for the random damage component,
/// taken as an argument so tests can pin it. Larger losing rosters soak a
/// little damage, but rosters past the penalty threshold take extra instead.
/// The result never drops below 2.
pub fn duel_damage(
    winner_strength: u8,
    loser_strength: u8,
    loser_team_size: usize,
    cfg: &CombatConfig,
    roll: f32,
) -> f32 {
    let strength_diff = (winner_strength as i32 - loser_strength as i32).unsigned_abs();
    let raw = cfg.base_damage + (strength_diff / 5) as f32 + (roll * 10.0).floor();

    let mut protection =
        loser_team_size.saturating_sub(1) as f32 * cfg.team_size_protection;
    if loser_team_size > cfg.large_penalty_threshold {
        protection -=
            (loser_team_size - cfg.large_penalty_threshold) as f32 * cfg.large_penalty_rate;
    }

    (raw * (1.0 - protection)).floor().max(2.0)
}

/// Life returned to the duel winner for the damage it dealt
#[inline]
pub fn winner_life_gain(damage: f32, cfg: &CombatConfig) -> f32 {
    (damage * cfg.winner_life_gain).floor()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::palette_color;
    use crate::config::Config;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn test_team(id: TeamId, rng: &mut ChaCha8Rng) -> Team {
        let cfg = Config::default();
        Team::new(id, format!("Team-{id}"), palette_color(id), false, 0, &cfg.teams, rng)
    }

    #[test]
    fn test_team_creation_ranges() {
        let cfg = Config::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for id in 0..50 {
            let team = test_team(id, &mut rng);
            assert!(team.aggression >= cfg.teams.start_aggression_min);
            assert!(team.aggression <= cfg.teams.start_aggression_max);
            assert!(team.max_size >= cfg.teams.max_size_min);
            assert!(team.max_size <= cfg.teams.max_size_max);
            assert_eq!(team.life, 100.0);
        }
    }

    #[test]
    fn test_cooperation_probability() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut team = test_team(1, &mut rng);
        team.aggression = 30.0;
        assert!((team.cooperation_probability() - 0.7).abs() < 1e-6);

        team.aggression = 100.0;
        assert_eq!(team.cooperation_probability(), 0.0);
    }

    #[test]
    fn test_clamped_adjustments() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut team = test_team(1, &mut rng);

        team.add_life(500.0);
        assert_eq!(team.life, 100.0);
        team.add_life(-500.0);
        assert_eq!(team.life, 0.0);

        team.add_aggression(500.0);
        assert_eq!(team.aggression, 100.0);
        team.add_aggression(-500.0);
        assert_eq!(team.aggression, 0.0);
    }

    #[test]
    fn test_should_attack_rejects_individuals() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut solo = test_team(1, &mut rng);
        solo.is_individual = true;
        solo.members = vec![1];

        let mut group = test_team(2, &mut rng);
        group.members = vec![2, 3, 4];
        group.aggression = 100.0;

        assert!(!solo.should_attack(&group, &mut rng));
        assert!(!group.should_attack(&solo, &mut rng));
    }

    #[test]
    fn test_should_attack_fires_for_aggressive_full_teams() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut attacker = test_team(1, &mut rng);
        attacker.members = vec![1, 2, 3, 4, 5, 6];
        attacker.max_size = 6;
        attacker.aggression = 100.0;

        let mut victim = test_team(2, &mut rng);
        victim.members = vec![7, 8];

        // p = 0.4 + 0.4 + 0.2 = 1.0, gated at 0.3 per check
        let fired = (0..200).filter(|_| attacker.should_attack(&victim, &mut rng)).count();
        assert!(fired > 30, "expected roughly 30% attack rate, got {fired}/200");
    }

    #[test]
    fn test_start_combat_rules() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let mut team = test_team(1, &mut rng);
        team.members = vec![1, 2, 3];

        assert!(team.start_combat(2, Some(Vec2::new(10.0, 10.0)), 100));
        assert!(team.is_in_combat);
        assert_eq!(team.combat_target, Some(2));

        // Already fighting
        assert!(!team.start_combat(3, None, 100));

        team.end_combat();
        assert!(!team.is_in_combat);
        assert!(team.rally_point.is_none());

        // Too small to coordinate
        team.members = vec![1];
        assert!(!team.start_combat(2, None, 100));
    }

    #[test]
    fn test_combat_expiry() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut team = test_team(1, &mut rng);
        team.members = vec![1, 2];
        team.start_combat(2, None, 100);

        assert!(!team.combat_expired(200, 180));
        assert!(team.combat_expired(281, 180));
    }

    #[test]
    fn test_rebellion_requires_large_roster() {
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let mut team = test_team(1, &mut rng);
        team.aggression = 100.0;
        team.members = vec![1, 2, 3];

        assert!(!(0..1000).any(|_| team.rebellion_roll(&mut rng)));

        team.members = vec![1, 2, 3, 4, 5, 6];
        // Max chance is 0.2% per roll; over many rolls it should fire at least once
        assert!((0..20_000).any(|_| team.rebellion_roll(&mut rng)));
    }

    #[test]
    fn test_morale_bounds_hold() {
        let cfg = Config::default();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut team = test_team(1, &mut rng);
        team.members = (0..10).collect();

        for tick in (0..120_000).step_by(120) {
            team.update_morale(tick, &cfg.teams, &mut rng);
            assert!((0.0..=100.0).contains(&team.life));
            assert!((0.0..=100.0).contains(&team.aggression));
        }
    }

    #[test]
    fn test_morale_regenerates_out_of_combat() {
        let cfg = Config::default();
        let mut rng = ChaCha8Rng::seed_from_u64(10);
        let mut team = test_team(1, &mut rng);
        team.members = vec![1, 2, 3];
        team.life = 50.0;
        team.created_at = 0;

        // StepRng pinned at ~0.5 suppresses the stochastic event branch
        let mut pinned = rand::rngs::mock::StepRng::new(u64::MAX / 2, 0);
        team.update_morale(0, &cfg.teams, &mut pinned);
        assert!((team.life - 50.8).abs() < 1e-4);

        // In combat the same team drains instead
        team.life = 50.0;
        team.is_in_combat = true;
        team.update_morale(0, &cfg.teams, &mut pinned);
        assert!((team.life - 49.8).abs() < 1e-4);
    }

    #[test]
    fn test_duel_damage_floor_and_pinned_roll() {
        let cfg = Config::default().combat;

        // Pinned minimum roll, equal strengths, solo loser: raw base damage
        let damage = duel_damage(50, 50, 1, &cfg, 0.0);
        assert_eq!(damage, 8.0);
        assert_eq!(winner_life_gain(damage, &cfg), 3.0);

        // Strength gap adds floor(diff/5)
        let damage = duel_damage(90, 10, 1, &cfg, 0.0);
        assert_eq!(damage, 8.0 + 16.0);

        // Heavy protection can never push damage below the floor
        let cfg_soft = CombatConfig {
            base_damage: 2.0,
            ..cfg.clone()
        };
        let damage = duel_damage(50, 50, 5, &cfg_soft, 0.0);
        assert_eq!(damage, 2.0);
    }

    #[test]
    fn test_duel_damage_large_team_penalty() {
        let cfg = Config::default().combat;

        let protected = duel_damage(50, 50, 4, &cfg, 0.9);
        let oversized = duel_damage(50, 50, 10, &cfg, 0.9);
        assert!(
            oversized > protected,
            "rosters past the threshold must take extra damage"
        );
    }

    #[test]
    fn test_total_strength_and_centroid() {
        let cfg = Config::default();
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        let mut team = test_team(7, &mut rng);
        team.members = vec![1, 2];

        let mut a = Agent::new(1, 7, Vec2::new(0.0, 0.0), &cfg, &mut rng);
        let mut b = Agent::new(2, 7, Vec2::new(10.0, 20.0), &cfg, &mut rng);
        a.strength = 30;
        b.strength = 45;
        let agents = vec![a, b];

        assert_eq!(team.total_strength(&agents), 75);
        assert_eq!(team.centroid(&agents), Some(Vec2::new(5.0, 10.0)));

        let empty = test_team(8, &mut rng);
        assert_eq!(empty.centroid(&agents), None);
    }
}
