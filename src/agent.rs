//! Agent structure and steering behaviors.

use crate::color::Color;
use crate::config::Config;
use glam::Vec2;
use rand::Rng;
use std::f32::consts::{PI, TAU};

/// Unique agent identifier
pub type AgentId = u64;

/// Unique team identifier
pub type TeamId = u64;

/// Wander circle radius
const WANDER_RADIUS: f32 = 25.0;
/// Wander circle projection distance along the heading
const WANDER_DISTANCE: f32 = 80.0;
/// Per-step wander angle jitter
pub const WANDER_JITTER: f32 = 0.3;

/// Linear interpolation of `value` from [in_min, in_max] to [out_min, out_max]
#[inline]
pub fn remap(value: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    let t = (value - in_min) / (in_max - in_min);
    out_min + t * (out_max - out_min)
}

/// An autonomous agent in the simulation
#[derive(Clone, Debug)]
pub struct Agent {
    // Identity
    pub id: AgentId,
    pub team: TeamId,

    // Physics
    pub position: Vec2,
    pub velocity: Vec2,
    pub acceleration: Vec2,

    // Intrinsic traits, fixed at creation (1-100)
    pub leadership: u8,
    pub strength: u8,

    // Derived movement caps
    pub max_speed: f32,
    pub max_force: f32,
    pub size: f32,

    pub color: Color,

    // Navigation (meaningful while acting as leader)
    pub target: Vec2,
    pub wander_angle: f32,
    pub last_retarget: u64,
    pub retarget_interval: u64,

    // Roles
    pub is_team_leader: bool,
    pub is_in_combat: bool,
    pub combat_target: Option<TeamId>,

    // Interaction gate: None = ready
    pub last_interaction: Option<u64>,
}

impl Agent {
    /// Create a new agent with random traits at the given position.
    ///
    /// The caller (the world) assigns the team id and registers the agent in
    /// the team's roster.
    pub fn new(
        id: AgentId,
        team: TeamId,
        position: Vec2,
        config: &Config,
        rng: &mut impl Rng,
    ) -> Self {
        let leadership = rng.gen_range(1..=100u8);
        let strength = rng.gen_range(1..=100u8);

        let max_speed = remap(strength as f32, 1.0, 100.0, 0.5, 3.0);
        let max_force = remap(leadership as f32, 1.0, 100.0, 0.02, 0.1);
        let size = remap(strength as f32, 1.0, 100.0, 8.0, 20.0);

        let target = random_target(config, rng);
        let retarget_interval = rng.gen_range(
            config.agents.retarget_interval_min..=config.agents.retarget_interval_max,
        );

        Self {
            id,
            team,
            position,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            leadership,
            strength,
            max_speed,
            max_force,
            size,
            color: crate::color::palette_color(id),
            target,
            wander_angle: 0.0,
            last_retarget: 0,
            retarget_interval,
            is_team_leader: false,
            is_in_combat: false,
            combat_target: None,
            last_interaction: None,
        }
    }

    /// Radius within which this agent triggers interactions
    #[inline]
    pub fn interaction_radius(&self, padding: f32) -> f32 {
        self.size + padding
    }

    /// Whether the interaction cooldown has elapsed at `tick`
    #[inline]
    pub fn interaction_ready(&self, tick: u64, cooldown: u64) -> bool {
        match self.last_interaction {
            None => true,
            Some(last) => tick.saturating_sub(last) >= cooldown,
        }
    }

    /// Steering force toward a point at capped speed
    pub fn seek(&self, target: Vec2) -> Vec2 {
        let desired = (target - self.position).normalize_or_zero() * self.max_speed;
        (desired - self.velocity).clamp_length_max(self.max_force)
    }

    /// Seek a point on a circle projected ahead of the current heading.
    ///
    /// The wander angle is advanced by the caller and passed in so force
    /// computation stays a pure read.
    pub fn wander_at(&self, angle: f32) -> Vec2 {
        let circle = self.position + self.velocity.normalize_or_zero() * WANDER_DISTANCE;
        let offset = Vec2::new(angle.cos(), angle.sin()) * WANDER_RADIUS;
        self.seek(circle + offset)
    }

    /// Repulsion from crowding neighbors, inverse-distance weighted.
    ///
    /// Allows up to 3x the normal force when agents are nearly overlapping.
    pub fn separate(&self, agents: &[Agent], rng: &mut impl Rng) -> Vec2 {
        let mut steer = Vec2::ZERO;
        let mut count = 0u32;

        for other in agents {
            if other.id == self.id {
                continue;
            }
            let distance = self.position.distance(other.position);
            let min_safe = (self.size + other.size) / 2.0 + 5.0;

            if distance < min_safe {
                let mut diff = self.position - other.position;
                if diff == Vec2::ZERO {
                    diff = Vec2::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0));
                }
                let strength = remap(distance, 0.0, min_safe, 5.0, 1.0);
                steer += diff.normalize_or_zero() * strength;
                count += 1;
            } else if distance < min_safe * 2.0 {
                steer += (self.position - other.position).normalize_or_zero() * 0.5;
                count += 1;
            }
        }

        if count > 0 {
            steer /= count as f32;
            steer = steer.clamp_length_max(self.max_force * 3.0);
        }
        steer
    }

    /// Seek the average position of nearby same-team members
    pub fn cohesion(&self, agents: &[Agent]) -> Vec2 {
        const NEIGHBOR_DISTANCE: f32 = 80.0;

        let mut sum = Vec2::ZERO;
        let mut count = 0u32;
        for other in agents {
            if other.id == self.id || other.team != self.team {
                continue;
            }
            let distance = self.position.distance(other.position);
            if distance > 0.0 && distance < NEIGHBOR_DISTANCE {
                sum += other.position;
                count += 1;
            }
        }

        if count > 0 {
            self.seek(sum / count as f32)
        } else {
            Vec2::ZERO
        }
    }

    /// Gentle pull toward the nearest few teammates to prevent stragglers.
    ///
    /// Only engages teammates beyond safe distance but within 1.5x the ideal
    /// spacing; the force is capped well below `max_force`.
    pub fn attachment(&self, agents: &[Agent], roster_len: usize) -> Vec2 {
        if roster_len <= 1 {
            return Vec2::ZERO;
        }

        let ideal = (self.size + 15.0) * 1.2;
        let max_connections = 3.min(roster_len - 1);

        let mut mates: Vec<(f32, Vec2, f32)> = agents
            .iter()
            .filter(|a| a.team == self.team && a.id != self.id)
            .map(|a| (self.position.distance(a.position), a.position, a.size))
            .collect();
        mates.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut force = Vec2::ZERO;
        let mut connections = 0u32;
        for &(distance, position, other_size) in mates.iter().take(max_connections) {
            let min_safe = (self.size + other_size) / 2.0 + 10.0;
            if distance > min_safe && distance < ideal * 1.5 && distance > ideal {
                let pull = (position - self.position).normalize_or_zero() * ((distance - ideal) * 0.05);
                force += pull;
                connections += 1;
            }
        }

        if connections > 0 {
            force /= connections as f32;
            force = force.clamp_length_max(self.max_force * 0.2);
        }
        force
    }

    /// Seek the agent's ring slot around the team centroid
    pub fn formation(&self, slot: usize, roster_len: usize, centroid: Vec2) -> Vec2 {
        if roster_len <= 1 {
            return Vec2::ZERO;
        }
        let desired = centroid + formation_slot(slot, roster_len);
        self.seek(desired) * 0.3
    }

    /// Combat steering: rally first, then close on the nearest enemy
    pub fn combat_movement(&self, rally: Option<Vec2>, nearest_enemy: Option<Vec2>) -> Vec2 {
        if let Some(rally) = rally {
            if self.position.distance(rally) > 30.0 {
                return self.seek(rally);
            }
        }
        match nearest_enemy {
            Some(position) => self.seek(position),
            None => Vec2::ZERO,
        }
    }

    /// Integrate accumulated acceleration into velocity and position
    pub fn integrate(&mut self) {
        self.velocity += self.acceleration;
        self.velocity = self.velocity.clamp_length_max(self.max_speed);
        self.position += self.velocity;
        self.acceleration = Vec2::ZERO;
    }

    /// Wrap position around world edges (pure position transform)
    pub fn wrap_edges(&mut self, width: f32, height: f32) {
        if self.position.x < -self.size {
            self.position.x = width + self.size;
        }
        if self.position.x > width + self.size {
            self.position.x = -self.size;
        }
        if self.position.y < -self.size {
            self.position.y = height + self.size;
        }
        if self.position.y > height + self.size {
            self.position.y = -self.size;
        }
    }
}

/// Ring slot offset from the team centroid for formation keeping.
///
/// Tiers: <=3 members a tight single ring, <=6 a wider ring, beyond that a
/// double ring with the first half of the roster inside.
pub fn formation_slot(index: usize, count: usize) -> Vec2 {
    if count <= 3 {
        ring_offset(index, count, 20.0)
    } else if count <= 6 {
        ring_offset(index, count, 28.0)
    } else {
        let inner_count = count / 2;
        if index < inner_count {
            ring_offset(index, inner_count, 20.0)
        } else {
            ring_offset(index - inner_count, count - inner_count, 40.0)
        }
    }
}

/// Offset from the leader's position for followers holding formation
pub fn follow_offset(index: usize, count: usize) -> Vec2 {
    if count <= 3 {
        // Line up behind the leader
        let angle = index as f32 * TAU / count as f32 + PI;
        Vec2::new(angle.cos(), angle.sin()) * 25.0
    } else if count <= 6 {
        ring_offset(index, count, 30.0)
    } else {
        let inner_count = count / 2;
        if index < inner_count {
            ring_offset(index, inner_count, 25.0)
        } else {
            ring_offset(index - inner_count, count - inner_count, 45.0)
        }
    }
}

#[inline]
fn ring_offset(index: usize, count: usize, radius: f32) -> Vec2 {
    let angle = index as f32 * TAU / count.max(1) as f32;
    Vec2::new(angle.cos(), angle.sin()) * radius
}

/// Random waypoint inside the world with a margin from the edges
pub fn random_target(config: &Config, rng: &mut impl Rng) -> Vec2 {
    let margin = config.world.spawn_margin;
    Vec2::new(
        rng.gen_range(margin..config.world.width - margin),
        rng.gen_range(margin..config.world.height - margin),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn test_agent(rng: &mut ChaCha8Rng) -> Agent {
        Agent::new(1, 1, Vec2::new(100.0, 100.0), &Config::default(), rng)
    }

    #[test]
    fn test_agent_creation_ranges() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for id in 0..50 {
            let agent = Agent::new(id, id, Vec2::ZERO, &Config::default(), &mut rng);
            assert!((1..=100).contains(&agent.leadership));
            assert!((1..=100).contains(&agent.strength));
            assert!((0.5..=3.0).contains(&agent.max_speed));
            assert!((0.02..=0.1).contains(&agent.max_force));
            assert!((8.0..=20.0).contains(&agent.size));
        }
    }

    #[test]
    fn test_seek_bounded_by_max_force() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let agent = test_agent(&mut rng);
        let force = agent.seek(Vec2::new(5000.0, -3000.0));
        assert!(force.length() <= agent.max_force + 1e-5);
    }

    #[test]
    fn test_seek_points_toward_target() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let agent = test_agent(&mut rng);
        let force = agent.seek(Vec2::new(200.0, 100.0));
        assert!(force.x > 0.0);
    }

    #[test]
    fn test_separate_pushes_apart() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut a = test_agent(&mut rng);
        let mut b = test_agent(&mut rng);
        a.id = 1;
        b.id = 2;
        a.position = Vec2::new(100.0, 100.0);
        b.position = Vec2::new(104.0, 100.0);

        let agents = vec![a.clone(), b];
        let force = a.separate(&agents, &mut rng);
        // Pushed away from the neighbor on the right
        assert!(force.x < 0.0);
        assert!(force.length() <= a.max_force * 3.0 + 1e-5);
    }

    #[test]
    fn test_separate_ignores_far_agents() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut a = test_agent(&mut rng);
        let mut b = test_agent(&mut rng);
        a.id = 1;
        b.id = 2;
        a.position = Vec2::new(100.0, 100.0);
        b.position = Vec2::new(500.0, 500.0);

        let agents = vec![a.clone(), b];
        assert_eq!(a.separate(&agents, &mut rng), Vec2::ZERO);
    }

    #[test]
    fn test_cohesion_zero_for_solo() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let a = test_agent(&mut rng);
        let agents = vec![a.clone()];
        assert_eq!(a.cohesion(&agents), Vec2::ZERO);
    }

    #[test]
    fn test_cohesion_seeks_teammates() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let mut a = test_agent(&mut rng);
        let mut b = test_agent(&mut rng);
        a.id = 1;
        b.id = 2;
        a.team = 9;
        b.team = 9;
        a.position = Vec2::new(100.0, 100.0);
        b.position = Vec2::new(150.0, 100.0);

        let agents = vec![a.clone(), b];
        let force = a.cohesion(&agents);
        assert!(force.x > 0.0);
    }

    #[test]
    fn test_formation_slot_tiers() {
        // Tight ring for small teams
        assert!((formation_slot(0, 3).length() - 20.0).abs() < 1e-4);
        // Wider single ring for medium teams
        assert!((formation_slot(0, 6).length() - 28.0).abs() < 1e-4);
        // Double ring for large teams: first half inner, rest outer
        assert!((formation_slot(0, 8).length() - 20.0).abs() < 1e-4);
        assert!((formation_slot(7, 8).length() - 40.0).abs() < 1e-4);
    }

    #[test]
    fn test_follow_offset_behind_leader_for_small_teams() {
        // Index 0 of a pair sits behind the leader (angle pi)
        let offset = follow_offset(0, 2);
        assert!(offset.x < 0.0);
        assert!((offset.length() - 25.0).abs() < 1e-4);
    }

    #[test]
    fn test_integrate_clamps_speed() {
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let mut agent = test_agent(&mut rng);
        agent.acceleration = Vec2::new(100.0, 0.0);
        agent.integrate();
        assert!(agent.velocity.length() <= agent.max_speed + 1e-5);
        assert_eq!(agent.acceleration, Vec2::ZERO);
    }

    #[test]
    fn test_wrap_edges() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut agent = test_agent(&mut rng);
        agent.position = Vec2::new(-agent.size - 1.0, 50.0);
        agent.wrap_edges(800.0, 600.0);
        assert!(agent.position.x > 800.0);
    }

    #[test]
    fn test_interaction_cooldown() {
        let mut rng = ChaCha8Rng::seed_from_u64(10);
        let mut agent = test_agent(&mut rng);
        assert!(agent.interaction_ready(0, 120));

        agent.last_interaction = Some(100);
        assert!(!agent.interaction_ready(150, 120));
        assert!(agent.interaction_ready(220, 120));
    }

    #[test]
    fn test_combat_movement_prefers_rally() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let agent = test_agent(&mut rng);
        let rally = Some(Vec2::new(500.0, 100.0));
        let enemy = Some(Vec2::new(100.0, 500.0));

        // Far from rally: head there first
        let force = agent.combat_movement(rally, enemy);
        assert!(force.x > 0.0);

        // Within rally radius: switch to the enemy
        let close_rally = Some(agent.position + Vec2::new(10.0, 0.0));
        let force = agent.combat_movement(close_rally, enemy);
        assert!(force.y > 0.0);
    }
}
