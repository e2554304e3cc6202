//! Snapshot structures for host communication.
//!
//! These are lightweight copies of simulation state, optimized for fast
//! transfer between the simulation thread and a rendering/UI host.

use crate::agent::{AgentId, TeamId};
use crate::stats::Stats;
use crate::world::World;

/// Lightweight view of an agent for rendering
#[derive(Clone, Debug)]
pub struct AgentView {
    pub id: AgentId,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub color: (u8, u8, u8),
    pub team: TeamId,
    pub is_team_leader: bool,
    pub is_in_combat: bool,
}

/// Lightweight view of a team for panels
#[derive(Clone, Debug)]
pub struct TeamView {
    pub id: TeamId,
    pub name: String,
    pub color: (u8, u8, u8),
    pub member_count: usize,
    pub max_size: usize,
    pub aggression: f32,
    pub life: f32,
    pub total_strength: u32,
    pub is_individual: bool,
    pub is_in_combat: bool,
    pub leader: Option<AgentId>,
}

/// Detailed agent info for the selected-agent panel
#[derive(Clone, Debug)]
pub struct AgentDetail {
    pub id: AgentId,
    pub x: f32,
    pub y: f32,
    pub leadership: u8,
    pub strength: u8,
    pub max_speed: f32,
    pub max_force: f32,
    pub size: f32,
    pub team: TeamId,
    pub team_name: String,
    pub is_team_leader: bool,
    pub is_in_combat: bool,
    pub target: (f32, f32),
}

/// Complete world snapshot for rendering
#[derive(Clone, Debug)]
pub struct WorldSnapshot {
    /// Current simulation tick
    pub tick: u64,
    /// Statistics
    pub stats: Stats,
    /// All agents (lightweight view)
    pub agents: Vec<AgentView>,
    /// All non-empty teams, strongest first
    pub teams: Vec<TeamView>,
    /// World bounds
    pub width: f32,
    pub height: f32,
    /// Currently selected agent (if any)
    pub selected_agent: Option<AgentDetail>,
}

impl WorldSnapshot {
    /// Create a snapshot from the current world state
    pub fn from_world(world: &World, selected_id: Option<AgentId>) -> Self {
        let agents: Vec<AgentView> = world
            .agents
            .iter()
            .map(|a| AgentView {
                id: a.id,
                x: a.position.x,
                y: a.position.y,
                size: a.size,
                color: (a.color.r, a.color.g, a.color.b),
                team: a.team,
                is_team_leader: a.is_team_leader,
                is_in_combat: a.is_in_combat,
            })
            .collect();

        let mut teams: Vec<TeamView> = world
            .teams
            .values()
            .filter(|t| !t.members.is_empty())
            .map(|t| TeamView {
                id: t.id,
                name: t.name.clone(),
                color: (t.color.r, t.color.g, t.color.b),
                member_count: t.members.len(),
                max_size: t.max_size,
                aggression: t.aggression,
                life: t.life,
                total_strength: t.total_strength(&world.agents),
                is_individual: t.is_individual,
                is_in_combat: t.is_in_combat,
                leader: t.leader,
            })
            .collect();
        teams.sort_by(|a, b| b.total_strength.cmp(&a.total_strength));

        let selected_agent = selected_id.and_then(|id| {
            world.agents.iter().find(|a| a.id == id).map(|a| AgentDetail {
                id: a.id,
                x: a.position.x,
                y: a.position.y,
                leadership: a.leadership,
                strength: a.strength,
                max_speed: a.max_speed,
                max_force: a.max_force,
                size: a.size,
                team: a.team,
                team_name: world
                    .teams
                    .get(&a.team)
                    .map(|t| t.name.clone())
                    .unwrap_or_default(),
                is_team_leader: a.is_team_leader,
                is_in_combat: a.is_in_combat,
                target: (a.target.x, a.target.y),
            })
        });

        Self {
            tick: world.tick,
            stats: world.stats.clone(),
            agents,
            teams,
            width: world.config.world.width,
            height: world.config.world.height,
            selected_agent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn small_world() -> World {
        let mut config = Config::default();
        config.lifecycle.initial_population = 5;
        config.lifecycle.max_population = 10;
        World::new_with_seed(config, 21)
    }

    #[test]
    fn test_snapshot_reflects_world() {
        let world = small_world();
        let snapshot = WorldSnapshot::from_world(&world, None);

        assert_eq!(snapshot.agents.len(), 5);
        assert_eq!(snapshot.teams.len(), 5);
        assert!(snapshot.selected_agent.is_none());
        assert_eq!(snapshot.width, world.config.world.width);
    }

    #[test]
    fn test_snapshot_teams_sorted_by_strength() {
        let mut world = small_world();
        world.run(10);
        let snapshot = WorldSnapshot::from_world(&world, None);

        for pair in snapshot.teams.windows(2) {
            assert!(pair[0].total_strength >= pair[1].total_strength);
        }
    }

    #[test]
    fn test_snapshot_selected_agent() {
        let world = small_world();
        let id = world.agents[2].id;
        let snapshot = WorldSnapshot::from_world(&world, Some(id));

        let detail = snapshot.selected_agent.expect("selected agent must resolve");
        assert_eq!(detail.id, id);
        assert!(!detail.team_name.is_empty());

        // A missing id simply yields no selection
        let snapshot = WorldSnapshot::from_world(&world, Some(99_999));
        assert!(snapshot.selected_agent.is_none());
    }
}
