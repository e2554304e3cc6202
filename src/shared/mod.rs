//! Shared module for host communication.
//!
//! This module contains the command, snapshot, and thread types a rendering
//! or UI host uses to drive the simulation.

pub mod commands;
pub mod sim_thread;
pub mod snapshot;

pub use commands::{SimCommand, SimSettings, SimState};
pub use sim_thread::SimulationHandle;
pub use snapshot::{AgentDetail, AgentView, TeamView, WorldSnapshot};
