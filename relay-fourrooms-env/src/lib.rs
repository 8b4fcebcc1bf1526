#![warn(missing_docs)]
//! FourRooms grid world for goal-transfer experiments.
//!
//! The environment is the classic four-rooms navigation task: a 13x13 grid
//! of four rooms connected by doorways. The agent starts in a uniformly
//! random walkable cell and receives reward 1.0 on reaching the goal cell,
//! which terminates the episode. The goal is selected by a
//! [`GoalId`](relay_core::GoalId) indexing the walkable cells in scan order
//! and can be moved mid-trial through
//! [`GoalEnv::set_goal`](relay_core::GoalEnv::set_goal), which is how the
//! trainer realizes its one-shot goal switch.
mod base;
mod config;

pub use base::{FourRooms, FourRoomsAct, FourRoomsObs, EAST_DOORWAY};
pub use config::FourRoomsConfig;
