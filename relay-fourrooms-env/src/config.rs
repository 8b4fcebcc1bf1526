//! Configuration of [`FourRooms`](crate::FourRooms).
use crate::base::FOUR_ROOMS_LAYOUT;
use anyhow::Result;
use relay_core::GoalId;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`FourRooms`](crate::FourRooms).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct FourRoomsConfig {
    /// Wall layout: one line per row, `1` for walls, spaces for walkable
    /// cells.
    pub layout: String,

    /// Initial goal cell, indexing the walkable cells in scan order.
    pub goal: GoalId,

    /// Episode step limit after which the environment signals truncation.
    ///
    /// `None` leaves episode cutoff entirely to the caller's horizon.
    pub max_episode_steps: Option<usize>,

    /// Probability that an action is replaced by a uniformly random one.
    pub slip_prob: f32,
}

impl Default for FourRoomsConfig {
    fn default() -> Self {
        Self {
            layout: FOUR_ROOMS_LAYOUT.to_string(),
            goal: crate::EAST_DOORWAY,
            max_episode_steps: None,
            slip_prob: 0.0,
        }
    }
}

impl FourRoomsConfig {
    /// Sets the initial goal cell.
    pub fn goal(mut self, v: GoalId) -> Self {
        self.goal = v;
        self
    }

    /// Sets the episode step limit.
    pub fn max_episode_steps(mut self, v: Option<usize>) -> Self {
        self.max_episode_steps = v;
        self
    }

    /// Sets the action noise probability.
    pub fn slip_prob(mut self, v: f32) -> Self {
        self.slip_prob = v;
        self
    }

    /// Number of walkable cells of the layout, which is also the length of
    /// the one-hot feature vector of an observation.
    pub fn n_cells(&self) -> usize {
        self.layout.chars().filter(|c| *c == ' ').count()
    }

    /// Constructs [`FourRoomsConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`FourRoomsConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn classic_layout_has_104_cells() {
        assert_eq!(FourRoomsConfig::default().n_cells(), 104);
    }

    #[test]
    fn serde_roundtrip() -> Result<()> {
        let config = FourRoomsConfig::default().goal(25).slip_prob(1.0 / 3.0);
        let dir = TempDir::new("fourrooms_config")?;
        let path = dir.path().join("env.yaml");
        config.save(&path)?;
        let config_ = FourRoomsConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }
}
