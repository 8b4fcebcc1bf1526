//! Configuration of [`Trainer`](super::Trainer).
use crate::GoalId;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Trainer`](super::Trainer).
///
/// The configuration is immutable during a trial; derived quantities like
/// [`train_iterations`](Self::train_iterations) and
/// [`goal_switch_episode`](Self::goal_switch_episode) are pure functions of
/// the stored fields.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct TrainerConfig {
    /// Total number of training episodes of a trial.
    pub total_train_episodes: usize,

    /// Number of episodes collected into the rollout buffer per iteration.
    pub buffer_episodes: usize,

    /// Step horizon of a training episode.
    pub t_max: usize,

    /// Interval of evaluation in training episodes.
    pub test_interval: usize,

    /// Discount factor.
    pub gamma: f32,

    /// GAE smoothing factor.
    pub gae_lambda: f32,

    /// Goal the environment is switched to at the episode midpoint.
    ///
    /// `None` disables goal switching.
    pub switch_goal: Option<GoalId>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            total_train_episodes: 2000,
            buffer_episodes: 10,
            t_max: 1000,
            test_interval: 10,
            gamma: 0.99,
            gae_lambda: 0.99,
            switch_goal: None,
        }
    }
}

impl TrainerConfig {
    /// Sets the total number of training episodes.
    pub fn total_train_episodes(mut self, v: usize) -> Self {
        self.total_train_episodes = v;
        self
    }

    /// Sets the number of episodes per rollout buffer.
    pub fn buffer_episodes(mut self, v: usize) -> Self {
        self.buffer_episodes = v;
        self
    }

    /// Sets the step horizon of a training episode.
    pub fn t_max(mut self, v: usize) -> Self {
        self.t_max = v;
        self
    }

    /// Sets the interval of evaluation in training episodes.
    pub fn test_interval(mut self, v: usize) -> Self {
        self.test_interval = v;
        self
    }

    /// Sets the discount factor.
    pub fn gamma(mut self, v: f32) -> Self {
        self.gamma = v;
        self
    }

    /// Sets the GAE smoothing factor.
    pub fn gae_lambda(mut self, v: f32) -> Self {
        self.gae_lambda = v;
        self
    }

    /// Sets the goal switched to at the episode midpoint.
    pub fn switch_goal(mut self, v: Option<GoalId>) -> Self {
        self.switch_goal = v;
        self
    }

    /// Number of collect/optimize iterations of a trial.
    pub fn train_iterations(&self) -> usize {
        (self.total_train_episodes + self.buffer_episodes - 1) / self.buffer_episodes
    }

    /// Episode at which the goal switch fires, if one is configured.
    pub fn goal_switch_episode(&self) -> usize {
        self.total_train_episodes / 2
    }

    /// Constructs [`TrainerConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`TrainerConfig`].
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
    fn derived_quantities() {
        let config = TrainerConfig::default()
            .total_train_episodes(2000)
            .buffer_episodes(10);
        assert_eq!(config.train_iterations(), 200);
        assert_eq!(config.goal_switch_episode(), 1000);

        let config = config.total_train_episodes(15).buffer_episodes(4);
        assert_eq!(config.train_iterations(), 4);
    }

    #[test]
    fn serde_roundtrip() -> Result<()> {
        let config = TrainerConfig::default()
            .total_train_episodes(100)
            .switch_goal(Some(62));

        let dir = TempDir::new("trainer_config")?;
        let path = dir.path().join("trainer.yaml");
        config.save(&path)?;
        let config_ = TrainerConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }
}
