//! Configuration of [`Ppo`](super::Ppo).
use super::{ActorConfig, CriticConfig};
use crate::{util::OutDim, Device};
use anyhow::Result;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Ppo`](super::Ppo).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct PpoConfig<P, V>
where
    P: OutDim,
    V: OutDim,
{
    /// Configuration of the actor.
    pub actor_config: ActorConfig<P>,

    /// Configuration of the critic.
    pub critic_config: CriticConfig<V>,

    /// Number of optimization epochs per rollout buffer.
    pub opt_epochs: usize,

    /// Minibatch size of the shuffled batch partitions.
    pub mini_batch_size: usize,

    /// Clip ratio of the surrogate and value objectives.
    pub clip_eps: f64,

    /// Entropy bonus coefficient.
    pub entropy_coef: f64,

    /// Seed of the action-sampling RNG.
    pub seed: u64,

    /// Device on which the networks are built.
    pub device: Option<Device>,
}

impl<P, V> Default for PpoConfig<P, V>
where
    P: OutDim,
    V: OutDim,
{
    fn default() -> Self {
        Self {
            actor_config: ActorConfig::default(),
            critic_config: CriticConfig::default(),
            opt_epochs: 10,
            mini_batch_size: 64,
            clip_eps: 0.2,
            entropy_coef: 0.01,
            seed: 42,
            device: None,
        }
    }
}

impl<P, V> PpoConfig<P, V>
where
    P: DeserializeOwned + Serialize + OutDim,
    V: DeserializeOwned + Serialize + OutDim,
{
    /// Sets the actor configuration.
    pub fn actor_config(mut self, v: ActorConfig<P>) -> Self {
        self.actor_config = v;
        self
    }

    /// Sets the critic configuration.
    pub fn critic_config(mut self, v: CriticConfig<V>) -> Self {
        self.critic_config = v;
        self
    }

    /// Sets the number of optimization epochs.
    pub fn opt_epochs(mut self, v: usize) -> Self {
        self.opt_epochs = v;
        self
    }

    /// Sets the minibatch size.
    pub fn mini_batch_size(mut self, v: usize) -> Self {
        self.mini_batch_size = v;
        self
    }

    /// Sets the clip ratio.
    pub fn clip_eps(mut self, v: f64) -> Self {
        self.clip_eps = v;
        self
    }

    /// Sets the entropy bonus coefficient.
    pub fn entropy_coef(mut self, v: f64) -> Self {
        self.entropy_coef = v;
        self
    }

    /// Sets the seed of the action-sampling RNG.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Sets the device.
    pub fn device(mut self, v: Option<Device>) -> Self {
        self.device = v;
        self
    }

    /// Constructs [`PpoConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`PpoConfig`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
