//! Value network of the PPO agent.
use crate::{
    model::SubModel,
    opt::{Optimizer, OptimizerConfig},
    util::OutDim,
};
use anyhow::{Context, Result};
use candle_core::{DType, Device, Tensor, D};
use candle_nn::{VarBuilder, VarMap};
use log::info;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`Critic`].
pub struct CriticConfig<V: OutDim> {
    v_config: Option<V>,
    opt_config: OptimizerConfig,
}

impl<V: OutDim> Default for CriticConfig<V> {
    fn default() -> Self {
        Self {
            v_config: None,
            opt_config: OptimizerConfig::default(),
        }
    }
}

impl<V> CriticConfig<V>
where
    V: DeserializeOwned + Serialize + OutDim,
{
    /// Sets configurations for the value network.
    pub fn v_config(mut self, v: V) -> Self {
        self.v_config = Some(v);
        self
    }

    /// Sets optimizer configuration.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }

    /// Constructs [`CriticConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`CriticConfig`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// State-value function for PPO agents.
///
/// Maps a batch of state features to scalar value estimates.
pub struct Critic<V>
where
    V: SubModel<Input = Tensor, Output = Tensor>,
    V::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    device: Device,
    varmap: VarMap,

    // Value network.
    #[allow(dead_code)]
    v_config: V::Config,
    v: V,

    // Optimizer.
    #[allow(dead_code)]
    opt_config: OptimizerConfig,
    opt: Optimizer,
}

impl<V> Critic<V>
where
    V: SubModel<Input = Tensor, Output = Tensor>,
    V::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    /// Constructs [`Critic`].
    pub fn build(config: CriticConfig<V::Config>, device: Device) -> Result<Critic<V>> {
        let v_config = config.v_config.context("v_config is not set.")?;
        let opt_config = config.opt_config;
        let varmap = VarMap::new();
        let v = {
            let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
            V::build(vb, v_config.clone())
        };
        let opt = opt_config.build(varmap.all_vars()).unwrap();

        Ok(Critic {
            device,
            varmap,
            v_config,
            v,
            opt_config,
            opt,
        })
    }

    /// Outputs the value estimates as a rank-1 tensor.
    pub fn forward(&self, x: &V::Input) -> Tensor {
        self.v.forward(x).squeeze(D::Minus1).unwrap()
    }

    /// Applies a backward pass and one optimization step.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        self.opt.backward_step(loss)?;
        Ok(())
    }

    /// The variables of the value network.
    pub fn varmap(&self) -> &VarMap {
        &self.varmap
    }

    /// Save parameters of the value network.
    pub fn save<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        self.varmap.save(&path)?;
        info!("Save critic to {:?}", path.as_ref());
        Ok(())
    }

    /// Load parameters of the value network.
    pub fn load<T: AsRef<Path>>(&mut self, path: T) -> Result<()> {
        self.varmap.load(&path)?;
        info!("Load critic from {:?}", path.as_ref());
        Ok(())
    }
}

/// The clipped value regression loss.
///
/// The new value estimate is clipped to within `clip_eps` of the
/// rollout-time estimate and the larger of the clipped/unclipped squared
/// errors against the return target is averaged, mirroring the policy clip.
pub fn clipped_value_loss(
    v_new: &Tensor,
    v_old: &Tensor,
    returns: &Tensor,
    clip_eps: f64,
) -> Result<Tensor> {
    let v_clipped = (v_old + (v_new - v_old)?.clamp(-clip_eps, clip_eps)?)?;
    let loss_unclipped = (v_new - returns)?.powf(2.0)?;
    let loss_clipped = (v_clipped - returns)?.powf(2.0)?;
    Ok(loss_unclipped.maximum(&loss_clipped)?.mean_all()?)
}
