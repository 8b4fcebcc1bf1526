//! Policy network of the PPO agent.
use crate::{
    model::SubModel,
    opt::{Optimizer, OptimizerConfig},
    util::{copy_params, OutDim},
};
use anyhow::{Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use log::info;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`Actor`].
pub struct ActorConfig<P: OutDim> {
    pi_config: Option<P>,
    opt_config: OptimizerConfig,
}

impl<P: OutDim> Default for ActorConfig<P> {
    fn default() -> Self {
        Self {
            pi_config: None,
            opt_config: OptimizerConfig::default(),
        }
    }
}

impl<P> ActorConfig<P>
where
    P: DeserializeOwned + Serialize + OutDim,
{
    /// Sets configurations for the policy network.
    pub fn pi_config(mut self, v: P) -> Self {
        self.pi_config = Some(v);
        self
    }

    /// Sets output dimension of the model.
    pub fn out_dim(mut self, v: i64) -> Self {
        match &mut self.pi_config {
            None => {}
            Some(pi_config) => pi_config.set_out_dim(v),
        };
        self
    }

    /// Sets optimizer configuration.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }

    /// Constructs [`ActorConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`ActorConfig`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Stochastic discrete policy for PPO agents.
///
/// Maps a batch of state features to unnormalized action scores (logits).
pub struct Actor<P>
where
    P: SubModel<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    device: Device,
    varmap: VarMap,

    // Dimension of the action vector.
    out_dim: i64,

    // Policy network.
    pi_config: P::Config,
    pi: P,

    // Optimizer.
    opt_config: OptimizerConfig,
    opt: Optimizer,
}

impl<P> Actor<P>
where
    P: SubModel<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    /// Constructs [`Actor`].
    pub fn build(config: ActorConfig<P::Config>, device: Device) -> Result<Actor<P>> {
        let pi_config = config.pi_config.context("pi_config is not set.")?;
        let out_dim = pi_config.get_out_dim();
        let opt_config = config.opt_config;
        let varmap = VarMap::new();
        let pi = {
            let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
            P::build(vb, pi_config.clone())
        };

        Ok(Actor::_build(
            device, out_dim, opt_config, pi_config, pi, varmap, None,
        ))
    }

    fn _build(
        device: Device,
        out_dim: i64,
        opt_config: OptimizerConfig,
        pi_config: P::Config,
        pi: P,
        varmap: VarMap,
        varmap_src: Option<&VarMap>,
    ) -> Self {
        let opt = opt_config.build(varmap.all_vars()).unwrap();

        if let Some(varmap_src) = varmap_src {
            copy_params(&varmap, varmap_src).unwrap();
        }

        Self {
            device,
            out_dim,
            opt_config,
            varmap,
            opt,
            pi,
            pi_config,
        }
    }

    /// Outputs the action logits given a batch of state features.
    pub fn forward(&self, x: &P::Input) -> Tensor {
        let logits = self.pi.forward(x);
        debug_assert_eq!(logits.dims()[1], self.out_dim as usize);
        logits
    }

    /// Applies a backward pass and one optimization step.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        self.opt.backward_step(loss)?;
        Ok(())
    }

    /// The variables of the policy network.
    pub fn varmap(&self) -> &VarMap {
        &self.varmap
    }

    /// Save parameters of the policy network.
    pub fn save<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        self.varmap.save(&path)?;
        info!("Save actor to {:?}", path.as_ref());
        Ok(())
    }

    /// Load parameters of the policy network.
    pub fn load<T: AsRef<Path>>(&mut self, path: T) -> Result<()> {
        self.varmap.load(&path)?;
        info!("Load actor from {:?}", path.as_ref());
        Ok(())
    }
}

impl<P> Clone for Actor<P>
where
    P: SubModel<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    /// Copies the parameters into a fresh, independent variable map.
    fn clone(&self) -> Self {
        let device = self.device.clone();
        let opt_config = self.opt_config.clone();
        let pi_config = self.pi_config.clone();
        let varmap = VarMap::new();
        let pi = {
            let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
            P::build(vb, pi_config.clone())
        };
        let out_dim = self.out_dim;

        Self::_build(
            device,
            out_dim,
            opt_config,
            pi_config,
            pi,
            varmap,
            Some(&self.varmap),
        )
    }
}

/// The clipped surrogate policy loss.
///
/// With `ratio = exp(logp_new - logp_old)`, the loss is
/// `-mean(min(ratio * A, clip(ratio, 1 - eps, 1 + eps) * A))`. The entropy
/// bonus is added by the caller.
pub fn clipped_surrogate_loss(
    logp_new: &Tensor,
    logp_old: &Tensor,
    advantages: &Tensor,
    clip_eps: f64,
) -> Result<Tensor> {
    let ratio = (logp_new - logp_old)?.exp()?;
    let surr1 = (&ratio * advantages)?;
    let surr2 = (ratio.clamp(1.0 - clip_eps, 1.0 + clip_eps)? * advantages)?;
    Ok(surr1.minimum(&surr2)?.mean_all()?.neg()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mlp::{Mlp, MlpConfig};
    use tempdir::TempDir;

    fn actor() -> Actor<Mlp> {
        let config = ActorConfig::default()
            .pi_config(MlpConfig::new(3, vec![8], 4))
            .opt_config(OptimizerConfig::Adam { lr: 1e-3 });
        Actor::build(config, Device::Cpu).unwrap()
    }

    fn loss_of(logp_new: &[f32], logp_old: &[f32], adv: &[f32], eps: f64) -> f32 {
        let n = logp_new.len();
        let dev = Device::Cpu;
        let logp_new = Tensor::from_slice(logp_new, (n,), &dev).unwrap();
        let logp_old = Tensor::from_slice(logp_old, (n,), &dev).unwrap();
        let adv = Tensor::from_slice(adv, (n,), &dev).unwrap();
        clipped_surrogate_loss(&logp_new, &logp_old, &adv, eps)
            .unwrap()
            .to_scalar::<f32>()
            .unwrap()
    }

    #[test]
    fn in_band_ratio_uses_unclipped_surrogate() {
        // ratio == 1 is inside [1 - eps, 1 + eps], so the loss is -mean(A).
        let loss = loss_of(&[-0.5, -1.0], &[-0.5, -1.0], &[2.0, 4.0], 0.2);
        assert!((loss - (-3.0)).abs() < 1e-5);
    }

    #[test]
    fn out_of_band_ratio_with_positive_advantage_is_clipped() {
        // ratio == 2 with positive advantage clips to 1 + eps.
        let logp_old = [-1.0f32];
        let logp_new = [logp_old[0] + 2f32.ln()];
        let loss = loss_of(&logp_new, &logp_old, &[1.0], 0.2);
        assert!((loss - (-1.2)).abs() < 1e-5);
    }

    #[test]
    fn clone_decouples_parameters() -> Result<()> {
        let mut actor = actor();
        let frozen = actor.clone();

        let x = Tensor::from_slice(&[1.0f32, -1.0, 0.5], (1, 3), &Device::Cpu)?;
        let before = frozen.forward(&x).to_vec2::<f32>()?;

        // A couple of gradient steps on the original must not move the
        // frozen copy.
        for _ in 0..3 {
            let loss = actor.forward(&x).mean_all()?;
            actor.backward_step(&loss)?;
        }

        let after = frozen.forward(&x).to_vec2::<f32>()?;
        assert_eq!(before, after);

        let moved = actor.forward(&x).to_vec2::<f32>()?;
        assert_ne!(before, moved);
        Ok(())
    }

    #[test]
    fn save_load_roundtrip() -> Result<()> {
        let actor_ = actor();
        let dir = TempDir::new("actor")?;
        let path = dir.path().join("actor.safetensors");
        actor_.save(&path)?;

        let mut actor2 = actor();
        let x = Tensor::from_slice(&[0.3f32, 0.1, -0.7], (1, 3), &Device::Cpu)?;
        actor2.load(&path)?;
        assert_eq!(
            actor_.forward(&x).to_vec2::<f32>()?,
            actor2.forward(&x).to_vec2::<f32>()?
        );
        Ok(())
    }
}
