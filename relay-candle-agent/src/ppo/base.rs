//! PPO agent implemented with candle.
use super::{
    actor::clipped_surrogate_loss, critic::clipped_value_loss, Actor, Critic, PpoConfig,
};
use crate::{
    model::SubModel,
    util::{sample_categorical, OutDim},
};
use anyhow::Result;
use candle_core::{Device, Tensor, D};
use candle_nn::ops::{log_softmax, softmax};
use rand::{rngs::SmallRng, seq::SliceRandom, SeedableRng};
use relay_core::{
    record::{Record, RecordValue},
    Agent, DiscreteAct, Env, Featurize, Policy, RolloutBuffer,
};
use serde::{de::DeserializeOwned, Serialize};
use std::{fs, marker::PhantomData, path::Path};

fn obs_tensor<O: Featurize>(obs: &O, device: &Device) -> Tensor {
    let feature = obs.featurize();
    Tensor::from_slice(&feature, (1, feature.len()), device).unwrap()
}

/// PPO agent with a clipped surrogate objective.
///
/// The agent owns a discrete [`Actor`] and a [`Critic`] over the same state
/// features. During rollouts it reports sampled actions together with their
/// log-probabilities and value estimates; these rollout-time outputs are the
/// "old" reference of the clipped objectives when [`Agent::opt`] later
/// consumes the rollout buffer.
pub struct Ppo<E, P, V>
where
    E: Env,
    P: SubModel<Input = Tensor, Output = Tensor>,
    V: SubModel<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + OutDim + Clone,
    V::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    pub(in crate::ppo) actor: Actor<P>,
    pub(in crate::ppo) critic: Critic<V>,
    pub(in crate::ppo) opt_epochs: usize,
    pub(in crate::ppo) mini_batch_size: usize,
    pub(in crate::ppo) clip_eps: f64,
    pub(in crate::ppo) entropy_coef: f64,
    pub(in crate::ppo) n_opts: usize,
    pub(in crate::ppo) train: bool,
    pub(in crate::ppo) device: Device,
    rng: SmallRng,
    phantom: PhantomData<E>,
}

impl<E, P, V> Ppo<E, P, V>
where
    E: Env,
    E::Obs: Featurize,
    E::Act: DiscreteAct,
    P: SubModel<Input = Tensor, Output = Tensor>,
    V: SubModel<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + OutDim + Clone,
    V::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    /// Constructs the PPO agent.
    pub fn build(config: PpoConfig<P::Config, V::Config>) -> Result<Self> {
        let device: Device = config
            .device
            .expect("No device is given for PPO agent")
            .into();
        let actor = Actor::build(config.actor_config, device.clone())?;
        let critic = Critic::build(config.critic_config, device.clone())?;

        Ok(Ppo {
            actor,
            critic,
            opt_epochs: config.opt_epochs,
            mini_batch_size: config.mini_batch_size,
            clip_eps: config.clip_eps,
            entropy_coef: config.entropy_coef,
            n_opts: 0,
            train: true,
            device,
            rng: SmallRng::seed_from_u64(config.seed),
            phantom: PhantomData,
        })
    }

    fn opt_(&mut self, buffer: &mut RolloutBuffer) -> Record {
        let batch = buffer.flatten();
        let n = batch.len();
        if n == 0 {
            return Record::empty();
        }

        let device = &self.device;
        let states = Tensor::from_slice(&batch.states, (n, batch.state_dim), device).unwrap();
        let actions: Vec<u32> = batch.actions.iter().map(|&a| a as u32).collect();
        let actions = Tensor::from_slice(&actions, (n,), device).unwrap();
        let logp_old = Tensor::from_slice(&batch.logps, (n,), device).unwrap();
        let values_old = Tensor::from_slice(&batch.values, (n,), device).unwrap();
        let returns = Tensor::from_slice(&batch.returns, (n,), device).unwrap();
        let advantages = Tensor::from_slice(&batch.advantages, (n,), device).unwrap();

        let mut loss_actor = 0f32;
        let mut loss_critic = 0f32;
        let mut n_steps = 0;
        let mut ixs: Vec<usize> = (0..n).collect();

        for _ in 0..self.opt_epochs {
            ixs.shuffle(&mut self.rng);

            for mb in ixs.chunks(self.mini_batch_size) {
                let mb: Vec<u32> = mb.iter().map(|&i| i as u32).collect();
                let mb = Tensor::from_slice(&mb[..], (mb.len(),), device).unwrap();
                let states_mb = states.index_select(&mb, 0).unwrap();
                let actions_mb = actions.index_select(&mb, 0).unwrap();
                let logp_old_mb = logp_old.index_select(&mb, 0).unwrap();
                let values_old_mb = values_old.index_select(&mb, 0).unwrap();
                let returns_mb = returns.index_select(&mb, 0).unwrap();
                let advantages_mb = advantages.index_select(&mb, 0).unwrap();

                // Critic update, on a fresh forward pass and before the
                // actor update. Only the rollout-time values are the
                // clipping reference.
                let v_new = self.critic.forward(&states_mb);
                let loss_c =
                    clipped_value_loss(&v_new, &values_old_mb, &returns_mb, self.clip_eps).unwrap();
                self.critic.backward_step(&loss_c).unwrap();

                // Actor update.
                let logits = self.actor.forward(&states_mb);
                let logp_all = log_softmax(&logits, D::Minus1).unwrap();
                let logp_new = logp_all
                    .gather(&actions_mb.unsqueeze(D::Minus1).unwrap(), D::Minus1)
                    .unwrap()
                    .squeeze(D::Minus1)
                    .unwrap();
                let probs = softmax(&logits, D::Minus1).unwrap();
                let entropy = (probs * &logp_all)
                    .unwrap()
                    .sum(D::Minus1)
                    .unwrap()
                    .neg()
                    .unwrap()
                    .mean_all()
                    .unwrap();
                let surrogate =
                    clipped_surrogate_loss(&logp_new, &logp_old_mb, &advantages_mb, self.clip_eps)
                        .unwrap();
                let loss_a = (surrogate - (self.entropy_coef * &entropy).unwrap()).unwrap();
                self.actor.backward_step(&loss_a).unwrap();

                loss_critic += loss_c.to_scalar::<f32>().unwrap();
                loss_actor += loss_a.to_scalar::<f32>().unwrap();
                n_steps += 1;
            }
        }

        self.n_opts += 1;

        Record::from_slice(&[
            (
                "loss_actor",
                RecordValue::Scalar(loss_actor / n_steps as f32),
            ),
            (
                "loss_critic",
                RecordValue::Scalar(loss_critic / n_steps as f32),
            ),
        ])
    }
}

impl<E, P, V> Policy<E> for Ppo<E, P, V>
where
    E: Env,
    E::Obs: Featurize,
    E::Act: DiscreteAct,
    P: SubModel<Input = Tensor, Output = Tensor>,
    V: SubModel<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + OutDim + Clone,
    V::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    fn sample(&mut self, obs: &E::Obs) -> E::Act {
        let x = obs_tensor(obs, &self.device);
        let logits = self.actor.forward(&x).detach();
        let (ix, _) = sample_categorical(&logits, &mut self.rng).unwrap();
        E::Act::from_index(ix)
    }
}

impl<E, P, V> Agent<E> for Ppo<E, P, V>
where
    E: Env,
    E::Obs: Featurize,
    E::Act: DiscreteAct,
    P: SubModel<Input = Tensor, Output = Tensor>,
    V: SubModel<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + OutDim + Clone,
    V::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    type Snapshot = PpoPolicy<E, P>;

    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn sample_with_stats(&mut self, obs: &E::Obs) -> (E::Act, f32, f32) {
        let x = obs_tensor(obs, &self.device);
        let logits = self.actor.forward(&x).detach();
        let (ix, logp) = sample_categorical(&logits, &mut self.rng).unwrap();
        let value = self.value(obs);
        (E::Act::from_index(ix), logp, value)
    }

    fn value(&self, obs: &E::Obs) -> f32 {
        let x = obs_tensor(obs, &self.device);
        self.critic.forward(&x).detach().to_vec1::<f32>().unwrap()[0]
    }

    fn opt(&mut self, buffer: &mut RolloutBuffer) -> Record {
        self.opt_(buffer)
    }

    fn snapshot(&self) -> Self::Snapshot {
        PpoPolicy {
            actor: self.actor.clone(),
            device: self.device.clone(),
            rng: SmallRng::seed_from_u64(42),
            phantom: PhantomData,
        }
    }

    fn save_params(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        self.actor.save(&path.join("actor.safetensors"))?;
        self.critic.save(&path.join("critic.safetensors"))?;
        Ok(())
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        self.actor.load(&path.join("actor.safetensors"))?;
        self.critic.load(&path.join("critic.safetensors"))?;
        Ok(())
    }
}

/// Frozen policy produced by [`Agent::snapshot`] for evaluation.
///
/// Holds an independent copy of the actor parameters; subsequent training
/// steps of the originating agent do not affect it.
pub struct PpoPolicy<E, P>
where
    E: Env,
    P: SubModel<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    actor: Actor<P>,
    device: Device,
    rng: SmallRng,
    phantom: PhantomData<E>,
}

impl<E, P> Policy<E> for PpoPolicy<E, P>
where
    E: Env,
    E::Obs: Featurize,
    E::Act: DiscreteAct,
    P: SubModel<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    fn sample(&mut self, obs: &E::Obs) -> E::Act {
        let x = obs_tensor(obs, &self.device);
        let logits = self.actor.forward(&x).detach();
        let (ix, _) = sample_categorical(&logits, &mut self.rng).unwrap();
        E::Act::from_index(ix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        mlp::{Mlp, MlpConfig},
        ppo::{ActorConfig, CriticConfig},
        Device as ConfigDevice,
    };
    use relay_core::{
        dummy::{DummyEnv, DummyObs},
        gae, Trajectory,
    };

    fn agent() -> Ppo<DummyEnv, Mlp, Mlp> {
        let config = PpoConfig::default()
            .actor_config(ActorConfig::default().pi_config(MlpConfig::new(1, vec![8], 4)))
            .critic_config(CriticConfig::default().v_config(MlpConfig::new(1, vec![8], 1)))
            .opt_epochs(2)
            .mini_batch_size(4)
            .device(Some(ConfigDevice::Cpu));
        Ppo::build(config).unwrap()
    }

    fn buffer() -> RolloutBuffer {
        let mut buffer = RolloutBuffer::new(2);
        for ep in 0..2 {
            let mut traj = Trajectory::new();
            for t in 0..3 {
                traj.push(vec![(ep * 3 + t) as f32 / 6.0], t % 4, -1.2, 1.0, 0.1);
            }
            traj.set_bootstrap(0.0);
            let (returns, advantages) = gae(traj.rewards(), traj.values(), 0.99, 0.95);
            buffer.push(traj.into_episode(returns, advantages));
        }
        buffer
    }

    #[test]
    fn sample_with_stats_is_well_formed() {
        let mut agent = agent();
        let (act, logp, value) = agent.sample_with_stats(&DummyObs(0));
        assert!(act.0 < 4);
        assert!(logp <= 0.0);
        assert!(value.is_finite());
    }

    #[test]
    fn opt_consumes_the_buffer_and_reports_losses() {
        let mut agent = agent();
        let mut buffer = buffer();
        let record = agent.opt(&mut buffer);
        assert!(record.get_scalar("loss_actor").unwrap().is_finite());
        assert!(record.get_scalar("loss_critic").unwrap().is_finite());
    }

    #[test]
    fn snapshot_policy_samples_actions() {
        let agent = agent();
        let mut policy = agent.snapshot();
        let act = policy.sample(&DummyObs(1));
        assert!(act.0 < 4);
    }
}
