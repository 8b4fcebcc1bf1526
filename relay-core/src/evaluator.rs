//! Evaluate a frozen policy.
use crate::{Env, GoalEnv, GoalId, Policy};
use anyhow::Result;
use std::marker::PhantomData;

/// Summary of one evaluation pass.
#[derive(Clone, Copy, Debug)]
pub struct Evaluation {
    /// Mean discounted return over the test episodes.
    pub return_mean: f32,

    /// Mean realized episode length over the test episodes.
    pub length_mean: f32,
}

/// Evaluates a policy on an environment pinned to a goal.
pub trait Evaluator<E: Env> {
    /// Runs test episodes with `policy` and returns the averaged results.
    ///
    /// The policy is expected to be a frozen snapshot; the evaluator never
    /// touches training state.
    fn evaluate<P: Policy<E>>(&mut self, policy: &mut P, goal: GoalId) -> Result<Evaluation>;
}

/// Default [`Evaluator`] for goal-based environments.
///
/// Each call builds a fresh test environment from the stored configuration,
/// pins it to the requested goal and runs a fixed number of episodes with
/// deterministic per-episode seeding through [`Env::reset_with_index`]. The
/// discounted return of an episode is accumulated in reverse,
/// `g = r[t] + gamma * g`.
pub struct OnPolicyEvaluator<E: GoalEnv> {
    env_config: E::Config,
    seed: i64,
    n_episodes: usize,
    t_max: usize,
    gamma: f32,
    phantom: PhantomData<E>,
}

impl<E: GoalEnv> OnPolicyEvaluator<E> {
    /// Constructs a new [`OnPolicyEvaluator`].
    ///
    /// * `env_config` - Configuration of the test environment.
    /// * `seed` - Seed of the test environments built by this evaluator.
    /// * `n_episodes` - Number of episodes per evaluation pass.
    /// * `t_max` - Step horizon of a test episode.
    /// * `gamma` - Discount factor of the reported return.
    pub fn new(env_config: &E::Config, seed: i64, n_episodes: usize, t_max: usize, gamma: f32) -> Self {
        Self {
            env_config: env_config.clone(),
            seed,
            n_episodes,
            t_max,
            gamma,
            phantom: PhantomData,
        }
    }

    fn discounted_return(&self, rewards: &[f32]) -> f32 {
        let mut g = 0f32;
        for r in rewards.iter().rev() {
            g = r + self.gamma * g;
        }
        g
    }
}

impl<E: GoalEnv> Evaluator<E> for OnPolicyEvaluator<E> {
    fn evaluate<P: Policy<E>>(&mut self, policy: &mut P, goal: GoalId) -> Result<Evaluation> {
        let mut env = E::build(&self.env_config, self.seed)?;
        env.set_goal(goal);

        let mut return_sum = 0f32;
        let mut length_sum = 0f32;

        for ix in 0..self.n_episodes {
            let mut obs = env.reset_with_index(ix)?;
            let mut rewards = Vec::new();

            for _t in 0..self.t_max {
                let act = policy.sample(&obs);
                let (step, _) = env.step(&act);
                env.render(ix);
                rewards.push(step.reward);
                let done = step.is_done();
                obs = step.obs;
                if done {
                    break;
                }
            }

            return_sum += self.discounted_return(&rewards);
            length_sum += rewards.len() as f32;
        }

        env.close();

        Ok(Evaluation {
            return_mean: return_sum / self.n_episodes as f32,
            length_mean: length_sum / self.n_episodes as f32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dummy::{DummyAgent, DummyEnv, DummyEnvConfig};
    use crate::Agent;

    #[test]
    fn discounted_return_is_reverse_accumulated() {
        // Three unit rewards with gamma 0.5: 1 + 0.5 + 0.25.
        let config = DummyEnvConfig {
            episode_len: 3,
            reward: 1.0,
            goal: 0,
        };
        let mut evaluator = OnPolicyEvaluator::<DummyEnv>::new(&config, 0, 4, 100, 0.5);
        let mut policy = DummyAgent::new().snapshot();

        let eval = evaluator.evaluate(&mut policy, 0).unwrap();
        assert!((eval.return_mean - 1.75).abs() < 1e-6);
        assert!((eval.length_mean - 3.0).abs() < 1e-6);
    }

    #[test]
    fn horizon_caps_episode_length() {
        let config = DummyEnvConfig {
            episode_len: 50,
            reward: 0.0,
            goal: 0,
        };
        let mut evaluator = OnPolicyEvaluator::<DummyEnv>::new(&config, 0, 2, 10, 0.99);
        let mut policy = DummyAgent::new().snapshot();

        let eval = evaluator.evaluate(&mut policy, 0).unwrap();
        assert!((eval.length_mean - 10.0).abs() < 1e-6);
    }
}
