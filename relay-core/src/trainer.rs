//! Train an [`Agent`] on a goal-based environment.
mod config;

use crate::{
    gae,
    record::{Record, RecordValue::Scalar, Recorder},
    Agent, DiscreteAct, Evaluator, Featurize, GoalEnv, RolloutBuffer, Trajectory,
};
use anyhow::Result;
pub use config::TrainerConfig;
use log::info;

/// Per-episode result sequences of one trial.
#[derive(Clone, Debug, Default)]
pub struct TrialResult {
    /// Undiscounted return of every training episode.
    pub train_returns: Vec<f32>,

    /// Mean discounted test return of every evaluation pass.
    pub test_returns: Vec<f32>,

    /// Mean test episode length of every evaluation pass.
    pub test_lengths: Vec<f32>,
}

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Manages the episode-driven on-policy training loop.
///
/// # Training loop
///
/// A trial alternates between collecting and optimizing until the episode
/// budget is exhausted:
///
/// ```mermaid
/// graph LR
///     A[Collecting]-->|buffer full|B[Optimizing]
///     B -->|episodes left|A
///     B -->|budget exhausted|D[Done]
///     A -->|every test_interval episodes|C[Evaluating]
///     C --> A
/// ```
///
/// * **Collecting** runs episodes against the environment. Every step stores
///   a transition (features, action, log-probability, reward, value) in a
///   [`Trajectory`]; when the episode ends, its GAE targets are computed and
///   the episode is pushed into a [`RolloutBuffer`]. An episode ends on
///   termination (bootstrap value zero), on truncation, or at the `t_max`
///   horizon (both bootstrapped from the critic).
/// * **Optimizing** hands the full buffer to [`Agent::opt`] once
///   `buffer_episodes` episodes are collected. The buffer belongs to a single
///   iteration and is dropped afterwards.
/// * **Evaluating** runs whenever the cumulative episode counter crosses
///   `test_interval`: a frozen snapshot of the policy is evaluated on a fresh
///   environment pinned to the current goal.
///
/// If a switch goal is configured, the environment's goal is moved exactly
/// once, when the episode counter equals
/// [`TrainerConfig::goal_switch_episode`]. All subsequent rollouts and
/// evaluations of the trial observe the new goal.
pub struct Trainer<E: GoalEnv> {
    /// Configuration of the environment for training.
    env_config: E::Config,

    /// Configuration of the training loop.
    config: TrainerConfig,
}

impl<E> Trainer<E>
where
    E: GoalEnv,
    E::Obs: Featurize,
    E::Act: DiscreteAct,
{
    /// Constructs a trainer.
    pub fn build(config: TrainerConfig, env_config: E::Config) -> Self {
        Self { env_config, config }
    }

    /// Runs one episode and returns its trajectory.
    ///
    /// The bootstrap entry of the value history is always set when this
    /// method returns: zero on termination, the critic's estimate of the
    /// final observation on truncation. Reaching the horizon without either
    /// signal is treated as truncation, so horizon-capped episodes do not
    /// under-count their tail advantage.
    fn rollout_episode<A: Agent<E>>(&self, env: &mut E, agent: &mut A) -> Result<Trajectory> {
        let mut traj = Trajectory::new();
        let mut obs = env.reset()?;

        for _t in 0..self.config.t_max {
            let feature = obs.featurize();
            let (act, logp, value) = agent.sample_with_stats(&obs);
            let (step, _) = env.step(&act);
            traj.push(feature, act.index(), logp, step.reward, value);
            obs = step.obs;

            if step.is_terminated {
                traj.set_bootstrap(0.0);
                break;
            }
            if step.is_truncated {
                traj.set_bootstrap(agent.value(&obs));
                break;
            }
        }

        if traj.values().len() == traj.len() {
            traj.set_bootstrap(agent.value(&obs));
        }

        Ok(traj)
    }

    /// Train the agent for one trial.
    ///
    /// `seed` seeds the training environment; evaluation environments are
    /// seeded by the evaluator itself.
    pub fn train<A, D>(
        &mut self,
        agent: &mut A,
        evaluator: &mut D,
        recorder: &mut dyn Recorder,
        seed: i64,
    ) -> Result<TrialResult>
    where
        A: Agent<E>,
        D: Evaluator<E>,
    {
        let mut env = E::build(&self.env_config, seed)?;
        let mut result = TrialResult::default();
        let mut n_ep = 0;

        if self.config.switch_goal.is_some() {
            info!("Current goal {}", env.goal());
        }

        agent.train();

        for _it in 0..self.config.train_iterations() {
            let mut buffer = RolloutBuffer::new(self.config.buffer_episodes);

            for _ep in 0..self.config.buffer_episodes {
                let traj = self.rollout_episode(&mut env, agent)?;
                n_ep += 1;

                let episode_return = traj.total_reward();
                result.train_returns.push(episode_return);

                let (returns, advantages) = gae(
                    traj.rewards(),
                    traj.values(),
                    self.config.gamma,
                    self.config.gae_lambda,
                );
                buffer.push(traj.into_episode(returns, advantages));

                recorder.store(Record::from_slice(&[
                    ("episode", Scalar(n_ep as f32)),
                    ("episode_return", Scalar(episode_return)),
                ]));

                if n_ep % self.config.test_interval == 0 {
                    let mut policy = agent.snapshot();
                    let eval = evaluator.evaluate(&mut policy, env.goal())?;
                    result.test_returns.push(eval.return_mean);
                    result.test_lengths.push(eval.length_mean);
                    info!(
                        "Test return at episode {}: {:.3} | average test episode length: {:.1}",
                        n_ep, eval.return_mean, eval.length_mean
                    );
                    recorder.store(Record::from_slice(&[
                        ("test_return", Scalar(eval.return_mean)),
                        ("test_length", Scalar(eval.length_mean)),
                    ]));
                    recorder.flush(n_ep as i64);
                }

                if let Some(goal) = self.config.switch_goal {
                    if n_ep == self.config.goal_switch_episode() {
                        env.set_goal(goal);
                        let best = result
                            .test_returns
                            .iter()
                            .fold(f32::NEG_INFINITY, |a, &b| a.max(b));
                        info!("New goal {}. Best test return so far: {:.3}", goal, best);
                        recorder.store(Record::from_slice(&[
                            ("episode", Scalar(n_ep as f32)),
                            ("goal", Scalar(goal as f32)),
                        ]));
                    }
                }
            }

            let record = agent.opt(&mut buffer);
            recorder.store(record);
        }

        env.close();

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dummy::{DummyAgent, DummyEnv, DummyEnvConfig},
        record::BufferedRecorder,
        OnPolicyEvaluator,
    };

    fn trainer(switch_goal: Option<usize>) -> Trainer<DummyEnv> {
        let config = TrainerConfig::default()
            .total_train_episodes(8)
            .buffer_episodes(2)
            .t_max(10)
            .test_interval(4)
            .switch_goal(switch_goal);
        Trainer::build(config, DummyEnvConfig::default())
    }

    fn run(switch_goal: Option<usize>) -> (TrialResult, BufferedRecorder) {
        let mut trainer = trainer(switch_goal);
        let mut agent = DummyAgent::new();
        let mut evaluator =
            OnPolicyEvaluator::<DummyEnv>::new(&DummyEnvConfig::default(), 42, 2, 10, 0.99);
        let mut recorder = BufferedRecorder::new();
        let result = trainer
            .train(&mut agent, &mut evaluator, &mut recorder, 0)
            .unwrap();
        (result, recorder)
    }

    fn switch_records(recorder: &BufferedRecorder) -> Vec<f32> {
        recorder
            .iter()
            .filter(|r| r.get("goal").is_some())
            .map(|r| r.get_scalar("episode").unwrap())
            .collect()
    }

    #[test]
    fn goal_switch_fires_once_at_midpoint() {
        let (result, recorder) = run(Some(7));
        assert_eq!(result.train_returns.len(), 8);
        assert_eq!(result.test_returns.len(), 2);
        assert_eq!(result.test_lengths.len(), 2);

        // total_train_episodes / 2 == 4, exactly one firing.
        assert_eq!(switch_records(&recorder), vec![4.0]);
    }

    #[test]
    fn goal_switch_never_fires_when_unconfigured() {
        let (_, recorder) = run(None);
        assert!(switch_records(&recorder).is_empty());
    }
}
