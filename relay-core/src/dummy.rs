//! This module is used for tests.
use crate::{
    record::Record, Act, Agent, DiscreteAct, Env, Featurize, GoalEnv, GoalId, Obs, Policy,
    RolloutBuffer, Step,
};
use anyhow::Result;
use std::path::Path;

/// Dummy observation carrying the step counter of the episode.
#[derive(Clone, Debug)]
pub struct DummyObs(pub usize);

impl Obs for DummyObs {}

impl Featurize for DummyObs {
    fn featurize(&self) -> Vec<f32> {
        vec![self.0 as f32]
    }
}

/// Dummy action.
#[derive(Clone, Debug)]
pub struct DummyAct(pub usize);

impl Act for DummyAct {}

impl DiscreteAct for DummyAct {
    fn index(&self) -> usize {
        self.0
    }

    fn from_index(ix: usize) -> Self {
        Self(ix)
    }
}

/// Configuration of [`DummyEnv`].
#[derive(Clone, Debug)]
pub struct DummyEnvConfig {
    /// Steps until the episode terminates.
    pub episode_len: usize,

    /// Reward emitted at every step.
    pub reward: f32,

    /// Initial goal.
    pub goal: GoalId,
}

impl Default for DummyEnvConfig {
    fn default() -> Self {
        Self {
            episode_len: 3,
            reward: 1.0,
            goal: 0,
        }
    }
}

/// Scripted environment: emits a constant reward and terminates after a
/// fixed number of steps.
pub struct DummyEnv {
    config: DummyEnvConfig,
    goal: GoalId,
    t: usize,
}

impl Env for DummyEnv {
    type Config = DummyEnvConfig;
    type Obs = DummyObs;
    type Act = DummyAct;
    type Info = ();

    fn build(config: &Self::Config, _seed: i64) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            goal: config.goal,
            t: 0,
        })
    }

    fn reset(&mut self) -> Result<Self::Obs> {
        self.t = 0;
        Ok(DummyObs(0))
    }

    fn reset_with_index(&mut self, _ix: usize) -> Result<Self::Obs> {
        self.reset()
    }

    fn step(&mut self, act: &Self::Act) -> (Step<Self>, Record) {
        self.t += 1;
        let step = Step::new(
            DummyObs(self.t),
            act.clone(),
            self.config.reward,
            self.t >= self.config.episode_len,
            false,
            (),
        );
        (step, Record::empty())
    }
}

impl GoalEnv for DummyEnv {
    fn goal(&self) -> GoalId {
        self.goal
    }

    fn set_goal(&mut self, goal: GoalId) {
        self.goal = goal;
    }
}

/// Frozen dummy policy, always taking action 0.
pub struct DummyPolicy;

impl Policy<DummyEnv> for DummyPolicy {
    fn sample(&mut self, _obs: &DummyObs) -> DummyAct {
        DummyAct(0)
    }
}

/// Dummy agent with constant outputs and a no-op optimization step.
pub struct DummyAgent {
    train: bool,
}

impl DummyAgent {
    /// Constructs the agent.
    pub fn new() -> Self {
        Self { train: true }
    }
}

impl Default for DummyAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl Policy<DummyEnv> for DummyAgent {
    fn sample(&mut self, _obs: &DummyObs) -> DummyAct {
        DummyAct(0)
    }
}

impl Agent<DummyEnv> for DummyAgent {
    type Snapshot = DummyPolicy;

    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn sample_with_stats(&mut self, _obs: &DummyObs) -> (DummyAct, f32, f32) {
        (DummyAct(0), 0.0, 0.0)
    }

    fn value(&self, _obs: &DummyObs) -> f32 {
        0.0
    }

    fn opt(&mut self, _buffer: &mut RolloutBuffer) -> Record {
        Record::empty()
    }

    fn snapshot(&self) -> Self::Snapshot {
        DummyPolicy
    }

    fn save_params(&self, _path: &Path) -> Result<()> {
        Ok(())
    }

    fn load_params(&mut self, _path: &Path) -> Result<()> {
        Ok(())
    }
}
