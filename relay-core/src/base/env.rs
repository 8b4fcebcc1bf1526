//! Environment.
use super::{Act, Info, Obs, Step};
use crate::record::Record;
use anyhow::Result;

/// Identifier of a reward-location configuration in a goal-based environment.
pub type GoalId = usize;

/// Represents an environment, typically an MDP.
pub trait Env {
    /// Configurations.
    type Config: Clone;

    /// Observation of the environment.
    type Obs: Obs;

    /// Action of the environment.
    type Act: Act;

    /// Information in the [`Step`] object.
    type Info: Info;

    /// Builds an environment with a given random seed.
    fn build(config: &Self::Config, seed: i64) -> Result<Self>
    where
        Self: Sized;

    /// Resets the environment and returns an initial observation.
    fn reset(&mut self) -> Result<Self::Obs>;

    /// Resets the environment with a given index.
    ///
    /// The index is used in an arbitrary way. For example, it can be used as a
    /// random seed, which is useful for deterministic evaluation episodes.
    /// This method is called by [`OnPolicyEvaluator`].
    ///
    /// [`OnPolicyEvaluator`]: crate::OnPolicyEvaluator
    fn reset_with_index(&mut self, ix: usize) -> Result<Self::Obs>;

    /// Performs an environment step.
    fn step(&mut self, act: &Self::Act) -> (Step<Self>, Record)
    where
        Self: Sized;

    /// Releases resources held by the environment.
    fn close(&mut self) {}

    /// Renders the current state, if the environment supports it.
    ///
    /// `episode` is the index of the running episode, which implementations
    /// may use for labelling.
    fn render(&self, _episode: usize) {}
}

/// An environment whose reward location is selected by a [`GoalId`].
///
/// The goal is part of the environment state and is observed by all
/// subsequent episodes. During training, only the trainer mutates it, and at
/// most once per trial (see [`TrainerConfig::switch_goal`]).
///
/// [`TrainerConfig::switch_goal`]: crate::TrainerConfig
pub trait GoalEnv: Env {
    /// Returns the current goal.
    fn goal(&self) -> GoalId;

    /// Moves the reward location to the given goal.
    fn set_goal(&mut self, goal: GoalId);
}
