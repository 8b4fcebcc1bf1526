//! Agent.
use super::{Env, Policy};
use crate::{record::Record, rollout::RolloutBuffer};
use anyhow::Result;
use std::path::Path;

/// Represents a trainable on-policy agent on an environment.
///
/// In addition to plain action sampling through [`Policy`], an on-policy
/// agent exposes the per-step statistics the trainer stores in a
/// [`Trajectory`] (log-probability and value estimate), a bootstrap value for
/// truncated episodes, and an optimization step over a full
/// [`RolloutBuffer`].
///
/// [`Trajectory`]: crate::Trajectory
pub trait Agent<E: Env>: Policy<E> {
    /// A frozen copy of the current policy, decoupled from the parameters
    /// being trained. Used for evaluation.
    type Snapshot: Policy<E>;

    /// Set the agent to training mode.
    fn train(&mut self);

    /// Set the agent to evaluation mode.
    fn eval(&mut self);

    /// Return if it is in training mode.
    fn is_train(&self) -> bool;

    /// Samples an action and returns it with its log-probability and the
    /// critic's value estimate of `obs`.
    ///
    /// The returned values are constants with respect to the parameters
    /// (no gradient tracking); they serve as the "old" reference values of
    /// the clipped objectives during optimization.
    fn sample_with_stats(&mut self, obs: &E::Obs) -> (E::Act, f32, f32);

    /// The critic's value estimate of `obs`, used to bootstrap the tail of a
    /// truncated episode.
    fn value(&self, obs: &E::Obs) -> f32;

    /// Performs an optimization phase over the episodes collected in
    /// `buffer`.
    fn opt(&mut self, buffer: &mut RolloutBuffer) -> Record;

    /// Copies the current policy parameters into a frozen policy.
    fn snapshot(&self) -> Self::Snapshot;

    /// Save the parameters of the agent in the given directory.
    fn save_params(&self, path: &Path) -> Result<()>;

    /// Load the parameters of the agent from the given directory.
    fn load_params(&mut self, path: &Path) -> Result<()>;
}
