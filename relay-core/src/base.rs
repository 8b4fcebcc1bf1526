//! Core functionalities.
mod agent;
mod env;
mod policy;
mod step;
pub use agent::Agent;
pub use env::{Env, GoalEnv, GoalId};
pub use policy::Policy;
use std::fmt::Debug;
pub use step::{Info, Step};

/// An observation of an environment.
pub trait Obs: Clone + Debug {}

/// An action on an environment.
pub trait Act: Clone + Debug {}

/// Maps a raw observation into a flat feature vector.
///
/// This is the seam between an environment and the function approximators of
/// an agent: the agent never sees the raw observation type, only the feature
/// vector produced here.
pub trait Featurize: Obs {
    /// Returns the feature vector of the observation.
    ///
    /// The length must be the same for every observation of the environment.
    fn featurize(&self) -> Vec<f32>;
}

/// An action drawn from a finite, indexed action set.
///
/// Categorical policies emit action indices; this trait converts between the
/// index and the environment's action type.
pub trait DiscreteAct: Act {
    /// Returns the index of the action.
    fn index(&self) -> usize;

    /// Constructs the action with the given index.
    fn from_index(ix: usize) -> Self;
}
