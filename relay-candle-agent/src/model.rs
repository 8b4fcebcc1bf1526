//! Interface of neural networks used in RL agents.
use candle_nn::VarBuilder;

/// Neural network model not owning its [`VarMap`] internally.
///
/// The owning module (e.g. [`Actor`](crate::ppo::Actor)) creates the
/// [`VarMap`], builds the submodel from a [`VarBuilder`] on top of it, and
/// drives optimization; the submodel only defines the forward computation.
///
/// [`VarMap`]: candle_nn::VarMap
pub trait SubModel {
    /// Configuration from which [`SubModel`] is constructed.
    type Config;

    /// Input of the [`SubModel`].
    type Input;

    /// Output of the [`SubModel`].
    type Output;

    /// Builds [`SubModel`] with [`VarBuilder`] and [`SubModel::Config`].
    fn build(vb: VarBuilder, config: Self::Config) -> Self;

    /// A generalized forward function.
    fn forward(&self, input: &Self::Input) -> Self::Output;
}
