#![warn(missing_docs)]
//! Core abstractions for goal-transfer reinforcement learning experiments.
//!
//! This crate provides the backend-agnostic pieces of the relay stack:
//!
//! * Interaction traits: [`Env`], [`GoalEnv`], [`Policy`], [`Agent`] and the
//!   observation/action marker traits.
//! * On-policy data handling: [`Trajectory`], [`RolloutBuffer`],
//!   [`RolloutBatch`] and generalized advantage estimation ([`gae`]).
//! * The episode-driven [`Trainer`] with its one-shot goal switch, the
//!   [`OnPolicyEvaluator`] and the multi-trial [`Runner`].
//! * Benchmark statistics over persisted multi-trial results ([`stats`]).
//! * A lightweight [`record`] module for metrics.
//!
//! Concrete environments and agents live in the sibling crates
//! `relay-fourrooms-env` and `relay-candle-agent`.
pub mod dummy;
pub mod error;
pub mod record;
pub mod stats;

mod base;
pub use base::{
    Act, Agent, DiscreteAct, Env, Featurize, GoalEnv, GoalId, Info, Obs, Policy, Step,
};

mod gae;
pub use gae::gae;

mod rollout;
pub use rollout::{Episode, RolloutBatch, RolloutBuffer, Trajectory};

mod evaluator;
pub use evaluator::{Evaluation, Evaluator, OnPolicyEvaluator};

mod trainer;
pub use trainer::{Trainer, TrainerConfig, TrialResult};

mod runner;
pub use runner::{ExperimentRecords, Runner, RunnerConfig};
