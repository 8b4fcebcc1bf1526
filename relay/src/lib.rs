//! Goal-transfer reinforcement learning experiments in Rust.
//!
//! Relay consists of the following crates:
//!
//! * [relay-core](../relay_core/index.html) provides the backend-agnostic
//!   traits and experiment machinery: environments, agents, the rollout
//!   buffer with generalized advantage estimation, the episode-driven
//!   trainer with its one-shot goal switch, the evaluator, the multi-trial
//!   runner and the benchmark statistics.
//! * [relay-fourrooms-env](../relay_fourrooms_env/index.html) implements the
//!   FourRooms grid world, a four-room navigation task whose goal cell can
//!   be moved mid-trial.
//! * [relay-candle-agent](../relay_candle_agent/index.html) implements the
//!   PPO agent on [candle](https://crates.io/crates/candle-core).
//! * [relay](./index.html) wires the pieces into runnable experiments.
pub mod fourrooms;
