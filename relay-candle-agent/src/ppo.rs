//! Proximal policy optimization with a clipped surrogate objective.
mod actor;
mod base;
mod config;
mod critic;
pub use actor::{clipped_surrogate_loss, Actor, ActorConfig};
pub use base::{Ppo, PpoPolicy};
pub use config::PpoConfig;
pub use critic::{clipped_value_loss, Critic, CriticConfig};
