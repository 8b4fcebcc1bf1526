//! On-policy rollout storage and batch flattening.
//!
//! A [`Trajectory`] accumulates the transitions of one running episode. Once
//! the episode has ended and its GAE targets are known it becomes an
//! [`Episode`] and is pushed into the [`RolloutBuffer`], which holds a fixed
//! number of episodes between optimization phases. [`RolloutBuffer::flatten`]
//! concatenates the buffered episodes into one [`RolloutBatch`] for minibatch
//! sampling.

/// Transition histories of one running episode.
///
/// Invariant: after [`Trajectory::set_bootstrap`] has been called, the value
/// history is exactly one entry longer than the reward history.
#[derive(Default)]
pub struct Trajectory {
    states: Vec<Vec<f32>>,
    actions: Vec<usize>,
    logps: Vec<f32>,
    rewards: Vec<f32>,
    values: Vec<f32>,
}

impl Trajectory {
    /// Creates an empty trajectory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one transition.
    pub fn push(&mut self, state: Vec<f32>, action: usize, logp: f32, reward: f32, value: f32) {
        self.states.push(state);
        self.actions.push(action);
        self.logps.push(logp);
        self.rewards.push(reward);
        self.values.push(value);
    }

    /// Appends the bootstrap value of the state the episode ended in.
    ///
    /// Zero if the episode reached a terminal state, otherwise the critic's
    /// estimate of the truncation state.
    pub fn set_bootstrap(&mut self, value: f32) {
        self.values.push(value);
    }

    /// Number of transitions recorded so far.
    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    /// True if no transition has been recorded.
    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    /// The reward history.
    pub fn rewards(&self) -> &[f32] {
        &self.rewards
    }

    /// The value history, including the bootstrap entry once set.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Sum of the recorded rewards.
    pub fn total_reward(&self) -> f32 {
        self.rewards.iter().sum()
    }

    /// Finishes the trajectory with its GAE targets.
    ///
    /// # Panics
    ///
    /// Panics if the bootstrap value has not been set or the target lengths
    /// do not match the number of transitions.
    pub fn into_episode(self, returns: Vec<f32>, advantages: Vec<f32>) -> Episode {
        let n = self.rewards.len();
        assert_eq!(self.values.len(), n + 1, "bootstrap value not set");
        assert_eq!(returns.len(), n);
        assert_eq!(advantages.len(), n);

        Episode {
            states: self.states,
            actions: self.actions,
            logps: self.logps,
            values: self.values,
            returns,
            advantages,
        }
    }
}

/// A finished episode with its per-step optimization targets.
pub struct Episode {
    states: Vec<Vec<f32>>,
    actions: Vec<usize>,
    logps: Vec<f32>,
    /// Length T + 1; the bootstrap entry is dropped when flattening.
    values: Vec<f32>,
    returns: Vec<f32>,
    advantages: Vec<f32>,
}

impl Episode {
    /// Number of transitions in the episode.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// True if the episode holds no transition.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// An ordered collection of episodes accumulated between optimization phases.
///
/// The buffer is owned by a single training iteration: it fills up to
/// `capacity` episodes, is flattened once, and is dropped afterwards.
pub struct RolloutBuffer {
    episodes: Vec<Episode>,
    capacity: usize,
}

impl RolloutBuffer {
    /// Creates a buffer that is full after `capacity` episodes.
    pub fn new(capacity: usize) -> Self {
        Self {
            episodes: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Pushes a finished episode.
    pub fn push(&mut self, episode: Episode) {
        self.episodes.push(episode);
    }

    /// Number of buffered episodes.
    pub fn len(&self) -> usize {
        self.episodes.len()
    }

    /// True if no episode is buffered.
    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }

    /// True once `capacity` episodes are buffered.
    pub fn is_full(&self) -> bool {
        self.episodes.len() >= self.capacity
    }

    /// Concatenates all buffered episodes into flat per-field batches.
    ///
    /// Fields are concatenated in episode order, then time order. The
    /// per-episode value histories are truncated to the episode length (the
    /// bootstrap entry is not a transition).
    pub fn flatten(&self) -> RolloutBatch {
        let total: usize = self.episodes.iter().map(|e| e.len()).sum();
        let state_dim = self
            .episodes
            .iter()
            .flat_map(|e| e.states.first())
            .map(|s| s.len())
            .next()
            .unwrap_or(0);

        let mut batch = RolloutBatch {
            states: Vec::with_capacity(total * state_dim),
            state_dim,
            actions: Vec::with_capacity(total),
            logps: Vec::with_capacity(total),
            values: Vec::with_capacity(total),
            returns: Vec::with_capacity(total),
            advantages: Vec::with_capacity(total),
        };

        for ep in self.episodes.iter() {
            let n = ep.len();
            for s in ep.states.iter() {
                debug_assert_eq!(s.len(), state_dim);
                batch.states.extend_from_slice(s);
            }
            batch.actions.extend_from_slice(&ep.actions);
            batch.logps.extend_from_slice(&ep.logps);
            batch.values.extend_from_slice(&ep.values[..n]);
            batch.returns.extend_from_slice(&ep.returns);
            batch.advantages.extend_from_slice(&ep.advantages);
        }

        batch
    }
}

/// Flattened transition batch over all episodes of a rollout buffer.
///
/// The first dimension of every field equals the total transition count of
/// the buffer. No shuffling happens here; that is the minibatch sampler's
/// responsibility.
pub struct RolloutBatch {
    /// Row-major `[len, state_dim]` feature matrix.
    pub states: Vec<f32>,

    /// Number of features per state row.
    pub state_dim: usize,

    /// Action indices.
    pub actions: Vec<usize>,

    /// Rollout-time log-probabilities of the actions.
    pub logps: Vec<f32>,

    /// Rollout-time value estimates.
    pub values: Vec<f32>,

    /// GAE return targets.
    pub returns: Vec<f32>,

    /// GAE advantages.
    pub advantages: Vec<f32>,
}

impl RolloutBatch {
    /// Total number of transitions in the batch.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// True if the batch holds no transition.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gae;

    fn episode(len: usize, offset: f32) -> Episode {
        let mut traj = Trajectory::new();
        for t in 0..len {
            traj.push(
                vec![offset + t as f32, 0.0],
                t % 4,
                -0.5,
                offset + t as f32,
                0.1,
            );
        }
        traj.set_bootstrap(0.0);
        let (returns, advantages) = gae(traj.rewards(), traj.values(), 0.99, 0.95);
        traj.into_episode(returns, advantages)
    }

    #[test]
    fn flatten_concatenates_all_episodes() {
        let mut buffer = RolloutBuffer::new(3);
        for (len, offset) in [(5, 0.0), (7, 100.0), (3, 200.0)] {
            buffer.push(episode(len, offset));
        }
        assert!(buffer.is_full());

        let batch = buffer.flatten();
        assert_eq!(batch.len(), 15);
        assert_eq!(batch.state_dim, 2);
        assert_eq!(batch.states.len(), 15 * 2);
        assert_eq!(batch.values.len(), 15);
        assert_eq!(batch.returns.len(), 15);

        // Episode-then-time order: the first feature of each row recovers
        // the (offset, t) pair it was built from.
        assert_eq!(batch.states[0], 0.0);
        assert_eq!(batch.states[4 * 2], 4.0);
        assert_eq!(batch.states[5 * 2], 100.0);
        assert_eq!(batch.states[12 * 2], 200.0);
        assert_eq!(batch.states[14 * 2], 202.0);
    }

    #[test]
    fn bootstrap_values_are_dropped() {
        let mut buffer = RolloutBuffer::new(1);
        let mut traj = Trajectory::new();
        traj.push(vec![1.0], 0, 0.0, 1.0, 0.3);
        traj.push(vec![2.0], 1, 0.0, 0.0, 0.4);
        traj.set_bootstrap(9.9);
        let (returns, advantages) = gae(traj.rewards(), traj.values(), 0.99, 0.95);
        buffer.push(traj.into_episode(returns, advantages));

        let batch = buffer.flatten();
        assert_eq!(batch.values, vec![0.3, 0.4]);
    }

    #[test]
    #[should_panic]
    fn unfinished_trajectory_cannot_become_episode() {
        let mut traj = Trajectory::new();
        traj.push(vec![0.0], 0, 0.0, 0.0, 0.0);
        // No bootstrap entry.
        let _ = traj.into_episode(vec![0.0], vec![0.0]);
    }
}
