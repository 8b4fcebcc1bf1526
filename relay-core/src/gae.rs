//! Generalized advantage estimation.

/// Computes per-step return and advantage targets with GAE(λ).
///
/// `rewards` holds the `T` rewards of one episode and `values` the `T + 1`
/// value estimates, whose last entry is the bootstrap value of the state the
/// episode ended in (zero for a terminal state). The advantage is the
/// reverse-accumulated, exponentially smoothed sum of TD residuals
///
/// ```text
/// delta[t] = r[t] + gamma * v[t + 1] - v[t]
/// adv[t]   = delta[t] + gamma * lambda * adv[t + 1]
/// ```
///
/// and `return[t] = adv[t] + v[t]`. Returns `(returns, advantages)`.
///
/// # Panics
///
/// Panics if `values.len() != rewards.len() + 1`. A mismatch means the
/// caller dropped or duplicated a bootstrap entry and the targets would be
/// silently wrong, so this is treated as a precondition violation.
pub fn gae(rewards: &[f32], values: &[f32], gamma: f32, lambda: f32) -> (Vec<f32>, Vec<f32>) {
    assert_eq!(
        values.len(),
        rewards.len() + 1,
        "value history must contain one bootstrap entry more than rewards"
    );

    let n = rewards.len();
    let mut returns = vec![0f32; n];
    let mut advantages = vec![0f32; n];
    let mut adv = 0f32;

    for t in (0..n).rev() {
        let delta = rewards[t] + gamma * values[t + 1] - values[t];
        adv = delta + gamma * lambda * adv;
        advantages[t] = adv;
        returns[t] = adv + values[t];
    }

    (returns, advantages)
}

#[cfg(test)]
mod tests {
    use super::gae;

    #[test]
    fn zero_inputs_give_zero_targets() {
        let rewards = [0f32; 5];
        let values = [0f32; 6];
        let (returns, advantages) = gae(&rewards, &values, 0.99, 0.99);
        assert_eq!(returns, vec![0f32; 5]);
        assert_eq!(advantages, vec![0f32; 5]);
    }

    #[test]
    fn single_step_episode() {
        // One step with bootstrap value zero: the return is the reward and
        // the advantage is the reward minus the value estimate, for any
        // gamma/lambda.
        let (returns, advantages) = gae(&[2.5], &[0.7, 0.0], 0.9, 0.95);
        assert!((returns[0] - 2.5).abs() < 1e-6);
        assert!((advantages[0] - (2.5 - 0.7)).abs() < 1e-6);
    }

    #[test]
    fn reverse_accumulation_matches_hand_rolled() {
        let rewards = [1.0, 0.0, 1.0];
        let values = [0.5, 0.2, 0.1, 0.3];
        let (gamma, lambda) = (0.5f32, 0.8f32);

        let d2 = 1.0 + gamma * 0.3 - 0.1;
        let d1 = 0.0 + gamma * 0.1 - 0.2;
        let d0 = 1.0 + gamma * 0.2 - 0.5;
        let a2 = d2;
        let a1 = d1 + gamma * lambda * a2;
        let a0 = d0 + gamma * lambda * a1;

        let (returns, advantages) = gae(&rewards, &values, gamma, lambda);
        assert!((advantages[0] - a0).abs() < 1e-6);
        assert!((advantages[1] - a1).abs() < 1e-6);
        assert!((advantages[2] - a2).abs() < 1e-6);
        assert!((returns[0] - (a0 + 0.5)).abs() < 1e-6);
    }

    #[test]
    #[should_panic]
    fn missing_bootstrap_entry_panics() {
        let _ = gae(&[1.0, 1.0], &[0.0, 0.0], 0.99, 0.99);
    }
}
