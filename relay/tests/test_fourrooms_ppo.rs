use anyhow::Result;
use relay_candle_agent::{
    mlp::{Mlp, MlpConfig},
    ppo::{ActorConfig, CriticConfig, Ppo, PpoConfig},
    Device,
};
use relay_core::{record::NullRecorder, OnPolicyEvaluator, Runner, RunnerConfig, TrainerConfig};
use relay_fourrooms_env::{FourRooms, FourRoomsConfig, EAST_DOORWAY};
use tempdir::TempDir;

/// Trains a tiny PPO agent on FourRooms for a few episodes, including a
/// goal switch, and checks the shapes of the persisted results.
#[test]
fn fourrooms_ppo_smoke() -> Result<()> {
    let dir = TempDir::new("fourrooms_ppo")?;

    let env_config = FourRoomsConfig::default().goal(EAST_DOORWAY);
    let state_dim = env_config.n_cells() as i64;

    let trainer_config = TrainerConfig::default()
        .total_train_episodes(4)
        .buffer_episodes(2)
        .t_max(20)
        .test_interval(2)
        .switch_goal(Some(10));
    let runner_config = RunnerConfig::default()
        .num_trials(1)
        .artifact_dir(dir.path());

    let ppo_config = PpoConfig::default()
        .actor_config(ActorConfig::default().pi_config(MlpConfig::new(state_dim, vec![16], 4)))
        .critic_config(CriticConfig::default().v_config(MlpConfig::new(state_dim, vec![16], 1)))
        .opt_epochs(1)
        .mini_batch_size(16)
        .device(Some(Device::Cpu));

    let mut evaluator = OnPolicyEvaluator::<FourRooms>::new(&env_config, 0, 2, 20, 0.99);
    let mut recorder = NullRecorder {};
    let runner = Runner::<FourRooms>::build(runner_config, trainer_config, env_config);

    let (records, summary) = runner.run_experiment(
        |trial| {
            Ppo::<FourRooms, Mlp, Mlp>::build(ppo_config.clone().seed(trial as u64)).unwrap()
        },
        &mut evaluator,
        &mut recorder,
    )?;

    assert_eq!(records.all_train_returns.len(), 1);
    assert_eq!(records.all_train_returns[0].len(), 4);
    assert_eq!(records.all_test_returns[0].len(), 2);
    assert_eq!(records.all_test_lengths[0].len(), 2);
    assert!(summary.best_return.is_finite());

    Ok(())
}
