//! The FourRooms goal-transfer experiment.
//!
//! Trains PPO on FourRooms with a mid-training goal switch and summarizes
//! the multi-trial results. Hyperparameters follow the reference setup:
//! 2000 episodes per trial in rollout buffers of 10, horizon 1000,
//! evaluation of 10 episodes every 10 training episodes, hidden width 128,
//! Adam with actor/critic learning rates 3e-4/1e-3, gamma 0.99, GAE lambda
//! 0.99, clip ratio 0.2 and entropy coefficient 0.01.
use anyhow::Result;
use clap::Parser;
use log::info;
use relay_candle_agent::{
    mlp::{Mlp, MlpConfig},
    opt::OptimizerConfig,
    ppo::{ActorConfig, CriticConfig, Ppo, PpoConfig},
    Device,
};
use relay_core::{
    record::LogRecorder, stats, OnPolicyEvaluator, Runner, RunnerConfig, TrainerConfig,
};
use relay_fourrooms_env::{FourRooms, FourRoomsConfig, EAST_DOORWAY};
use std::path::PathBuf;

/// Goal the environment switches to at the episode midpoint: a cell in the
/// middle of the south-west room.
const SWITCHED_GOAL: usize = 75;

/// Number of movement actions in FourRooms.
const N_ACTIONS: i64 = 4;

/// Train PPO on FourRooms with a mid-training goal switch.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Args {
    /// Number of independent trials.
    #[arg(long, default_value_t = 5)]
    pub trials: usize,

    /// Total training episodes per trial.
    #[arg(long, default_value_t = 2000)]
    pub episodes: usize,

    /// Reuse persisted result artifacts instead of retraining.
    #[arg(long)]
    pub load_results: bool,

    /// Directory for result artifacts and CSV exports.
    #[arg(long, default_value = "results")]
    pub artifact_dir: PathBuf,

    /// Disable the mid-training goal switch.
    #[arg(long)]
    pub no_goal_switch: bool,
}

/// Runs the experiment.
pub fn run(args: &Args) -> Result<()> {
    info!(
        "FourRooms PPO: {} trials x {} episodes, goal switch {}",
        args.trials,
        args.episodes,
        if args.no_goal_switch { "off" } else { "on" }
    );

    let env_config = FourRoomsConfig::default().goal(EAST_DOORWAY);
    let state_dim = env_config.n_cells() as i64;

    let trainer_config = TrainerConfig::default()
        .total_train_episodes(args.episodes)
        .buffer_episodes(10)
        .t_max(1000)
        .test_interval(10)
        .gamma(0.99)
        .gae_lambda(0.99)
        .switch_goal((!args.no_goal_switch).then(|| SWITCHED_GOAL));

    let runner_config = RunnerConfig::default()
        .num_trials(args.trials)
        .load_saved_results(args.load_results)
        .artifact_dir(&args.artifact_dir);

    let ppo_config = PpoConfig::default()
        .actor_config(
            ActorConfig::default()
                .pi_config(MlpConfig::new(state_dim, vec![128], N_ACTIONS))
                .opt_config(OptimizerConfig::Adam { lr: 3e-4 }),
        )
        .critic_config(
            CriticConfig::default()
                .v_config(MlpConfig::new(state_dim, vec![128], 1))
                .opt_config(OptimizerConfig::Adam { lr: 1e-3 }),
        )
        .opt_epochs(10)
        .mini_batch_size(64)
        .clip_eps(0.2)
        .entropy_coef(0.01)
        .device(Some(Device::Cpu));

    let mut evaluator = OnPolicyEvaluator::<FourRooms>::new(
        &env_config,
        0,
        10,
        trainer_config.t_max,
        trainer_config.gamma,
    );
    let mut recorder = LogRecorder::new();
    let runner = Runner::<FourRooms>::build(runner_config, trainer_config.clone(), env_config);

    let (records, summary) = runner.run_experiment(
        |trial| {
            Ppo::<FourRooms, Mlp, Mlp>::build(ppo_config.clone().seed(42 + trial as u64))
                .expect("failed to build PPO agent")
        },
        &mut evaluator,
        &mut recorder,
    )?;

    stats::export_curve(
        args.artifact_dir.join("test_returns.csv"),
        "test_return",
        &records.all_test_returns,
        trainer_config.test_interval,
    )?;
    stats::export_curve(
        args.artifact_dir.join("test_lengths.csv"),
        "test_length",
        &records.all_test_lengths,
        trainer_config.test_interval,
    )?;

    println!(
        "Overall best return w/ 95% CI: {:.3} +- {:.3}",
        summary.best_return, summary.best_return_ci
    );
    println!(
        "Best return for goal 1 w/ 95% CI: {:.3} +- {:.3}",
        summary.split_best_returns[0], summary.split_best_ci[0]
    );
    println!(
        "Best return for goal 2 w/ 95% CI: {:.3} +- {:.3}",
        summary.split_best_returns[1], summary.split_best_ci[1]
    );

    Ok(())
}
