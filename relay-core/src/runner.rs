//! Repeat training across independent trials and persist the results.
use crate::{
    record::Recorder,
    stats::{self, BenchmarkSummary},
    Agent, DiscreteAct, Evaluator, Featurize, GoalEnv, Trainer, TrainerConfig,
};
use anyhow::Result;
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
    time::Instant,
};

const TRAIN_RETURNS_FILE: &str = "all_train_returns.bin";
const TEST_RETURNS_FILE: &str = "all_test_returns.bin";
const TEST_LENGTHS_FILE: &str = "all_test_lengths.bin";

/// Configuration of [`Runner`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct RunnerConfig {
    /// Number of independent trials.
    pub num_trials: usize,

    /// If true and all three artifacts exist, load them instead of
    /// recomputing.
    pub load_saved_results: bool,

    /// Directory the result artifacts are written to.
    pub artifact_dir: PathBuf,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            num_trials: 5,
            load_saved_results: false,
            artifact_dir: PathBuf::from("."),
        }
    }
}

impl RunnerConfig {
    /// Sets the number of trials.
    pub fn num_trials(mut self, v: usize) -> Self {
        self.num_trials = v;
        self
    }

    /// Sets whether existing artifacts are reused.
    pub fn load_saved_results(mut self, v: bool) -> Self {
        self.load_saved_results = v;
        self
    }

    /// Sets the artifact directory.
    pub fn artifact_dir(mut self, v: impl Into<PathBuf>) -> Self {
        self.artifact_dir = v.into();
        self
    }

    /// Constructs [`RunnerConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`RunnerConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// The three `[num_trials][...]` result arrays of an experiment.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct ExperimentRecords {
    /// Training-episode returns of every trial.
    pub all_train_returns: Vec<Vec<f32>>,

    /// Test returns of every trial.
    pub all_test_returns: Vec<Vec<f32>>,

    /// Test episode lengths of every trial.
    pub all_test_lengths: Vec<Vec<f32>>,
}

fn save_array(path: &Path, data: &Vec<Vec<f32>>) -> Result<()> {
    let file = BufWriter::new(File::create(path)?);
    bincode::serialize_into(file, data)?;
    Ok(())
}

fn load_array(path: &Path) -> Result<Vec<Vec<f32>>> {
    let file = BufReader::new(File::open(path)?);
    Ok(bincode::deserialize_from(file)?)
}

/// Repeats the trainer across independent trials.
///
/// Every trial gets a freshly built agent (through the caller's factory) and
/// a freshly built environment from the immutable environment configuration,
/// so trials always start from the configured goal and from untrained
/// parameters. The collected result arrays are persisted to the artifact
/// directory; with [`RunnerConfig::load_saved_results`] set and all three
/// artifacts present, a later invocation reloads them instead of retraining.
pub struct Runner<E: GoalEnv> {
    config: RunnerConfig,
    trainer_config: TrainerConfig,
    env_config: E::Config,
}

impl<E> Runner<E>
where
    E: GoalEnv,
    E::Obs: Featurize,
    E::Act: DiscreteAct,
{
    /// Constructs a runner.
    pub fn build(
        config: RunnerConfig,
        trainer_config: TrainerConfig,
        env_config: E::Config,
    ) -> Self {
        Self {
            config,
            trainer_config,
            env_config,
        }
    }

    /// True if all three result artifacts exist.
    pub fn artifacts_exist(&self) -> bool {
        [TRAIN_RETURNS_FILE, TEST_RETURNS_FILE, TEST_LENGTHS_FILE]
            .iter()
            .all(|f| self.config.artifact_dir.join(f).is_file())
    }

    fn save(&self, records: &ExperimentRecords) -> Result<()> {
        let dir = &self.config.artifact_dir;
        std::fs::create_dir_all(dir)?;
        save_array(&dir.join(TRAIN_RETURNS_FILE), &records.all_train_returns)?;
        save_array(&dir.join(TEST_RETURNS_FILE), &records.all_test_returns)?;
        save_array(&dir.join(TEST_LENGTHS_FILE), &records.all_test_lengths)?;
        Ok(())
    }

    fn load(&self) -> Result<ExperimentRecords> {
        let dir = &self.config.artifact_dir;
        Ok(ExperimentRecords {
            all_train_returns: load_array(&dir.join(TRAIN_RETURNS_FILE))?,
            all_test_returns: load_array(&dir.join(TEST_RETURNS_FILE))?,
            all_test_lengths: load_array(&dir.join(TEST_LENGTHS_FILE))?,
        })
    }

    /// Runs (or reloads) all trials and returns the result arrays.
    ///
    /// `agent_fn` builds a fresh agent for the given trial index.
    pub fn run<A, D, F>(
        &self,
        mut agent_fn: F,
        evaluator: &mut D,
        recorder: &mut dyn Recorder,
    ) -> Result<ExperimentRecords>
    where
        A: Agent<E>,
        D: Evaluator<E>,
        F: FnMut(usize) -> A,
    {
        if self.config.load_saved_results && self.artifacts_exist() {
            info!("Loading saved results from {:?}", self.config.artifact_dir);
            return self.load();
        }

        let start = Instant::now();
        let mut records = ExperimentRecords::default();

        for trial in 0..self.config.num_trials {
            info!("Trial: {}", trial + 1);
            let mut agent = agent_fn(trial);
            let mut trainer =
                Trainer::<E>::build(self.trainer_config.clone(), self.env_config.clone());
            let result = trainer.train(&mut agent, evaluator, recorder, trial as i64)?;

            records.all_train_returns.push(result.train_returns);
            records.all_test_returns.push(result.test_returns);
            records.all_test_lengths.push(result.test_lengths);
        }

        info!(
            "Experiment completed in {:.2} seconds",
            start.elapsed().as_secs_f32()
        );
        self.save(&records)?;

        Ok(records)
    }

    /// Runs all trials, then summarizes and logs the benchmark statistics.
    pub fn run_experiment<A, D, F>(
        &self,
        agent_fn: F,
        evaluator: &mut D,
        recorder: &mut dyn Recorder,
    ) -> Result<(ExperimentRecords, BenchmarkSummary)>
    where
        A: Agent<E>,
        D: Evaluator<E>,
        F: FnMut(usize) -> A,
    {
        let records = self.run(agent_fn, evaluator, recorder)?;

        let summary = stats::benchmark(
            &records.all_train_returns,
            &records.all_test_returns,
            &records.all_test_lengths,
            self.trainer_config.test_interval,
        );

        info!(
            "Overall best return w/ 95% CI: {:.3} +- {:.3}",
            summary.best_return, summary.best_return_ci
        );
        info!(
            "Individual trial best returns: {:?}",
            summary.trial_best_returns
        );
        info!(
            "Best return for goal 1 w/ 95% CI: {:.3} +- {:.3}",
            summary.split_best_returns[0], summary.split_best_ci[0]
        );
        info!(
            "Best return for goal 2 w/ 95% CI: {:.3} +- {:.3}",
            summary.split_best_returns[1], summary.split_best_ci[1]
        );

        Ok((records, summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dummy::{DummyAgent, DummyEnv, DummyEnvConfig},
        record::NullRecorder,
        OnPolicyEvaluator,
    };
    use tempdir::TempDir;

    fn runner(dir: &Path, load_saved: bool) -> Runner<DummyEnv> {
        let config = RunnerConfig::default()
            .num_trials(2)
            .load_saved_results(load_saved)
            .artifact_dir(dir);
        let trainer_config = TrainerConfig::default()
            .total_train_episodes(4)
            .buffer_episodes(2)
            .t_max(10)
            .test_interval(2);
        Runner::build(config, trainer_config, DummyEnvConfig::default())
    }

    fn bits(rows: &[Vec<f32>]) -> Vec<Vec<u32>> {
        rows.iter()
            .map(|row| row.iter().map(|v| v.to_bits()).collect())
            .collect()
    }

    #[test]
    fn persisted_results_roundtrip_bit_identical() -> Result<()> {
        let dir = TempDir::new("runner")?;
        let mut evaluator =
            OnPolicyEvaluator::<DummyEnv>::new(&DummyEnvConfig::default(), 1, 2, 10, 0.5);
        let mut recorder = NullRecorder {};

        let runner_ = runner(dir.path(), false);
        let records = runner_.run(|_| DummyAgent::new(), &mut evaluator, &mut recorder)?;
        assert_eq!(records.all_train_returns.len(), 2);
        assert_eq!(records.all_test_returns[0].len(), 2);
        assert!(runner_.artifacts_exist());

        // A second runner with the reuse flag set loads the same arrays.
        let runner_ = runner(dir.path(), true);
        let reloaded = runner_.run(
            |_| -> DummyAgent { panic!("must not retrain") },
            &mut evaluator,
            &mut recorder,
        )?;
        assert_eq!(
            bits(&records.all_train_returns),
            bits(&reloaded.all_train_returns)
        );
        assert_eq!(
            bits(&records.all_test_returns),
            bits(&reloaded.all_test_returns)
        );
        assert_eq!(
            bits(&records.all_test_lengths),
            bits(&reloaded.all_test_lengths)
        );
        Ok(())
    }

    #[test]
    fn reuse_flag_without_artifacts_recomputes() -> Result<()> {
        let dir = TempDir::new("runner_fresh")?;
        let mut evaluator =
            OnPolicyEvaluator::<DummyEnv>::new(&DummyEnvConfig::default(), 1, 2, 10, 0.5);
        let mut recorder = NullRecorder {};

        let runner_ = runner(dir.path(), true);
        let records = runner_.run(|_| DummyAgent::new(), &mut evaluator, &mut recorder)?;
        assert_eq!(records.all_train_returns.len(), 2);
        Ok(())
    }
}
