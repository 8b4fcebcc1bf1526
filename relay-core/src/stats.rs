//! Benchmark statistics over multi-trial experiment results.
//!
//! The functions here consume the `[num_trials][num_points]` arrays produced
//! by the [`Runner`](crate::Runner) and summarize them: mean curves with
//! per-point confidence intervals, per-trial best returns with a Student-t
//! 95% half-width, and the pre/post goal-switch split used for transfer
//! comparisons. Curves can be exported as CSV for external plotting.
use anyhow::Result;
use std::path::Path;

/// Two-sided 95% Student-t quantiles for small degrees of freedom; the
/// normal quantile is used beyond the table.
const T_TABLE_95: [f32; 30] = [
    12.706, 4.303, 3.182, 2.776, 2.571, 2.447, 2.365, 2.306, 2.262, 2.228, 2.201, 2.179, 2.160,
    2.145, 2.131, 2.120, 2.110, 2.101, 2.093, 2.086, 2.080, 2.074, 2.069, 2.064, 2.060, 2.056,
    2.052, 2.048, 2.045, 2.042,
];

fn t_value_95(df: usize) -> f32 {
    if df == 0 {
        f32::NAN
    } else if df <= T_TABLE_95.len() {
        T_TABLE_95[df - 1]
    } else {
        1.96
    }
}

fn mean(xs: &[f32]) -> f32 {
    xs.iter().sum::<f32>() / xs.len() as f32
}

fn sample_std(xs: &[f32]) -> f32 {
    let m = mean(xs);
    (xs.iter().map(|x| (x - m) * (x - m)).sum::<f32>() / (xs.len() - 1) as f32).sqrt()
}

fn best(xs: &[f32]) -> f32 {
    xs.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b))
}

fn column_means(rows: &[Vec<f32>]) -> Vec<f32> {
    let n_points = rows[0].len();
    (0..n_points)
        .map(|p| rows.iter().map(|row| row[p]).sum::<f32>() / rows.len() as f32)
        .collect()
}

/// Per-point 95% normal confidence half-widths, `1.96 * std / sqrt(n)`.
fn column_cis(rows: &[Vec<f32>]) -> Vec<f32> {
    let n = rows.len() as f32;
    let means = column_means(rows);
    means
        .iter()
        .enumerate()
        .map(|(p, m)| {
            let var = rows.iter().map(|row| (row[p] - m) * (row[p] - m)).sum::<f32>() / n;
            1.96 * var.sqrt() / n.sqrt()
        })
        .collect()
}

/// Mean of the per-trial values and its 95% Student-t half-width.
fn mean_with_ci(values: &[f32]) -> (f32, f32) {
    let n = values.len();
    let m = mean(values);
    if n < 2 {
        return (m, 0.0);
    }
    let ci = t_value_95(n - 1) * sample_std(values) / (n as f32).sqrt();
    (m, ci)
}

/// Aggregated statistics of a multi-trial experiment.
#[derive(Clone, Debug)]
pub struct BenchmarkSummary {
    /// Training-episode axis of the test curves.
    pub episodes: Vec<usize>,

    /// Mean test-return curve across trials.
    pub mean_test_returns: Vec<f32>,

    /// Per-point 95% half-widths of the test-return curve.
    pub test_return_ci: Vec<f32>,

    /// Mean test-episode-length curve across trials.
    pub mean_test_lengths: Vec<f32>,

    /// Per-point 95% half-widths of the test-length curve.
    pub test_length_ci: Vec<f32>,

    /// Mean training-return curve across trials.
    pub mean_train_returns: Vec<f32>,

    /// Best test return of each trial.
    pub trial_best_returns: Vec<f32>,

    /// Mean of the per-trial best returns.
    pub best_return: f32,

    /// 95% Student-t half-width of [`Self::best_return`].
    pub best_return_ci: f32,

    /// Best-return means for the [pre-switch, post-switch] halves of the
    /// test curve.
    pub split_best_returns: [f32; 2],

    /// 95% half-widths matching [`Self::split_best_returns`].
    pub split_best_ci: [f32; 2],
}

/// Summarizes the three `[num_trials][...]` result arrays.
///
/// `test_interval` maps test-curve points onto the training-episode axis.
/// The pre/post split halves the test curve at `num_points / 2`, matching
/// the trainer's goal-switch midpoint.
pub fn benchmark(
    all_train_returns: &[Vec<f32>],
    all_test_returns: &[Vec<f32>],
    all_test_lengths: &[Vec<f32>],
    test_interval: usize,
) -> BenchmarkSummary {
    assert!(!all_test_returns.is_empty(), "no trials to summarize");
    let num_points = all_test_returns[0].len();

    let trial_best_returns: Vec<f32> = all_test_returns.iter().map(|row| best(row)).collect();
    let (best_return, best_return_ci) = mean_with_ci(&trial_best_returns);

    let halfway = num_points / 2;
    let best_g1: Vec<f32> = all_test_returns.iter().map(|row| best(&row[..halfway])).collect();
    let best_g2: Vec<f32> = all_test_returns.iter().map(|row| best(&row[halfway..])).collect();
    let (mean_g1, ci_g1) = mean_with_ci(&best_g1);
    let (mean_g2, ci_g2) = mean_with_ci(&best_g2);

    BenchmarkSummary {
        episodes: (0..num_points).map(|p| p * test_interval).collect(),
        mean_test_returns: column_means(all_test_returns),
        test_return_ci: column_cis(all_test_returns),
        mean_test_lengths: column_means(all_test_lengths),
        test_length_ci: column_cis(all_test_lengths),
        mean_train_returns: column_means(all_train_returns),
        trial_best_returns,
        best_return,
        best_return_ci,
        split_best_returns: [mean_g1, mean_g2],
        split_best_ci: [ci_g1, ci_g2],
    }
}

/// Writes one curve as CSV: episode axis, cross-trial mean, 95% half-width,
/// then one column per trial.
pub fn export_curve(
    path: impl AsRef<Path>,
    label: &str,
    rows: &[Vec<f32>],
    test_interval: usize,
) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    let mut header = vec!["episode".to_string(), format!("mean_{}", label), "ci95".to_string()];
    for i in 0..rows.len() {
        header.push(format!("trial_{}", i + 1));
    }
    wtr.write_record(&header)?;

    let means = column_means(rows);
    let cis = column_cis(rows);
    for p in 0..means.len() {
        let mut rec = vec![
            (p * test_interval).to_string(),
            means[p].to_string(),
            cis[p].to_string(),
        ];
        for row in rows.iter() {
            rec.push(row[p].to_string());
        }
        wtr.write_record(&rec)?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn t_quantiles() {
        assert!((t_value_95(1) - 12.706).abs() < 1e-3);
        assert!((t_value_95(4) - 2.776).abs() < 1e-3);
        assert!((t_value_95(100) - 1.96).abs() < 1e-6);
    }

    #[test]
    fn summary_of_two_trials() {
        let train = vec![vec![0.0; 4], vec![0.0; 4]];
        let test = vec![vec![1.0, 3.0, 2.0, 4.0], vec![2.0, 4.0, 2.0, 6.0]];
        let lengths = vec![vec![10.0; 4], vec![20.0; 4]];

        let summary = benchmark(&train, &test, &lengths, 10);

        assert_eq!(summary.episodes, vec![0, 10, 20, 30]);
        assert_eq!(summary.mean_test_returns, vec![1.5, 3.5, 2.0, 5.0]);
        assert_eq!(summary.mean_test_lengths, vec![15.0; 4]);
        assert_eq!(summary.trial_best_returns, vec![4.0, 6.0]);
        assert!((summary.best_return - 5.0).abs() < 1e-6);
        // df = 1: 12.706 * std(4, 6) / sqrt(2) = 12.706
        assert!((summary.best_return_ci - 12.706).abs() < 1e-3);
        // Halves: bests (3, 4) and (4, 6).
        assert!((summary.split_best_returns[0] - 3.5).abs() < 1e-6);
        assert!((summary.split_best_returns[1] - 5.0).abs() < 1e-6);
    }

    #[test]
    fn single_trial_has_no_spread() {
        let rows = vec![vec![1.0, 2.0]];
        let summary = benchmark(&rows, &rows, &rows, 1);
        assert_eq!(summary.best_return, 2.0);
        assert_eq!(summary.best_return_ci, 0.0);
    }

    #[test]
    fn csv_export() -> Result<()> {
        let dir = TempDir::new("stats")?;
        let path = dir.path().join("test_returns.csv");
        let rows = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        export_curve(&path, "test_return", &rows, 10)?;

        let contents = std::fs::read_to_string(&path)?;
        let mut lines = contents.lines();
        assert_eq!(
            lines.next().unwrap(),
            "episode,mean_test_return,ci95,trial_1,trial_2"
        );
        assert_eq!(lines.count(), 2);
        Ok(())
    }
}
