//! Observer implementations for training pipelines
//!
//! Composable data collection during training without coupling the loop to
//! specific output formats.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};

use crate::{
    Result,
    grid::Action,
    ports::{EpisodeSummary, Observer, StepRecord},
    types::Position,
};

/// Observation of a single transition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepObservation {
    pub step: u32,
    pub player: Position,
    pub action: Action,
    pub reward: f64,
    pub loss: Option<f64>,
}

/// Complete observation of one episode, written as a JSON line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    #[serde(flatten)]
    pub summary: EpisodeSummary,
    pub target: Position,
    /// Per-step detail, only recorded when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transitions: Option<Vec<StepObservation>>,
}

/// Progress bar observer - Shows training progress
pub struct ProgressObserver {
    progress_bar: Option<ProgressBar>,
    wins: usize,
    episodes: usize,
}

impl ProgressObserver {
    pub fn new() -> Self {
        Self {
            progress_bar: None,
            wins: 0,
            episodes: 0,
        }
    }

    fn message(&self) -> String {
        let rate = if self.episodes > 0 {
            self.wins as f64 / self.episodes as f64 * 100.0
        } else {
            0.0
        };
        format!("{} ({rate:.1}%)", self.wins)
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer for ProgressObserver {
    fn on_training_start(&mut self, total_episodes: usize) -> Result<()> {
        let pb = ProgressBar::new(total_episodes as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} episodes (W:{msg})")
                .map_err(|e| crate::Error::ProgressBarTemplate {
                    message: e.to_string(),
                })?
                .progress_chars("=>-"),
        );
        self.progress_bar = Some(pb);
        Ok(())
    }

    fn on_episode_end(&mut self, summary: &EpisodeSummary) -> Result<()> {
        self.episodes += 1;
        if summary.won {
            self.wins += 1;
        }

        if let Some(pb) = &self.progress_bar {
            pb.set_position(summary.episode as u64);
            pb.set_message(self.message());
        }
        Ok(())
    }

    fn on_training_end(&mut self) -> Result<()> {
        if let Some(pb) = &self.progress_bar {
            pb.finish_with_message(self.message());
        }
        Ok(())
    }
}

/// Summary of training metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub episodes: usize,
    pub wins: usize,
    pub win_rate: f64,
    pub avg_episode_length: f64,
    /// `None` when no parameter update was made (e.g. evaluation)
    pub avg_loss: Option<f64>,
    pub reached_target: usize,
    pub out_of_bounds: usize,
    pub step_limit: usize,
}

#[derive(Debug, Default)]
struct Metrics {
    episodes: usize,
    wins: usize,
    step_sum: u64,
    loss_sum: f64,
    loss_count: usize,
    reached_target: usize,
    out_of_bounds: usize,
    step_limit: usize,
}

/// Metrics observer - Tracks training metrics
///
/// Clones share one set of counters, so a caller can keep a handle and read
/// the summary after the pipeline that owns the boxed observer has finished.
#[derive(Debug, Clone, Default)]
pub struct MetricsObserver {
    metrics: Arc<Mutex<Metrics>>,
}

impl MetricsObserver {
    pub fn new() -> Self {
        Self::default()
    }

    fn metrics(&self) -> MutexGuard<'_, Metrics> {
        self.metrics.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get current win rate
    pub fn win_rate(&self) -> f64 {
        let metrics = self.metrics();
        if metrics.episodes == 0 {
            0.0
        } else {
            metrics.wins as f64 / metrics.episodes as f64
        }
    }

    /// Get average episode length in steps
    pub fn avg_episode_length(&self) -> f64 {
        let metrics = self.metrics();
        if metrics.episodes == 0 {
            0.0
        } else {
            metrics.step_sum as f64 / metrics.episodes as f64
        }
    }

    /// Mean TD loss over all updates
    pub fn avg_loss(&self) -> Option<f64> {
        let metrics = self.metrics();
        (metrics.loss_count > 0).then(|| metrics.loss_sum / metrics.loss_count as f64)
    }

    pub fn summary(&self) -> MetricsSummary {
        let win_rate = self.win_rate();
        let avg_episode_length = self.avg_episode_length();
        let avg_loss = self.avg_loss();
        let metrics = self.metrics();
        MetricsSummary {
            episodes: metrics.episodes,
            wins: metrics.wins,
            win_rate,
            avg_episode_length,
            avg_loss,
            reached_target: metrics.reached_target,
            out_of_bounds: metrics.out_of_bounds,
            step_limit: metrics.step_limit,
        }
    }
}

impl Observer for MetricsObserver {
    fn on_step(&mut self, record: &StepRecord<'_>) -> Result<()> {
        if let Some(loss) = record.loss {
            let mut metrics = self.metrics();
            metrics.loss_sum += loss;
            metrics.loss_count += 1;
        }
        Ok(())
    }

    fn on_episode_end(&mut self, summary: &EpisodeSummary) -> Result<()> {
        let mut metrics = self.metrics();
        metrics.episodes += 1;
        metrics.step_sum += u64::from(summary.steps);
        if summary.won {
            metrics.wins += 1;
        }
        if summary.reasons.reached_target {
            metrics.reached_target += 1;
        }
        if summary.reasons.out_of_bounds {
            metrics.out_of_bounds += 1;
        }
        if summary.reasons.step_limit {
            metrics.step_limit += 1;
        }
        Ok(())
    }
}

/// JSONL observer - Exports one episode per line
pub struct JsonlObserver {
    writer: BufWriter<File>,
    include_steps: bool,
    current_steps: Vec<StepObservation>,
    current_target: Position,
}

impl JsonlObserver {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        Ok(Self {
            writer,
            include_steps: false,
            current_steps: Vec::new(),
            current_target: Position::default(),
        })
    }

    /// Also record every transition of each episode.
    pub fn with_steps(mut self, include_steps: bool) -> Self {
        self.include_steps = include_steps;
        self
    }
}

impl Observer for JsonlObserver {
    fn on_episode_start(&mut self, _episode: usize) -> Result<()> {
        self.current_steps.clear();
        Ok(())
    }

    fn on_step(&mut self, record: &StepRecord<'_>) -> Result<()> {
        self.current_target = record.state.target_position;
        if self.include_steps {
            self.current_steps.push(StepObservation {
                step: record.outcome.state.steps,
                player: record.outcome.state.player_position,
                action: record.action,
                reward: record.outcome.reward,
                loss: record.loss,
            });
        }
        Ok(())
    }

    fn on_episode_end(&mut self, summary: &EpisodeSummary) -> Result<()> {
        let observation = Observation {
            summary: *summary,
            target: self.current_target,
            transitions: self
                .include_steps
                .then(|| std::mem::take(&mut self.current_steps)),
        };

        serde_json::to_writer(&mut self.writer, &observation)?;
        writeln!(&mut self.writer)?;
        self.writer.flush()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::{
        grid::{Environment, EnvironmentConfig},
        pipeline::{TrainingConfig, TrainingPipeline},
        q_learning::{EpsilonGreedy, QTable},
        types::MapSize,
    };

    fn run_with(observer: Box<dyn Observer>, episodes: usize) -> crate::pipeline::TrainingResult {
        let config = TrainingConfig {
            max_episodes: episodes,
            visual_interval: 0,
            environment: EnvironmentConfig {
                map_size: MapSize::new(4, 4).unwrap(),
                max_steps: 10,
                ..EnvironmentConfig::default()
            },
            ..TrainingConfig::default()
        };
        let mut env = Environment::with_seed(config.environment, 17);
        let mut policy = EpsilonGreedy::new(0.3).with_seed(17);
        let mut table = QTable::new(16, 5, 0.0).unwrap();
        TrainingPipeline::new(config)
            .with_observer(observer)
            .run(&mut env, &mut policy, &mut table)
            .unwrap()
    }

    #[test]
    fn test_jsonl_writes_one_line_per_episode() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("episodes.jsonl");
        let observer = JsonlObserver::new(&path).unwrap().with_steps(true);
        let result = run_with(Box::new(observer), 7);

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = contents
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[0]["episode"], 1);
        let total_steps: usize = lines
            .iter()
            .map(|line| line["transitions"].as_array().unwrap().len())
            .sum();
        assert_eq!(total_steps, result.epochs);
    }

    #[test]
    fn test_metrics_summary_matches_outcomes() {
        let mut metrics = MetricsObserver::new();
        let summary = EpisodeSummary {
            episode: 1,
            steps: 4,
            total_reward: 1.25,
            final_reward: 1.0,
            won: true,
            reasons: crate::grid::TerminationReasons {
                reached_target: true,
                ..crate::grid::TerminationReasons::NONE
            },
            penalties: 0,
        };
        metrics.on_episode_end(&summary).unwrap();
        metrics
            .on_episode_end(&EpisodeSummary {
                episode: 2,
                steps: 2,
                won: false,
                reasons: crate::grid::TerminationReasons {
                    out_of_bounds: true,
                    ..crate::grid::TerminationReasons::NONE
                },
                ..summary
            })
            .unwrap();

        let summary = metrics.summary();
        assert_eq!(summary.episodes, 2);
        assert_eq!(summary.wins, 1);
        assert_eq!(summary.win_rate, 0.5);
        assert_eq!(summary.avg_episode_length, 3.0);
        assert_eq!(summary.reached_target, 1);
        assert_eq!(summary.out_of_bounds, 1);
        assert_eq!(summary.avg_loss, None);
    }

    #[test]
    fn test_metrics_handle_reads_after_pipeline() {
        let metrics = MetricsObserver::new();
        let result = run_with(Box::new(metrics.clone()), 12);

        let summary = metrics.summary();
        assert_eq!(summary.episodes, 12);
        assert_eq!(summary.wins, result.wins);
        assert_eq!(summary.avg_episode_length, result.epochs as f64 / 12.0);
        let loss = summary.avg_loss.unwrap();
        assert!(loss.is_finite() && loss >= 0.0);
    }
}
