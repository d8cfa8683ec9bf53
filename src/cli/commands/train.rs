//! Train command - TD training of a value function on the grid world

use std::{
    fs::File,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use serde_json::to_writer_pretty;

use crate::{
    app::{App, DEFAULT_WEIGHTS_PATH, SessionConfig},
    cli::output::{print_metrics, print_training_result},
    grid::RewardScheme,
    pipeline::{
        JsonlObserver, MetricsObserver, MetricsSummary, Observer, ProgressObserver,
        TrainingConfig, TrainingResult,
    },
    q_learning::{ApproximatorKind, OutputActivation, TdLoss},
    render::TerminalRenderer,
    types::MapSize,
};

#[derive(Debug, Serialize)]
struct TrainingSummaryFile {
    training: TrainingResult,
    metrics: MetricsSummary,
    metadata: SummaryMetadata,
}

#[derive(Debug, Serialize)]
struct SummaryMetadata {
    approximator: String,
    map_size: String,
    reward_scheme: String,
    loss: String,
    seed: Option<u64>,
    resumed: bool,
    episodes_trained: usize,
    weights: PathBuf,
}

fn sanitize_summary_path(raw: &Path) -> PathBuf {
    let mut normalized = raw.to_path_buf();
    let raw_str = raw.as_os_str().to_string_lossy();

    // Trailing separator or no file name means a directory target
    if raw_str.ends_with(std::path::MAIN_SEPARATOR) || normalized.file_name().is_none() {
        normalized.push("training_summary.json");
        return normalized;
    }

    match normalized.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => normalized,
        _ => {
            normalized.set_extension("json");
            normalized
        }
    }
}

#[derive(Parser, Debug)]
#[command(about = "Train a value function", allow_negative_numbers = true)]
pub struct TrainArgs {
    /// Resume from the parameters at --weights (fails if they cannot be loaded)
    #[arg(long)]
    pub load: bool,

    /// Where parameters are loaded from and saved to
    #[arg(long, short = 'w', default_value = DEFAULT_WEIGHTS_PATH)]
    pub weights: PathBuf,

    /// JSON file with a training configuration; flags override its values
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Number of training episodes
    #[arg(long, short = 'e')]
    pub episodes: Option<usize>,

    /// Learning rate
    #[arg(long)]
    pub alpha: Option<f64>,

    /// Discount factor
    #[arg(long)]
    pub gamma: Option<f64>,

    /// Exploration probability
    #[arg(long)]
    pub epsilon: Option<f64>,

    /// Multiplicative epsilon decay per episode
    #[arg(long)]
    pub epsilon_decay: Option<f64>,

    /// Floor for decayed epsilon
    #[arg(long)]
    pub min_epsilon: Option<f64>,

    /// Render every n-th episode (0 disables rendering)
    #[arg(long)]
    pub visual_interval: Option<usize>,

    /// Map size as WIDTHxHEIGHT
    #[arg(long)]
    pub map_size: Option<MapSize>,

    /// Episodes end once the step counter exceeds this value
    #[arg(long)]
    pub max_steps: Option<u32>,

    /// Reward formula (branch-table or halved-delta)
    #[arg(long)]
    pub reward_scheme: Option<RewardScheme>,

    /// TD loss convention (all-actions or taken-action)
    #[arg(long)]
    pub loss: Option<TdLoss>,

    /// Value function for fresh sessions (network or table)
    #[arg(long)]
    pub approximator: Option<ApproximatorKind>,

    /// Network output activation (linear or relu)
    #[arg(long)]
    pub output_activation: Option<OutputActivation>,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,

    /// Optional path for writing a summary JSON file
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Optional file for JSONL episode observations
    #[arg(long)]
    pub observations: Option<PathBuf>,

    /// Include every transition in the JSONL observations
    #[arg(long)]
    pub record_steps: bool,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Delay between rendered frames in milliseconds
    #[arg(long, default_value_t = 250)]
    pub frame_delay_ms: u64,
}

impl TrainArgs {
    /// Training configuration from --config (or defaults) with flag overrides.
    pub fn training_config(&self) -> Result<TrainingConfig> {
        let mut config = match &self.config {
            Some(path) => TrainingConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => TrainingConfig::default(),
        };

        if let Some(episodes) = self.episodes {
            config.max_episodes = episodes;
        }
        if let Some(alpha) = self.alpha {
            config.alpha = alpha;
        }
        if let Some(gamma) = self.gamma {
            config.gamma = gamma;
        }
        if let Some(epsilon) = self.epsilon {
            config.epsilon = epsilon;
        }
        if let Some(decay) = self.epsilon_decay {
            config.epsilon_decay = decay;
        }
        if let Some(min_epsilon) = self.min_epsilon {
            config.min_epsilon = min_epsilon;
        }
        if let Some(interval) = self.visual_interval {
            config.visual_interval = interval;
        }
        if let Some(map_size) = self.map_size {
            config.environment.map_size = map_size;
        }
        if let Some(max_steps) = self.max_steps {
            config.environment.max_steps = max_steps;
        }
        if let Some(scheme) = self.reward_scheme {
            config.environment.reward_scheme = scheme;
        }
        if let Some(loss) = self.loss {
            config.loss = loss;
        }
        if let Some(kind) = self.approximator {
            config.approximator = kind;
        }
        if let Some(activation) = self.output_activation {
            config.output_activation = activation;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }

        config.validate().context("Invalid training configuration")?;
        Ok(config)
    }

    fn observers(
        &self,
        config: &TrainingConfig,
        metrics: &MetricsObserver,
    ) -> Result<Vec<Box<dyn Observer>>> {
        let mut observers: Vec<Box<dyn Observer>> = vec![Box::new(metrics.clone())];
        if !self.no_progress {
            observers.push(Box::new(ProgressObserver::new()));
        }
        if config.visual_interval > 0 {
            observers.push(Box::new(
                TerminalRenderer::stdout()
                    .with_frame_delay(Duration::from_millis(self.frame_delay_ms)),
            ));
        }
        if let Some(path) = &self.observations {
            let observer = JsonlObserver::new(path)
                .with_context(|| format!("Failed to create {}", path.display()))?
                .with_steps(self.record_steps);
            observers.push(Box::new(observer));
        }
        Ok(observers)
    }
}

pub fn execute(args: TrainArgs) -> Result<()> {
    execute_with(&App::new(), args)
}

/// Run the command against an explicit container.
pub fn execute_with(app: &App, args: TrainArgs) -> Result<()> {
    let training = args.training_config()?;
    let summary_spec = args.summary.as_ref().map(|raw| {
        let sanitized = sanitize_summary_path(raw);
        let normalized = sanitized != *raw;
        (sanitized, normalized)
    });

    let metrics = MetricsObserver::new();
    let observers = args.observers(&training, &metrics)?;
    let session = SessionConfig::new(training.clone())
        .with_resume(args.load)
        .with_weights_path(&args.weights);

    if args.load {
        println!("Resuming from {}", args.weights.display());
    }
    let trained = app.train(&session, observers).with_context(|| {
        if args.load {
            format!("Training from {} failed", args.weights.display())
        } else {
            "Training failed".to_string()
        }
    })?;

    print_training_result(&trained.result);
    let metrics = metrics.summary();
    print_metrics(&metrics);
    println!("\n✓ Parameters saved to: {}", args.weights.display());
    println!("  Approximator: {}", trained.approximator.kind());
    println!("  Episodes trained: {}", trained.metadata.episodes_trained);

    if let Some((summary_path, normalized)) = summary_spec {
        if normalized {
            println!("\nNormalizing summary path to {}", summary_path.display());
        }
        if let Some(parent) = summary_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let summary = TrainingSummaryFile {
            training: trained.result.clone(),
            metrics,
            metadata: SummaryMetadata {
                approximator: trained.approximator.kind().to_string(),
                map_size: training.environment.map_size.to_string(),
                reward_scheme: training.environment.reward_scheme.to_string(),
                loss: training.loss.to_string(),
                seed: trained.metadata.seed,
                resumed: trained.resumed,
                episodes_trained: trained.metadata.episodes_trained,
                weights: args.weights.clone(),
            },
        };

        let file = File::create(&summary_path)
            .with_context(|| format!("Failed to create {}", summary_path.display()))?;
        to_writer_pretty(file, &summary)?;
        println!("\nSummary written to {}", summary_path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_summary_path() {
        assert_eq!(
            sanitize_summary_path(Path::new("out/summary")),
            PathBuf::from("out/summary.json")
        );
        assert_eq!(
            sanitize_summary_path(Path::new("out/summary.JSON")),
            PathBuf::from("out/summary.JSON")
        );
        let dir = format!("out{}", std::path::MAIN_SEPARATOR);
        assert_eq!(
            sanitize_summary_path(Path::new(&dir)),
            Path::new("out").join("training_summary.json")
        );
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = TrainArgs::parse_from([
            "train",
            "--episodes",
            "12",
            "--alpha",
            "0.1",
            "--map-size",
            "5x4",
            "--reward-scheme",
            "halved-delta",
            "--approximator",
            "table",
            "--seed",
            "7",
        ]);
        let config = args.training_config().unwrap();
        assert_eq!(config.max_episodes, 12);
        assert_eq!(config.alpha, 0.1);
        assert_eq!(config.gamma, 0.7);
        assert_eq!(config.environment.map_size, MapSize::new(5, 4).unwrap());
        assert_eq!(config.environment.reward_scheme, RewardScheme::HalvedDelta);
        assert_eq!(config.approximator, ApproximatorKind::Table);
        assert_eq!(config.seed, Some(7));
        assert!(!args.load);
        assert_eq!(args.weights, PathBuf::from(DEFAULT_WEIGHTS_PATH));
    }

    #[test]
    fn test_config_file_then_flags() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, r#"{"gamma": 0.9, "max_episodes": 40}"#).unwrap();

        let args = TrainArgs::parse_from([
            "train",
            "--config",
            path.to_str().unwrap(),
            "--episodes",
            "5",
        ]);
        let config = args.training_config().unwrap();
        assert_eq!(config.gamma, 0.9);
        assert_eq!(config.max_episodes, 5);
        assert_eq!(config.epsilon, 0.15);
    }

    #[test]
    fn test_invalid_override_rejected() {
        let args = TrainArgs::parse_from(["train", "--gamma", "1.5"]);
        assert!(args.training_config().is_err());
    }
}
