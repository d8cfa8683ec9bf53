//! Configuration types for session composition.

use std::path::{Path, PathBuf};

use crate::{
    grid::{EnvironmentConfig, environment::MAX_STEPS},
    pipeline::TrainingConfig,
};

/// Default location of persisted parameters.
pub const DEFAULT_WEIGHTS_PATH: &str = "weights.msgpack";

/// Configuration for one training session.
///
/// Wraps the hyperparameters with the persistence settings the composition
/// root needs: where parameters live and whether to resume from them.
///
/// # Examples
///
/// ```
/// use gridseek::app::SessionConfig;
/// use gridseek::pipeline::TrainingConfig;
///
/// let config = SessionConfig::new(TrainingConfig::default())
///     .with_seed(42)
///     .with_resume(true)
///     .with_weights_path("run/weights.msgpack");
/// assert!(config.resume);
/// ```
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub training: TrainingConfig,
    /// Load parameters from `weights_path` before training
    pub resume: bool,
    pub weights_path: PathBuf,
    /// Free text stored with the saved parameters
    pub description: String,
}

impl SessionConfig {
    pub fn new(training: TrainingConfig) -> Self {
        Self {
            training,
            resume: false,
            weights_path: PathBuf::from(DEFAULT_WEIGHTS_PATH),
            description: String::new(),
        }
    }

    /// Set the random seed for deterministic behavior.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.training.seed = Some(seed);
        self
    }

    pub fn with_resume(mut self, resume: bool) -> Self {
        self.resume = resume;
        self
    }

    pub fn with_weights_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.weights_path = path.as_ref().to_path_buf();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(TrainingConfig::default())
    }
}

/// Configuration for greedy evaluation of saved parameters.
///
/// The map size and reward scheme come from the saved metadata.
#[derive(Debug, Clone)]
pub struct EvaluationConfig {
    pub weights_path: PathBuf,
    pub episodes: usize,
    pub max_steps: u32,
    pub render: bool,
    pub seed: Option<u64>,
}

impl EvaluationConfig {
    pub fn new<P: AsRef<Path>>(weights_path: P) -> Self {
        Self {
            weights_path: weights_path.as_ref().to_path_buf(),
            episodes: 100,
            max_steps: MAX_STEPS,
            render: false,
            seed: None,
        }
    }

    pub fn with_episodes(mut self, episodes: usize) -> Self {
        self.episodes = episodes;
        self
    }

    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_render(mut self, render: bool) -> Self {
        self.render = render;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Configuration for a human play session.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlayConfig {
    pub environment: EnvironmentConfig,
    pub seed: Option<u64>,
}
