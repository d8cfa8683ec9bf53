//! Dependency injection container for gridseek sessions.
//!
//! The container owns infrastructure dependencies (the parameter repository
//! and a default seed) and wires environments, policies and approximators
//! together for training, evaluation and play.

use std::{io::Write, path::Path, sync::Arc};

use tracing::info;

use super::config::{EvaluationConfig, PlayConfig, SessionConfig};
use crate::{
    Error, Result,
    adapters::MsgPackRepository,
    features::FeatureEncoder,
    grid::{Environment, EnvironmentConfig},
    human::{KeySource, PlayOutcome, PlaySession},
    pipeline::{EvaluationPipeline, EvaluationResult, Observer, TrainingPipeline, TrainingResult},
    ports::ValueFunctionRepository,
    q_learning::{Approximator, EpsilonGreedy, SavedValueFunction, TrainingMetadata},
};

// Offsets keep the environment, policy and initializer streams independent
const POLICY_SEED_OFFSET: u64 = 1;
const INIT_SEED_OFFSET: u64 = 2;

/// Outcome of [`App::train`].
#[derive(Debug, Clone)]
pub struct TrainedSession {
    pub result: TrainingResult,
    pub approximator: Approximator,
    pub metadata: TrainingMetadata,
    /// Whether training continued from saved parameters
    pub resumed: bool,
}

/// Application with dependency injection.
///
/// # Examples
///
/// ## Production usage
///
/// ```no_run
/// use gridseek::app::{App, SessionConfig};
///
/// let app = App::new();
/// let session = app.train(&SessionConfig::default().with_seed(42), Vec::new())?;
/// println!("win rate {:.2}", session.result.win_rate);
/// # Ok::<(), gridseek::Error>(())
/// ```
///
/// ## Testing with dependency injection
///
/// ```
/// use gridseek::app::App;
/// use gridseek::adapters::InMemoryRepository;
///
/// let app = App::for_testing()
///     .with_repository(InMemoryRepository::new())
///     .with_default_seed(42)
///     .build();
/// ```
pub struct App {
    repository: Arc<dyn ValueFunctionRepository + Send + Sync>,
    /// Default random seed (None = non-deterministic)
    default_seed: Option<u64>,
}

impl App {
    /// Create a new app with production defaults.
    ///
    /// Uses `MsgPackRepository` and no default seed.
    pub fn new() -> Self {
        Self {
            repository: Arc::new(MsgPackRepository::new()),
            default_seed: None,
        }
    }

    /// Create a builder for constructing an app with custom dependencies.
    pub fn for_testing() -> AppBuilder {
        AppBuilder::new()
    }

    pub fn repository(&self) -> Arc<dyn ValueFunctionRepository + Send + Sync> {
        Arc::clone(&self.repository)
    }

    fn seed(&self, configured: Option<u64>) -> Option<u64> {
        configured.or(self.default_seed)
    }

    /// Environment seeded from `seed`, or from entropy when absent.
    pub fn create_environment(&self, config: EnvironmentConfig, seed: Option<u64>) -> Environment {
        Environment::new(config, crate::q_learning::policy::build_rng(self.seed(seed)))
    }

    /// Load saved parameters, rejecting unsupported versions.
    pub fn load(&self, path: &Path) -> Result<(Approximator, TrainingMetadata)> {
        let saved = self.repository.load(path)?;
        let metadata = saved.metadata.clone();
        let approximator = saved.into_approximator()?;
        info!(
            path = %path.display(),
            approximator = %approximator.kind(),
            episodes = metadata.episodes_trained,
            "loaded parameters"
        );
        Ok((approximator, metadata))
    }

    pub fn save(
        &self,
        approximator: &Approximator,
        metadata: &TrainingMetadata,
        path: &Path,
    ) -> Result<()> {
        let saved = SavedValueFunction::new(approximator.clone(), metadata.clone());
        self.repository.save(&saved, path)?;
        info!(path = %path.display(), "saved parameters");
        Ok(())
    }

    /// Approximator for a session: loaded when resuming, fresh otherwise.
    ///
    /// A failed load is returned as an error; it never falls back to fresh
    /// parameters.
    pub fn create_approximator(
        &self,
        config: &SessionConfig,
    ) -> Result<(Approximator, Option<TrainingMetadata>)> {
        let training = &config.training;
        let encoder = FeatureEncoder::new(training.environment.map_size);

        if config.resume {
            let (approximator, metadata) = self.load(&config.weights_path)?;
            check_input_len(&approximator, &encoder)?;
            return Ok((approximator, Some(metadata)));
        }

        let seed = self
            .seed(training.seed)
            .map(|s| s.wrapping_add(INIT_SEED_OFFSET));
        let approximator = Approximator::build(
            training.approximator,
            training.environment.map_size,
            training.output_activation,
            seed,
        )?;
        Ok((approximator, None))
    }

    /// Train, then persist the parameters to `config.weights_path`.
    pub fn train(
        &self,
        config: &SessionConfig,
        observers: Vec<Box<dyn Observer>>,
    ) -> Result<TrainedSession> {
        let training = &config.training;
        training.validate()?;

        let (mut approximator, previous) = self.create_approximator(config)?;
        let resumed = previous.is_some();
        if resumed {
            info!(path = %config.weights_path.display(), "resuming training");
        }

        let seed = self.seed(training.seed);
        let mut env = self.create_environment(training.environment, seed);
        let mut policy = EpsilonGreedy::new(training.epsilon)
            .with_decay(training.epsilon_decay, training.min_epsilon);
        if let Some(seed) = seed {
            policy = policy.with_seed(seed.wrapping_add(POLICY_SEED_OFFSET));
        }

        let mut pipeline = observers
            .into_iter()
            .fold(TrainingPipeline::new(training.clone()), |pipeline, observer| {
                pipeline.with_observer(observer)
            });
        let result = pipeline.run(&mut env, &mut policy, &mut approximator)?;

        let metadata = TrainingMetadata {
            episodes_trained: previous.map_or(0, |m| m.episodes_trained) + result.episodes,
            seed,
            map_size: training.environment.map_size,
            reward_scheme: training.environment.reward_scheme,
            description: config.description.clone(),
        };
        self.save(&approximator, &metadata, &config.weights_path)?;

        Ok(TrainedSession {
            result,
            approximator,
            metadata,
            resumed,
        })
    }

    /// Greedy roll-outs of saved parameters.
    pub fn evaluate(
        &self,
        config: &EvaluationConfig,
        observers: Vec<Box<dyn Observer>>,
    ) -> Result<EvaluationResult> {
        let (approximator, metadata) = self.load(&config.weights_path)?;
        check_input_len(&approximator, &FeatureEncoder::new(metadata.map_size))?;
        let environment = EnvironmentConfig {
            map_size: metadata.map_size,
            max_steps: config.max_steps,
            reward_scheme: metadata.reward_scheme,
        };
        let mut env = self.create_environment(environment, config.seed);

        let mut pipeline = observers.into_iter().fold(
            EvaluationPipeline::new(config.episodes).with_render(config.render),
            |pipeline, observer| pipeline.with_observer(observer),
        );
        pipeline.run(&mut env, &approximator)
    }

    /// One human-controlled episode.
    pub fn play<K: KeySource, W: Write>(
        &self,
        config: &PlayConfig,
        keys: K,
        out: W,
    ) -> Result<PlayOutcome> {
        let mut env = self.create_environment(config.environment, config.seed);
        PlaySession::new(&mut env, keys, out).run()
    }
}

fn check_input_len(approximator: &Approximator, encoder: &FeatureEncoder) -> Result<()> {
    if approximator.input_len() != encoder.len() {
        return Err(Error::FeatureLength {
            expected: approximator.input_len(),
            got: encoder.len(),
        });
    }
    Ok(())
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for constructing an app with custom dependencies.
///
/// Primarily used for testing to inject in-memory repositories and control
/// randomness.
pub struct AppBuilder {
    repository: Option<Arc<dyn ValueFunctionRepository + Send + Sync>>,
    default_seed: Option<u64>,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            repository: None,
            default_seed: None,
        }
    }

    pub fn with_repository<R: ValueFunctionRepository + Send + Sync + 'static>(
        mut self,
        repo: R,
    ) -> Self {
        self.repository = Some(Arc::new(repo));
        self
    }

    /// Seed used whenever a session does not configure its own.
    pub fn with_default_seed(mut self, seed: u64) -> Self {
        self.default_seed = Some(seed);
        self
    }

    /// Build the app; defaults to `MsgPackRepository`.
    pub fn build(self) -> App {
        App {
            repository: self
                .repository
                .unwrap_or_else(|| Arc::new(MsgPackRepository::new())),
            default_seed: self.default_seed,
        }
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        adapters::InMemoryRepository,
        pipeline::TrainingConfig,
        q_learning::{ApproximatorKind, OutputActivation},
        types::MapSize,
    };

    fn small_config() -> SessionConfig {
        SessionConfig::new(TrainingConfig {
            max_episodes: 30,
            visual_interval: 0,
            approximator: ApproximatorKind::Table,
            environment: EnvironmentConfig {
                map_size: MapSize::new(4, 4).unwrap(),
                max_steps: 12,
                ..EnvironmentConfig::default()
            },
            ..TrainingConfig::default()
        })
        .with_weights_path("mem/weights")
    }

    #[test]
    fn test_train_saves_through_repository() {
        let repo = InMemoryRepository::new();
        let app = App::for_testing()
            .with_repository(repo.clone())
            .with_default_seed(42)
            .build();

        let session = app.train(&small_config(), Vec::new()).unwrap();
        assert!(!session.resumed);
        assert_eq!(session.result.episodes, 30);
        assert!(repo.contains(Path::new("mem/weights")));
        assert_eq!(session.metadata.seed, Some(42));
    }

    #[test]
    fn test_resume_accumulates_episode_count() {
        let repo = InMemoryRepository::new();
        let app = App::for_testing()
            .with_repository(repo)
            .with_default_seed(3)
            .build();

        app.train(&small_config(), Vec::new()).unwrap();
        let session = app
            .train(&small_config().with_resume(true), Vec::new())
            .unwrap();
        assert!(session.resumed);
        assert_eq!(session.metadata.episodes_trained, 60);
    }

    #[test]
    fn test_resume_without_saved_parameters_fails() {
        let app = App::for_testing()
            .with_repository(InMemoryRepository::new())
            .build();
        let err = app
            .train(&small_config().with_resume(true), Vec::new())
            .unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_resume_rejects_mismatched_map_size() {
        let app = App::for_testing()
            .with_repository(InMemoryRepository::new())
            .with_default_seed(1)
            .build();
        app.train(&small_config(), Vec::new()).unwrap();

        let mut config = small_config().with_resume(true);
        config.training.environment.map_size = MapSize::new(5, 5).unwrap();
        let err = app.train(&config, Vec::new()).unwrap_err();
        assert!(matches!(
            err,
            Error::FeatureLength {
                expected: 16,
                got: 25
            }
        ));
    }

    #[test]
    fn test_evaluate_rejects_zero_sized_saved_map() {
        let repo = InMemoryRepository::new();
        let table = Approximator::build(
            ApproximatorKind::Table,
            MapSize::new(2, 2).unwrap(),
            OutputActivation::Linear,
            None,
        )
        .unwrap();
        let metadata = TrainingMetadata {
            map_size: MapSize {
                width: 0,
                height: 0,
            },
            ..TrainingMetadata::default()
        };
        repo.save(&SavedValueFunction::new(table, metadata), Path::new("w"))
            .unwrap();

        let app = App::for_testing().with_repository(repo).build();
        let result = app.evaluate(&EvaluationConfig::new("w").with_episodes(1), Vec::new());
        assert!(matches!(result, Err(Error::SerializationContext { .. })));
    }

    #[test]
    fn test_evaluate_rejects_map_size_not_matching_parameters() {
        let repo = InMemoryRepository::new();
        let table = Approximator::build(
            ApproximatorKind::Table,
            MapSize::new(4, 4).unwrap(),
            OutputActivation::Linear,
            None,
        )
        .unwrap();
        let metadata = TrainingMetadata {
            map_size: MapSize::new(5, 5).unwrap(),
            ..TrainingMetadata::default()
        };
        repo.save(&SavedValueFunction::new(table, metadata), Path::new("w"))
            .unwrap();

        let app = App::for_testing().with_repository(repo).build();
        let err = app
            .evaluate(&EvaluationConfig::new("w").with_episodes(1), Vec::new())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::FeatureLength {
                expected: 16,
                got: 25
            }
        ));
    }

    #[test]
    fn test_seeded_sessions_are_reproducible() {
        let run = || {
            App::for_testing()
                .with_repository(InMemoryRepository::new())
                .build()
                .train(&small_config().with_seed(9), Vec::new())
                .unwrap()
                .result
        };
        assert_eq!(run(), run());
    }
}
