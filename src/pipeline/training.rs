//! Online TD training loop

use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    Error, Result,
    features::FeatureEncoder,
    grid::{
        ACTION_COUNT, Action, Environment, EnvironmentConfig, EpisodeStatus, StepOutcome,
        TerminationReasons,
    },
    ports::{EpisodeSummary, Frame, Observer, StepRecord, TdUpdate, ValueFunction},
    q_learning::{ApproximatorKind, EpsilonGreedy, OutputActivation, TdLoss, argmax},
};

/// Reward value counted as a penalty in the statistics.
const PENALTY_REWARD: f64 = -1.0;

/// Training configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Episodes are numbered `1..=max_episodes`
    pub max_episodes: usize,

    /// Learning rate
    pub alpha: f64,

    /// Discount
    pub gamma: f64,

    /// Exploration probability
    pub epsilon: f64,

    /// Multiplicative epsilon decay applied after each episode
    pub epsilon_decay: f64,

    /// Floor for decayed epsilon
    pub min_epsilon: f64,

    /// Every n-th episode is rendered; 0 disables rendering
    pub visual_interval: usize,

    pub loss: TdLoss,

    /// Random seed
    pub seed: Option<u64>,

    pub environment: EnvironmentConfig,

    pub approximator: ApproximatorKind,

    pub output_activation: OutputActivation,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            max_episodes: 100_000,
            alpha: 3e-2,
            gamma: 7e-1,
            epsilon: 1.5e-1,
            epsilon_decay: 1.0,
            min_epsilon: 0.0,
            visual_interval: 100,
            loss: TdLoss::default(),
            seed: None,
            environment: EnvironmentConfig::default(),
            approximator: ApproximatorKind::default(),
            output_activation: OutputActivation::default(),
        }
    }
}

impl TrainingConfig {
    /// Check hyperparameter ranges.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] naming the first bad setting.
    pub fn validate(&self) -> Result<()> {
        let invalid =
            |message: String| -> Result<()> { Err(Error::InvalidConfiguration { message }) };

        if !(self.alpha.is_finite() && self.alpha > 0.0) {
            return invalid(format!("alpha must be positive, got {}", self.alpha));
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return invalid(format!("gamma must be in [0, 1], got {}", self.gamma));
        }
        if !(0.0..=1.0).contains(&self.epsilon) {
            return invalid(format!("epsilon must be in [0, 1], got {}", self.epsilon));
        }
        if !(self.epsilon_decay > 0.0 && self.epsilon_decay <= 1.0) {
            return invalid(format!(
                "epsilon decay must be in (0, 1], got {}",
                self.epsilon_decay
            ));
        }
        if !(0.0..=1.0).contains(&self.min_epsilon) {
            return invalid(format!(
                "min epsilon must be in [0, 1], got {}",
                self.min_epsilon
            ));
        }
        let size = self.environment.map_size;
        if size.width == 0 || size.height == 0 {
            return Err(Error::InvalidMapSize {
                width: size.width,
                height: size.height,
            });
        }
        Ok(())
    }

    /// Load a configuration from a JSON file; missing fields take defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| Error::Io {
            operation: format!("open config {path:?}"),
            source,
        })?;
        let config = serde_json::from_reader(std::io::BufReader::new(file))?;
        Ok(config)
    }
}

/// Result of a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingResult {
    pub episodes: usize,

    /// Transitions processed
    pub epochs: usize,

    /// Episodes whose final reward was positive
    pub wins: usize,

    /// Non-terminal transitions that paid exactly -1
    pub penalties: usize,

    pub reached_target: usize,
    pub out_of_bounds: usize,
    pub step_limit: usize,

    /// Mean undiscounted return per episode
    pub mean_reward: f64,

    pub win_rate: f64,
}

/// Running totals across episodes.
#[derive(Debug, Default)]
pub(crate) struct Tally {
    pub episodes: usize,
    pub epochs: usize,
    pub wins: usize,
    pub penalties: usize,
    pub reached_target: usize,
    pub out_of_bounds: usize,
    pub step_limit: usize,
    pub reward_sum: f64,
}

impl Tally {
    pub fn record(&mut self, summary: &EpisodeSummary) {
        self.episodes += 1;
        self.penalties += summary.penalties;
        self.reward_sum += summary.total_reward;
        if summary.won {
            self.wins += 1;
        }
        if summary.reasons.reached_target {
            self.reached_target += 1;
        }
        if summary.reasons.out_of_bounds {
            self.out_of_bounds += 1;
        }
        if summary.reasons.step_limit {
            self.step_limit += 1;
        }
    }

    pub fn ratio(&self, count: usize) -> f64 {
        if self.episodes > 0 {
            count as f64 / self.episodes as f64
        } else {
            0.0
        }
    }
}

impl From<&Tally> for TrainingResult {
    fn from(tally: &Tally) -> Self {
        Self {
            episodes: tally.episodes,
            epochs: tally.epochs,
            wins: tally.wins,
            penalties: tally.penalties,
            reached_target: tally.reached_target,
            out_of_bounds: tally.out_of_bounds,
            step_limit: tally.step_limit,
            mean_reward: if tally.episodes > 0 {
                tally.reward_sum / tally.episodes as f64
            } else {
                0.0
            },
            win_rate: tally.ratio(tally.wins),
        }
    }
}

pub(crate) fn check_action_count(value_fn: &dyn ValueFunction) -> Result<()> {
    if value_fn.num_actions() != ACTION_COUNT {
        return Err(Error::ValueLength {
            expected: ACTION_COUNT,
            got: value_fn.num_actions(),
        });
    }
    Ok(())
}

pub(crate) fn termination(outcome: &StepOutcome) -> TerminationReasons {
    match outcome.status {
        EpisodeStatus::Terminated(reasons) => reasons,
        _ => TerminationReasons::NONE,
    }
}

/// Epsilon-greedy TD control over one environment
pub struct TrainingPipeline {
    config: TrainingConfig,
    observers: Vec<Box<dyn Observer>>,
}

impl TrainingPipeline {
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            config,
            observers: Vec::new(),
        }
    }

    /// Add an observer to the pipeline
    pub fn with_observer(mut self, observer: Box<dyn Observer>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Train `value_fn` for `max_episodes` episodes.
    ///
    /// Any error from the environment, policy or approximator aborts the run.
    pub fn run<R: Rng>(
        &mut self,
        env: &mut Environment<R>,
        policy: &mut EpsilonGreedy,
        value_fn: &mut dyn ValueFunction,
    ) -> Result<TrainingResult> {
        self.config.validate()?;
        check_action_count(value_fn)?;

        let encoder = FeatureEncoder::new(env.config().map_size);
        let mut tally = Tally::default();
        let mut rolling_wins = 0;

        info!(
            episodes = self.config.max_episodes,
            approximator = value_fn.name(),
            map_size = %env.config().map_size,
            "training started"
        );
        for observer in &mut self.observers {
            observer.on_training_start(self.config.max_episodes)?;
        }

        for episode in 1..=self.config.max_episodes {
            let visualize =
                self.config.visual_interval > 0 && episode % self.config.visual_interval == 0;

            for observer in &mut self.observers {
                observer.on_episode_start(episode)?;
            }

            let mut state = env.reset();
            let mut features = encoder.encode(&state);
            let mut total_reward = 0.0;
            let mut penalties = 0;

            let last = loop {
                let values = value_fn.evaluate(&features)?;
                let action_index = policy.select(&values)?;
                let outcome = env.step(action_index)?;
                let next_features = encoder.encode(&outcome.state);

                let loss = if outcome.done {
                    None
                } else {
                    let next_values = value_fn.evaluate(&next_features)?;
                    let next_max = next_values[argmax(&next_values)?];
                    let target = outcome.reward + self.config.gamma * next_max;
                    let loss = value_fn.apply_update(&TdUpdate {
                        features: &features,
                        action: action_index,
                        target,
                        learning_rate: self.config.alpha,
                        loss: self.config.loss,
                    })?;
                    if outcome.reward == PENALTY_REWARD {
                        penalties += 1;
                    }
                    Some(loss)
                };

                tally.epochs += 1;
                total_reward += outcome.reward;

                let record = StepRecord {
                    episode,
                    state: &state,
                    action: Action::from_index(action_index)?,
                    outcome: &outcome,
                    loss,
                };
                for observer in &mut self.observers {
                    observer.on_step(&record)?;
                }

                if visualize {
                    let frame = Frame {
                        episode,
                        epochs: tally.epochs,
                        rolling_wins,
                        visual_interval: self.config.visual_interval,
                        state: outcome.state,
                        won: None,
                    };
                    for observer in &mut self.observers {
                        observer.on_render(&frame)?;
                    }
                }

                state = outcome.state;
                features = next_features;
                if outcome.done {
                    break outcome;
                }
            };

            let won = last.reward > 0.0;
            if won {
                rolling_wins += 1;
            }

            if visualize {
                let frame = Frame {
                    episode,
                    epochs: tally.epochs,
                    rolling_wins,
                    visual_interval: self.config.visual_interval,
                    state: last.state,
                    won: Some(won),
                };
                for observer in &mut self.observers {
                    observer.on_render(&frame)?;
                }
                debug!(episode, rolling_wins, "visualised episode");
                rolling_wins = 0;
            }

            let summary = EpisodeSummary {
                episode,
                steps: last.state.steps,
                total_reward,
                final_reward: last.reward,
                won,
                reasons: termination(&last),
                penalties,
            };
            tally.record(&summary);
            for observer in &mut self.observers {
                observer.on_episode_end(&summary)?;
            }

            policy.decay_epsilon();
        }

        for observer in &mut self.observers {
            observer.on_training_end()?;
        }

        let result = TrainingResult::from(&tally);
        info!(
            episodes = result.episodes,
            epochs = result.epochs,
            wins = result.wins,
            win_rate = result.win_rate,
            "training finished"
        );
        Ok(result)
    }
}
