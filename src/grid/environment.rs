//! Transition function, reward shaping and termination policy

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use super::{action::Action, reward::RewardScheme, state::GridState};
use crate::{
    Error, Result,
    types::{MapSize, Position},
};

/// Default step limit per episode.
pub const MAX_STEPS: u32 = 100;

/// Construction-time settings for an [`Environment`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Grid dimensions
    pub map_size: MapSize,

    /// Episodes end once `steps > max_steps`
    pub max_steps: u32,

    /// Reward formula
    pub reward_scheme: RewardScheme,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            map_size: MapSize::default(),
            max_steps: MAX_STEPS,
            reward_scheme: RewardScheme::default(),
        }
    }
}

/// Which terminal conditions fired on a transition.
///
/// More than one can hold at once, e.g. reaching the target on the same move
/// the step limit is exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TerminationReasons {
    pub reached_target: bool,
    pub out_of_bounds: bool,
    pub step_limit: bool,
}

impl TerminationReasons {
    pub const NONE: Self = Self {
        reached_target: false,
        out_of_bounds: false,
        step_limit: false,
    };

    pub fn any(&self) -> bool {
        self.reached_target || self.out_of_bounds || self.step_limit
    }
}

/// Lifecycle of the current episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EpisodeStatus {
    /// No episode has been started yet
    #[default]
    NotStarted,
    Running,
    /// Absorbing until the next `reset`
    Terminated(TerminationReasons),
}

/// Reserved extension slot returned with every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StepInfo {}

/// Result of [`Environment::step`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    pub state: GridState,
    pub reward: f64,
    pub done: bool,
    pub status: EpisodeStatus,
    pub info: StepInfo,
}

/// Grid-world environment.
///
/// Owns the live [`GridState`] and the random source used for spawning.
/// The RNG is injected so tests and training runs are reproducible.
#[derive(Debug, Clone)]
pub struct Environment<R: Rng = StdRng> {
    config: EnvironmentConfig,
    state: GridState,
    last_distance: f64,
    status: EpisodeStatus,
    rng: R,
}

impl Environment<StdRng> {
    /// Environment with a deterministic RNG.
    pub fn with_seed(config: EnvironmentConfig, seed: u64) -> Self {
        Self::new(config, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Environment<R> {
    pub fn new(config: EnvironmentConfig, rng: R) -> Self {
        let origin = Position::default();
        Self {
            config,
            state: GridState::new(config.map_size, origin, origin),
            last_distance: 0.0,
            status: EpisodeStatus::NotStarted,
            rng,
        }
    }

    pub fn config(&self) -> &EnvironmentConfig {
        &self.config
    }

    pub fn state(&self) -> &GridState {
        &self.state
    }

    pub fn status(&self) -> EpisodeStatus {
        self.status
    }

    /// Distance recorded after the last reset or move.
    pub fn last_distance(&self) -> f64 {
        self.last_distance
    }

    /// Start a new episode with player and target drawn uniformly from
    /// `[0, min(width, height))^2`.
    pub fn reset(&mut self) -> GridState {
        let extent = self.config.map_size.spawn_extent() as i32;
        let target = Position::new(
            self.rng.random_range(0..extent),
            self.rng.random_range(0..extent),
        );
        let player = Position::new(
            self.rng.random_range(0..extent),
            self.rng.random_range(0..extent),
        );
        self.reset_to(player, target)
    }

    /// Start a new episode from explicit positions.
    pub fn reset_to(&mut self, player: Position, target: Position) -> GridState {
        self.state = GridState::new(self.config.map_size, player, target);
        self.last_distance = self.state.distance();
        self.status = EpisodeStatus::Running;
        self.state
    }

    /// Apply the action with the given index.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidAction`] if `action_index` is not in the action
    ///   table. The state is left untouched.
    /// - [`Error::EpisodeFinished`] if the episode already terminated.
    /// - [`Error::NotStarted`] if `reset` was never called.
    pub fn step(&mut self, action_index: usize) -> Result<StepOutcome> {
        let action = Action::from_index(action_index)?;
        match self.status {
            EpisodeStatus::Running => {}
            EpisodeStatus::NotStarted => return Err(Error::NotStarted),
            EpisodeStatus::Terminated(_) => return Err(Error::EpisodeFinished),
        }

        let state = &mut self.state;
        state.player_position = state.player_position.offset(action.displacement());
        state.steps += 1;
        state.last_action = action;

        let delta = if action == Action::Stay {
            None
        } else {
            let new_distance = state.distance();
            let delta = self.last_distance - new_distance;
            self.last_distance = new_distance;
            Some(delta)
        };

        let reasons = TerminationReasons {
            reached_target: state.on_target(),
            out_of_bounds: state.out_of_map(),
            step_limit: state.steps > self.config.max_steps,
        };
        let reward = self.config.reward_scheme.reward(delta, reasons);
        let done = reasons.any();

        state.last_reward = reward;
        self.status = if done {
            EpisodeStatus::Terminated(reasons)
        } else {
            EpisodeStatus::Running
        };

        Ok(StepOutcome {
            state: *state,
            reward,
            done,
            status: self.status,
            info: StepInfo::default(),
        })
    }
}
