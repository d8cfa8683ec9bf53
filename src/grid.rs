//! Grid-world environment: action table, episode state, reward shaping and
//! the transition state machine.

pub mod action;
pub mod environment;
pub mod reward;
pub mod state;

pub use action::{ACTION_COUNT, ACTIONS, Action};
pub use environment::{
    Environment, EnvironmentConfig, EpisodeStatus, StepInfo, StepOutcome, TerminationReasons,
};
pub use reward::RewardScheme;
pub use state::GridState;
