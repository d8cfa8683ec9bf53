//! Grid-world seek task with online TD learning
//!
//! This crate provides:
//! - A bounded grid environment where a player seeks a target, with shaped
//!   rewards and three terminal conditions
//! - Feature encoding of grid states for value-function approximators
//! - An epsilon-greedy policy and a TD training loop over a pluggable
//!   `ValueFunction` (small neural network or table)
//! - Text rendering, keyboard play and MessagePack persistence

pub mod adapters;
pub mod app;
pub mod cli;
pub mod error;
pub mod features;
pub mod grid;
pub mod human;
pub mod pipeline;
pub mod ports;
pub mod q_learning;
pub mod render;
pub mod types;

pub use error::{Error, Result};
pub use features::FeatureEncoder;
pub use grid::{
    ACTION_COUNT, Action, Environment, EnvironmentConfig, GridState, RewardScheme, StepOutcome,
    TerminationReasons,
};
pub use q_learning::{Approximator, EpsilonGreedy, QNetwork, QTable};
pub use types::{MapSize, Position};
