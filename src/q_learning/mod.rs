//! Online TD control for the grid world
//!
//! Everything the training loop needs beyond the environment itself:
//!
//! - [`EpsilonGreedy`]: action selection over per-action value estimates
//! - [`QNetwork`] and [`QTable`]: value functions implementing
//!   [`ValueFunction`](crate::ports::ValueFunction)
//! - [`TdLoss`]: how the squared TD error is formed
//! - [`SavedValueFunction`]: versioned on-disk form of a trained approximator
//!
//! The update is Q-learning style: the target bootstraps from
//! `max_a V(next_state)[a]` regardless of which action is taken next, and it
//! is treated as a constant (semi-gradient).

pub mod loss;
pub mod network;
pub mod policy;
pub mod q_table;
pub mod serialization;

// Public re-exports
pub use loss::TdLoss;
pub use network::{OutputActivation, QNetwork};
pub use policy::{EpsilonGreedy, argmax};
pub use q_table::QTable;
pub use serialization::{Approximator, ApproximatorKind, SavedValueFunction, TrainingMetadata};
