//! Value-function port - per-action value estimates with in-place updates
//!
//! The training loop only needs two things from an approximator: a vector of
//! action values for a feature vector, and a way to move those values toward a
//! TD target. Anything satisfying that contract (a small network, a lookup
//! table, a linear model) can be plugged in.

use crate::{Result, q_learning::TdLoss};

/// Inputs defining one TD update.
#[derive(Debug, Clone, Copy)]
pub struct TdUpdate<'a> {
    /// Encoded state the update applies to
    pub features: &'a [f64],
    /// Action taken in that state
    pub action: usize,
    /// `reward + gamma * max V(next_state)`
    pub target: f64,
    pub learning_rate: f64,
    pub loss: TdLoss,
}

/// Approximator mapping a feature vector to one value per action.
///
/// # Examples
///
/// ```no_run
/// use gridseek::ports::{TdUpdate, ValueFunction};
/// use gridseek::q_learning::TdLoss;
///
/// fn nudge(vf: &mut dyn ValueFunction, features: &[f64]) -> gridseek::Result<f64> {
///     vf.apply_update(&TdUpdate {
///         features,
///         action: 0,
///         target: 1.0,
///         learning_rate: 0.03,
///         loss: TdLoss::TakenAction,
///     })
/// }
/// ```
pub trait ValueFunction: Send {
    /// Length of the vectors returned by [`evaluate`](Self::evaluate).
    fn num_actions(&self) -> usize;

    /// Per-action value estimates for `features`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FeatureLength`](crate::Error::FeatureLength) if the
    /// vector does not match the approximator's input size.
    fn evaluate(&self, features: &[f64]) -> Result<Vec<f64>>;

    /// Take one gradient step on the squared TD error and return the loss
    /// measured before the step.
    fn apply_update(&mut self, update: &TdUpdate<'_>) -> Result<f64>;

    /// Short identifier used in logs and saved metadata.
    fn name(&self) -> &str;
}
