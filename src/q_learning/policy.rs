//! Epsilon-greedy action selection

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{Error, Result, grid::ACTION_COUNT};

pub(crate) fn build_rng(seed: Option<u64>) -> StdRng {
    if let Some(seed) = seed {
        StdRng::seed_from_u64(seed)
    } else {
        StdRng::from_rng(&mut rand::rng())
    }
}

/// Index of the largest value; ties go to the lowest index.
///
/// # Errors
///
/// Returns [`Error::NonFiniteValue`] if any estimate is NaN or infinite.
pub fn argmax(values: &[f64]) -> Result<usize> {
    let mut best = 0;
    for (action, &value) in values.iter().enumerate() {
        if !value.is_finite() {
            return Err(Error::NonFiniteValue { action });
        }
        if value > values[best] {
            best = action;
        }
    }
    Ok(best)
}

/// Explore uniformly with probability epsilon, otherwise exploit.
///
/// Epsilon optionally decays multiplicatively after each episode down to a
/// floor; with the default decay of 1.0 it stays constant.
#[derive(Debug, Clone)]
pub struct EpsilonGreedy {
    epsilon: f64,
    initial_epsilon: f64,
    epsilon_decay: f64,
    min_epsilon: f64,
    rng: StdRng,
    rng_seed: Option<u64>,
}

impl EpsilonGreedy {
    pub fn new(epsilon: f64) -> Self {
        Self {
            epsilon,
            initial_epsilon: epsilon,
            epsilon_decay: 1.0,
            min_epsilon: 0.0,
            rng: build_rng(None),
            rng_seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self.rng_seed = Some(seed);
        self
    }

    pub fn with_decay(mut self, epsilon_decay: f64, min_epsilon: f64) -> Self {
        self.epsilon_decay = epsilon_decay;
        self.min_epsilon = min_epsilon;
        self
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Pick an action index from per-action value estimates.
    ///
    /// # Errors
    ///
    /// - [`Error::ValueLength`] if `values` does not hold one entry per action.
    /// - [`Error::NonFiniteValue`] if an estimate is NaN or infinite.
    pub fn select(&mut self, values: &[f64]) -> Result<usize> {
        if values.len() != ACTION_COUNT {
            return Err(Error::ValueLength {
                expected: ACTION_COUNT,
                got: values.len(),
            });
        }
        let greedy = argmax(values)?;

        if self.rng.random::<f64>() < self.epsilon {
            // Explore: uniform over the action table
            Ok(self.rng.random_range(0..ACTION_COUNT))
        } else {
            Ok(greedy)
        }
    }

    /// Decay epsilon after episode
    pub fn decay_epsilon(&mut self) {
        self.epsilon = (self.epsilon * self.epsilon_decay).max(self.min_epsilon);
    }

    /// Restore the initial epsilon and reseed.
    pub fn reset(&mut self) {
        self.epsilon = self.initial_epsilon;
        self.rng = build_rng(self.rng_seed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_epsilon_always_exploits() {
        let mut policy = EpsilonGreedy::new(0.0).with_seed(1);
        let values = [0.1, 0.4, -2.0, 0.3, 0.0];
        for _ in 0..100 {
            assert_eq!(policy.select(&values).unwrap(), 1);
        }
    }

    #[test]
    fn test_ties_break_toward_lowest_index() {
        assert_eq!(argmax(&[0.0, 1.0, 1.0, 1.0, 0.5]).unwrap(), 1);
        assert_eq!(argmax(&[2.0; 5]).unwrap(), 0);
    }

    #[test]
    fn test_full_exploration_covers_all_actions() {
        let mut policy = EpsilonGreedy::new(1.0).with_seed(9);
        let mut seen = [false; ACTION_COUNT];
        for _ in 0..500 {
            seen[policy.select(&[0.0; ACTION_COUNT]).unwrap()] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_same_seed_same_choices() {
        let values = [0.3, 0.1, 0.2, 0.0, 0.5];
        let mut a = EpsilonGreedy::new(0.5).with_seed(42);
        let mut b = EpsilonGreedy::new(0.5).with_seed(42);
        for _ in 0..50 {
            assert_eq!(a.select(&values).unwrap(), b.select(&values).unwrap());
        }
    }

    #[test]
    fn test_non_finite_values_rejected() {
        let mut policy = EpsilonGreedy::new(0.0).with_seed(1);
        assert!(matches!(
            policy.select(&[0.0, f64::NAN, 0.0, 0.0, 0.0]),
            Err(Error::NonFiniteValue { action: 1 })
        ));
        assert!(matches!(
            policy.select(&[0.0; 3]),
            Err(Error::ValueLength { expected: 5, got: 3 })
        ));
    }

    #[test]
    fn test_decay_respects_floor() {
        let mut policy = EpsilonGreedy::new(0.5).with_decay(0.5, 0.2);
        policy.decay_epsilon();
        assert_eq!(policy.epsilon(), 0.25);
        policy.decay_epsilon();
        assert_eq!(policy.epsilon(), 0.2);
        policy.reset();
        assert_eq!(policy.epsilon(), 0.5);
    }
}
