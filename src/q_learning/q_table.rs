//! Tabular value function keyed by the encoded grid

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    ports::{TdUpdate, ValueFunction},
};

/// Q-table mapping (state key, action) pairs to Q-values
///
/// The state key is the feature vector written as one character per cell:
/// `p` for the player, `t` for the target, `.` otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QTable {
    q_values: HashMap<(String, usize), f64>,
    inputs: usize,
    actions: usize,
    /// Value reported for unseen state-action pairs
    q_init: f64,
}

impl QTable {
    pub fn new(inputs: usize, actions: usize, q_init: f64) -> Result<Self> {
        if inputs == 0 || actions == 0 {
            return Err(Error::InvalidConfiguration {
                message: format!("q-table needs inputs and actions (got {inputs}, {actions})"),
            });
        }
        Ok(Self {
            q_values: HashMap::new(),
            inputs,
            actions,
            q_init,
        })
    }

    fn state_key(&self, features: &[f64]) -> Result<String> {
        if features.len() != self.inputs {
            return Err(Error::FeatureLength {
                expected: self.inputs,
                got: features.len(),
            });
        }
        Ok(features
            .iter()
            .map(|&v| {
                if v > 0.0 {
                    't'
                } else if v < 0.0 {
                    'p'
                } else {
                    '.'
                }
            })
            .collect())
    }

    /// Get Q-value for a state-action pair
    pub fn get(&self, key: &str, action: usize) -> f64 {
        *self
            .q_values
            .get(&(key.to_string(), action))
            .unwrap_or(&self.q_init)
    }

    /// Set Q-value for a state-action pair
    pub fn set(&mut self, key: String, action: usize, value: f64) {
        self.q_values.insert((key, action), value);
    }

    /// Get total number of Q-values stored
    pub fn size(&self) -> usize {
        self.q_values.len()
    }

    pub fn input_len(&self) -> usize {
        self.inputs
    }
}

impl ValueFunction for QTable {
    fn num_actions(&self) -> usize {
        self.actions
    }

    fn evaluate(&self, features: &[f64]) -> Result<Vec<f64>> {
        let key = self.state_key(features)?;
        Ok((0..self.actions).map(|a| self.get(&key, a)).collect())
    }

    fn apply_update(&mut self, update: &TdUpdate<'_>) -> Result<f64> {
        let key = self.state_key(update.features)?;
        let values: Vec<f64> = (0..self.actions).map(|a| self.get(&key, a)).collect();
        let (loss, grad) = update
            .loss
            .loss_and_gradient(&values, update.action, update.target)?;

        for (action, (q, g)) in values.iter().zip(&grad).enumerate() {
            if *g != 0.0 {
                self.set(key.clone(), action, q - update.learning_rate * g);
            }
        }
        Ok(loss)
    }

    fn name(&self) -> &str {
        "q-table"
    }
}
