//! Squared-error TD loss conventions

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// How the squared TD error is formed from the per-action value vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TdLoss {
    /// Regress every action value onto the target and average.
    #[default]
    AllActions,
    /// Only the value of the action actually taken.
    TakenAction,
}

impl TdLoss {
    const NAMES: &'static str = "all-actions, taken-action";

    /// Loss value and its gradient with respect to `values`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAction`] if `action` does not index `values`.
    pub fn loss_and_gradient(
        self,
        values: &[f64],
        action: usize,
        target: f64,
    ) -> Result<(f64, Vec<f64>)> {
        if action >= values.len() {
            return Err(Error::InvalidAction {
                index: action,
                max: values.len().saturating_sub(1),
            });
        }

        let mut grad = vec![0.0; values.len()];
        let loss = match self {
            TdLoss::AllActions => {
                let n = values.len() as f64;
                let mut total = 0.0;
                for (g, &q) in grad.iter_mut().zip(values) {
                    let err = q - target;
                    total += err * err;
                    *g = 2.0 * err / n;
                }
                total / n
            }
            TdLoss::TakenAction => {
                let err = values[action] - target;
                grad[action] = 2.0 * err;
                err * err
            }
        };

        Ok((loss, grad))
    }

    pub fn name(self) -> &'static str {
        match self {
            TdLoss::AllActions => "all-actions",
            TdLoss::TakenAction => "taken-action",
        }
    }
}

impl fmt::Display for TdLoss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TdLoss {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all-actions" | "all" | "vector" => Ok(TdLoss::AllActions),
            "taken-action" | "taken" | "action" => Ok(TdLoss::TakenAction),
            other => Err(Error::ParseTdLoss {
                input: other.to_string(),
                expected: Self::NAMES.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_actions_averages_over_vector() {
        let (loss, grad) = TdLoss::AllActions
            .loss_and_gradient(&[1.0, 0.0, 2.0, 1.0], 2, 1.0)
            .unwrap();
        // errors 0, -1, 1, 0
        assert_eq!(loss, 0.5);
        assert_eq!(grad, vec![0.0, -0.5, 0.5, 0.0]);
    }

    #[test]
    fn test_taken_action_touches_single_entry() {
        let (loss, grad) = TdLoss::TakenAction
            .loss_and_gradient(&[1.0, 0.0, 2.0], 2, 0.5)
            .unwrap();
        assert_eq!(loss, 2.25);
        assert_eq!(grad, vec![0.0, 0.0, 3.0]);
    }

    #[test]
    fn test_action_outside_vector_rejected() {
        let result = TdLoss::TakenAction.loss_and_gradient(&[0.0; 5], 5, 0.0);
        assert!(matches!(result, Err(Error::InvalidAction { index: 5, .. })));
    }
}
