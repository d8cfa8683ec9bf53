//! Two-layer feed-forward Q-network trained with plain SGD
//!
//! `features -> Dense(hidden) -> ReLU -> Dense(actions) -> output activation`.
//! Gradients are computed by hand; the network is small enough that a tape or
//! autodiff graph would only add overhead.

use std::{fmt, str::FromStr};

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    ports::{TdUpdate, ValueFunction},
};

/// Width of the hidden layer.
pub const DEFAULT_HIDDEN: usize = 16;

/// Activation applied to the output layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputActivation {
    /// Raw action values, free to go negative.
    #[default]
    Linear,
    /// Clamp action values at zero.
    Relu,
}

impl OutputActivation {
    fn apply(self, x: f64) -> f64 {
        match self {
            OutputActivation::Linear => x,
            OutputActivation::Relu => relu(x),
        }
    }

    fn derivative(self, pre: f64) -> f64 {
        match self {
            OutputActivation::Linear => 1.0,
            OutputActivation::Relu => relu_derivative(pre),
        }
    }
}

impl fmt::Display for OutputActivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputActivation::Linear => f.write_str("linear"),
            OutputActivation::Relu => f.write_str("relu"),
        }
    }
}

impl FromStr for OutputActivation {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" | "identity" => Ok(OutputActivation::Linear),
            "relu" => Ok(OutputActivation::Relu),
            other => Err(Error::InvalidConfiguration {
                message: format!("unknown output activation '{other}' (expected linear or relu)"),
            }),
        }
    }
}

fn relu(x: f64) -> f64 {
    x.max(0.0)
}

fn relu_derivative(pre: f64) -> f64 {
    if pre > 0.0 { 1.0 } else { 0.0 }
}

/// Glorot-uniform weights for an `out x in` matrix.
fn xavier(in_dim: usize, out_dim: usize, rng: &mut impl Rng) -> Vec<f64> {
    let limit = (6.0 / (in_dim + out_dim) as f64).sqrt();
    (0..in_dim * out_dim)
        .map(|_| rng.random_range(-limit..limit))
        .collect()
}

/// Activations kept from the forward pass for backpropagation.
struct Forward {
    hidden_pre: Vec<f64>,
    hidden: Vec<f64>,
    output_pre: Vec<f64>,
    output: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QNetwork {
    inputs: usize,
    hidden: usize,
    outputs: usize,
    /// Row-major `hidden x inputs`
    w1: Vec<f64>,
    b1: Vec<f64>,
    /// Row-major `outputs x hidden`
    w2: Vec<f64>,
    b2: Vec<f64>,
    output_activation: OutputActivation,
}

impl QNetwork {
    /// Create a network with Xavier-initialised weights and zero biases.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if any layer width is zero.
    pub fn new(
        inputs: usize,
        hidden: usize,
        outputs: usize,
        output_activation: OutputActivation,
        rng: &mut impl Rng,
    ) -> Result<Self> {
        if inputs == 0 || hidden == 0 || outputs == 0 {
            return Err(Error::InvalidConfiguration {
                message: format!(
                    "network layers must be non-empty (got {inputs} -> {hidden} -> {outputs})"
                ),
            });
        }

        Ok(Self {
            inputs,
            hidden,
            outputs,
            w1: xavier(inputs, hidden, rng),
            b1: vec![0.0; hidden],
            w2: xavier(hidden, outputs, rng),
            b2: vec![0.0; outputs],
            output_activation,
        })
    }

    /// Same as [`new`](Self::new) with a seeded generator.
    pub fn with_seed(
        inputs: usize,
        hidden: usize,
        outputs: usize,
        output_activation: OutputActivation,
        seed: u64,
    ) -> Result<Self> {
        Self::new(
            inputs,
            hidden,
            outputs,
            output_activation,
            &mut StdRng::seed_from_u64(seed),
        )
    }

    pub fn input_len(&self) -> usize {
        self.inputs
    }

    pub fn hidden_len(&self) -> usize {
        self.hidden
    }

    pub fn output_activation(&self) -> OutputActivation {
        self.output_activation
    }

    /// Total number of trainable parameters.
    pub fn parameter_count(&self) -> usize {
        self.w1.len() + self.b1.len() + self.w2.len() + self.b2.len()
    }

    fn check_input(&self, features: &[f64]) -> Result<()> {
        if features.len() != self.inputs {
            return Err(Error::FeatureLength {
                expected: self.inputs,
                got: features.len(),
            });
        }
        Ok(())
    }

    fn forward(&self, x: &[f64]) -> Forward {
        let mut hidden_pre = self.b1.clone();
        for (j, h) in hidden_pre.iter_mut().enumerate() {
            let row = &self.w1[j * self.inputs..(j + 1) * self.inputs];
            *h += row.iter().zip(x).map(|(w, x)| w * x).sum::<f64>();
        }
        let hidden: Vec<f64> = hidden_pre.iter().copied().map(relu).collect();

        let mut output_pre = self.b2.clone();
        for (o, y) in output_pre.iter_mut().enumerate() {
            let row = &self.w2[o * self.hidden..(o + 1) * self.hidden];
            *y += row.iter().zip(&hidden).map(|(w, h)| w * h).sum::<f64>();
        }
        let output = output_pre
            .iter()
            .map(|&y| self.output_activation.apply(y))
            .collect();

        Forward {
            hidden_pre,
            hidden,
            output_pre,
            output,
        }
    }
}

impl ValueFunction for QNetwork {
    fn num_actions(&self) -> usize {
        self.outputs
    }

    fn evaluate(&self, features: &[f64]) -> Result<Vec<f64>> {
        self.check_input(features)?;
        Ok(self.forward(features).output)
    }

    fn apply_update(&mut self, update: &TdUpdate<'_>) -> Result<f64> {
        self.check_input(update.features)?;
        let x = update.features;
        let fwd = self.forward(x);
        let (loss, grad_out) = update
            .loss
            .loss_and_gradient(&fwd.output, update.action, update.target)?;

        let d_out: Vec<f64> = grad_out
            .iter()
            .zip(&fwd.output_pre)
            .map(|(g, &pre)| g * self.output_activation.derivative(pre))
            .collect();

        // Backpropagate through w2 before it is modified.
        let mut d_hidden = vec![0.0; self.hidden];
        for (o, &d) in d_out.iter().enumerate() {
            if d == 0.0 {
                continue;
            }
            let row = &self.w2[o * self.hidden..(o + 1) * self.hidden];
            for (dh, w) in d_hidden.iter_mut().zip(row) {
                *dh += w * d;
            }
        }
        for (dh, &pre) in d_hidden.iter_mut().zip(&fwd.hidden_pre) {
            *dh *= relu_derivative(pre);
        }

        let lr = update.learning_rate;
        for (o, &d) in d_out.iter().enumerate() {
            if d == 0.0 {
                continue;
            }
            let row = &mut self.w2[o * self.hidden..(o + 1) * self.hidden];
            for (w, h) in row.iter_mut().zip(&fwd.hidden) {
                *w -= lr * d * h;
            }
            self.b2[o] -= lr * d;
        }
        for (j, &d) in d_hidden.iter().enumerate() {
            if d == 0.0 {
                continue;
            }
            let row = &mut self.w1[j * self.inputs..(j + 1) * self.inputs];
            for (w, xi) in row.iter_mut().zip(x) {
                *w -= lr * d * xi;
            }
            self.b1[j] -= lr * d;
        }

        Ok(loss)
    }

    fn name(&self) -> &str {
        "q-network"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::q_learning::TdLoss;

    fn features() -> Vec<f64> {
        let mut x = vec![0.0; 9];
        x[1] = -1.0;
        x[7] = 1.0;
        x
    }

    #[test]
    fn test_shapes_and_seeding() {
        let a = QNetwork::with_seed(9, 4, 5, OutputActivation::Linear, 3).unwrap();
        let b = QNetwork::with_seed(9, 4, 5, OutputActivation::Linear, 3).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.parameter_count(), 9 * 4 + 4 + 4 * 5 + 5);
        assert_eq!(a.evaluate(&features()).unwrap().len(), 5);
    }

    #[test]
    fn test_wrong_feature_length_rejected() {
        let net = QNetwork::with_seed(9, 4, 5, OutputActivation::Linear, 3).unwrap();
        assert!(matches!(
            net.evaluate(&[0.0; 4]),
            Err(Error::FeatureLength {
                expected: 9,
                got: 4
            })
        ));
    }

    #[test]
    fn test_zero_width_layer_rejected() {
        assert!(QNetwork::with_seed(9, 0, 5, OutputActivation::Linear, 1).is_err());
    }

    #[test]
    fn test_relu_output_is_non_negative() {
        let net = QNetwork::with_seed(9, 8, 5, OutputActivation::Relu, 11).unwrap();
        assert!(net.evaluate(&features()).unwrap().iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn test_updates_reduce_loss() {
        let x = features();
        for loss in [TdLoss::AllActions, TdLoss::TakenAction] {
            let mut net =
                QNetwork::with_seed(9, DEFAULT_HIDDEN, 5, OutputActivation::Linear, 5).unwrap();
            let update = TdUpdate {
                features: &x,
                action: 2,
                target: 0.75,
                learning_rate: 0.05,
                loss,
            };
            let first = net.apply_update(&update).unwrap();
            let mut last = first;
            for _ in 0..200 {
                last = net.apply_update(&update).unwrap();
            }
            assert!(last < first, "{loss}: loss went from {first} to {last}");
            assert!(last < 1e-3, "{loss}: final loss {last}");
            let values = net.evaluate(&x).unwrap();
            assert!((values[2] - 0.75).abs() < 0.05);
        }
    }
}
