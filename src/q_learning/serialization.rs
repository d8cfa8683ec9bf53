//! Serialization support for trained value functions.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    grid::{ACTION_COUNT, RewardScheme},
    ports::{TdUpdate, ValueFunction},
    q_learning::{
        network::{DEFAULT_HIDDEN, OutputActivation, QNetwork},
        q_table::QTable,
    },
    types::MapSize,
};

/// Which approximator to build for a fresh session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApproximatorKind {
    #[default]
    Network,
    Table,
}

impl ApproximatorKind {
    const NAMES: &'static str = "network, table";
}

impl fmt::Display for ApproximatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApproximatorKind::Network => f.write_str("network"),
            ApproximatorKind::Table => f.write_str("table"),
        }
    }
}

impl FromStr for ApproximatorKind {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "network" | "net" | "nn" => Ok(ApproximatorKind::Network),
            "table" | "tabular" | "q-table" => Ok(ApproximatorKind::Table),
            other => Err(Error::ParseApproximator {
                input: other.to_string(),
                expected: Self::NAMES.to_string(),
            }),
        }
    }
}

/// Any of the built-in value functions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Approximator {
    Network(QNetwork),
    Table(QTable),
}

impl Approximator {
    /// Fresh approximator sized for `map_size` cells and the action table.
    pub fn build(
        kind: ApproximatorKind,
        map_size: MapSize,
        output_activation: OutputActivation,
        seed: Option<u64>,
    ) -> Result<Self> {
        let inputs = map_size.cells();
        match kind {
            ApproximatorKind::Network => {
                let mut rng = crate::q_learning::policy::build_rng(seed);
                Ok(Approximator::Network(QNetwork::new(
                    inputs,
                    DEFAULT_HIDDEN,
                    ACTION_COUNT,
                    output_activation,
                    &mut rng,
                )?))
            }
            ApproximatorKind::Table => Ok(Approximator::Table(QTable::new(
                inputs,
                ACTION_COUNT,
                0.0,
            )?)),
        }
    }

    pub fn kind(&self) -> ApproximatorKind {
        match self {
            Approximator::Network(_) => ApproximatorKind::Network,
            Approximator::Table(_) => ApproximatorKind::Table,
        }
    }

    /// Feature-vector length this approximator accepts.
    pub fn input_len(&self) -> usize {
        match self {
            Approximator::Network(net) => net.input_len(),
            Approximator::Table(table) => table.input_len(),
        }
    }

    fn inner(&self) -> &dyn ValueFunction {
        match self {
            Approximator::Network(net) => net,
            Approximator::Table(table) => table,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn ValueFunction {
        match self {
            Approximator::Network(net) => net,
            Approximator::Table(table) => table,
        }
    }
}

impl ValueFunction for Approximator {
    fn num_actions(&self) -> usize {
        self.inner().num_actions()
    }

    fn evaluate(&self, features: &[f64]) -> Result<Vec<f64>> {
        self.inner().evaluate(features)
    }

    fn apply_update(&mut self, update: &TdUpdate<'_>) -> Result<f64> {
        self.inner_mut().apply_update(update)
    }

    fn name(&self) -> &str {
        self.inner().name()
    }
}

/// Provenance stored next to the parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetadata {
    pub episodes_trained: usize,
    pub seed: Option<u64>,
    pub map_size: MapSize,
    pub reward_scheme: RewardScheme,
    pub description: String,
}

impl Default for TrainingMetadata {
    fn default() -> Self {
        Self {
            episodes_trained: 0,
            seed: None,
            map_size: MapSize::default(),
            reward_scheme: RewardScheme::default(),
            description: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedValueFunction {
    pub version: u32,
    pub approximator: Approximator,
    pub metadata: TrainingMetadata,
}

impl SavedValueFunction {
    pub const VERSION: u32 = 1;

    pub fn new(approximator: Approximator, metadata: TrainingMetadata) -> Self {
        Self {
            version: Self::VERSION,
            approximator,
            metadata,
        }
    }

    /// Unwrap the approximator after checking the format version.
    pub fn into_approximator(self) -> Result<Approximator> {
        if self.version != Self::VERSION {
            return Err(Error::UnsupportedVersion {
                found: self.version,
                expected: Self::VERSION,
            });
        }
        Ok(self.approximator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_roundtrip_preserves_outputs() {
        let map_size = MapSize::new(3, 3).unwrap();
        let approximator = Approximator::build(
            ApproximatorKind::Network,
            map_size,
            OutputActivation::Linear,
            Some(4),
        )
        .unwrap();
        let features = [0.0, -1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let before = approximator.evaluate(&features).unwrap();

        let saved = SavedValueFunction::new(approximator, TrainingMetadata::default());
        let bytes = rmp_serde::to_vec(&saved).unwrap();
        let loaded: SavedValueFunction = rmp_serde::from_slice(&bytes).unwrap();
        let restored = loaded.into_approximator().unwrap();

        assert_eq!(restored.kind(), ApproximatorKind::Network);
        assert_eq!(restored.evaluate(&features).unwrap(), before);
    }

    #[test]
    fn test_table_roundtrip_keeps_entries() {
        let map_size = MapSize::new(2, 2).unwrap();
        let mut approximator = Approximator::build(
            ApproximatorKind::Table,
            map_size,
            OutputActivation::Linear,
            None,
        )
        .unwrap();
        let features = [-1.0, 0.0, 0.0, 1.0];
        approximator
            .apply_update(&TdUpdate {
                features: &features,
                action: 2,
                target: 1.0,
                learning_rate: 0.5,
                loss: crate::q_learning::TdLoss::TakenAction,
            })
            .unwrap();

        let bytes = rmp_serde::to_vec(&SavedValueFunction::new(
            approximator,
            TrainingMetadata::default(),
        ))
        .unwrap();
        let loaded: SavedValueFunction = rmp_serde::from_slice(&bytes).unwrap();
        let restored = loaded.into_approximator().unwrap();
        assert_eq!(restored.evaluate(&features).unwrap()[2], 1.0);
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let approximator = Approximator::build(
            ApproximatorKind::Table,
            MapSize::default(),
            OutputActivation::Linear,
            None,
        )
        .unwrap();
        let mut saved = SavedValueFunction::new(approximator, TrainingMetadata::default());
        saved.version = 99;
        assert!(matches!(
            saved.into_approximator(),
            Err(Error::UnsupportedVersion {
                found: 99,
                expected: 1
            })
        ));
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!("table".parse::<ApproximatorKind>().unwrap(), ApproximatorKind::Table);
        assert!("forest".parse::<ApproximatorKind>().is_err());
    }
}
