//! Flattened one-hot style encoding of a grid state

use crate::{grid::GridState, types::MapSize};

/// Player cell value
pub const PLAYER_MARK: f64 = -1.0;
/// Target cell value
pub const TARGET_MARK: f64 = 1.0;

/// Maps a [`GridState`] to a vector of `width * height` values.
///
/// Cell `(x, y)` lives at index `y * width + x`. Every entry is zero except the
/// player (`-1`) and the target (`+1`). The target is written last, so a player
/// standing on the target encodes as a single `+1`. An off-map player has no
/// cell and is simply not written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureEncoder {
    map_size: MapSize,
}

impl FeatureEncoder {
    pub fn new(map_size: MapSize) -> Self {
        Self { map_size }
    }

    /// Length of every vector produced by [`encode`](Self::encode).
    pub fn len(&self) -> usize {
        self.map_size.cells()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn encode(&self, state: &GridState) -> Vec<f64> {
        let mut features = vec![0.0; self.len()];
        if let Some(i) = self.map_size.index_of(state.player_position) {
            features[i] = PLAYER_MARK;
        }
        if let Some(i) = self.map_size.index_of(state.target_position) {
            features[i] = TARGET_MARK;
        }
        features
    }
}
