//! Snapshot of a single episode

use serde::{Deserialize, Serialize};

use super::action::Action;
use crate::types::{MapSize, Position};

/// Mutable episode state owned by the [`Environment`](super::Environment).
///
/// Callers only ever receive copies, so a snapshot handed out by `reset` or
/// `step` never changes underneath them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridState {
    pub map_size: MapSize,
    pub player_position: Position,
    pub target_position: Position,
    pub steps: u32,
    pub last_action: Action,
    pub last_reward: f64,
}

impl GridState {
    /// Fresh state at step zero.
    pub fn new(map_size: MapSize, player_position: Position, target_position: Position) -> Self {
        Self {
            map_size,
            player_position,
            target_position,
            steps: 0,
            last_action: Action::Stay,
            last_reward: 0.0,
        }
    }

    /// Euclidean distance between player and target.
    pub fn distance(&self) -> f64 {
        self.player_position.distance(self.target_position)
    }

    pub fn on_target(&self) -> bool {
        self.player_position == self.target_position
    }

    pub fn out_of_map(&self) -> bool {
        !self.map_size.contains(self.player_position)
    }
}
