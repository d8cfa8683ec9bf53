//! Discrete action table

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Number of discrete actions.
pub const ACTION_COUNT: usize = 5;

/// All actions in index order.
pub const ACTIONS: [Action; ACTION_COUNT] = [
    Action::Stay,
    Action::North,
    Action::East,
    Action::South,
    Action::West,
];

/// One of the five moves available to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    #[default]
    Stay,
    North,
    East,
    South,
    West,
}

impl Action {
    /// Look up an action by its index in [`ACTIONS`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAction`] for indices outside `0..ACTION_COUNT`.
    pub fn from_index(index: usize) -> Result<Self> {
        ACTIONS.get(index).copied().ok_or(Error::InvalidAction {
            index,
            max: ACTION_COUNT - 1,
        })
    }

    /// Position of this action in [`ACTIONS`].
    pub const fn index(self) -> usize {
        match self {
            Action::Stay => 0,
            Action::North => 1,
            Action::East => 2,
            Action::South => 3,
            Action::West => 4,
        }
    }

    /// Unit displacement `(dx, dy)`; y grows southwards.
    pub const fn displacement(self) -> (i32, i32) {
        match self {
            Action::Stay => (0, 0),
            Action::North => (0, -1),
            Action::East => (1, 0),
            Action::South => (0, 1),
            Action::West => (-1, 0),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Action::Stay => "stay",
            Action::North => "north",
            Action::East => "east",
            Action::South => "south",
            Action::West => "west",
        }
    }
}

impl TryFrom<usize> for Action {
    type Error = Error;

    fn try_from(index: usize) -> Result<Self> {
        Action::from_index(index)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_roundtrip_covers_table() {
        for (i, action) in ACTIONS.iter().enumerate() {
            assert_eq!(action.index(), i);
            assert_eq!(Action::from_index(i).unwrap(), *action);
        }
    }

    #[test]
    fn test_displacements_are_unit_vectors() {
        assert_eq!(Action::Stay.displacement(), (0, 0));
        for action in &ACTIONS[1..] {
            let (dx, dy) = action.displacement();
            assert_eq!(dx.abs() + dy.abs(), 1, "{action} is not a unit move");
        }
    }

    #[test]
    fn test_out_of_range_index_rejected() {
        assert!(matches!(
            Action::from_index(5),
            Err(Error::InvalidAction { index: 5, max: 4 })
        ));
        assert!(Action::try_from(usize::MAX).is_err());
    }
}
