//! Newtype wrappers for grid coordinates and dimensions.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// An integer cell coordinate.
///
/// Coordinates are signed because a move may carry the player one cell past
/// the border; that position is a terminal state, not an invalid value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Component-wise translation by a displacement.
    pub const fn offset(self, (dx, dy): (i32, i32)) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Euclidean distance to another position.
    pub fn distance(self, other: Position) -> f64 {
        let dx = f64::from(other.x - self.x);
        let dy = f64::from(other.y - self.y);
        (dx * dx + dy * dy).sqrt()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.y)
    }
}

/// Grid dimensions (width, height), both positive.
///
/// Deserialization goes through [`MapSize::new`], so a zero dimension in a
/// config or parameter file is rejected at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawMapSize")]
pub struct MapSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Deserialize)]
struct RawMapSize {
    width: u32,
    height: u32,
}

impl TryFrom<RawMapSize> for MapSize {
    type Error = Error;

    fn try_from(raw: RawMapSize) -> Result<Self, Self::Error> {
        MapSize::new(raw.width, raw.height)
    }
}

impl MapSize {
    /// Create a map size, rejecting zero-sized dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMapSize`] if either dimension is zero.
    pub fn new(width: u32, height: u32) -> Result<Self, Error> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidMapSize { width, height });
        }
        Ok(Self { width, height })
    }

    /// Number of cells on the map.
    pub fn cells(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Upper bound (exclusive) for spawn coordinates on both axes.
    ///
    /// Uses the smaller dimension so rectangular maps never spawn off-grid.
    pub fn spawn_extent(&self) -> u32 {
        self.width.min(self.height)
    }

    /// Whether `position` lies inside `[0, width) x [0, height)`.
    pub fn contains(&self, position: Position) -> bool {
        position.x >= 0
            && position.y >= 0
            && (position.x as i64) < i64::from(self.width)
            && (position.y as i64) < i64::from(self.height)
    }

    /// Row-major cell index of an on-map position.
    pub fn index_of(&self, position: Position) -> Option<usize> {
        if self.contains(position) {
            Some(position.y as usize * self.width as usize + position.x as usize)
        } else {
            None
        }
    }
}

impl Default for MapSize {
    fn default() -> Self {
        Self {
            width: 10,
            height: 10,
        }
    }
}

impl fmt::Display for MapSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for MapSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_err = || Error::ParseMapSize {
            input: s.to_string(),
        };
        let (w, h) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(parse_err)?;
        let width = w.trim().parse::<u32>().map_err(|_| parse_err())?;
        let height = h.trim().parse::<u32>().map_err(|_| parse_err())?;
        MapSize::new(width, height)
    }
}
