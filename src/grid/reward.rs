//! Reward shaping schemes
//!
//! Two formulas exist for the same state machine. [`RewardScheme::BranchTable`]
//! is the default; [`RewardScheme::HalvedDelta`] is the earlier formula, kept
//! so runs made with it stay reproducible.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::environment::TerminationReasons;
use crate::Error;

/// Reward applied when the step counter exceeds the limit (branch table).
pub const STEP_LIMIT_PENALTY: f64 = -1.0;
/// Reward applied when the player lands on the target (branch table).
pub const TARGET_BONUS: f64 = 0.5;
/// Reward applied when the player leaves the map (branch table).
pub const OUT_OF_MAP_PENALTY: f64 = -0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RewardScheme {
    /// Fixed +/-0.25 or +/-0.5 per move depending on the distance delta.
    #[default]
    BranchTable,
    /// Half the distance delta (negative deltas scaled by 1.5), terminal
    /// bonuses of +/-1, and the whole sum halved.
    HalvedDelta,
}

impl RewardScheme {
    const NAMES: &'static str = "branch-table, halved-delta";

    /// Total reward for one transition.
    ///
    /// `delta` is `previous_distance - new_distance`, or `None` when the
    /// player stayed put (no shaping). Terminal contributions are additive.
    pub fn reward(self, delta: Option<f64>, reasons: TerminationReasons) -> f64 {
        match self {
            RewardScheme::BranchTable => {
                let mut reward = delta.map_or(0.0, branch_shaping);
                if reasons.step_limit {
                    reward += STEP_LIMIT_PENALTY;
                }
                if reasons.reached_target {
                    reward += TARGET_BONUS;
                }
                if reasons.out_of_bounds {
                    reward += OUT_OF_MAP_PENALTY;
                }
                reward
            }
            RewardScheme::HalvedDelta => {
                let mut reward = 0.0;
                if let Some(delta) = delta {
                    reward += delta / 2.0;
                    if reward < 0.0 {
                        reward *= 1.5;
                    }
                }
                if reasons.step_limit {
                    reward -= 1.0;
                }
                if reasons.reached_target {
                    reward += 1.0;
                }
                if reasons.out_of_bounds {
                    reward -= 1.0;
                }
                reward / 2.0
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RewardScheme::BranchTable => "branch-table",
            RewardScheme::HalvedDelta => "halved-delta",
        }
    }
}

fn branch_shaping(delta: f64) -> f64 {
    if delta < 0.0 {
        if delta.abs() < 1.0 { -0.25 } else { -0.5 }
    } else if delta > 0.0 {
        if delta < 1.0 { 0.25 } else { 0.5 }
    } else {
        0.0
    }
}

impl fmt::Display for RewardScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RewardScheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "branch-table" | "branch" | "table" => Ok(RewardScheme::BranchTable),
            "halved-delta" | "legacy" => Ok(RewardScheme::HalvedDelta),
            other => Err(Error::ParseRewardScheme {
                input: other.to_string(),
                expected: Self::NAMES.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONE: TerminationReasons = TerminationReasons::NONE;

    #[test]
    fn test_branch_table_rows() {
        let scheme = RewardScheme::BranchTable;
        assert_eq!(scheme.reward(Some(-0.4), NONE), -0.25);
        assert_eq!(scheme.reward(Some(-1.0), NONE), -0.5);
        assert_eq!(scheme.reward(Some(-1.7), NONE), -0.5);
        assert_eq!(scheme.reward(Some(0.4), NONE), 0.25);
        assert_eq!(scheme.reward(Some(1.0), NONE), 0.5);
        assert_eq!(scheme.reward(Some(2.3), NONE), 0.5);
        assert_eq!(scheme.reward(Some(0.0), NONE), 0.0);
        assert_eq!(scheme.reward(None, NONE), 0.0);
    }

    #[test]
    fn test_branch_table_terminal_contributions_add_up() {
        let all = TerminationReasons {
            reached_target: true,
            out_of_bounds: false,
            step_limit: true,
        };
        // +0.5 shaping, +0.5 target, -1.0 step limit
        assert_eq!(RewardScheme::BranchTable.reward(Some(1.0), all), 0.0);

        let out = TerminationReasons {
            out_of_bounds: true,
            ..NONE
        };
        assert_eq!(RewardScheme::BranchTable.reward(Some(-1.0), out), -1.0);
    }

    #[test]
    fn test_halved_delta_formula() {
        let scheme = RewardScheme::HalvedDelta;
        assert_eq!(scheme.reward(Some(1.0), NONE), 0.25);
        // -1/2 * 1.5 = -0.75, halved
        assert_eq!(scheme.reward(Some(-1.0), NONE), -0.375);

        let target = TerminationReasons {
            reached_target: true,
            ..NONE
        };
        // (0.5 + 1.0) / 2
        assert_eq!(scheme.reward(Some(1.0), target), 0.75);
    }

    #[test]
    fn test_parse_scheme_names() {
        assert_eq!(
            "branch-table".parse::<RewardScheme>().unwrap(),
            RewardScheme::BranchTable
        );
        assert_eq!(
            "Legacy".parse::<RewardScheme>().unwrap(),
            RewardScheme::HalvedDelta
        );
        assert!(matches!(
            "quadratic".parse::<RewardScheme>(),
            Err(Error::ParseRewardScheme { .. })
        ));
    }
}
