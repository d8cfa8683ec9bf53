//! Observer port - abstraction for training observation and data collection
//!
//! Observers see every training event without the loop knowing how the data
//! is used: progress bars, JSONL export, aggregate metrics and the terminal
//! renderer all sit behind this one trait.

use serde::{Deserialize, Serialize};

use crate::{
    Result,
    grid::{Action, GridState, StepOutcome, TerminationReasons},
};

/// One accepted transition as seen by the training loop.
#[derive(Debug, Clone, Copy)]
pub struct StepRecord<'a> {
    pub episode: usize,
    /// State the action was chosen in
    pub state: &'a GridState,
    pub action: Action,
    pub outcome: &'a StepOutcome,
    /// TD loss, absent on terminal transitions (no update is made)
    pub loss: Option<f64>,
}

/// Per-episode summary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    pub episode: usize,
    pub steps: u32,
    pub total_reward: f64,
    pub final_reward: f64,
    /// Final reward was positive
    pub won: bool,
    pub reasons: TerminationReasons,
    /// Non-terminal transitions that paid exactly -1
    pub penalties: usize,
}

/// Snapshot handed to renderers during a visualised episode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub episode: usize,
    /// Transitions processed since training began
    pub epochs: usize,
    /// Wins since the previous visualised episode
    pub rolling_wins: usize,
    pub visual_interval: usize,
    pub state: GridState,
    /// Set on the closing frame of the episode
    pub won: Option<bool>,
}

impl Frame {
    /// Rolling win rate in percent over the visual interval.
    pub fn win_rate_percent(&self) -> f64 {
        if self.visual_interval == 0 {
            return 0.0;
        }
        self.rolling_wins as f64 / self.visual_interval as f64 * 100.0
    }
}

/// Observer trait for monitoring training
///
/// # Event Sequence
///
/// 1. `on_training_start(total_episodes)` - once
/// 2. For each episode:
///    - `on_episode_start(episode)`
///    - `on_step(..)` after every transition
///    - `on_render(..)` after every transition of a visualised episode, then
///      once more with [`Frame::won`] set
///    - `on_episode_end(..)`
/// 3. `on_training_end()` - once
///
/// # Examples
///
/// ```no_run
/// use gridseek::ports::{EpisodeSummary, Observer};
///
/// struct WinCounter {
///     wins: usize,
/// }
///
/// impl Observer for WinCounter {
///     fn on_episode_end(&mut self, summary: &EpisodeSummary) -> gridseek::Result<()> {
///         if summary.won {
///             self.wins += 1;
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Observer: Send {
    fn on_training_start(&mut self, _total_episodes: usize) -> Result<()> {
        Ok(())
    }

    /// `episode` is 1-based.
    fn on_episode_start(&mut self, _episode: usize) -> Result<()> {
        Ok(())
    }

    fn on_step(&mut self, _record: &StepRecord<'_>) -> Result<()> {
        Ok(())
    }

    /// Only called for visualised episodes.
    fn on_render(&mut self, _frame: &Frame) -> Result<()> {
        Ok(())
    }

    fn on_episode_end(&mut self, _summary: &EpisodeSummary) -> Result<()> {
        Ok(())
    }

    /// Use this to finalize outputs, close files, or display summaries.
    fn on_training_end(&mut self) -> Result<()> {
        Ok(())
    }
}
