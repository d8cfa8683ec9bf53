//! Keyboard play
//!
//! A [`KeySource`] yields curses-style key codes, a [`KeyMap`] turns the four
//! arrow codes into moves, and [`PlaySession`] drives one episode while
//! rendering every state. Any unmapped key ends the session.

use std::io::{BufRead, Write};

use rand::Rng;

use crate::{
    Result,
    error::Error,
    grid::{Action, Environment, EpisodeStatus, TerminationReasons},
    render::write_state,
};

pub const KEY_DOWN: i32 = 258;
pub const KEY_UP: i32 = 259;
pub const KEY_LEFT: i32 = 260;
pub const KEY_RIGHT: i32 = 261;

/// Source of key codes.
pub trait KeySource {
    /// Next key code, or `None` once input is exhausted.
    fn next_key(&mut self) -> Result<Option<i32>>;
}

/// Key code to action table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMap {
    bindings: Vec<(i32, Action)>,
}

impl Default for KeyMap {
    fn default() -> Self {
        Self {
            bindings: vec![
                (KEY_DOWN, Action::South),
                (KEY_UP, Action::North),
                (KEY_LEFT, Action::West),
                (KEY_RIGHT, Action::East),
            ],
        }
    }
}

impl KeyMap {
    pub fn action_for(&self, code: i32) -> Option<Action> {
        self.bindings
            .iter()
            .find(|(key, _)| *key == code)
            .map(|&(_, action)| action)
    }
}

/// Line-based key reader.
///
/// Each line is one key press: `w`/`k`/`Up`, `d`/`l`/`Right`, `s`/`j`/`Down`,
/// `a`/`h`/`Left`, or a raw ANSI arrow escape. Anything else passes through as
/// the code of its first character (`-1` for an empty line).
pub struct StdinKeys<R: BufRead> {
    reader: R,
    line: String,
}

impl<R: BufRead> StdinKeys<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
        }
    }

    fn translate(input: &str) -> i32 {
        match input {
            "w" | "k" | "up" | "\x1b[A" => KEY_UP,
            "d" | "l" | "right" | "\x1b[C" => KEY_RIGHT,
            "s" | "j" | "down" | "\x1b[B" => KEY_DOWN,
            "a" | "h" | "left" | "\x1b[D" => KEY_LEFT,
            other => other.chars().next().map_or(-1, |c| c as i32),
        }
    }
}

impl<R: BufRead> KeySource for StdinKeys<R> {
    fn next_key(&mut self) -> Result<Option<i32>> {
        self.line.clear();
        let read = self
            .reader
            .read_line(&mut self.line)
            .map_err(|source| Error::Io {
                operation: "read key".to_string(),
                source,
            })?;
        if read == 0 {
            return Ok(None);
        }
        let input = self.line.trim().to_ascii_lowercase();
        Ok(Some(Self::translate(&input)))
    }
}

/// How a play session ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayOutcome {
    pub steps: u32,
    pub total_reward: f64,
    /// `None` when the player quit before the episode terminated
    pub reasons: Option<TerminationReasons>,
    pub final_reward: f64,
}

impl PlayOutcome {
    pub fn won(&self) -> bool {
        self.reasons.is_some() && self.final_reward > 0.0
    }
}

/// One human-controlled episode.
pub struct PlaySession<'a, R: Rng, K: KeySource, W: Write> {
    env: &'a mut Environment<R>,
    keys: K,
    key_map: KeyMap,
    out: W,
}

impl<'a, R: Rng, K: KeySource, W: Write> PlaySession<'a, R, K, W> {
    pub fn new(env: &'a mut Environment<R>, keys: K, out: W) -> Self {
        Self {
            env,
            keys,
            key_map: KeyMap::default(),
            out,
        }
    }

    /// Reset the environment and play until the episode ends or an unmapped
    /// key arrives.
    pub fn run(&mut self) -> Result<PlayOutcome> {
        let mut state = self.env.reset();
        let mut total_reward = 0.0;
        let mut final_reward = 0.0;

        loop {
            write_state(&mut self.out, &state)?;
            let Some(code) = self.keys.next_key()? else {
                break;
            };
            let Some(action) = self.key_map.action_for(code) else {
                break;
            };

            let outcome = self.env.step(action.index())?;
            state = outcome.state;
            total_reward += outcome.reward;
            final_reward = outcome.reward;
            if outcome.done {
                write_state(&mut self.out, &state)?;
                break;
            }
        }

        let reasons = match self.env.status() {
            EpisodeStatus::Terminated(reasons) => Some(reasons),
            _ => None,
        };
        Ok(PlayOutcome {
            steps: state.steps,
            total_reward,
            reasons,
            final_reward,
        })
    }

    pub fn into_output(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::{grid::EnvironmentConfig, types::MapSize};

    struct Scripted(std::vec::IntoIter<i32>);

    impl KeySource for Scripted {
        fn next_key(&mut self) -> Result<Option<i32>> {
            Ok(self.0.next())
        }
    }

    fn env() -> Environment {
        let config = EnvironmentConfig {
            map_size: MapSize::new(1, 1).unwrap(),
            ..EnvironmentConfig::default()
        };
        Environment::with_seed(config, 0)
    }

    #[test]
    fn test_curses_arrow_codes() {
        let map = KeyMap::default();
        assert_eq!(map.action_for(259), Some(Action::North));
        assert_eq!(map.action_for(261), Some(Action::East));
        assert_eq!(map.action_for(258), Some(Action::South));
        assert_eq!(map.action_for(260), Some(Action::West));
        assert_eq!(map.action_for('q' as i32), None);
    }

    #[test]
    fn test_stdin_translation() {
        let input = Cursor::new("w\nL\n\x1b[B\nh\nq\n\n");
        let mut keys = StdinKeys::new(input);
        let mut codes = Vec::new();
        while let Some(code) = keys.next_key().unwrap() {
            codes.push(code);
        }
        assert_eq!(
            codes,
            vec![KEY_UP, KEY_RIGHT, KEY_DOWN, KEY_LEFT, 'q' as i32, -1]
        );
    }

    #[test]
    fn test_unmapped_key_ends_session() {
        // 1x1 map: player and target both spawn at the origin
        let mut env = env();
        let mut session = PlaySession::new(&mut env, Scripted(vec![27].into_iter()), Vec::new());
        let outcome = session.run().unwrap();
        assert_eq!(outcome.steps, 0);
        assert!(outcome.reasons.is_none());
        assert!(!outcome.won());

        let text = String::from_utf8(session.into_output()).unwrap();
        assert!(text.contains("Player @ [0, 0]"));
    }

    #[test]
    fn test_move_off_map_ends_episode() {
        let mut env = env();
        let mut session =
            PlaySession::new(&mut env, Scripted(vec![KEY_LEFT, KEY_LEFT].into_iter()), Vec::new());
        let outcome = session.run().unwrap();
        assert_eq!(outcome.steps, 1);
        let reasons = outcome.reasons.unwrap();
        assert!(reasons.out_of_bounds);
        assert!(!outcome.won());

        let text = String::from_utf8(session.into_output()).unwrap();
        assert!(text.ends_with("Player @ [-1, 0]\n"));
    }
}
