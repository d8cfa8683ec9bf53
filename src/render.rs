//! Text rendering of the grid
//!
//! [`render_frame`] is a pure function of a [`GridState`]; [`TerminalRenderer`]
//! is the observer that prints frames and training stats during visualised
//! episodes.

use std::{
    fmt::Write as _,
    io::{self, Write},
    thread,
    time::Duration,
};

use crate::{
    Result,
    error::Error,
    grid::{Action, GridState},
    ports::{Frame, Observer},
    types::Position,
};

/// Delay between frames when rendering to a terminal.
pub const DEFAULT_FRAME_DELAY: Duration = Duration::from_millis(250);

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

fn player_marker(action: Action) -> char {
    match action {
        Action::Stay => '*',
        Action::North => '^',
        Action::East => '>',
        Action::South => 'v',
        Action::West => '<',
    }
}

/// Render a state as text.
///
/// ```text
/// Step: #001 / Last reward: 0.50 / Last action: east
/// +---+
/// |.>O|
/// +---+
/// Player @ [1, 0]
/// ```
///
/// A player one cell past the map edge is drawn on the border.
pub fn render_frame(state: &GridState) -> String {
    let width = state.map_size.width as i32;
    let height = state.map_size.height as i32;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Step: #{:03} / Last reward: {:.2} / Last action: {}",
        state.steps, state.last_reward, state.last_action
    );

    let border: String = std::iter::once('+')
        .chain(std::iter::repeat_n('-', width as usize))
        .chain(std::iter::once('+'))
        .collect();

    let cell = |x: i32, y: i32| -> char {
        let position = Position::new(x, y);
        let on_border = x < 0 || y < 0 || x >= width || y >= height;
        if position == state.target_position && position == state.player_position {
            'X'
        } else if position == state.target_position {
            'O'
        } else if position == state.player_position {
            player_marker(state.last_action)
        } else if on_border {
            if (x < 0 || x >= width) && (y < 0 || y >= height) {
                '+'
            } else if y < 0 || y >= height {
                '-'
            } else {
                '|'
            }
        } else {
            '.'
        }
    };

    for y in -1..=height {
        if (y == -1 || y == height) && state.player_position.y != y {
            out.push_str(&border);
            out.push('\n');
            continue;
        }
        for x in -1..=width {
            out.push(cell(x, y));
        }
        out.push('\n');
    }

    let _ = writeln!(out, "Player @ {}", state.player_position);
    out
}

/// Observer that draws visualised episodes to a terminal or any writer.
pub struct TerminalRenderer<W: Write + Send = io::Stdout> {
    out: W,
    frame_delay: Duration,
    clear: bool,
}

impl TerminalRenderer<io::Stdout> {
    /// Stdout renderer with screen clearing and the default frame delay.
    pub fn stdout() -> Self {
        Self {
            out: io::stdout(),
            frame_delay: DEFAULT_FRAME_DELAY,
            clear: true,
        }
    }
}

impl<W: Write + Send> TerminalRenderer<W> {
    /// Renderer writing plain frames to `out` without delay.
    pub fn new(out: W) -> Self {
        Self {
            out,
            frame_delay: Duration::ZERO,
            clear: false,
        }
    }

    pub fn with_frame_delay(mut self, frame_delay: Duration) -> Self {
        self.frame_delay = frame_delay;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_frame(&mut self, frame: &Frame) -> io::Result<()> {
        if self.clear {
            self.out.write_all(CLEAR_SCREEN.as_bytes())?;
        }
        self.out.write_all(render_frame(&frame.state).as_bytes())?;
        writeln!(self.out, "{}", "=".repeat(40))?;
        writeln!(
            self.out,
            "Epochs: {} / Episodes: {} / Wins: {} ({:2.2}%)",
            frame.epochs,
            frame.episode,
            frame.rolling_wins,
            frame.win_rate_percent()
        )?;
        match frame.won {
            Some(true) => writeln!(self.out, "++++ WIN +++++")?,
            Some(false) => writeln!(self.out, "---- LOSE ----")?,
            None => {}
        }
        self.out.flush()
    }
}

impl<W: Write + Send> Observer for TerminalRenderer<W> {
    fn on_render(&mut self, frame: &Frame) -> Result<()> {
        // Output failures never abort training
        if let Err(e) = self.write_frame(frame) {
            tracing::warn!(error = %e, "failed to render frame");
        }
        if !self.frame_delay.is_zero() {
            thread::sleep(self.frame_delay);
        }
        Ok(())
    }
}

/// Write one rendered state, mapping output errors.
pub fn write_state<W: Write>(out: &mut W, state: &GridState) -> Result<()> {
    out.write_all(render_frame(state).as_bytes())
        .and_then(|()| out.flush())
        .map_err(|source| Error::Io {
            operation: "write rendered grid".to_string(),
            source,
        })
}
