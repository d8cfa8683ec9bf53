//! Greedy roll-outs of a trained value function

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::training::{Tally, check_action_count, termination};
use crate::{
    Result,
    features::FeatureEncoder,
    grid::{Action, Environment, GridState},
    ports::{EpisodeSummary, Frame, Observer, StepRecord, ValueFunction},
    q_learning::argmax,
};

/// Result of an evaluation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub episodes: usize,
    pub wins: usize,
    pub reached_target: usize,
    pub out_of_bounds: usize,
    pub step_limit: usize,
    pub mean_steps: f64,
    pub mean_reward: f64,
    pub win_rate: f64,
}

/// Plays episodes with epsilon = 0 and no parameter updates.
pub struct EvaluationPipeline {
    episodes: usize,
    render: bool,
    observers: Vec<Box<dyn Observer>>,
}

impl EvaluationPipeline {
    pub fn new(episodes: usize) -> Self {
        Self {
            episodes,
            render: false,
            observers: Vec::new(),
        }
    }

    /// Emit render frames for every episode.
    pub fn with_render(mut self, render: bool) -> Self {
        self.render = render;
        self
    }

    pub fn with_observer(mut self, observer: Box<dyn Observer>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn run<R: Rng>(
        &mut self,
        env: &mut Environment<R>,
        value_fn: &dyn ValueFunction,
    ) -> Result<EvaluationResult> {
        check_action_count(value_fn)?;
        let encoder = FeatureEncoder::new(env.config().map_size);
        let mut tally = Tally::default();
        let mut total_steps = 0usize;

        for observer in &mut self.observers {
            observer.on_training_start(self.episodes)?;
        }

        for episode in 1..=self.episodes {
            for observer in &mut self.observers {
                observer.on_episode_start(episode)?;
            }

            let mut state = env.reset();
            let mut total_reward = 0.0;
            let last = loop {
                let values = value_fn.evaluate(&encoder.encode(&state))?;
                let action_index = argmax(&values)?;
                let outcome = env.step(action_index)?;
                tally.epochs += 1;
                total_reward += outcome.reward;

                let record = StepRecord {
                    episode,
                    state: &state,
                    action: Action::from_index(action_index)?,
                    outcome: &outcome,
                    loss: None,
                };
                for observer in &mut self.observers {
                    observer.on_step(&record)?;
                }
                if self.render {
                    self.emit_frame(episode, &tally, outcome.state, None)?;
                }

                state = outcome.state;
                if outcome.done {
                    break outcome;
                }
            };

            let won = last.reward > 0.0;
            let summary = EpisodeSummary {
                episode,
                steps: last.state.steps,
                total_reward,
                final_reward: last.reward,
                won,
                reasons: termination(&last),
                penalties: 0,
            };
            total_steps += summary.steps as usize;
            tally.record(&summary);

            if self.render {
                self.emit_frame(episode, &tally, last.state, Some(won))?;
            }
            for observer in &mut self.observers {
                observer.on_episode_end(&summary)?;
            }
        }

        for observer in &mut self.observers {
            observer.on_training_end()?;
        }

        let result = EvaluationResult {
            episodes: tally.episodes,
            wins: tally.wins,
            reached_target: tally.reached_target,
            out_of_bounds: tally.out_of_bounds,
            step_limit: tally.step_limit,
            mean_steps: tally.ratio(total_steps),
            mean_reward: if tally.episodes > 0 {
                tally.reward_sum / tally.episodes as f64
            } else {
                0.0
            },
            win_rate: tally.ratio(tally.wins),
        };
        info!(
            episodes = result.episodes,
            win_rate = result.win_rate,
            "evaluation finished"
        );
        Ok(result)
    }

    fn emit_frame(
        &mut self,
        episode: usize,
        tally: &Tally,
        state: GridState,
        won: Option<bool>,
    ) -> Result<()> {
        // Win rate over every episode played so far
        let frame = Frame {
            episode,
            epochs: tally.epochs,
            rolling_wins: tally.wins,
            visual_interval: episode,
            state,
            won,
        };
        for observer in &mut self.observers {
            observer.on_render(&frame)?;
        }
        Ok(())
    }
}
