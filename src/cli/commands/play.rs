//! Play command - steer the player with the keyboard

use std::io;

use anyhow::{Context, Result};
use clap::Parser;

use crate::{
    app::{App, PlayConfig},
    cli::output::{describe_reasons, print_kv, print_section},
    grid::{EnvironmentConfig, RewardScheme, environment::MAX_STEPS},
    human::StdinKeys,
    types::MapSize,
};

#[derive(Parser, Debug)]
#[command(about = "Play an episode with the keyboard")]
pub struct PlayArgs {
    /// Map size as WIDTHxHEIGHT
    #[arg(long, default_value = "10x10")]
    pub map_size: MapSize,

    /// Episodes end once the step counter exceeds this value
    #[arg(long, default_value_t = MAX_STEPS)]
    pub max_steps: u32,

    /// Reward formula (branch-table or halved-delta)
    #[arg(long, default_value = "branch-table")]
    pub reward_scheme: RewardScheme,

    /// Random seed for the spawn positions
    #[arg(long)]
    pub seed: Option<u64>,
}

pub fn execute(args: PlayArgs) -> Result<()> {
    let config = PlayConfig {
        environment: EnvironmentConfig {
            map_size: args.map_size,
            max_steps: args.max_steps,
            reward_scheme: args.reward_scheme,
        },
        seed: args.seed,
    };

    println!("Move with w/a/s/d, h/j/k/l or arrow keys, one per line; anything else quits.");
    let keys = StdinKeys::new(io::stdin().lock());
    let outcome = App::new()
        .play(&config, keys, io::stdout())
        .context("Play session failed")?;

    print_section(if outcome.won() { "++++ WIN +++++" } else { "Game over" });
    print_kv("Steps", &outcome.steps.to_string());
    print_kv("Total reward", &format!("{:.2}", outcome.total_reward));
    let ending = outcome
        .reasons
        .as_ref()
        .map_or_else(|| "quit".to_string(), describe_reasons);
    print_kv("Ending", &ending);
    Ok(())
}
