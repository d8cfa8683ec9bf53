//! Evaluate command - greedy roll-outs of saved parameters

use std::{fs::File, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::to_writer_pretty;

use crate::{
    app::{App, DEFAULT_WEIGHTS_PATH, EvaluationConfig},
    cli::output::{print_evaluation_result, print_metrics},
    grid::environment::MAX_STEPS,
    pipeline::{MetricsObserver, Observer, ProgressObserver},
    render::TerminalRenderer,
};

#[derive(Parser, Debug)]
#[command(about = "Evaluate saved parameters with a greedy policy")]
pub struct EvaluateArgs {
    /// Path to saved parameters
    #[arg(default_value = DEFAULT_WEIGHTS_PATH)]
    pub weights: PathBuf,

    /// Number of evaluation episodes
    #[arg(long, short = 'e', default_value_t = 100)]
    pub episodes: usize,

    /// Episodes end once the step counter exceeds this value
    #[arg(long, default_value_t = MAX_STEPS)]
    pub max_steps: u32,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,

    /// Draw every step of every episode
    #[arg(long)]
    pub render: bool,

    /// Delay between rendered frames in milliseconds
    #[arg(long, default_value_t = 250)]
    pub frame_delay_ms: u64,

    /// Export results to a JSON file
    #[arg(long)]
    pub export: Option<PathBuf>,
}

pub fn execute(args: EvaluateArgs) -> Result<()> {
    execute_with(&App::new(), args)
}

/// Run the command against an explicit container.
pub fn execute_with(app: &App, args: EvaluateArgs) -> Result<()> {
    let mut config = EvaluationConfig::new(&args.weights)
        .with_episodes(args.episodes)
        .with_max_steps(args.max_steps)
        .with_render(args.render);
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }

    let metrics = MetricsObserver::new();
    let mut observers: Vec<Box<dyn Observer>> = vec![Box::new(metrics.clone())];
    if args.render {
        observers.push(Box::new(
            TerminalRenderer::stdout().with_frame_delay(Duration::from_millis(args.frame_delay_ms)),
        ));
    } else {
        observers.push(Box::new(ProgressObserver::new()));
    }

    println!("Loading parameters from: {}", args.weights.display());
    let result = app
        .evaluate(&config, observers)
        .with_context(|| format!("Failed to evaluate {}", args.weights.display()))?;
    print_evaluation_result(&result);
    print_metrics(&metrics.summary());

    if let Some(path) = &args.export {
        let file =
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        to_writer_pretty(file, &result)?;
        println!("\nResults exported to {}", path.display());
    }
    Ok(())
}
