//! Training and evaluation pipelines
//!
//! - [`TrainingPipeline`]: epsilon-greedy TD control with observer hooks
//! - [`EvaluationPipeline`]: greedy roll-outs with no updates
//! - [`observers`]: progress, metrics and JSONL recorders

pub mod evaluation;
pub mod observers;
pub mod training;

pub use evaluation::{EvaluationPipeline, EvaluationResult};
pub use observers::{
    JsonlObserver, MetricsObserver, MetricsSummary, Observation, ProgressObserver,
    StepObservation,
};
pub use training::{TrainingConfig, TrainingPipeline, TrainingResult};

pub use crate::ports::Observer;
