//! Ports (trait boundaries) for external dependencies.
//!
//! These traits are owned by the domain and implemented by adapters in the
//! infrastructure layer.

pub mod observer;
pub mod repository;
pub mod value_function;

pub use observer::{EpisodeSummary, Frame, Observer, StepRecord};
pub use repository::ValueFunctionRepository;
pub use value_function::{TdUpdate, ValueFunction};
