//! Application layer with dependency injection container.
//!
//! The container owns infrastructure dependencies and composes the domain
//! objects for each kind of session.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │           Application Layer (app)           │
//! │  ┌──────────────────────────────────────┐   │
//! │  │            App (container)           │   │
//! │  └──────────────┬───────────────────────┘   │
//! │                 │ owns                      │
//! │                 ▼                           │
//! │  ┌──────────────────────────────────────┐   │
//! │  │  Infrastructure (adapters)           │   │
//! │  │  - MsgPackRepository                 │   │
//! │  │  - InMemoryRepository (testing)      │   │
//! │  └──────────────┬───────────────────────┘   │
//! │                 │ implements                │
//! │                 ▼                           │
//! │  ┌──────────────────────────────────────┐   │
//! │  │  Domain Ports (ports)                │   │
//! │  │  - ValueFunctionRepository           │   │
//! │  │  - ValueFunction, Observer           │   │
//! │  └──────────────┬───────────────────────┘   │
//! │                 │ used by                   │
//! │                 ▼                           │
//! │  ┌──────────────────────────────────────┐   │
//! │  │  Domain Logic                        │   │
//! │  │  - Environment, FeatureEncoder       │   │
//! │  │  - EpsilonGreedy, TrainingPipeline   │   │
//! │  └──────────────────────────────────────┘   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use gridseek::app::{App, SessionConfig};
//! use gridseek::adapters::InMemoryRepository;
//! use gridseek::pipeline::TrainingConfig;
//!
//! let app = App::for_testing()
//!     .with_repository(InMemoryRepository::new())
//!     .with_default_seed(42)
//!     .build();
//!
//! let config = SessionConfig::new(TrainingConfig {
//!     max_episodes: 10,
//!     visual_interval: 0,
//!     ..TrainingConfig::default()
//! });
//! let session = app.train(&config, Vec::new())?;
//! assert_eq!(session.result.episodes, 10);
//! # Ok::<(), gridseek::Error>(())
//! ```

pub mod config;
pub mod container;

pub use config::{DEFAULT_WEIGHTS_PATH, EvaluationConfig, PlayConfig, SessionConfig};
pub use container::{App, AppBuilder, TrainedSession};
