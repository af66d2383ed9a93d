// Library surface for the CLI and integration tests.
pub mod app_dirs;
pub mod chinese;
pub mod config;
pub mod error;
pub mod games;
pub mod generation;
pub mod practice;
pub mod store;
pub mod trainer;

pub use error::{EngineError, Result};
pub use trainer::{Trainer, TrainerError};
