//! Thumbnail generation worker (§4.D, §5).
//!
//! One process per worker, strictly one job at a time: resolves a playable
//! URL, extracts a frame (or downloads-then-decodes for livestreams),
//! validates and persists the result, and reports the outcome back through
//! the coordinator store.

pub mod config;
pub mod error;
pub mod executor;
pub mod generator;
pub mod logging;
pub mod retry;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use executor::JobExecutor;
pub use generator::{Generator, GeneratorConfig};
pub use logging::JobLogger;
