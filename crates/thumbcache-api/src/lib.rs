//! The request-handling process (§4.E, §5): request admission and dedup,
//! the size-bounded cleanup loop, and the HTTP surface (§6) that fronts
//! both.
//!
//! Generation itself happens out of process, in `thumbcache-worker`; this
//! crate only ever reads the artifact store, enqueues work, and waits.

pub mod cleanup;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use cleanup::CleanupLoop;
pub use config::ApiConfig;
pub use coordinator::{GetOutcome, RequestCoordinator};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
