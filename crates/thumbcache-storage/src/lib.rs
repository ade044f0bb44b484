//! On-disk artifact store: bytes keyed by (video, time).

pub mod error;
pub mod store;

pub use error::{StorageError, StorageResult};
pub use store::{ArtifactStore, ArtifactStoreConfig, FolderSize, LatestEntry};
