//! The stored artifact: image bytes plus optional title.

use crate::time_offset::TimeOffset;

/// Artifacts below this many bytes are treated as a failed generation
/// (upstream premiere/placeholder image) and discarded on read.
pub const MIN_ARTIFACT_BYTES: usize = 100;

#[derive(Debug, Clone)]
pub struct Artifact {
    pub image: Vec<u8>,
    pub offset: TimeOffset,
    pub title: Option<String>,
}

impl Artifact {
    pub fn is_well_formed(&self) -> bool {
        self.image.len() >= MIN_ARTIFACT_BYTES
    }

    /// Bytes this artifact adds to the storage counter: image plus the
    /// UTF-8 size of an optional title.
    pub fn storage_delta(&self) -> u64 {
        let title_bytes = self.title.as_ref().map_or(0, |t| t.len());
        (self.image.len() + title_bytes) as u64
    }
}
