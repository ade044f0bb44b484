//! The payload enqueued for a worker to pick up.
//!
//! This is the wire form of a [`crate::fingerprint::Fingerprint`] plus the
//! extra fields the generator needs: whether to persist a title on success
//! and whether the source is a livestream (decode-locally branch).

use serde::{Deserialize, Serialize};

use crate::priority::Priority;
use crate::time_offset::TimeOffset;
use crate::video_id::VideoId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedJob {
    pub video_id: String,
    pub time: f64,
    pub priority: Priority,
    pub title: Option<String>,
    pub is_livestream: bool,
}

impl QueuedJob {
    pub fn new(video_id: &VideoId, time: TimeOffset, priority: Priority) -> Self {
        Self {
            video_id: video_id.as_str().to_string(),
            time: time.seconds(),
            priority,
            title: None,
            is_livestream: false,
        }
    }

    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    pub fn with_livestream(mut self, is_livestream: bool) -> Self {
        self.is_livestream = is_livestream;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_through_json() {
        let job = QueuedJob::new(
            &VideoId::parse("jNQXAC9IVRw").unwrap(),
            TimeOffset::parse(5.3).unwrap(),
            Priority::High,
        )
        .with_title(Some("Me at the zoo".to_string()));

        let encoded = serde_json::to_string(&job).unwrap();
        let decoded: QueuedJob = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.video_id, "jNQXAC9IVRw");
        assert_eq!(decoded.title, Some("Me at the zoo".to_string()));
        assert!(!decoded.is_livestream);
    }
}
