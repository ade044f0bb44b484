//! The (video id, time offset) pair that keys caching, dedup and queueing.

use std::fmt;

use crate::time_offset::TimeOffset;
use crate::video_id::VideoId;

#[derive(Debug, Clone, PartialEq)]
pub struct Fingerprint {
    pub video_id: VideoId,
    pub time: TimeOffset,
}

impl Fingerprint {
    pub fn new(video_id: VideoId, time: TimeOffset) -> Self {
        Self { video_id, time }
    }

    /// `<video_id>-<offset>`, used as the pub/sub channel name and log key.
    pub fn job_id(&self) -> String {
        format!("{}-{}", self.video_id, self.time.canonical())
    }

    /// `best-<video_id>`, the coordinator-store key for the best-time hint.
    pub fn best_time_key(&self) -> String {
        format!("best-{}", self.video_id)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.job_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_id_matches_coordinator_key_layout() {
        let fp = Fingerprint::new(
            VideoId::parse("jNQXAC9IVRw").unwrap(),
            TimeOffset::parse(5.3).unwrap(),
        );
        assert_eq!(fp.job_id(), "jNQXAC9IVRw-5.3");
        assert_eq!(fp.best_time_key(), "best-jNQXAC9IVRw");
    }
}
