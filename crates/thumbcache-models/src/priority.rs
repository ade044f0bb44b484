//! Job priority class.

use std::fmt;

/// `high` for front-auth requests, `normal` otherwise. Determines which of
/// the two coordinator-store queues a job lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Normal,
}

impl Priority {
    /// Name of the coordinator-store queue this priority maps to.
    pub fn queue_name(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Normal => "normal",
        }
    }

    pub const ALL: [Priority; 2] = [Priority::High, Priority::Normal];
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.queue_name())
    }
}
