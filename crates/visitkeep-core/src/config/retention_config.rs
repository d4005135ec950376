use serde::{Deserialize, Serialize};

use super::defaults;

/// Idle-record retention used by the sweep helper.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    /// Records whose last visit is older than this many seconds are purgeable.
    pub idle_secs: u64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            idle_secs: defaults::DEFAULT_RETENTION_IDLE_SECS,
        }
    }
}

impl RetentionConfig {
    pub fn idle_window(&self) -> chrono::Duration {
        i64::try_from(self.idle_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }
}
