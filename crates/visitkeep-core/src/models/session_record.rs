//! SessionRecord: durable per-token visit state.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Durable state for one session token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Time of the previous completed visit. `None` before the first one.
    #[serde(default)]
    pub last_visit: Option<DateTime<Utc>>,
    /// Completed visits so far.
    #[serde(default)]
    pub visit_count: u64,
    /// Reserved per-session attributes (e.g. `expires`). Empty on creation.
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl SessionRecord {
    /// True for a record that has never completed a visit.
    pub fn is_fresh(&self) -> bool {
        self.visit_count == 0 && self.last_visit.is_none()
    }

    /// Count one completed visit at `at`.
    pub fn record_visit(&mut self, at: DateTime<Utc>) {
        self.visit_count = self.visit_count.saturating_add(1);
        self.last_visit = Some(at);
    }

    /// Whether the last visit happened strictly before `cutoff`.
    /// Records with no visit are never idle.
    pub fn idle_since(&self, cutoff: DateTime<Utc>) -> bool {
        self.last_visit.is_some_and(|at| at < cutoff)
    }
}
