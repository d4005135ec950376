//! VisitSnapshot: the history a visit reports, taken before it is counted.
//!
//! Rendered to clients through [`VisitSnapshot::last_visit_message`].

use chrono::{DateTime, Utc};

use visitkeep_core::SessionRecord;

/// `asctime(3)` layout, e.g. `Sun Oct 18 09:05:03 2026`.
const ASCTIME_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

/// Visit history as of the previous visit, reported back to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisitSnapshot {
    Tracked {
        last_visit: Option<DateTime<Utc>>,
        visit_count: u64,
    },
    /// Storage failed; history is not known.
    Unknown,
}

impl VisitSnapshot {
    /// Snapshot of a record before the current visit is applied.
    pub fn before_visit(record: &SessionRecord) -> Self {
        Self::Tracked {
            last_visit: record.last_visit,
            visit_count: record.visit_count,
        }
    }

    pub fn is_tracked(&self) -> bool {
        matches!(self, Self::Tracked { .. })
    }

    pub fn last_visit(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Tracked { last_visit, .. } => *last_visit,
            Self::Unknown => None,
        }
    }

    pub fn visit_count(&self) -> Option<u64> {
        match self {
            Self::Tracked { visit_count, .. } => Some(*visit_count),
            Self::Unknown => None,
        }
    }

    /// `"on <asctime>"`, `"never"` for a first visit, `"unknown"` when
    /// storage was unavailable.
    pub fn last_visit_message(&self) -> String {
        match self {
            Self::Tracked {
                last_visit: Some(at),
                ..
            } => format!("on {}", at.format(ASCTIME_FORMAT)),
            Self::Tracked { last_visit: None, .. } => "never".to_string(),
            Self::Unknown => "unknown".to_string(),
        }
    }
}
