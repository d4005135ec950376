//! MemorySessionStore: concurrent in-process store via DashMap.
//!
//! Not durable. Each record's read-modify-write runs under the map's
//! per-shard entry lock.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use visitkeep_core::errors::SessionResult;
use visitkeep_core::{ISessionStore, RecordTransition, SessionRecord, SessionToken};

/// Thread-safe in-memory session store.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    records: Arc<DashMap<SessionToken, SessionRecord>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl ISessionStore for MemorySessionStore {
    fn load(&self, token: &SessionToken) -> SessionResult<SessionRecord> {
        Ok(self
            .records
            .get(token)
            .map(|r| r.value().clone())
            .unwrap_or_default())
    }

    fn save(&self, token: &SessionToken, record: &SessionRecord) -> SessionResult<()> {
        self.records.insert(token.clone(), record.clone());
        Ok(())
    }

    fn update(
        &self,
        token: &SessionToken,
        mutate: &mut dyn FnMut(&mut SessionRecord),
    ) -> SessionResult<RecordTransition> {
        let transition = match self.records.entry(token.clone()) {
            Entry::Occupied(mut occupied) => {
                let before = occupied.get().clone();
                mutate(occupied.get_mut());
                RecordTransition {
                    before,
                    after: occupied.get().clone(),
                    created: false,
                }
            }
            Entry::Vacant(vacant) => {
                let mut after = SessionRecord::default();
                mutate(&mut after);
                vacant.insert(after.clone());
                RecordTransition {
                    before: SessionRecord::default(),
                    after,
                    created: true,
                }
            }
        };
        Ok(transition)
    }

    fn remove(&self, token: &SessionToken) -> SessionResult<bool> {
        Ok(self.records.remove(token).is_some())
    }

    fn purge_idle(&self, cutoff: DateTime<Utc>) -> SessionResult<usize> {
        let mut purged = 0;
        self.records.retain(|_, record| {
            let idle = record.idle_since(cutoff);
            purged += usize::from(idle);
            !idle
        });
        Ok(purged)
    }
}
