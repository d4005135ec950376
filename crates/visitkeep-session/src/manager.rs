//! SessionManager: one visit per request, no state kept between calls.
//!
//! Phases walked by a request:
//!
//! ```text
//! NoToken ─► TokenPresentedNoRecord ─┐
//!            TokenPresentedWithRecord ┴─► Completed
//! ```
//!
//! A presented, well-formed token skips `NoToken`. The store's atomic
//! `update` decides between the two `TokenPresented*` phases.

use std::sync::Arc;

use tracing::{debug, warn};

use visitkeep_core::config::VisitkeepConfig;
use visitkeep_core::errors::{SessionError, SessionResult};
use visitkeep_core::{IClock, ISessionStore, ITokenGenerator, SessionToken, SystemClock};

use crate::cookie::{CookieBinding, CookieInstruction};
use crate::snapshot::VisitSnapshot;
use crate::token::OsTokenGenerator;

/// Request lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    NoToken,
    TokenPresentedNoRecord,
    TokenPresentedWithRecord,
    Completed,
}

/// Result of one visit.
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub token: SessionToken,
    /// History strictly before this visit.
    pub snapshot: VisitSnapshot,
    pub cookie: CookieInstruction,
    /// Phases walked, in order.
    pub trail: Vec<SessionPhase>,
    /// Set when storage failed and the visit was served untracked.
    pub degraded: Option<String>,
}

impl SessionOutcome {
    /// Last phase reached. `None` when a presented token failed before the
    /// store answered.
    pub fn phase(&self) -> Option<SessionPhase> {
        self.trail.last().copied()
    }

    pub fn is_completed(&self) -> bool {
        self.phase() == Some(SessionPhase::Completed)
    }

    /// Whether this visit created the record.
    pub fn is_first_visit(&self) -> bool {
        self.trail.contains(&SessionPhase::TokenPresentedNoRecord)
    }
}

/// Orchestrates token issuance, record access and cookie binding.
pub struct SessionManager {
    store: Arc<dyn ISessionStore>,
    generator: Arc<dyn ITokenGenerator>,
    clock: Arc<dyn IClock>,
    cookies: CookieBinding,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn ISessionStore>,
        generator: Arc<dyn ITokenGenerator>,
        cookies: CookieBinding,
    ) -> Self {
        Self {
            store,
            generator,
            clock: Arc::new(SystemClock),
            cookies,
        }
    }

    /// Manager with the OS token generator and the configured cookie.
    pub fn from_config(store: Arc<dyn ISessionStore>, config: &VisitkeepConfig) -> Self {
        Self::new(
            store,
            Arc::new(OsTokenGenerator),
            CookieBinding::from_config(&config.cookie),
        )
    }

    /// Replace the wall clock.
    pub fn with_clock(mut self, clock: Arc<dyn IClock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn cookies(&self) -> &CookieBinding {
        &self.cookies
    }

    pub fn store(&self) -> &Arc<dyn ISessionStore> {
        &self.store
    }

    /// Serve one visit for a request carrying `cookie_header`.
    ///
    /// Storage failures are returned as `StorageUnavailable`; see
    /// [`SessionManager::visit_or_degrade`] for the request-boundary variant.
    pub fn visit(&self, cookie_header: Option<&str>) -> SessionResult<SessionOutcome> {
        let mut outcome = self.begin(cookie_header)?;
        self.complete(&mut outcome)?;
        Ok(outcome)
    }

    /// Like [`SessionManager::visit`], but a storage failure yields an
    /// `Unknown` snapshot instead of an error. The token and cookie
    /// instruction are still returned. Entropy failures still propagate.
    pub fn visit_or_degrade(&self, cookie_header: Option<&str>) -> SessionResult<SessionOutcome> {
        let mut outcome = self.begin(cookie_header)?;
        match self.complete(&mut outcome) {
            Ok(()) => Ok(outcome),
            Err(SessionError::StorageUnavailable(e)) => {
                warn!(
                    token = outcome.token.log_prefix(),
                    error = %e,
                    "session storage unavailable; serving untracked visit"
                );
                outcome.degraded = Some(e.to_string());
                Ok(outcome)
            }
            Err(e) => Err(e),
        }
    }

    /// Resolve the token and the cookie instruction.
    fn begin(&self, cookie_header: Option<&str>) -> SessionResult<SessionOutcome> {
        let mut trail = Vec::with_capacity(3);
        let (token, fresh) = match self.cookies.extract(cookie_header) {
            Some(token) => (token, false),
            None => {
                trail.push(SessionPhase::NoToken);
                (self.generator.generate()?, true)
            }
        };
        let cookie = self.cookies.instruction_for(&token, fresh);
        Ok(SessionOutcome {
            token,
            snapshot: VisitSnapshot::Unknown,
            cookie,
            trail,
            degraded: None,
        })
    }

    /// Count the visit and record the pre-visit snapshot.
    fn complete(&self, outcome: &mut SessionOutcome) -> SessionResult<()> {
        let now = self.clock.now();
        let transition = self
            .store
            .update(&outcome.token, &mut |record| record.record_visit(now))?;

        let fresh = outcome.trail.first() == Some(&SessionPhase::NoToken);
        if fresh && !transition.created {
            warn!(
                token = outcome.token.log_prefix(),
                "freshly issued token already had a record"
            );
        }

        let phase = if transition.created {
            SessionPhase::TokenPresentedNoRecord
        } else {
            SessionPhase::TokenPresentedWithRecord
        };
        outcome.trail.push(phase);
        outcome.trail.push(SessionPhase::Completed);
        outcome.snapshot = VisitSnapshot::before_visit(&transition.before);

        debug!(
            token = outcome.token.log_prefix(),
            phase = ?phase,
            visit_count = transition.after.visit_count,
            set_cookie = outcome.cookie.is_set(),
            "visit completed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use visitkeep_core::SessionRecord;

    use super::*;

    struct FixedToken;

    impl ITokenGenerator for FixedToken {
        fn generate(&self) -> SessionResult<SessionToken> {
            Ok(SessionToken::from_entropy([7; 32]))
        }
    }

    /// Store double holding one record in a mutex.
    #[derive(Default)]
    struct SingleRecordStore {
        record: std::sync::Mutex<Option<SessionRecord>>,
    }

    impl ISessionStore for SingleRecordStore {
        fn load(&self, _token: &SessionToken) -> SessionResult<SessionRecord> {
            Ok(self.record.lock().unwrap().clone().unwrap_or_default())
        }

        fn save(&self, _token: &SessionToken, record: &SessionRecord) -> SessionResult<()> {
            *self.record.lock().unwrap() = Some(record.clone());
            Ok(())
        }

        fn update(
            &self,
            _token: &SessionToken,
            mutate: &mut dyn FnMut(&mut SessionRecord),
        ) -> SessionResult<visitkeep_core::RecordTransition> {
            let mut slot = self.record.lock().unwrap();
            let created = slot.is_none();
            let before = slot.clone().unwrap_or_default();
            let mut after = before.clone();
            mutate(&mut after);
            *slot = Some(after.clone());
            Ok(visitkeep_core::RecordTransition {
                before,
                after,
                created,
            })
        }

        fn remove(&self, _token: &SessionToken) -> SessionResult<bool> {
            Ok(self.record.lock().unwrap().take().is_some())
        }

        fn purge_idle(&self, _cutoff: chrono::DateTime<chrono::Utc>) -> SessionResult<usize> {
            Ok(0)
        }
    }

    fn manager() -> SessionManager {
        SessionManager::new(
            Arc::new(SingleRecordStore::default()),
            Arc::new(FixedToken),
            CookieBinding::default(),
        )
    }

    #[test]
    fn first_visit_walks_no_token_path() {
        let outcome = manager().visit(None).unwrap();
        assert_eq!(
            outcome.trail,
            vec![
                SessionPhase::NoToken,
                SessionPhase::TokenPresentedNoRecord,
                SessionPhase::Completed
            ]
        );
        assert!(outcome.is_first_visit());
        assert!(outcome.cookie.is_set());
    }

    #[test]
    fn return_visit_walks_with_record_path() {
        let m = manager();
        let first = m.visit(None).unwrap();
        let header = format!("sid={}", first.token);
        let second = m.visit(Some(header.as_str())).unwrap();

        assert_eq!(
            second.trail,
            vec![SessionPhase::TokenPresentedWithRecord, SessionPhase::Completed]
        );
        assert!(second.is_completed());
        assert!(!second.is_first_visit());
        assert_eq!(second.cookie, CookieInstruction::Keep);
    }
}
