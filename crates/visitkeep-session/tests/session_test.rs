use std::sync::atomic::{AtomicI64, AtomicU8, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

use visitkeep_core::config::{CookieConfig, RetentionConfig, StoreConfig, VisitkeepConfig};
use visitkeep_core::errors::{SessionError, SessionResult, StorageError};
use visitkeep_core::{
    IClock, ISessionStore, ITokenGenerator, RecordTransition, SessionRecord, SessionToken,
};
use visitkeep_session::{
    purge_idle_sessions, CookieBinding, CookieInstruction, SessionManager, SessionPhase,
    VisitSnapshot,
};
use visitkeep_storage::{FileSessionStore, MemorySessionStore, SqliteSessionStore};

// ── Test doubles ─────────────────────────────────────────────────────────

/// Clock that advances one second per reading.
struct StepClock {
    base: DateTime<Utc>,
    ticks: AtomicI64,
}

impl StepClock {
    fn new(base: DateTime<Utc>) -> Self {
        Self {
            base,
            ticks: AtomicI64::new(0),
        }
    }
}

impl IClock for StepClock {
    fn now(&self) -> DateTime<Utc> {
        self.base + Duration::seconds(self.ticks.fetch_add(1, Ordering::SeqCst))
    }
}

struct FixedClock(DateTime<Utc>);

impl IClock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Deterministic distinct tokens.
#[derive(Default)]
struct SequenceGenerator(AtomicU8);

impl ITokenGenerator for SequenceGenerator {
    fn generate(&self) -> SessionResult<SessionToken> {
        let n = self.0.fetch_add(1, Ordering::SeqCst).wrapping_add(1);
        Ok(SessionToken::from_entropy([n; 32]))
    }
}

struct NoEntropy;

impl ITokenGenerator for NoEntropy {
    fn generate(&self) -> SessionResult<SessionToken> {
        Err(SessionError::EntropyUnavailable {
            reason: "random source closed".to_string(),
        })
    }
}

/// Store whose every operation fails like a full disk.
struct BrokenStore;

impl BrokenStore {
    fn err() -> SessionError {
        StorageError::Io {
            path: "/var/www/tmp".to_string(),
            message: "No space left on device".to_string(),
        }
        .into()
    }
}

impl ISessionStore for BrokenStore {
    fn load(&self, _token: &SessionToken) -> SessionResult<SessionRecord> {
        Err(Self::err())
    }

    fn save(&self, _token: &SessionToken, _record: &SessionRecord) -> SessionResult<()> {
        Err(Self::err())
    }

    fn update(
        &self,
        _token: &SessionToken,
        _mutate: &mut dyn FnMut(&mut SessionRecord),
    ) -> SessionResult<RecordTransition> {
        Err(Self::err())
    }

    fn remove(&self, _token: &SessionToken) -> SessionResult<bool> {
        Err(Self::err())
    }

    fn purge_idle(&self, _cutoff: DateTime<Utc>) -> SessionResult<usize> {
        Err(Self::err())
    }
}

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, 1, 8, 0, 0).unwrap()
}

fn manager_over(store: Arc<dyn ISessionStore>) -> SessionManager {
    SessionManager::new(
        store,
        Arc::new(SequenceGenerator::default()),
        CookieBinding::default(),
    )
    .with_clock(Arc::new(StepClock::new(base_time())))
}

fn sid(token: &SessionToken) -> String {
    format!("sid={token}")
}

// ── Request scenario ─────────────────────────────────────────────────────

#[test]
fn three_request_scenario() {
    let store = Arc::new(MemorySessionStore::new());
    let manager = manager_over(store.clone());

    // Request 1: no cookie.
    let r1 = manager.visit(None).unwrap();
    let t1 = r1.token.clone();
    assert_eq!(
        r1.snapshot,
        VisitSnapshot::Tracked {
            last_visit: None,
            visit_count: 0
        }
    );
    assert_eq!(r1.cookie.set_cookie(), Some(format!(
        "sid={t1}; HttpOnly; SameSite=Strict; Max-Age=3600"
    ).as_str()));

    // Request 2: cookie sid=T1.
    let r2 = manager.visit(Some(sid(&t1).as_str())).unwrap();
    assert_eq!(r2.token, t1);
    assert_eq!(
        r2.snapshot,
        VisitSnapshot::Tracked {
            last_visit: Some(base_time()),
            visit_count: 1
        }
    );
    assert_eq!(r2.cookie, CookieInstruction::Keep);

    // Request 3: garbage cookie.
    let r3 = manager.visit(Some("sid=garbage")).unwrap();
    assert_ne!(r3.token, t1);
    assert_eq!(
        r3.snapshot,
        VisitSnapshot::Tracked {
            last_visit: None,
            visit_count: 0
        }
    );
    assert!(r3.cookie.is_set());

    assert_eq!(store.load(&t1).unwrap().visit_count, 2);
    assert_eq!(store.load(&r3.token).unwrap().visit_count, 1);
}

#[test]
fn nth_visit_reports_previous_history() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(
        FileSessionStore::open(dir.path(), std::time::Duration::from_secs(5)).unwrap(),
    );
    let manager = manager_over(store.clone());

    let first = manager.visit(None).unwrap();
    let header = sid(&first.token);
    for n in 2..=10u64 {
        let outcome = manager.visit(Some(header.as_str())).unwrap();
        assert_eq!(outcome.snapshot.visit_count(), Some(n - 1));
        // The clock ticks once per visit, starting at base_time.
        let previous = base_time() + Duration::seconds(i64::try_from(n).unwrap() - 2);
        assert_eq!(outcome.snapshot.last_visit(), Some(previous));
        assert_eq!(store.load(&first.token).unwrap().visit_count, n);
    }
}

#[test]
fn unknown_well_formed_token_is_a_first_visit() {
    let store = Arc::new(MemorySessionStore::new());
    let manager = manager_over(store.clone());
    let presented = SessionToken::from_entropy([0xee; 32]);

    let outcome = manager.visit(Some(sid(&presented).as_str())).unwrap();
    assert_eq!(outcome.token, presented);
    assert_eq!(outcome.snapshot.visit_count(), Some(0));
    assert_eq!(
        outcome.trail,
        vec![SessionPhase::TokenPresentedNoRecord, SessionPhase::Completed]
    );
    assert_eq!(outcome.cookie, CookieInstruction::Keep);
}

// ── Idempotence and malformed input ──────────────────────────────────────

#[test]
fn valid_token_never_gets_second_set_cookie() {
    let manager = manager_over(Arc::new(MemorySessionStore::new()));
    let first = manager.visit(None).unwrap();
    assert!(first.cookie.is_set());

    let header = sid(&first.token);
    for _ in 0..5 {
        let outcome = manager.visit(Some(header.as_str())).unwrap();
        assert_eq!(outcome.cookie, CookieInstruction::Keep);
        assert_eq!(outcome.token, first.token);
    }
}

#[test]
fn malformed_or_empty_token_starts_fresh_session() {
    let manager = manager_over(Arc::new(MemorySessionStore::new()));
    let upper = format!("sid={}", "A".repeat(64));
    let short = format!("sid={}", "ab".repeat(16));
    let inputs = [
        None,
        Some(""),
        Some("sid="),
        Some("sid=garbage"),
        Some("sid=../../etc/passwd"),
        Some(upper.as_str()),
        Some(short.as_str()),
    ];

    let mut seen = Vec::new();
    for input in inputs {
        let outcome = manager.visit(input).unwrap();
        assert_eq!(outcome.trail.first(), Some(&SessionPhase::NoToken), "{input:?}");
        assert_eq!(outcome.snapshot.visit_count(), Some(0), "{input:?}");
        assert!(outcome.cookie.is_set(), "{input:?}");
        assert!(!seen.contains(&outcome.token));
        seen.push(outcome.token);
    }
}

#[test]
fn configured_cookie_name_is_honored() {
    let config = VisitkeepConfig {
        cookie: CookieConfig {
            name: "visit".to_string(),
            ..CookieConfig::default()
        },
        ..VisitkeepConfig::default()
    };
    let manager = SessionManager::from_config(Arc::new(MemorySessionStore::new()), &config);

    let first = manager.visit(None).unwrap();
    let header = first.cookie.set_cookie().unwrap();
    assert!(header.starts_with("visit="));

    let again = manager
        .visit(Some(format!("visit={}", first.token).as_str()))
        .unwrap();
    assert_eq!(again.token, first.token);
    assert_eq!(again.snapshot.visit_count(), Some(1));
}

// ── Concurrency ──────────────────────────────────────────────────────────

fn concurrent_visits_count_exactly(store: Arc<dyn ISessionStore>) {
    const K: usize = 12;
    let manager = Arc::new(manager_over(store.clone()));
    let token = SessionToken::from_entropy([0x5a; 32]);
    let header = sid(&token);
    let barrier = Arc::new(Barrier::new(K));

    let handles: Vec<_> = (0..K)
        .map(|_| {
            let manager = Arc::clone(&manager);
            let header = header.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                manager.visit(Some(header.as_str())).unwrap()
            })
        })
        .collect();
    let outcomes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let mut counts: Vec<u64> = outcomes
        .iter()
        .map(|o| o.snapshot.visit_count().unwrap())
        .collect();
    counts.sort_unstable();
    assert_eq!(counts, (0..K as u64).collect::<Vec<_>>());
    assert_eq!(outcomes.iter().filter(|o| o.is_first_visit()).count(), 1);
    assert!(outcomes.iter().all(|o| o.cookie == CookieInstruction::Keep));
    assert_eq!(store.load(&token).unwrap().visit_count, K as u64);
}

#[test]
fn concurrent_visits_file_backend() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileSessionStore::open(dir.path(), std::time::Duration::from_secs(10)).unwrap();
    concurrent_visits_count_exactly(Arc::new(store));
}

#[test]
fn concurrent_visits_sqlite_backend() {
    let dir = tempfile::tempdir().unwrap();
    let store =
        SqliteSessionStore::open(&dir.path().join("sessions.db"), &StoreConfig::default()).unwrap();
    concurrent_visits_count_exactly(Arc::new(store));
}

#[test]
fn concurrent_visits_memory_backend() {
    concurrent_visits_count_exactly(Arc::new(MemorySessionStore::new()));
}

// ── Failure handling ─────────────────────────────────────────────────────

#[test]
fn storage_failure_is_reported_by_visit() {
    let manager = manager_over(Arc::new(BrokenStore));
    let err = manager.visit(None).unwrap_err();
    assert!(matches!(err, SessionError::StorageUnavailable(_)));
    assert!(err.is_recoverable());
}

#[test]
fn storage_failure_degrades_to_unknown_history() {
    let manager = manager_over(Arc::new(BrokenStore));

    let fresh = manager.visit_or_degrade(None).unwrap();
    assert_eq!(fresh.snapshot, VisitSnapshot::Unknown);
    assert_eq!(fresh.snapshot.last_visit_message(), "unknown");
    assert!(fresh.degraded.as_deref().unwrap().contains("No space left"));
    assert!(fresh.cookie.is_set());
    assert!(!fresh.is_completed());

    let header = sid(&fresh.token);
    let known = manager.visit_or_degrade(Some(header.as_str())).unwrap();
    assert_eq!(known.token, fresh.token);
    assert_eq!(known.snapshot, VisitSnapshot::Unknown);
    assert_eq!(known.cookie, CookieInstruction::Keep);
    assert_eq!(known.phase(), None);
}

#[test]
fn entropy_failure_is_fatal_for_new_sessions() {
    let manager = SessionManager::new(
        Arc::new(MemorySessionStore::new()),
        Arc::new(NoEntropy),
        CookieBinding::default(),
    );

    let err = manager.visit(None).unwrap_err();
    assert!(matches!(err, SessionError::EntropyUnavailable { .. }));
    assert!(!err.is_recoverable());
    assert!(matches!(
        manager.visit_or_degrade(Some("sid=garbage")),
        Err(SessionError::EntropyUnavailable { .. })
    ));

    // A presented valid token needs no entropy.
    let token = SessionToken::from_entropy([1; 32]);
    let outcome = manager.visit(Some(sid(&token).as_str())).unwrap();
    assert_eq!(outcome.token, token);
}

// ── Idle sweep ───────────────────────────────────────────────────────────

#[test]
fn sweep_removes_sessions_idle_past_retention() {
    let store = MemorySessionStore::new();
    let now = base_time();
    let stale = SessionToken::from_entropy([2; 32]);
    let recent = SessionToken::from_entropy([3; 32]);
    store
        .update(&stale, &mut |r| r.record_visit(now - Duration::hours(30)))
        .unwrap();
    store
        .update(&recent, &mut |r| r.record_visit(now - Duration::hours(2)))
        .unwrap();

    let purged =
        purge_idle_sessions(&store, &FixedClock(now), &RetentionConfig::default()).unwrap();
    assert_eq!(purged, 1);
    assert!(store.load(&stale).unwrap().is_fresh());
    assert_eq!(store.load(&recent).unwrap().visit_count, 1);
}

#[test]
fn sweep_with_huge_retention_keeps_everything() {
    let store = MemorySessionStore::new();
    let token = SessionToken::from_entropy([4; 32]);
    store
        .update(&token, &mut |r| r.record_visit(DateTime::<Utc>::MIN_UTC))
        .unwrap();

    let retention = RetentionConfig { idle_secs: u64::MAX };
    let purged = purge_idle_sessions(&store, &FixedClock(base_time()), &retention).unwrap();
    assert_eq!(purged, 0);
}

proptest! {
    #[test]
    fn prop_visit_counts_follow_request_count(n in 1u64..25) {
        let store = Arc::new(MemorySessionStore::new());
        let manager = manager_over(store.clone());
        let first = manager.visit(None).unwrap();
        let header = sid(&first.token);
        let mut last = first;
        for _ in 1..n {
            last = manager.visit(Some(header.as_str())).unwrap();
        }
        prop_assert_eq!(last.snapshot.visit_count(), Some(n - 1));
        prop_assert_eq!(store.load(&last.token).unwrap().visit_count, n);
    }
}
