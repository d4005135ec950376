//! Idle-session sweep for an external lifecycle collaborator (cron job,
//! maintenance endpoint). Never run on the request path.

use chrono::{DateTime, Utc};

use visitkeep_core::config::RetentionConfig;
use visitkeep_core::errors::SessionResult;
use visitkeep_core::{IClock, ISessionStore};

/// Delete records whose last visit is older than the retention window.
/// Returns the number removed.
pub fn purge_idle_sessions(
    store: &dyn ISessionStore,
    clock: &dyn IClock,
    retention: &RetentionConfig,
) -> SessionResult<usize> {
    let cutoff = clock
        .now()
        .checked_sub_signed(retention.idle_window())
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let purged = store.purge_idle(cutoff)?;
    tracing::info!(purged, idle_secs = retention.idle_secs, "session sweep finished");
    Ok(purged)
}
