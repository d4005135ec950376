// Single source of truth for all default values.

// --- Store ---
pub const DEFAULT_STORE_SUBDIR: &str = "tmp";
pub const DEFAULT_DB_FILENAME: &str = "sessions.db";
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_BUSY_TIMEOUT_MS: u32 = 5_000;
pub const DEFAULT_MAX_WRITE_ATTEMPTS: u32 = 5;
pub const DEFAULT_POOL_SIZE: usize = 4;
pub const MAX_POOL_SIZE: usize = 8;

// --- Cookie ---
pub const DEFAULT_COOKIE_NAME: &str = "sid";
pub const DEFAULT_COOKIE_MAX_AGE_SECS: i64 = 3_600; // 1 hour
pub const DEFAULT_COOKIE_HTTP_ONLY: bool = true;
pub const DEFAULT_COOKIE_SECURE: bool = false;
pub const DEFAULT_REFRESH_ON_VISIT: bool = false;

// --- Retention ---
pub const DEFAULT_RETENTION_IDLE_SECS: u64 = 86_400; // 1 day

// --- Observability ---
pub const DEFAULT_LOG_FILTER: &str = "visitkeep=info";
pub const LOG_ENV_VAR: &str = "VISITKEEP_LOG";
