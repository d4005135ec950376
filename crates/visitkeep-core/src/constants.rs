/// visitkeep version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Random bytes drawn per session token (256 bits).
pub const TOKEN_BYTES: usize = 32;

/// Length of the hex-encoded token string.
pub const TOKEN_LEN: usize = TOKEN_BYTES * 2;

/// Number of token characters that may appear in logs and error messages.
pub const TOKEN_LOG_PREFIX_LEN: usize = 8;

/// Upper bound on retried write attempts for any backend.
pub const MAX_WRITE_ATTEMPTS: u32 = 5;

/// File name prefix for per-token record files.
pub const RECORD_FILE_PREFIX: &str = "sess_";

/// Project config file looked up in the root directory.
pub const PROJECT_CONFIG_FILENAME: &str = "visitkeep.toml";
