//! Error handling for visitkeep.
//! One error enum per concern, `thiserror` only.

pub mod config_error;
pub mod session_error;
pub mod storage_error;

pub use config_error::ConfigError;
pub use session_error::{SessionError, SessionResult};
pub use storage_error::StorageError;
