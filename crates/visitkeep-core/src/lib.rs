//! # visitkeep-core
//!
//! Foundation crate for the visitkeep session store.
//! Defines the token and record models, the store/generator/clock traits,
//! errors, config, and constants. Every other crate in the workspace depends on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod models;
pub mod traits;
pub mod tracing_setup;

// Re-export the most commonly used types at the crate root.
pub use config::VisitkeepConfig;
pub use errors::{SessionError, SessionResult};
pub use models::{RecordTransition, SessionRecord, SessionToken};
pub use traits::{IClock, ISessionStore, ITokenGenerator, SystemClock};
