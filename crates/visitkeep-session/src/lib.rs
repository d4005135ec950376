//! # visitkeep-session
//!
//! Session manager for visitkeep: issues tokens, binds them to cookies, and
//! counts visits through an injected [`visitkeep_core::ISessionStore`].

pub mod cookie;
pub mod manager;
pub mod snapshot;
pub mod sweep;
pub mod token;

pub use cookie::{CookieBinding, CookieInstruction};
pub use manager::{SessionManager, SessionOutcome, SessionPhase};
pub use snapshot::VisitSnapshot;
pub use sweep::purge_idle_sessions;
pub use token::OsTokenGenerator;
