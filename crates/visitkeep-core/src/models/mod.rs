pub mod record_transition;
pub mod session_record;
pub mod session_token;

pub use record_transition::RecordTransition;
pub use session_record::SessionRecord;
pub use session_token::SessionToken;
