pub mod clock;
pub mod storage;
pub mod token_generator;

pub use clock::{IClock, SystemClock};
pub use storage::ISessionStore;
pub use token_generator::ITokenGenerator;
