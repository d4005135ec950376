//! Configuration system for visitkeep.
//! TOML-based, 3-layer resolution: env > project > defaults.

pub mod cookie_config;
pub mod defaults;
pub mod retention_config;
pub mod store_config;
pub mod visitkeep_config;

pub use cookie_config::{CookieConfig, SameSitePolicy};
pub use retention_config::RetentionConfig;
pub use store_config::{StoreBackend, StoreConfig};
pub use visitkeep_config::VisitkeepConfig;
