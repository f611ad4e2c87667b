//! Player profiles, name search and per-player statistics.

pub mod errors;
pub mod manager;
pub mod models;

pub use errors::{PlayerError, PlayerResult};
pub use manager::{DEFAULT_MIN_QUERY_LEN, MAX_SEARCH_RESULTS, PlayerManager};
pub use models::{Player, PlayerId, PlayerSummary};
