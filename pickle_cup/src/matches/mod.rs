//! Matches between two teams, inside a tournament or standalone.

pub mod manager;
pub mod models;

pub use manager::{DEFAULT_RECENT_LIMIT, MatchError, MatchManager, MatchResult};
pub use models::{FIRST_ROUND, Match, MatchId, MatchSummary, NewMatch, RecordResultRequest};
