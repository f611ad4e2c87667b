//! Doubles teams: creation by partner username, membership listings and
//! bracket previews over a team selection.

pub mod errors;
pub mod manager;
pub mod models;

pub use errors::{TeamError, TeamResult};
pub use manager::TeamManager;
pub use models::{NewTeam, Team, TeamId, TeamRef, TeamSummary};
