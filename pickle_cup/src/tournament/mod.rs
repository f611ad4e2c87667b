//! Tournament module: creation, first-round seeding and bracket views.
//!
//! ## Example
//!
//! ```no_run
//! use pickle_cup::db::MemoryStore;
//! use pickle_cup::tournament::{NewTournament, TournamentManager, TournamentStructure};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(MemoryStore::new());
//!     let manager = TournamentManager::new(store.clone(), store.clone(), store.clone());
//!
//!     let creator = uuid::Uuid::new_v4();
//!     let request = NewTournament::new("Dink Open", TournamentStructure::SingleElimination);
//!     let tournament = manager.create_tournament(creator, request).await?;
//!     println!("Created {}", tournament.name);
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod manager;
pub mod models;

pub use errors::{TournamentError, TournamentResult};
pub use manager::TournamentManager;
pub use models::{
    BracketView, CreatedTournament, MAX_NAME_LEN, NewTournament, Tournament, TournamentId,
    TournamentStatus, TournamentStructure,
};
