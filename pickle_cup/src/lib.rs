//! # Pickle Cup
//!
//! Pickleball tournament organizing: doubles teams, tournaments seeded from an
//! ordered team selection, player search and win/loss statistics, with
//! passwordless (magic link) sign-in.
//!
//! ## Architecture
//!
//! Business logic lives in managers that depend only on the repository traits
//! in [`db`], so the same code runs against PostgreSQL or the in-memory store:
//!
//! - **Bracket**: pairs teams two at a time, in selection order, into round 1
//! - **Tournaments**: creation, first-round seeding with compensation on failure
//! - **Teams**: creation by partner username, bracket previews
//! - **Players**: name search and stats
//! - **Matches**: recent listings and result recording
//! - **Auth**: magic links, JWT access tokens, rotating refresh tokens
//!
//! ## Core Modules
//!
//! - [`bracket`]: first-round pairing, batch persistence and text rendering
//! - [`db`]: repository traits, [`db::PgStore`], [`db::MemoryStore`] and timeouts
//!
//! ## Example
//!
//! ```
//! use pickle_cup::bracket::build_first_round;
//! use pickle_cup::team::TeamRef;
//! use uuid::Uuid;
//!
//! let teams: Vec<TeamRef> = ["A", "B", "C", "D"]
//!     .iter()
//!     .map(|name| TeamRef::new(Uuid::new_v4(), *name))
//!     .collect();
//! let round = build_first_round(&teams).unwrap();
//! assert_eq!(round.len(), 2);
//! assert_eq!(round[1].to_string(), "C vs D");
//! ```

/// Passwordless authentication.
pub mod auth;

/// Round-1 bracket generation.
pub mod bracket;
pub use bracket::{BracketError, Matchup, build_first_round, commit_round, render_bracket};

/// Store abstraction and implementations.
pub mod db;

pub mod matches;
pub mod player;
pub mod stats;
pub mod team;
pub mod tournament;

pub use stats::PlayerStats;
