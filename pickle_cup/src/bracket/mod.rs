//! Bracket generation from an ordered team selection.
//!
//! Teams are paired two at a time in the order the caller selected them:
//! `[A, B, C, D]` yields `A vs B` and `C vs D` for round 1. There is no
//! seeding, no byes and no advancement to later rounds.
//!
//! ## Example
//!
//! ```
//! use pickle_cup::bracket::{build_first_round, render_bracket};
//! use pickle_cup::team::TeamRef;
//! use uuid::Uuid;
//!
//! let teams = vec![
//!     TeamRef::new(Uuid::new_v4(), "Dink Dynasty"),
//!     TeamRef::new(Uuid::new_v4(), "Third Shot Drop"),
//! ];
//! let round = build_first_round(&teams).unwrap();
//! assert_eq!(round[0].to_string(), "Dink Dynasty vs Third Shot Drop");
//! println!("{}", render_bracket(&round));
//! ```

pub mod errors;
pub mod generator;

pub use errors::{BracketError, BracketResult, ValidationReason};
pub use generator::{
    EMPTY_BRACKET_PROMPT, Matchup, build_first_round, commit_round, render_bracket,
    validate_selection,
};
