//! HTTP API server for Pickle Cup.
//!
//! The binary in `main.rs` wires these modules together; they are exposed as a
//! library so integration tests can build the router against the in-memory store.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
