//! Internal modules for the Pickle Cup client.
//!
//! This library provides the HTTP API client, the shared session cache,
//! command parsing and text formatting used by the pc_client binary.

pub mod api_client;
pub mod commands;
pub mod display;
pub mod session;
