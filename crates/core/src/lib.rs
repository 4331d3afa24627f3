//! Core domain types, errors, and constants for the codeon execution engine.
//!
//! Every other crate in the workspace builds on the items defined here:
//!
//! - **`errors`**: the engine-wide `Error` enum and `Result` alias.
//! - **`types`**: the request/result data model and the toolchain description
//!   consumed by the registry.
//! - **`constants`**: boundary values that must be reproduced exactly
//!   (output cap, timeouts, sampling interval) and shared names.

pub mod constants;
pub mod errors;
pub mod types;

pub use self::{
    constants::*,
    errors::{Error, Result, ResultExt},
    types::*,
};
