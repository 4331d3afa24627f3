//! Configuration for the codeon execution engine
//!
//! The engine reads one JSON document describing which toolchains are
//! enabled, where their executables live, and the runtime limits. Values can
//! be overridden from the environment and, last, by the caller.

pub mod config;
pub mod loader;

pub use config::*;
pub use loader::*;
