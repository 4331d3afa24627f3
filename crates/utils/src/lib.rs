//! Shared utilities for codeon
//!
//! Small building blocks used by the execution engine and the binary: RAII
//! cleanup guards, logging setup and XDG path resolution.

pub mod cleanup;
pub mod tracing;
pub mod xdg;

pub use cleanup::*;
pub use xdg::*;
