//! Domain types shared across the workspace

pub mod execution;
pub mod toolchain;

pub use execution::*;
pub use toolchain::*;
