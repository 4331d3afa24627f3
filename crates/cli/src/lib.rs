//! Command-line front end and HTTP adapter for the codeon engine

pub mod cli;
pub mod commands;
pub mod server;

pub use cli::Cli;
pub use commands::Commands;
