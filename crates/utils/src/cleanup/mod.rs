//! Resource cleanup for workspaces and child process groups

pub mod handler;
pub mod process;

pub use handler::{cleanup_all_resources, init_cleanup_handler, TempDirGuard};
pub use process::{kill_process_group, ProcessGroupGuard};
