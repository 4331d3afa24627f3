//! Multi-language code execution for codeon
//!
//! Given source text and a language id, the [`Engine`] compiles the program
//! when the toolchain needs it (reusing artifacts from the build cache),
//! runs it with bounded time and output, samples its memory, and returns
//! everything as an `ExecutionResult`.

pub mod compiler;
pub mod engine;
pub mod registry;
pub mod runner;
pub mod sampler;
pub mod workspace;

pub use compiler::{compile, CompileOutcome};
pub use engine::{Engine, EngineSettings};
pub use registry::ToolchainRegistry;
pub use runner::run;
pub use sampler::MemorySampler;
pub use workspace::Workspace;
