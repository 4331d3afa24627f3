//! Compile step: turn a workspace's source file into a runnable artifact

use crate::runner::drain_streams;
use crate::runner::output::{cap_text, decode_capped, read_capped};
use crate::runner::process;
use crate::workspace::Workspace;
use codeon_core::{ExecutionOutcome, ExecutionResult, ToolchainSpec, STDERR_TRUNCATION_MARKER};
use codeon_utils::ProcessGroupGuard;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Result of the compile step
#[derive(Debug)]
pub enum CompileOutcome {
    /// Ready to run; `artifact` is the declared output, if the toolchain has one
    Ready { artifact: Option<PathBuf> },
    /// Compilation did not produce a runnable program
    Failed(ExecutionResult),
}

/// Run the toolchain's compile command inside the workspace
///
/// The source file must already be in place. Toolchains without a compile
/// step are ready immediately. `timeout` bounds the compiler process itself;
/// helpers it leaves holding the output pipes are killed after a short drain.
pub async fn compile(
    spec: &ToolchainSpec,
    workspace: &Workspace,
    timeout: Duration,
) -> CompileOutcome {
    let Some(template) = &spec.compile else {
        return CompileOutcome::Ready { artifact: None };
    };

    let artifact = workspace.artifact_path(spec);
    let rendered = template.render(&workspace.template_context(spec, artifact.as_deref()));
    tracing::debug!(command = %rendered, "compiling");

    let started = Instant::now();
    let mut child = match process::command(&rendered, workspace.path(), false).spawn() {
        Ok(child) => child,
        Err(e) => {
            tracing::warn!(program = %rendered.program, error = %e, "compiler could not be launched");
            return failed(ExecutionOutcome::LaunchError, format!("Compilation Failed: {e}"));
        }
    };
    let group = child.id().map(ProcessGroupGuard::new);

    let stdout_task = tokio::spawn(read_capped(child.stdout.take()));
    let stderr_task = tokio::spawn(read_capped(child.stderr.take()));

    let status = match tokio::time::timeout(timeout, child.wait()).await {
        Ok(Ok(status)) => status,
        Ok(Err(e)) => {
            stdout_task.abort();
            stderr_task.abort();
            return failed(ExecutionOutcome::LaunchError, format!("Compilation Failed: {e}"));
        }
        Err(_) => {
            if let Some(group) = &group {
                group.kill();
            }
            if let Err(e) = child.kill().await {
                tracing::debug!(error = %e, "compiler already gone at timeout");
            }
            stdout_task.abort();
            stderr_task.abort();
            tracing::info!(timeout_ms = timeout.as_millis() as u64, "compilation timed out");
            return failed(ExecutionOutcome::CompilationTimeout, "Compilation Timed Out");
        }
    };
    let (stdout, stderr) = drain_streams(stdout_task, stderr_task, group.as_ref()).await;

    let duration_ms = started.elapsed().as_millis() as u64;
    if !status.success() {
        tracing::debug!(exit_code = ?status.code(), duration_ms, "compilation failed");
        let diagnostics = format!(
            "Compilation Error:\n{}\n{}",
            String::from_utf8_lossy(&stderr),
            String::from_utf8_lossy(&stdout)
        );
        return failed(
            ExecutionOutcome::CompilationError,
            cap_text(&diagnostics, STDERR_TRUNCATION_MARKER),
        );
    }

    if let Some(path) = &artifact {
        if !path.is_file() {
            let name = spec.artifact.as_deref().unwrap_or_default();
            tracing::warn!(artifact = %name, "compiler exited 0 without producing its artifact");
            let diagnostics = format!(
                "Compilation Error:\n{}\ncompiler did not produce {name}",
                decode_capped(&stderr, STDERR_TRUNCATION_MARKER)
            );
            return failed(ExecutionOutcome::CompilationError, diagnostics);
        }
    }

    tracing::debug!(duration_ms, "compilation succeeded");
    CompileOutcome::Ready { artifact }
}

fn failed(outcome: ExecutionOutcome, stderr: impl Into<String>) -> CompileOutcome {
    CompileOutcome::Failed(ExecutionResult::failure(outcome, stderr))
}
