//! Run step: execute the program under a time bound and capture what it did

pub mod files;
pub mod output;
pub mod process;

use crate::sampler::MemorySampler;
use crate::workspace::Workspace;
use codeon_core::{
    ExecutionOutcome, ExecutionResult, ToolchainSpec, STDERR_TRUNCATION_MARKER,
    STDOUT_TRUNCATION_MARKER, STREAM_DRAIN_TIMEOUT,
};
use codeon_utils::ProcessGroupGuard;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use self::output::{decode_capped, read_capped};

/// Run the toolchain's program inside the workspace
///
/// `stdin` is written to the child and then closed. When `timeout` expires
/// the whole process group is killed and the result reports
/// `ExecutionTimedOut` with empty output and no files.
pub async fn run(
    spec: &ToolchainSpec,
    workspace: &Workspace,
    artifact: Option<&Path>,
    stdin: &str,
    timeout: Duration,
) -> ExecutionResult {
    let rendered = spec.run.render(&workspace.template_context(spec, artifact));
    tracing::debug!(command = %rendered, "running");

    let started = Instant::now();
    let mut child = match process::command(&rendered, workspace.path(), true).spawn() {
        Ok(child) => child,
        Err(e) => {
            tracing::warn!(program = %rendered.program, error = %e, "program could not be launched");
            return ExecutionResult::failure(
                ExecutionOutcome::LaunchError,
                format!("Execution Error: {e}"),
            );
        }
    };

    let pid = child.id();
    let group = pid.map(ProcessGroupGuard::new);
    let sampler = pid.map(MemorySampler::start);

    let stdin_task = child.stdin.take().map(|mut pipe| {
        let input = stdin.as_bytes().to_vec();
        tokio::spawn(async move {
            // A program that exits without reading closes the pipe first
            if let Err(e) = pipe.write_all(&input).await {
                tracing::trace!(error = %e, "stdin not fully consumed");
            }
            let _ = pipe.shutdown().await;
        })
    });
    let stdout_task = tokio::spawn(read_capped(child.stdout.take()));
    let stderr_task = tokio::spawn(read_capped(child.stderr.take()));

    let waited = tokio::time::timeout(timeout, child.wait()).await;
    let elapsed = started.elapsed();

    let status = match waited {
        Ok(Ok(status)) => status,
        Ok(Err(e)) => {
            abort_all(stdin_task, stdout_task, stderr_task);
            return ExecutionResult::failure(
                ExecutionOutcome::LaunchError,
                format!("Execution Error: {e}"),
            );
        }
        Err(_) => {
            if let Some(group) = &group {
                group.kill();
            }
            if let Err(e) = child.kill().await {
                tracing::debug!(error = %e, "child already gone at timeout");
            }
            let peak_bytes = match sampler {
                Some(sampler) => sampler.finish().await,
                None => 0,
            };
            abort_all(stdin_task, stdout_task, stderr_task);

            tracing::info!(
                timeout_ms = timeout.as_millis() as u64,
                "execution timed out, process group killed"
            );
            return ExecutionResult {
                stdout: String::new(),
                stderr: "Execution Timed Out".to_string(),
                success: false,
                duration_seconds: round_to_millis(elapsed),
                peak_memory_kb: peak_bytes / 1024,
                created_files: BTreeMap::new(),
                outcome: ExecutionOutcome::ExecutionTimedOut,
                cache_hit: false,
            };
        }
    };

    let peak_bytes = match sampler {
        Some(sampler) => sampler.finish().await,
        None => 0,
    };
    let (stdout, stderr) = drain_streams(stdout_task, stderr_task, group.as_ref()).await;
    if let Some(task) = stdin_task {
        task.abort();
    }

    let outcome = if status.success() {
        ExecutionOutcome::Success
    } else {
        ExecutionOutcome::RuntimeFailure {
            exit_code: status.code(),
        }
    };
    tracing::debug!(
        exit_code = ?status.code(),
        duration_ms = elapsed.as_millis() as u64,
        peak_memory_kb = peak_bytes / 1024,
        "program exited"
    );

    let created_files = {
        let workdir = workspace.path().to_path_buf();
        let spec = spec.clone();
        tokio::task::spawn_blocking(move || files::collect_created_files(&workdir, &spec))
            .await
            .unwrap_or_default()
    };

    ExecutionResult {
        stdout: decode_capped(&stdout, STDOUT_TRUNCATION_MARKER),
        stderr: decode_capped(&stderr, STDERR_TRUNCATION_MARKER),
        success: outcome.is_success(),
        duration_seconds: round_to_millis(elapsed),
        peak_memory_kb: peak_bytes / 1024,
        created_files,
        outcome,
        cache_hit: false,
    }
}

/// Collect both streams once the child has exited
///
/// Anything the program left running may still hold a pipe open; after a
/// bounded wait its process group is killed and the streams get one more
/// bounded wait.
pub(crate) async fn drain_streams(
    mut stdout_task: JoinHandle<Vec<u8>>,
    mut stderr_task: JoinHandle<Vec<u8>>,
    group: Option<&ProcessGroupGuard>,
) -> (Vec<u8>, Vec<u8>) {
    let deadline = Instant::now() + STREAM_DRAIN_TIMEOUT;
    let mut stdout = join_by(&mut stdout_task, deadline).await;
    let mut stderr = join_by(&mut stderr_task, deadline).await;

    if stdout.is_none() || stderr.is_none() {
        tracing::debug!("output pipes still open after exit, killing process group");
        if let Some(group) = group {
            group.kill();
        }
        let deadline = Instant::now() + STREAM_DRAIN_TIMEOUT;
        if stdout.is_none() {
            stdout = join_by(&mut stdout_task, deadline).await;
        }
        if stderr.is_none() {
            stderr = join_by(&mut stderr_task, deadline).await;
        }
    }

    stdout_task.abort();
    stderr_task.abort();
    (stdout.unwrap_or_default(), stderr.unwrap_or_default())
}

async fn join_by(task: &mut JoinHandle<Vec<u8>>, deadline: Instant) -> Option<Vec<u8>> {
    match tokio::time::timeout_at(deadline, task).await {
        Ok(joined) => Some(joined.unwrap_or_default()),
        Err(_) => None,
    }
}

fn abort_all(
    stdin_task: Option<JoinHandle<()>>,
    stdout_task: JoinHandle<Vec<u8>>,
    stderr_task: JoinHandle<Vec<u8>>,
) {
    if let Some(task) = stdin_task {
        task.abort();
    }
    stdout_task.abort();
    stderr_task.abort();
}

fn round_to_millis(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to_millis() {
        assert_eq!(round_to_millis(Duration::from_micros(1_234_567)), 1.235);
        assert_eq!(round_to_millis(Duration::from_micros(400)), 0.0);
        assert_eq!(round_to_millis(Duration::from_secs(2)), 2.0);
    }

    #[cfg(unix)]
    mod unix {
        use super::super::*;
        use codeon_core::{CommandTemplate, MAX_OUTPUT_CHARS};
        use tempfile::TempDir;

        fn sh() -> ToolchainSpec {
            ToolchainSpec::interpreted("sh", "main.sh", CommandTemplate::new("sh", ["{source}"]))
        }

        async fn run_script(script: &str, stdin: &str, timeout: Duration) -> (ExecutionResult, TempDir) {
            let root = TempDir::new().unwrap();
            let spec = sh();
            let workspace = Workspace::create(root.path()).unwrap();
            std::fs::write(workspace.source_path(&spec), script).unwrap();
            let result = run(&spec, &workspace, None, stdin, timeout).await;
            (result, root)
        }

        #[tokio::test]
        async fn test_echoes_stdin() {
            let (result, _root) = run_script("cat", "hello\nworld\n", Duration::from_secs(5)).await;
            assert!(result.success);
            assert_eq!(result.outcome, ExecutionOutcome::Success);
            assert_eq!(result.stdout, "hello\nworld\n");
            assert_eq!(result.stderr, "");
        }

        #[tokio::test]
        async fn test_non_zero_exit_is_runtime_failure() {
            let (result, _root) =
                run_script("echo oops >&2; exit 3", "", Duration::from_secs(5)).await;
            assert!(!result.success);
            assert_eq!(
                result.outcome,
                ExecutionOutcome::RuntimeFailure { exit_code: Some(3) }
            );
            assert_eq!(result.stderr, "oops\n");
        }

        #[tokio::test]
        async fn test_signal_death_has_no_exit_code() {
            let (result, _root) = run_script("kill -9 $$", "", Duration::from_secs(5)).await;
            assert_eq!(
                result.outcome,
                ExecutionOutcome::RuntimeFailure { exit_code: None }
            );
        }

        #[tokio::test]
        async fn test_timeout_kills_program() {
            let started = std::time::Instant::now();
            let (result, _root) =
                run_script("echo partial; sleep 30", "", Duration::from_millis(300)).await;

            assert_eq!(result.outcome, ExecutionOutcome::ExecutionTimedOut);
            assert!(!result.success);
            assert_eq!(result.stdout, "");
            assert_eq!(result.stderr, "Execution Timed Out");
            assert!(result.created_files.is_empty());
            assert!(result.duration_seconds >= 0.3);
            assert!(started.elapsed() < Duration::from_secs(10));
        }

        #[tokio::test]
        async fn test_output_is_capped() {
            let script = format!(
                "i=0; while [ $i -lt {} ]; do printf 'xxxxxxxxxx'; i=$((i+1)); done",
                MAX_OUTPUT_CHARS / 10 + 100
            );
            let (result, _root) = run_script(&script, "", Duration::from_secs(30)).await;

            assert!(result.success);
            assert!(result.stdout.ends_with(STDOUT_TRUNCATION_MARKER));
            assert_eq!(
                result.stdout.chars().count(),
                MAX_OUTPUT_CHARS + STDOUT_TRUNCATION_MARKER.chars().count()
            );
        }

        #[tokio::test]
        async fn test_background_process_does_not_hold_result() {
            let started = std::time::Instant::now();
            let (result, _root) =
                run_script("sleep 30 & echo done", "", Duration::from_secs(5)).await;

            assert!(result.success);
            assert_eq!(result.stdout, "done\n");
            assert!(started.elapsed() < Duration::from_secs(10));
        }

        #[tokio::test]
        async fn test_created_files_are_returned() {
            let (result, _root) =
                run_script("echo saved > out.txt; mkdir sub", "", Duration::from_secs(5)).await;
            assert!(result.success);
            assert_eq!(result.created_files.len(), 1);
            assert_eq!(result.created_files["out.txt"], "saved\n");
        }

        #[tokio::test]
        async fn test_missing_program_is_launch_error() {
            let root = TempDir::new().unwrap();
            let spec = ToolchainSpec::interpreted(
                "ghost",
                "main.x",
                CommandTemplate::new("codeon-no-such-interpreter", ["{source}"]),
            );
            let workspace = Workspace::create(root.path()).unwrap();

            let result = run(&spec, &workspace, None, "", Duration::from_secs(1)).await;
            assert_eq!(result.outcome, ExecutionOutcome::LaunchError);
            assert!(result.stderr.starts_with("Execution Error: "));
        }
    }
}
