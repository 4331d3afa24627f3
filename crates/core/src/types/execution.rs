//! Execution request and result types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One call to the engine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub source: String,
    pub language: String,
    #[serde(default)]
    pub stdin: String,
}

impl ExecutionRequest {
    pub fn new(
        source: impl Into<String>,
        language: impl Into<String>,
        stdin: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            language: language.into(),
            stdin: stdin.into(),
        }
    }
}

/// How an execution ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExecutionOutcome {
    /// Program exited with status 0
    Success,
    /// Program ran and exited non-zero (or was killed by a signal)
    RuntimeFailure { exit_code: Option<i32> },
    /// Compiler exited non-zero
    CompilationError,
    /// Compiler exceeded its own time bound
    CompilationTimeout,
    /// Program killed after exceeding the execution timeout
    ExecutionTimedOut,
    /// Compiler or program could not be launched
    LaunchError,
    /// No toolchain registered for the language
    UnsupportedLanguage,
}

impl ExecutionOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionOutcome::Success)
    }

    /// Whether the program itself was started
    #[must_use]
    pub fn reached_runner(&self) -> bool {
        matches!(
            self,
            ExecutionOutcome::Success
                | ExecutionOutcome::RuntimeFailure { .. }
                | ExecutionOutcome::ExecutionTimedOut
        )
    }
}

/// Everything returned to the caller of `execute`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub duration_seconds: f64,
    #[serde(rename = "peakMemoryKB")]
    pub peak_memory_kb: u64,
    pub created_files: BTreeMap<String, String>,
    pub outcome: ExecutionOutcome,
    /// Compilation was skipped because the artifact came from the build cache
    pub cache_hit: bool,
}

impl ExecutionResult {
    /// A result for an execution that never produced program output
    pub fn failure(outcome: ExecutionOutcome, stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            success: false,
            duration_seconds: 0.0,
            peak_memory_kb: 0,
            created_files: BTreeMap::new(),
            outcome,
            cache_hit: false,
        }
    }

    pub fn unsupported_language(language: &str) -> Self {
        Self::failure(
            ExecutionOutcome::UnsupportedLanguage,
            format!("Unsupported language: {language}"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_result_is_empty() {
        let result = ExecutionResult::failure(ExecutionOutcome::CompilationError, "bad");
        assert!(!result.success);
        assert_eq!(result.stdout, "");
        assert_eq!(result.duration_seconds, 0.0);
        assert_eq!(result.peak_memory_kb, 0);
        assert!(result.created_files.is_empty());
        assert!(!result.outcome.reached_runner());
    }

    #[test]
    fn test_result_serializes_with_external_field_names() {
        let result = ExecutionResult::unsupported_language("cobol");
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(json["durationSeconds"], 0.0);
        assert_eq!(json["peakMemoryKB"], 0);
        assert_eq!(json["createdFiles"], serde_json::json!({}));
        assert_eq!(json["outcome"]["kind"], "unsupported_language");
        assert_eq!(json["cacheHit"], false);
    }

    #[test]
    fn test_runtime_failure_carries_exit_code() {
        let outcome = ExecutionOutcome::RuntimeFailure { exit_code: Some(3) };
        let json = serde_json::to_value(outcome).unwrap();
        assert_eq!(json["kind"], "runtime_failure");
        assert_eq!(json["exit_code"], 3);
        assert!(outcome.reached_runner());
        assert!(!outcome.is_success());
    }
}
