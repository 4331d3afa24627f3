use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use codeon_core::{ExecutionRequest, ExecutionResult};
use codeon_exec::Engine;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn default_language() -> String {
    "python".to_string()
}

/// Body of `POST /api/run`
#[derive(Debug, Deserialize)]
pub struct RunPayload {
    #[serde(default)]
    pub code: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub input: String,
}

/// Response of `POST /api/run`
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct RunResponse {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    /// Seconds
    pub duration: f64,
    /// Peak resident memory in KB
    pub memory: u64,
    pub files: BTreeMap<String, String>,
}

impl From<ExecutionResult> for RunResponse {
    fn from(result: ExecutionResult) -> Self {
        Self {
            stdout: result.stdout,
            stderr: result.stderr,
            success: result.success,
            duration: result.duration_seconds,
            memory: result.peak_memory_kb,
            files: result.created_files,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LanguagesResponse {
    pub languages: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

/// Handle POST /api/run
pub async fn handle_run(State(engine): State<Engine>, body: String) -> Response {
    let payload: RunPayload = match serde_json::from_str(&body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::debug!(error = %e, "rejecting malformed run request");
            return error_response(StatusCode::BAD_REQUEST, "Invalid JSON");
        }
    };

    if engine.registry().resolve(&payload.language).is_err() {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!(
                "Language \"{}\" is not supported or disabled.",
                payload.language
            ),
        );
    }

    if payload.code.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "No code provided");
    }

    let request = ExecutionRequest::new(payload.code, payload.language, payload.input);
    match engine.execute(&request).await {
        Ok(result) => (StatusCode::OK, Json(RunResponse::from(result))).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "engine failure");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// Handle GET /api/languages
pub async fn handle_languages(State(engine): State<Engine>) -> Json<LanguagesResponse> {
    Json(LanguagesResponse {
        languages: engine.languages().into_iter().map(str::to_string).collect(),
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use codeon_cache::BuildCache;
    use codeon_core::{CommandTemplate, ToolchainSpec};
    use codeon_exec::{EngineSettings, ToolchainRegistry};
    use std::time::Duration;
    use tempfile::TempDir;

    fn engine(root: &TempDir) -> Engine {
        let registry = ToolchainRegistry::from_specs([ToolchainSpec::interpreted(
            "sh",
            "main.sh",
            CommandTemplate::new("sh", ["{source}"]),
        )]);
        let cache = BuildCache::new(root.path().join("cache"), None).unwrap();
        Engine::from_parts(
            registry,
            cache,
            EngineSettings {
                workspace_root: root.path().join("work"),
                execution_timeout: Duration::from_secs(5),
                compile_timeout: codeon_core::COMPILE_TIMEOUT,
            },
        )
    }

    async fn body_json<T: serde::de::DeserializeOwned>(response: Response) -> T {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_run_success() {
        let root = TempDir::new().unwrap();
        let body = r#"{ "code": "read x; echo \"got $x\"; echo hi > f.txt", "language": "sh", "input": "42\n" }"#;

        let response = handle_run(State(engine(&root)), body.to_string()).await;
        assert_eq!(response.status(), StatusCode::OK);

        let run: RunResponse = body_json(response).await;
        assert!(run.success);
        assert_eq!(run.stdout, "got 42\n");
        assert_eq!(run.stderr, "");
        assert_eq!(run.files["f.txt"], "hi\n");
    }

    #[tokio::test]
    async fn test_failed_program_is_still_ok_status() {
        let root = TempDir::new().unwrap();
        let body = r#"{ "code": "exit 1", "language": "sh" }"#;

        let response = handle_run(State(engine(&root)), body.to_string()).await;
        assert_eq!(response.status(), StatusCode::OK);
        let run: RunResponse = body_json(response).await;
        assert!(!run.success);
    }

    #[tokio::test]
    async fn test_invalid_json() {
        let root = TempDir::new().unwrap();
        let response = handle_run(State(engine(&root)), "{ nope".to_string()).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let error: ErrorResponse = body_json(response).await;
        assert_eq!(error.error, "Invalid JSON");
    }

    #[tokio::test]
    async fn test_unsupported_language_checked_before_code() {
        let root = TempDir::new().unwrap();
        // language defaults to python, which this engine does not have
        let response = handle_run(State(engine(&root)), "{}".to_string()).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let error: ErrorResponse = body_json(response).await;
        assert_eq!(error.error, "Language \"python\" is not supported or disabled.");
    }

    #[tokio::test]
    async fn test_empty_code() {
        let root = TempDir::new().unwrap();
        let body = r#"{ "code": "", "language": "sh" }"#;

        let response = handle_run(State(engine(&root)), body.to_string()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let error: ErrorResponse = body_json(response).await;
        assert_eq!(error.error, "No code provided");
    }

    #[tokio::test]
    async fn test_engine_failure_is_server_error() {
        let root = TempDir::new().unwrap();
        // A regular file where the workspace root should be
        let blocked = root.path().join("blocked");
        std::fs::write(&blocked, "").unwrap();
        let engine = Engine::from_parts(
            ToolchainRegistry::from_specs([ToolchainSpec::interpreted(
                "sh",
                "main.sh",
                CommandTemplate::new("sh", ["{source}"]),
            )]),
            BuildCache::new(root.path().join("cache"), None).unwrap(),
            EngineSettings {
                workspace_root: blocked.join("work"),
                execution_timeout: Duration::from_secs(5),
                compile_timeout: codeon_core::COMPILE_TIMEOUT,
            },
        );

        let body = r#"{ "code": "echo hi", "language": "sh" }"#;
        let response = handle_run(State(engine), body.to_string()).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_languages() {
        let root = TempDir::new().unwrap();
        let Json(languages) = handle_languages(State(engine(&root))).await;
        assert_eq!(languages.languages, vec!["sh"]);
    }
}
