use codeon_config::EngineConfig;
use codeon_core::{ExecutionOutcome, ExecutionRequest, ExecutionResult};
use codeon_exec::Engine;
use eyre::WrapErr;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Where the program's stdin comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Empty,
    Text(String),
    File(PathBuf),
}

impl Input {
    fn read(self) -> eyre::Result<String> {
        match self {
            Input::Empty => Ok(String::new()),
            Input::Text(text) => Ok(text),
            Input::File(path) => std::fs::read_to_string(&path)
                .wrap_err_with(|| format!("failed to read input file {}", path.display())),
        }
    }
}

pub async fn execute(
    config: &EngineConfig,
    language: &str,
    file: &Path,
    input: Input,
    json: bool,
) -> eyre::Result<ExitCode> {
    let source = read_source(file)?;
    let stdin = input.read()?;

    let engine = Engine::new(config)?;
    let result = engine
        .execute(&ExecutionRequest::new(source, language, stdin))
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        replay(&result)?;
    }

    Ok(if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn read_source(file: &Path) -> eyre::Result<String> {
    if file == Path::new("-") {
        let mut source = String::new();
        std::io::stdin()
            .read_to_string(&mut source)
            .wrap_err("failed to read source from stdin")?;
        return Ok(source);
    }

    std::fs::read_to_string(file)
        .wrap_err_with(|| format!("failed to read source file {}", file.display()))
}

/// Write the program's streams back to ours, followed by a summary
fn replay(result: &ExecutionResult) -> eyre::Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(result.stdout.as_bytes())?;
    stdout.flush()?;

    let mut stderr = std::io::stderr().lock();
    stderr.write_all(result.stderr.as_bytes())?;
    for (name, content) in &result.created_files {
        writeln!(stderr, "--- {name} ---")?;
        writeln!(stderr, "{content}")?;
    }
    writeln!(stderr, "{}", summary(result))?;
    Ok(())
}

pub(crate) fn summary(result: &ExecutionResult) -> String {
    let status = match result.outcome {
        ExecutionOutcome::Success => "ok".to_string(),
        ExecutionOutcome::RuntimeFailure {
            exit_code: Some(code),
        } => format!("exit {code}"),
        ExecutionOutcome::RuntimeFailure { exit_code: None } => "killed by signal".to_string(),
        ExecutionOutcome::CompilationError => "compilation error".to_string(),
        ExecutionOutcome::CompilationTimeout => "compilation timed out".to_string(),
        ExecutionOutcome::ExecutionTimedOut => "timed out".to_string(),
        ExecutionOutcome::LaunchError => "launch error".to_string(),
        ExecutionOutcome::UnsupportedLanguage => "unsupported language".to_string(),
    };

    let mut line = format!(
        "[{status}] {:.3}s, {} KB",
        result.duration_seconds, result.peak_memory_kb
    );
    if result.cache_hit {
        line.push_str(", cached build");
    }
    line
}
