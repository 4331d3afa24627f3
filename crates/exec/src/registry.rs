//! Toolchain registry: language id → how to compile and run it

use codeon_config::EngineConfig;
use codeon_core::{CommandTemplate, Error, Result, ToolchainSpec};
use std::collections::BTreeMap;

#[cfg(unix)]
const DEFAULT_PYTHON: &str = "python3";
#[cfg(not(unix))]
const DEFAULT_PYTHON: &str = "python";

/// Where a template's program comes from
#[derive(Clone, Copy)]
enum Program {
    /// Looked up in `compiler_paths` under `key`, falling back to `default`
    Tool {
        key: &'static str,
        default: &'static str,
    },
    /// The compiled artifact itself
    Artifact,
}

struct Step {
    program: Program,
    args: &'static [&'static str],
}

struct Builtin {
    language: &'static str,
    source: &'static str,
    compile: Option<Step>,
    run: Step,
    artifact: Option<&'static str>,
    cacheable: bool,
}

const fn tool(key: &'static str, default: &'static str) -> Program {
    Program::Tool { key, default }
}

const fn interpreted(
    language: &'static str,
    source: &'static str,
    program: Program,
    args: &'static [&'static str],
) -> Builtin {
    Builtin {
        language,
        source,
        compile: None,
        run: Step { program, args },
        artifact: None,
        cacheable: false,
    }
}

const fn native(
    language: &'static str,
    source: &'static str,
    compiler: Program,
    compile_args: &'static [&'static str],
) -> Builtin {
    Builtin {
        language,
        source,
        compile: Some(Step {
            program: compiler,
            args: compile_args,
        }),
        run: Step {
            program: Program::Artifact,
            args: &[],
        },
        artifact: Some("main.exe"),
        cacheable: true,
    }
}

const BUILTINS: &[Builtin] = &[
    interpreted("python", "main.py", tool("python", DEFAULT_PYTHON), &["{source}"]),
    interpreted("pypy", "main.py", tool("pypy", "pypy"), &["{source}"]),
    interpreted("javascript", "main.js", tool("javascript", "node"), &["{source}"]),
    interpreted("dart", "main.dart", tool("dart", "dart"), &["run", "{source}"]),
    native("c", "main.c", tool("c", "gcc"), &["{source}", "-o", "{artifact}"]),
    native("cpp", "main.cpp", tool("cpp", "g++"), &["{source}", "-o", "{artifact}"]),
    native("pascal", "main.pas", tool("pascal", "fpc"), &["{source}", "-o{artifact}"]),
    native(
        "go",
        "main.go",
        tool("go", "go"),
        &["build", "-o", "{artifact}", "{source}"],
    ),
    native("asm", "main.s", tool("c", "gcc"), &["{source}", "-o", "{artifact}"]),
    // javac emits one .class per type, so there is no single artifact to cache
    Builtin {
        language: "java",
        source: "Main.java",
        compile: Some(Step {
            program: tool("java", "javac"),
            args: &["{source}"],
        }),
        run: Step {
            program: tool("java_run", "java"),
            args: &["-cp", "{workdir}", "Main"],
        },
        artifact: None,
        cacheable: false,
    },
    Builtin {
        language: "kotlin",
        source: "Main.kt",
        compile: Some(Step {
            program: tool("kotlin", "kotlinc"),
            args: &["{source}", "-include-runtime", "-d", "{artifact}"],
        }),
        run: Step {
            program: tool("java_run", "java"),
            args: &["-jar", "{artifact}"],
        },
        artifact: Some("main.jar"),
        cacheable: true,
    },
];

/// Tool keys that name a helper executable rather than a language
const HELPER_KEYS: &[&str] = &["java_run"];

impl Step {
    fn template(&self, paths: Option<&BTreeMap<String, String>>) -> CommandTemplate {
        let program = match self.program {
            Program::Tool { key, default } => paths
                .and_then(|paths| paths.get(key))
                .map(String::as_str)
                .unwrap_or(default)
                .to_string(),
            Program::Artifact => "{artifact}".to_string(),
        };
        CommandTemplate::new(program, self.args.iter().copied())
    }
}

impl Builtin {
    fn spec(&self, paths: Option<&BTreeMap<String, String>>) -> ToolchainSpec {
        ToolchainSpec {
            language: self.language.to_string(),
            source_filename: self.source.to_string(),
            compile: self.compile.as_ref().map(|step| step.template(paths)),
            run: self.run.template(paths),
            artifact: self.artifact.map(str::to_string),
            cacheable: self.cacheable,
        }
    }
}

/// Immutable mapping from language id to toolchain, built once at startup
#[derive(Debug, Clone, Default)]
pub struct ToolchainRegistry {
    toolchains: BTreeMap<String, ToolchainSpec>,
}

impl ToolchainRegistry {
    /// Every built-in language with default executables
    pub fn builtin() -> Self {
        Self::with_compiler_paths(None)
    }

    /// Build the registry the configuration describes
    ///
    /// With a `compiler_paths` map only the languages it lists are enabled;
    /// without one every built-in language is.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::with_compiler_paths(config.compiler_paths.as_ref())
    }

    fn with_compiler_paths(paths: Option<&BTreeMap<String, String>>) -> Self {
        let toolchains = BUILTINS
            .iter()
            .filter(|builtin| paths.map_or(true, |paths| paths.contains_key(builtin.language)))
            .map(|builtin| (builtin.language.to_string(), builtin.spec(paths)))
            .collect::<BTreeMap<_, _>>();

        if let Some(paths) = paths {
            for key in paths.keys() {
                if !toolchains.contains_key(key) && !HELPER_KEYS.contains(&key.as_str()) {
                    tracing::warn!(language = %key, "compiler_paths names an unknown language, ignoring");
                }
            }
        }

        Self { toolchains }
    }

    /// Use an explicit table instead of the built-ins
    pub fn from_specs(specs: impl IntoIterator<Item = ToolchainSpec>) -> Self {
        Self {
            toolchains: specs
                .into_iter()
                .map(|spec| (spec.language.clone(), spec))
                .collect(),
        }
    }

    pub fn resolve(&self, language: &str) -> Result<&ToolchainSpec> {
        self.toolchains
            .get(language)
            .ok_or_else(|| Error::unsupported_language(language))
    }

    /// Supported language ids, sorted
    pub fn languages(&self) -> Vec<&str> {
        self.toolchains.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.toolchains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toolchains.is_empty()
    }
}
