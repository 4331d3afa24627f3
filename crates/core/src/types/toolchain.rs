//! Toolchain descriptions: how a language is compiled and run

use crate::constants::{
    ARTIFACT_PLACEHOLDER, INTERMEDIATE_EXTENSIONS, SOURCE_PLACEHOLDER, WORKDIR_PLACEHOLDER,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A program invocation with `{source}`, `{artifact}` and `{workdir}`
/// placeholders, expanded per workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandTemplate {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Values substituted into a [`CommandTemplate`]
#[derive(Debug, Clone, Copy)]
pub struct TemplateContext<'a> {
    /// Source filename, relative to the workspace
    pub source: &'a str,
    /// Absolute artifact path, when the toolchain produces one
    pub artifact: Option<&'a Path>,
    /// Absolute workspace directory
    pub workdir: &'a Path,
}

/// A fully expanded command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandTemplate {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Expand every placeholder for the given workspace
    #[must_use]
    pub fn render(&self, ctx: &TemplateContext<'_>) -> RenderedCommand {
        RenderedCommand {
            program: expand(&self.program, ctx),
            args: self.args.iter().map(|arg| expand(arg, ctx)).collect(),
        }
    }
}

fn expand(value: &str, ctx: &TemplateContext<'_>) -> String {
    if !value.contains('{') {
        return value.to_string();
    }

    let mut expanded = value
        .replace(SOURCE_PLACEHOLDER, ctx.source)
        .replace(WORKDIR_PLACEHOLDER, &ctx.workdir.to_string_lossy());

    if let Some(artifact) = ctx.artifact {
        expanded = expanded.replace(ARTIFACT_PLACEHOLDER, &artifact.to_string_lossy());
    }

    expanded
}

impl std::fmt::Display for RenderedCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.args.is_empty() {
            write!(f, "{}", self.program)
        } else {
            write!(f, "{} {}", self.program, self.args.join(" "))
        }
    }
}

/// Everything the engine needs to know about one language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolchainSpec {
    pub language: String,
    pub source_filename: String,
    #[serde(default)]
    pub compile: Option<CommandTemplate>,
    pub run: CommandTemplate,
    /// Single compiled output file, relative to the workspace
    #[serde(default)]
    pub artifact: Option<String>,
    /// Whether the artifact may be stored in the build cache
    #[serde(default)]
    pub cacheable: bool,
}

impl ToolchainSpec {
    /// A language that runs straight from its source file
    pub fn interpreted(
        language: impl Into<String>,
        source_filename: impl Into<String>,
        run: CommandTemplate,
    ) -> Self {
        Self {
            language: language.into(),
            source_filename: source_filename.into(),
            compile: None,
            run,
            artifact: None,
            cacheable: false,
        }
    }

    /// A language with a compile step producing a single cacheable artifact
    pub fn compiled(
        language: impl Into<String>,
        source_filename: impl Into<String>,
        artifact: impl Into<String>,
        compile: CommandTemplate,
        run: CommandTemplate,
    ) -> Self {
        Self {
            language: language.into(),
            source_filename: source_filename.into(),
            compile: Some(compile),
            run,
            artifact: Some(artifact.into()),
            cacheable: true,
        }
    }

    #[must_use]
    pub fn needs_compile(&self) -> bool {
        self.compile.is_some()
    }

    /// Only single-file artifacts from a real compile step are cached
    #[must_use]
    pub fn is_cacheable(&self) -> bool {
        self.cacheable && self.compile.is_some() && self.artifact.is_some()
    }

    /// Whether a workspace file is the source or a build output rather than
    /// something the program wrote
    #[must_use]
    pub fn is_build_output(&self, filename: &str) -> bool {
        if filename == self.source_filename || self.artifact.as_deref() == Some(filename) {
            return true;
        }

        Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| INTERMEDIATE_EXTENSIONS.contains(&ext))
    }
}
