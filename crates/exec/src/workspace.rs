//! Per-execution working directories

use codeon_core::{Result, TemplateContext, ToolchainSpec, WORKSPACE_PREFIX};
use codeon_utils::TempDirGuard;
use std::path::{Path, PathBuf};

/// Exclusively owned directory for one execution
///
/// Removed recursively when dropped, including during panic unwinding.
pub struct Workspace {
    guard: TempDirGuard,
}

impl Workspace {
    /// Create a fresh, uniquely named directory under `root`
    pub fn create(root: &Path) -> Result<Self> {
        let path = root.join(format!("{WORKSPACE_PREFIX}{}", uuid::Uuid::new_v4()));
        let guard = TempDirGuard::new(path)?;
        tracing::trace!(workspace = %guard.path().display(), "workspace created");
        Ok(Self { guard })
    }

    pub fn path(&self) -> &Path {
        self.guard.path()
    }

    pub fn source_path(&self, spec: &ToolchainSpec) -> PathBuf {
        self.path().join(&spec.source_filename)
    }

    pub fn artifact_path(&self, spec: &ToolchainSpec) -> Option<PathBuf> {
        spec.artifact.as_ref().map(|name| self.path().join(name))
    }

    /// Placeholder values for expanding the toolchain's templates
    pub fn template_context<'a>(
        &'a self,
        spec: &'a ToolchainSpec,
        artifact: Option<&'a Path>,
    ) -> TemplateContext<'a> {
        TemplateContext {
            source: &spec.source_filename,
            artifact,
            workdir: self.path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codeon_core::CommandTemplate;
    use tempfile::TempDir;

    #[test]
    fn test_workspaces_are_unique_and_removed() {
        let root = TempDir::new().unwrap();

        let first = Workspace::create(root.path()).unwrap();
        let second = Workspace::create(root.path()).unwrap();
        assert_ne!(first.path(), second.path());
        assert!(first
            .path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(WORKSPACE_PREFIX));

        let path = first.path().to_path_buf();
        std::fs::write(path.join("main.py"), "print(1)").unwrap();
        drop(first);
        assert!(!path.exists());
        assert!(second.path().exists());
    }

    #[test]
    fn test_paths_follow_spec() {
        let root = TempDir::new().unwrap();
        let workspace = Workspace::create(root.path()).unwrap();
        let spec = ToolchainSpec::compiled(
            "c",
            "main.c",
            "main.exe",
            CommandTemplate::new("gcc", ["{source}", "-o", "{artifact}"]),
            CommandTemplate::new("{artifact}", Vec::<String>::new()),
        );

        assert_eq!(workspace.source_path(&spec), workspace.path().join("main.c"));
        let artifact = workspace.artifact_path(&spec).unwrap();
        assert_eq!(artifact, workspace.path().join("main.exe"));

        let ctx = workspace.template_context(&spec, Some(&artifact));
        assert_eq!(ctx.source, "main.c");
        assert_eq!(ctx.workdir, workspace.path());
    }
}
