use super::output::{decode_capped, RETAINED_BYTES};
use codeon_core::{ToolchainSpec, FILE_TRUNCATION_MARKER};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

/// Collect the top-level regular files the program left in its workspace
///
/// Source, artifact and intermediate build outputs are skipped. Contents are
/// decoded lossily and capped; anything unreadable is left out.
pub fn collect_created_files(workdir: &Path, spec: &ToolchainSpec) -> BTreeMap<String, String> {
    let mut files = BTreeMap::new();

    let entries = match std::fs::read_dir(workdir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(error = %e, "could not list workspace");
            return files;
        }
    };

    for entry in entries.flatten() {
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if !file_type.is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        if spec.is_build_output(&name) {
            continue;
        }

        match read_prefix(&entry.path()) {
            Ok(bytes) => {
                files.insert(name, decode_capped(&bytes, FILE_TRUNCATION_MARKER));
            }
            Err(e) => {
                tracing::debug!(file = %name, error = %e, "skipping unreadable file");
            }
        }
    }

    files
}

/// Read no more than the bytes needed to fill the character cap
fn read_prefix(path: &Path) -> std::io::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    std::fs::File::open(path)?
        .take(RETAINED_BYTES as u64)
        .read_to_end(&mut bytes)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use codeon_core::{CommandTemplate, MAX_OUTPUT_CHARS};
    use tempfile::TempDir;

    fn java_like() -> ToolchainSpec {
        ToolchainSpec::compiled(
            "java",
            "Main.java",
            "main.jar",
            CommandTemplate::new("javac", ["{source}"]),
            CommandTemplate::new("java", ["-jar", "{artifact}"]),
        )
    }

    #[test]
    fn test_collects_only_program_files() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        std::fs::write(root.join("Main.java"), "class Main {}").unwrap();
        std::fs::write(root.join("main.jar"), [0u8, 1, 2]).unwrap();
        std::fs::write(root.join("Main.class"), [0xca, 0xfe]).unwrap();
        std::fs::write(root.join("output.txt"), "hello").unwrap();
        std::fs::write(root.join("data.bin"), [b'a', 0xff]).unwrap();
        std::fs::create_dir(root.join("nested")).unwrap();
        std::fs::write(root.join("nested").join("deep.txt"), "hidden").unwrap();

        let files = collect_created_files(root, &java_like());
        assert_eq!(files.len(), 2);
        assert_eq!(files["output.txt"], "hello");
        assert_eq!(files["data.bin"], "a\u{fffd}");
    }

    #[test]
    fn test_large_file_is_capped() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("big.txt"), "q".repeat(MAX_OUTPUT_CHARS + 5)).unwrap();

        let files = collect_created_files(dir.path(), &java_like());
        let content = &files["big.txt"];
        assert!(content.ends_with(FILE_TRUNCATION_MARKER));
        assert_eq!(content.len(), MAX_OUTPUT_CHARS + FILE_TRUNCATION_MARKER.len());
    }

    #[test]
    fn test_missing_workspace_yields_nothing() {
        let dir = TempDir::new().unwrap();
        assert!(collect_created_files(&dir.path().join("gone"), &java_like()).is_empty());
    }
}
