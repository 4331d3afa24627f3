//! Display implementations for error types

use super::types::Error;
use std::fmt;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Configuration { message } => {
                write!(f, "configuration error: {message}")
            }
            Error::FileSystem {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "file system {} operation failed for '{}': {}",
                    operation,
                    path.display(),
                    source
                )
            }
            Error::Json { message, .. } => {
                write!(f, "JSON error: {message}")
            }
            Error::UnsupportedLanguage { language } => {
                write!(f, "language '{language}' is not supported or disabled")
            }
            Error::Cache { message, .. } => {
                write!(f, "build cache error: {message}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_system_display() {
        let err = Error::file_system(
            "/tmp/ws/main.c",
            "write source file",
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        let message = err.to_string();
        assert!(message.starts_with("file system write source file operation failed for '/tmp/ws/main.c'"));
    }

    #[test]
    fn test_unsupported_language_display() {
        let err = Error::unsupported_language("cobol");
        assert_eq!(
            err.to_string(),
            "language 'cobol' is not supported or disabled"
        );
    }
}
