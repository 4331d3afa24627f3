//! Cache key generation

use sha2::{Digest, Sha256};
use std::fmt;

/// Hex SHA-256 digest identifying a (language, source text) pair
///
/// Any change to the source, whitespace included, yields a different key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn compute(language: &str, source: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(language.as_bytes());
        hasher.update(b"::");
        hasher.update(source.as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for log lines
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_input_same_key() {
        let a = CacheKey::compute("c", "int main(){return 0;}");
        let b = CacheKey::compute("c", "int main(){return 0;}");
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn test_whitespace_changes_key() {
        let a = CacheKey::compute("c", "int main(){return 0;}");
        let b = CacheKey::compute("c", "int main(){return 0;} ");
        assert_ne!(a, b);
    }

    #[test]
    fn test_language_is_part_of_key() {
        assert_ne!(
            CacheKey::compute("c", "int main(){}"),
            CacheKey::compute("cpp", "int main(){}")
        );
    }

    #[test]
    fn test_key_matches_language_source_digest() {
        // digest of "{language}::{source}"
        let key = CacheKey::compute("python", "");
        let expected = {
            let mut hasher = Sha256::new();
            hasher.update(b"python::");
            format!("{:x}", hasher.finalize())
        };
        assert_eq!(key.as_str(), expected);
    }

    #[test]
    fn test_short_form() {
        let key = CacheKey::compute("c", "x");
        assert_eq!(key.short().len(), 12);
        assert!(key.as_str().starts_with(key.short()));
    }
}
