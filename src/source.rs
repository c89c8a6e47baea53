//! Script source providers.
//!
//! A [`ScriptSource`] hands the runtime the text of a named script, split into
//! lines. Sources are read-only from the runtime's point of view.

use std::collections::HashMap;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("script not found: {0}")]
    NotFound(String),

    #[error("failed to read script {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: io::Error,
    },
}

/// Supplies script text by name.
pub trait ScriptSource: Send + Sync {
    /// Load every line of the named script.
    fn open_script(&self, name: &str) -> Result<Vec<String>, SourceError>;

    fn exists(&self, name: &str) -> bool;
}

/// Scripts stored as files under a root directory.
///
/// Names are resolved relative to the root; a leading `/` is ignored and names
/// that would escape the root are treated as missing.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, name: &str) -> Option<PathBuf> {
        let relative = Path::new(name.trim_start_matches('/'));
        let contained = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
        (contained && !relative.as_os_str().is_empty()).then(|| self.root.join(relative))
    }
}

impl ScriptSource for DirSource {
    fn open_script(&self, name: &str) -> Result<Vec<String>, SourceError> {
        let path = self
            .resolve(name)
            .ok_or_else(|| SourceError::NotFound(name.to_string()))?;
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(split_lines(&content)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(SourceError::NotFound(name.to_string()))
            }
            Err(source) => Err(SourceError::Io {
                name: name.to_string(),
                source,
            }),
        }
    }

    fn exists(&self, name: &str) -> bool {
        self.resolve(name).is_some_and(|path| path.is_file())
    }
}

/// Scripts held in memory, keyed by name.
#[derive(Debug, Default)]
pub struct MemorySource {
    scripts: RwLock<HashMap<String, String>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a script.
    pub fn insert(&self, name: impl Into<String>, content: impl Into<String>) {
        self.scripts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), content.into());
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_script(self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.insert(name, content);
        self
    }
}

impl ScriptSource for MemorySource {
    fn open_script(&self, name: &str) -> Result<Vec<String>, SourceError> {
        self.scripts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map(|content| split_lines(content))
            .ok_or_else(|| SourceError::NotFound(name.to_string()))
    }

    fn exists(&self, name: &str) -> bool {
        self.scripts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }
}

fn split_lines(content: &str) -> Vec<String> {
    content.lines().map(str::to_owned).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_source() {
        let source = MemorySource::new().with_script("a.txt", "STRING a\r\nENTER\n");
        assert!(source.exists("a.txt"));
        assert!(!source.exists("b.txt"));
        assert_eq!(source.open_script("a.txt").unwrap(), vec!["STRING a", "ENTER"]);
        assert!(matches!(
            source.open_script("b.txt"),
            Err(SourceError::NotFound(name)) if name == "b.txt"
        ));
    }

    #[test]
    fn test_dir_source_reads_files() {
        let root = TempDir::new().unwrap();
        std::fs::write(root.path().join("hello.txt"), "STRING hello\nENTER\n").unwrap();

        let source = DirSource::new(root.path());
        assert_eq!(source.root(), root.path());
        assert!(source.exists("hello.txt"));
        assert!(source.exists("/hello.txt"));
        assert_eq!(
            source.open_script("/hello.txt").unwrap(),
            vec!["STRING hello", "ENTER"]
        );
        assert!(matches!(
            source.open_script("missing.txt"),
            Err(SourceError::NotFound(_))
        ));
    }

    #[test]
    fn test_dir_source_rejects_escaping_names() {
        let source = DirSource::new("/tmp");
        assert!(source.resolve("../etc/passwd").is_none());
        assert!(source.resolve("").is_none());
        assert!(source.resolve("/").is_none());
        assert_eq!(
            source.resolve("scripts/a.txt"),
            Some(PathBuf::from("/tmp/scripts/a.txt"))
        );
    }
}
