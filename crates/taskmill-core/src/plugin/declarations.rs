//! Externally declared extension points.
//!
//! A [`DeclarationSource`] enumerates `(name, location)` pairs per plugin
//! category. [`ManifestDir`] reads them from TOML manifests on disk:
//!
//! ```toml
//! [extensions.command]
//! deploy = "acme.commands:deploy"
//!
//! [extensions.reporter]
//! junit = "acme.reporters:junit"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// One declared extension point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub location: String,
}

/// Errors reading extension declarations.
#[derive(Debug, Error)]
pub enum DeclarationError {
    #[error("failed to read extension manifest {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse extension manifest {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Enumerates externally declared extension points.
pub trait DeclarationSource {
    /// Declarations for `category`. An empty list is a valid answer.
    fn declarations(&self, category: &str) -> Result<Vec<Declaration>, DeclarationError>;
}

/// In-memory declarations, mostly for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticDeclarations {
    by_category: BTreeMap<String, Vec<Declaration>>,
}

impl StaticDeclarations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(
        mut self,
        category: impl Into<String>,
        name: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        self.by_category
            .entry(category.into())
            .or_default()
            .push(Declaration {
                name: name.into(),
                location: location.into(),
            });
        self
    }
}

impl DeclarationSource for StaticDeclarations {
    fn declarations(&self, category: &str) -> Result<Vec<Declaration>, DeclarationError> {
        Ok(self.by_category.get(category).cloned().unwrap_or_default())
    }
}

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    extensions: BTreeMap<String, BTreeMap<String, String>>,
}

/// A directory of `*.toml` extension manifests.
///
/// Manifests are read in file-name order, so when two manifests declare
/// the same name the later file wins once added to a registry. A missing
/// directory declares nothing.
#[derive(Debug, Clone)]
pub struct ManifestDir {
    dir: PathBuf,
}

impl ManifestDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    fn manifest_paths(&self) -> Result<Vec<PathBuf>, DeclarationError> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }
        let read_err = |source| DeclarationError::Read {
            path: self.dir.clone(),
            source,
        };
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(&self.dir).map_err(read_err)? {
            let path = entry.map_err(read_err)?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "toml") {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }
}

impl DeclarationSource for ManifestDir {
    fn declarations(&self, category: &str) -> Result<Vec<Declaration>, DeclarationError> {
        let mut found = Vec::new();
        for path in self.manifest_paths()? {
            let content = std::fs::read_to_string(&path).map_err(|source| DeclarationError::Read {
                path: path.clone(),
                source,
            })?;
            let manifest: Manifest =
                toml::from_str(&content).map_err(|source| DeclarationError::Parse {
                    path: path.clone(),
                    source,
                })?;
            if let Some(entries) = manifest.extensions.get(category) {
                found.extend(entries.iter().map(|(name, location)| Declaration {
                    name: name.clone(),
                    location: location.clone(),
                }));
            }
        }
        tracing::trace!(
            dir = %self.dir.display(),
            category,
            count = found.len(),
            "read extension manifests"
        );
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn static_declarations_by_category() {
        let source = StaticDeclarations::new()
            .declare("command", "a", "m:a")
            .declare("command", "b", "m:b")
            .declare("reporter", "r", "m:r");
        let names: Vec<String> = source
            .declarations("command")
            .unwrap()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(source.declarations("backend").unwrap().is_empty());
    }

    #[test]
    fn missing_dir_declares_nothing() {
        let tmp = TempDir::new().unwrap();
        let source = ManifestDir::new(tmp.path().join("nope"));
        assert!(source.declarations("command").unwrap().is_empty());
    }

    #[test]
    fn reads_manifests_in_file_name_order() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("b.toml"),
            "[extensions.command]\nlate = \"b.mod:late\"\n",
        )
        .unwrap();
        std::fs::write(
            tmp.path().join("a.toml"),
            "[extensions.command]\nearly = \"a.mod:early\"\n\n[extensions.reporter]\nx = \"a.mod:x\"\n",
        )
        .unwrap();
        std::fs::write(tmp.path().join("notes.txt"), "ignored").unwrap();

        let source = ManifestDir::new(tmp.path());
        let decls = source.declarations("command").unwrap();
        assert_eq!(
            decls,
            vec![
                Declaration {
                    name: "early".into(),
                    location: "a.mod:early".into()
                },
                Declaration {
                    name: "late".into(),
                    location: "b.mod:late".into()
                },
            ]
        );
        assert_eq!(source.declarations("reporter").unwrap().len(), 1);
    }

    #[test]
    fn malformed_manifest_is_an_error() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("bad.toml"), "this is not toml {{{").unwrap();
        let err = ManifestDir::new(tmp.path()).declarations("command").unwrap_err();
        assert!(matches!(err, DeclarationError::Parse { .. }), "got {err}");
    }
}
