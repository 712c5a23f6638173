//! Launch configuration persistence.
//!
//! Stores launch configuration documents to disk so supervision survives
//! process restarts.

use crate::error::{CoreError, Result};
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Durable key-document storage for supervised container configurations.
pub trait Persister: Send + Sync {
    /// Writes the document for `name` so it survives a restart.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be written. A failure must
    /// not corrupt documents persisted for other names.
    fn save(&self, name: &str, document: &Value) -> Result<()>;

    /// Returns every `(name, document)` pair currently durable.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store itself is unreachable.
    /// Individual records that fail to decode are skipped, not fatal.
    fn load_all(&self) -> Result<Vec<(String, Value)>>;

    /// Removes the durable record for `name`. Absence is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing record cannot be removed.
    fn delete(&self, name: &str) -> Result<()>;
}

/// Directory-backed persister: one JSON file per supervised name.
pub struct DirPersister {
    root: PathBuf,
}

impl DirPersister {
    /// Creates a persister rooted at `root`. The directory is expected to
    /// exist already; callers fall back to [`NullPersister`] when it does
    /// not.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn document_path(&self, name: &str) -> Result<PathBuf> {
        Ok(self.root.join(format!("{}.json", sanitize(name)?)))
    }
}

/// Reduces a container name to a safe file name component by stripping
/// path separators.
fn sanitize(name: &str) -> Result<String> {
    let cleaned: String = name.chars().filter(|c| !matches!(c, '/' | '\\')).collect();
    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        return Err(CoreError::Config(format!(
            "container name '{name}' does not yield a usable file name"
        )));
    }
    Ok(cleaned)
}

impl Persister for DirPersister {
    fn save(&self, name: &str, document: &Value) -> Result<()> {
        let path = self.document_path(name)?;
        let content = serde_json::to_vec_pretty(document)?;
        fs::write(&path, content)?;
        tracing::debug!(name, path = %path.display(), "saved configuration");
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<(String, Value)>> {
        let mut records = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            // One undecodable record must not abort the whole load.
            let content = match fs::read(&path) {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable record");
                    continue;
                }
            };
            match serde_json::from_slice(&content) {
                Ok(document) => records.push((name.to_string(), document)),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping undecodable record");
                }
            }
        }
        Ok(records)
    }

    fn delete(&self, name: &str) -> Result<()> {
        let path = self.document_path(name)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!(name, "removed persisted configuration");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// No-op persister used when the state directory does not exist.
/// Supervision works for the lifetime of the process; nothing survives a
/// restart.
pub struct NullPersister;

impl Persister for NullPersister {
    fn save(&self, _name: &str, _document: &Value) -> Result<()> {
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<(String, Value)>> {
        Ok(Vec::new())
    }

    fn delete(&self, _name: &str) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn save_load_delete_round_trip() {
        let temp = TempDir::new().unwrap();
        let persister = DirPersister::new(temp.path());

        let document = json!({"Image": "nginx", "Cmd": ["nginx"]});
        persister.save("web1", &document).unwrap();

        let records = persister.load_all().unwrap();
        assert_eq!(records, vec![("web1".to_string(), document)]);

        persister.delete("web1").unwrap();
        assert!(persister.load_all().unwrap().is_empty());
    }

    #[test]
    fn delete_missing_record_is_not_an_error() {
        let temp = TempDir::new().unwrap();
        let persister = DirPersister::new(temp.path());
        persister.delete("never-saved").unwrap();
    }

    #[test]
    fn save_overwrites_previous_document() {
        let temp = TempDir::new().unwrap();
        let persister = DirPersister::new(temp.path());

        persister.save("web1", &json!({"Image": "nginx:1.24"})).unwrap();
        persister.save("web1", &json!({"Image": "nginx:1.25"})).unwrap();

        let records = persister.load_all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].1["Image"], "nginx:1.25");
    }

    #[test]
    fn load_all_skips_undecodable_records() {
        let temp = TempDir::new().unwrap();
        let persister = DirPersister::new(temp.path());

        persister.save("good", &json!({"Image": "redis"})).unwrap();
        std::fs::write(temp.path().join("bad.json"), b"{not json").unwrap();
        std::fs::write(temp.path().join("notes.txt"), b"ignored").unwrap();

        let records = persister.load_all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0, "good");
    }

    #[test]
    fn names_are_stripped_of_path_separators() {
        let temp = TempDir::new().unwrap();
        let persister = DirPersister::new(temp.path());

        persister.save("/web1", &json!({})).unwrap();
        assert!(temp.path().join("web1.json").exists());

        // A name that is nothing but separators cannot be persisted.
        assert!(persister.save("///", &json!({})).is_err());
    }

    #[test]
    fn null_persister_never_fails_and_holds_nothing() {
        let persister = NullPersister;
        persister.save("web1", &json!({"Image": "nginx"})).unwrap();
        assert!(persister.load_all().unwrap().is_empty());
        persister.delete("web1").unwrap();
    }
}
