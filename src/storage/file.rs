// src/storage/file.rs

//! File-backed key/value store: one JSON document per key under the data
//! directory. This is the default persistence collaborator for the CLI.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::KeyValueStore;

pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create data dir {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys are generated internally (orion_<ns>_<suffix>) and already
        // filesystem-safe; sanitize anyway so a hostile key cannot escape.
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", safe))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("failed to read {}", key)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        fs::write(&path, value).with_context(|| format!("failed to write {}", path.display()))
    }

    fn delete(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("failed to delete {}", key)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_set_delete_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        assert_eq!(store.get("orion_test_key").unwrap(), None);
        store.set("orion_test_key", r#"{"a":1}"#).unwrap();
        assert_eq!(store.get("orion_test_key").unwrap().unwrap(), r#"{"a":1}"#);

        store.delete("orion_test_key").unwrap();
        assert_eq!(store.get("orion_test_key").unwrap(), None);
        // Deleting an absent key is not an error.
        store.delete("orion_test_key").unwrap();
    }

    #[test]
    fn hostile_keys_stay_inside_the_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        store.set("../escape", "x").unwrap();
        assert!(dir.path().join("___escape.json").exists());
    }
}
