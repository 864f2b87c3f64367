//! # pb-store-json
//!
//! Filesystem implementation of `KeyValueStore`: one `<key>.json` file per
//! blob under a data directory, replaced atomically on every write.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use pb_core::traits::KeyValueStore;

pub struct JsonFileStore {
    /// Directory holding the blobs (e.g., "./data/state")
    root: PathBuf,
}

impl JsonFileStore {
    /// Creates the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .with_context(|| format!("failed to create state directory {}", root.display()))?;
        tracing::debug!(root = %root.display(), "json blob store opened");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, key: &str) -> anyhow::Result<PathBuf> {
        let valid = !key.is_empty()
            && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            bail!("invalid blob key '{key}'");
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let path = self.blob_path(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
        }
    }

    /// Writes to a sibling temp file, then renames over the old blob.
    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let path = self.blob_path(key)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).with_context(|| format!("failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &path).with_context(|| format!("failed to replace {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pb_core::interactions::{InteractionStore, SAVED_KEY};

    #[test]
    fn missing_blob_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        assert_eq!(store.get("likes").unwrap(), None);
    }

    #[test]
    fn blobs_overwrite_and_leave_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("state")).unwrap();
        store.set("saved", r#"{"a":true}"#).unwrap();
        store.set("saved", r#"{"a":false}"#).unwrap();
        assert_eq!(store.get("saved").unwrap().as_deref(), Some(r#"{"a":false}"#));

        let names: Vec<_> = fs::read_dir(store.root())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["saved.json"]);
    }

    #[test]
    fn keys_cannot_escape_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        assert!(store.set("../etc/passwd", "x").is_err());
        assert!(store.get("").is_err());
    }

    #[test]
    fn saved_map_survives_a_reload() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut interactions = InteractionStore::load(Box::new(JsonFileStore::open(dir.path()).unwrap()));
            interactions.toggle_save("a");
        }
        let store = JsonFileStore::open(dir.path()).unwrap();
        assert_eq!(store.get(SAVED_KEY).unwrap().as_deref(), Some(r#"{"a":true}"#));
        let reloaded = InteractionStore::load(Box::new(store));
        assert!(reloaded.state().is_saved("a"));
    }
}
