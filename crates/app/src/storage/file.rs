//! Directory-backed store.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use tracing::{debug, warn};

use super::{KeyValueStore, StorageError};

/// One file per key under a directory.
///
/// Writes land in a sibling temp file which is then renamed over the target, so a
/// crash never leaves a half-written value behind.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Opens (and creates) the directory.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();

        fs::create_dir_all(&root)?;

        Ok(Self { root })
    }

    /// Directory holding the values.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
            && !key.starts_with('.');

        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }

        Ok(self.root.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)?) {
            Ok(value) => Ok(Some(value)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let tmp_path = path.with_extension("json.tmp");

        if let Err(error) = write_then_rename(&tmp_path, &path, value) {
            match fs::remove_file(&tmp_path) {
                Err(cleanup) if cleanup.kind() != io::ErrorKind::NotFound => {
                    warn!(key, error = %cleanup, "failed to remove temporary file");
                }
                _ => {}
            }

            return Err(error.into());
        }

        debug!(key, bytes = value.len(), "stored value");

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)?) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }
}

fn write_then_rename(tmp_path: &Path, path: &Path, value: &str) -> io::Result<()> {
    {
        let mut file = fs::File::create(tmp_path)?;
        file.write_all(value.as_bytes())?;
        file.sync_all()?;
    }

    fs::rename(tmp_path, path)
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn persists_across_handles() -> TestResult {
        let dir = tempfile::tempdir()?;

        FileStore::open(dir.path())?.set("storefront.cart.items", "[]")?;

        let reopened = FileStore::open(dir.path())?;

        assert_eq!(reopened.get("storefront.cart.items")?.as_deref(), Some("[]"));
        assert!(!dir.path().join("storefront.cart.items.json.tmp").exists());

        Ok(())
    }

    #[test]
    fn missing_keys_read_as_none_and_remove_cleanly() -> TestResult {
        let dir = tempfile::tempdir()?;
        let store = FileStore::open(dir.path())?;

        assert_eq!(store.get("absent")?, None);
        store.remove("absent")?;

        Ok(())
    }

    #[test]
    fn rejects_path_like_keys() -> TestResult {
        let dir = tempfile::tempdir()?;
        let store = FileStore::open(dir.path())?;

        assert!(matches!(
            store.set("../escape", "x"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(store.get(""), Err(StorageError::InvalidKey(_))));

        Ok(())
    }

    #[test]
    fn failed_write_leaves_no_temporary_file() -> TestResult {
        let dir = tempfile::tempdir()?;
        let store = FileStore::open(dir.path())?;

        // A non-empty directory where the value file should go makes the rename fail.
        let blocker = dir.path().join("storefront.cart.items.json");
        fs::create_dir(&blocker)?;
        fs::write(blocker.join("keep"), "")?;

        let result = store.set("storefront.cart.items", "[]");

        assert!(result.is_err());
        assert!(!dir.path().join("storefront.cart.items.json.tmp").exists());

        Ok(())
    }
}
