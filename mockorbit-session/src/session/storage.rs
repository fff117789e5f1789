//! Session Storage - the persistent key-value capability behind the controller
//!
//! The controller only ever talks to [`PersistentStore`]. [`FileStore`] is the durable
//! backend used by the CLI, [`MemoryStore`] the in-process one used by tests and
//! ephemeral hosts.

use mockorbit_core::{ErrorContext, MockOrbitError, MockOrbitResult, StorageConfig};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Durable string key-value capability
pub trait PersistentStore {
    fn get(&self, key: &str) -> MockOrbitResult<Option<String>>;

    fn set(&mut self, key: &str, value: &str) -> MockOrbitResult<()>;

    fn remove(&mut self, key: &str) -> MockOrbitResult<()>;

    /// Write several entries as one logical batch. Backends that can commit
    /// atomically should override this.
    fn set_all(&mut self, entries: &[(&str, &str)]) -> MockOrbitResult<()> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }

    /// Remove several entries as one logical batch
    fn remove_all(&mut self, keys: &[&str]) -> MockOrbitResult<()> {
        for key in keys {
            self.remove(key)?;
        }
        Ok(())
    }
}

/// Names of the three entries making up the persisted session record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreKeys {
    pub token: String,
    pub identity: String,
    pub active_role: String,
}

impl StoreKeys {
    pub fn all(&self) -> [&str; 3] {
        [
            self.token.as_str(),
            self.identity.as_str(),
            self.active_role.as_str(),
        ]
    }
}

impl Default for StoreKeys {
    fn default() -> Self {
        Self::from(&StorageConfig::default())
    }
}

impl From<&StorageConfig> for StoreKeys {
    fn from(config: &StorageConfig) -> Self {
        Self {
            token: config.token_key.clone(),
            identity: config.identity_key.clone(),
            active_role: config.active_role_key.clone(),
        }
    }
}

/// In-memory store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populated store, e.g. to simulate a record left by an earlier run
    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PersistentStore for MemoryStore {
    fn get(&self, key: &str) -> MockOrbitResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> MockOrbitResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> MockOrbitResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Store persisted as a single JSON object of string entries.
///
/// Every mutation rewrites the whole document through a temporary file and a rename,
/// so the file on disk is always either the old or the new document.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Open (and create the directory for) a store file
    pub fn open<P: AsRef<Path>>(path: P) -> MockOrbitResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| MockOrbitError::Storage {
                message: format!("Failed to create storage directory: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("file_store")
                    .during("open")
                    .at_path(parent),
            })?;
        }

        info!("Session store initialized at: {}", path.display());
        Ok(Self { path })
    }

    /// Open the store described by the storage configuration
    pub fn from_config(config: &StorageConfig) -> MockOrbitResult<Self> {
        Self::open(config.session_file())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_raw(&self) -> MockOrbitResult<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(None),
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(MockOrbitError::Storage {
                message: format!("Failed to read session store: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("file_store")
                    .during("read")
                    .at_path(&self.path),
            }),
        }
    }

    fn read_document(&self) -> MockOrbitResult<BTreeMap<String, String>> {
        let Some(content) = self.read_raw()? else {
            return Ok(BTreeMap::new());
        };

        serde_json::from_str(&content).map_err(|e| MockOrbitError::Storage {
            message: format!("Session store is corrupt: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("file_store")
                .during("parse")
                .at_path(&self.path)
                .hint("Sign in again to replace the session file"),
        })
    }

    /// Document to base a write on. A corrupt document is replaced rather than patched.
    fn document_for_write(&self) -> MockOrbitResult<BTreeMap<String, String>> {
        let Some(content) = self.read_raw()? else {
            return Ok(BTreeMap::new());
        };

        match serde_json::from_str(&content) {
            Ok(document) => Ok(document),
            Err(e) => {
                warn!(
                    "Overwriting corrupt session store at {}: {}",
                    self.path.display(),
                    e
                );
                Ok(BTreeMap::new())
            }
        }
    }

    fn write_document(&self, document: &BTreeMap<String, String>) -> MockOrbitResult<()> {
        let json_data = serde_json::to_string_pretty(document)?;

        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        std::fs::write(&tmp_path, json_data)
            .and_then(|_| std::fs::rename(&tmp_path, &self.path))
            .map_err(|e| MockOrbitError::Storage {
                message: format!("Failed to write session store: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("file_store")
                    .during("write")
                    .at_path(&self.path),
            })?;

        debug!(
            "Wrote {} entries to {}",
            document.len(),
            self.path.display()
        );
        Ok(())
    }
}

impl PersistentStore for FileStore {
    fn get(&self, key: &str) -> MockOrbitResult<Option<String>> {
        Ok(self.read_document()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> MockOrbitResult<()> {
        self.set_all(&[(key, value)])
    }

    fn remove(&mut self, key: &str) -> MockOrbitResult<()> {
        self.remove_all(&[key])
    }

    fn set_all(&mut self, entries: &[(&str, &str)]) -> MockOrbitResult<()> {
        let mut document = self.document_for_write()?;
        for (key, value) in entries {
            document.insert(key.to_string(), value.to_string());
        }
        self.write_document(&document)
    }

    fn remove_all(&mut self, keys: &[&str]) -> MockOrbitResult<()> {
        let mut document = self.document_for_write()?;
        let before = document.len();
        for key in keys {
            document.remove(*key);
        }
        if document.len() == before && !self.path.exists() {
            return Ok(());
        }
        self.write_document(&document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store_basic_operations() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("authToken").unwrap(), None);

        store.set("authToken", "tok").unwrap();
        assert_eq!(store.get("authToken").unwrap().as_deref(), Some("tok"));

        store.remove("authToken").unwrap();
        store.remove("authToken").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("state").join("session.json");

        let mut store = FileStore::open(&path).unwrap();
        store
            .set_all(&[("authToken", "tok"), ("activeRole", "interviewer")])
            .unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("authToken").unwrap().as_deref(), Some("tok"));
        assert_eq!(
            reopened.get("activeRole").unwrap().as_deref(),
            Some("interviewer")
        );
        assert!(!temp_dir.path().join("state").join("session.json.tmp").exists());
    }

    #[test]
    fn test_file_store_remove_all() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = FileStore::open(temp_dir.path().join("session.json")).unwrap();

        store.set_all(&[("a", "1"), ("b", "2"), ("c", "3")]).unwrap();
        store.remove_all(&["a", "b"]).unwrap();

        assert_eq!(store.get("a").unwrap(), None);
        assert_eq!(store.get("c").unwrap().as_deref(), Some("3"));
    }

    #[test]
    fn test_file_store_missing_file_reads_empty() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = FileStore::open(temp_dir.path().join("session.json")).unwrap();

        assert_eq!(store.get("authToken").unwrap(), None);
        store.remove_all(&["authToken"]).unwrap();
        assert!(!store.path().exists());
    }

    #[test]
    fn test_file_store_corrupt_document() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();

        let mut store = FileStore::open(&path).unwrap();
        assert!(matches!(
            store.get("authToken"),
            Err(MockOrbitError::Storage { .. })
        ));

        // Writing replaces the corrupt document
        store.set("authToken", "tok").unwrap();
        assert_eq!(store.get("authToken").unwrap().as_deref(), Some("tok"));
    }
}
