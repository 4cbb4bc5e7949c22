//! Durable client-side key-value storage.
//!
//! Holds the session record, checkout selections and UI preferences across
//! restarts. A missing key always means "use the default"; an unreadable
//! value is logged and treated as missing so startup never fails on it.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::warn;

/// Keys under which client state is persisted.
pub mod keys {
    /// Signed-in session record (token and user).
    pub const SESSION: &str = "session";

    /// Last saved shipping address.
    pub const SHIPPING_ADDRESS: &str = "shipping_address";

    /// Last selected payment method.
    pub const PAYMENT_METHOD: &str = "payment_method";

    /// UI theme.
    pub const THEME: &str = "theme";

    /// UI locale.
    pub const LOCALE: &str = "locale";
}

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: io::Error,
    },

    #[error("Invalid stored value for '{key}': {source}")]
    Serde {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A string-valued key-value backend.
pub trait KeyValueStore: Send + Sync {
    /// Read a raw value, `None` if the key was never written.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Overwrite a raw value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a value; deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be modified.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

// =============================================================================
// FileStore
// =============================================================================

/// One JSON file per key inside a state directory.
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// crash mid-write leaves the previous value intact.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a state directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StorageError::Io {
            key: dir.display().to_string(),
            source,
        })?;
        Ok(Self { dir })
    }

    /// The backing directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let io_err = |source| StorageError::Io {
            key: key.to_string(),
            source,
        };
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        fs::write(&tmp, value).map_err(io_err)?;
        fs::rename(&tmp, self.path_for(key)).map_err(io_err)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }
}

// =============================================================================
// MemoryStore
// =============================================================================

/// Process-local backend; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

// =============================================================================
// Storage
// =============================================================================

/// Typed JSON access over a shared backend.
///
/// Cheap to clone; every clone sees the same backend.
#[derive(Clone)]
pub struct Storage {
    backend: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage").finish_non_exhaustive()
    }
}

impl Storage {
    /// Wrap a backend.
    #[must_use]
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// File-backed storage rooted at `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn file(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        Ok(Self::new(Arc::new(FileStore::open(dir)?)))
    }

    /// In-memory storage.
    #[must_use]
    pub fn memory() -> Self {
        Self::new(Arc::new(MemoryStore::default()))
    }

    /// Load and decode a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or the value does not decode.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        self.backend
            .read(key)?
            .map(|raw| {
                serde_json::from_str(&raw).map_err(|source| StorageError::Serde {
                    key: key.to_string(),
                    source,
                })
            })
            .transpose()
    }

    /// Load a value, logging and discarding anything unreadable.
    #[must_use]
    pub fn load_or_none<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.load(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Ignoring unreadable stored value");
                None
            }
        }
    }

    /// Encode and overwrite a value.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the backend write fails.
    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value).map_err(|source| StorageError::Serde {
            key: key.to_string(),
            source,
        })?;
        self.backend.write(key, &raw)
    }

    /// Delete a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be modified.
    pub fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.backend.remove(key)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use souk_core::{PaymentMethod, ShippingAddress};

    use super::*;

    fn address() -> ShippingAddress {
        ShippingAddress {
            full_name: "Grace Hopper".to_string(),
            address: "1 Compiler Way".to_string(),
            city: "Arlington".to_string(),
            postal_code: "22201".to_string(),
            country: "US".to_string(),
            phone: Some("+1 555 0100".to_string()),
        }
    }

    #[test]
    fn test_memory_round_trip() {
        let storage = Storage::memory();
        assert!(storage.load::<ShippingAddress>(keys::SHIPPING_ADDRESS).unwrap().is_none());

        storage.save(keys::SHIPPING_ADDRESS, &address()).unwrap();
        let loaded: ShippingAddress = storage.load(keys::SHIPPING_ADDRESS).unwrap().unwrap();
        assert_eq!(loaded, address());

        storage.remove(keys::SHIPPING_ADDRESS).unwrap();
        assert!(storage.load::<ShippingAddress>(keys::SHIPPING_ADDRESS).unwrap().is_none());
    }

    #[test]
    fn test_file_store_survives_reload() {
        let dir = tempfile::tempdir().unwrap();

        {
            let storage = Storage::file(dir.path()).unwrap();
            storage.save(keys::SHIPPING_ADDRESS, &address()).unwrap();
            storage.save(keys::PAYMENT_METHOD, &PaymentMethod::PayPal).unwrap();
        }

        let reloaded = Storage::file(dir.path()).unwrap();
        let loaded: ShippingAddress = reloaded.load(keys::SHIPPING_ADDRESS).unwrap().unwrap();
        assert_eq!(loaded, address());
        assert_eq!(
            reloaded.load::<PaymentMethod>(keys::PAYMENT_METHOD).unwrap(),
            Some(PaymentMethod::PayPal)
        );
    }

    #[test]
    fn test_file_store_creates_nested_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let store = FileStore::open(&nested).unwrap();
        store.write(keys::THEME, "\"dark\"").unwrap();
        assert!(nested.join("theme.json").exists());
    }

    #[test]
    fn test_remove_missing_key_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        assert!(store.remove(keys::LOCALE).is_ok());
        assert!(MemoryStore::default().remove(keys::LOCALE).is_ok());
    }

    #[test]
    fn test_corrupt_value_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("shipping_address.json"), "{not json").unwrap();

        let storage = Storage::file(dir.path()).unwrap();
        assert!(matches!(
            storage.load::<ShippingAddress>(keys::SHIPPING_ADDRESS),
            Err(StorageError::Serde { .. })
        ));
        assert!(storage.load_or_none::<ShippingAddress>(keys::SHIPPING_ADDRESS).is_none());
    }
}
