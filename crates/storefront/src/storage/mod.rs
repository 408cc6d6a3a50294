//! Local persisted state.
//!
//! The storefront keeps a small amount of state on disk between runs: the
//! cart (one file per session), the signed-in user, and the last fetched
//! catalog for offline-degraded browsing. Everything is JSON under the
//! configured data directory, written atomically via a temp file and
//! rename so a crash never leaves a half-written file behind.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use huerta_core::CartLine;

use crate::models::{CurrentUser, Product};

const CURRENT_USER_FILE: &str = "current-user.json";
const CATALOG_CACHE_FILE: &str = "catalog-cache.json";

/// Errors raised by local persistence.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File the operation targeted.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
    /// A state file exists but does not parse.
    #[error("corrupt state file {path}: {source}")]
    Corrupt {
        /// The offending file.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },
}

/// Persisted cart file contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedCart {
    /// Cart lines at save time.
    pub lines: Vec<CartLine>,
    /// When the cart was last written.
    pub saved_at: DateTime<Utc>,
}

/// Persisted catalog file contents.
///
/// Read only by catalog browsing as an offline fallback; stock decisions
/// never consult it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogCache {
    /// Last successfully fetched product list.
    pub products: Vec<Product>,
    /// When the list was fetched.
    pub fetched_at: DateTime<Utc>,
}

/// Handle on the local state directory.
///
/// Cheap to clone; holds only the root path.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| StorageError::Io {
            path: root.clone(),
            source,
        })?;
        Ok(Self { root })
    }

    /// The directory this store writes into.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    // ===== Cart =====

    /// Load the persisted cart for `session`.
    ///
    /// A missing file is a fresh session, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_cart(&self, session: &str) -> Result<Option<PersistedCart>, StorageError> {
        self.read_json(&self.cart_path(session))
    }

    /// Persist the cart lines for `session`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_cart(&self, session: &str, lines: &[CartLine]) -> Result<(), StorageError> {
        let persisted = PersistedCart {
            lines: lines.to_vec(),
            saved_at: Utc::now(),
        };
        self.write_json(&self.cart_path(session), &persisted)
    }

    // ===== Current user =====

    /// Load the persisted signed-in user, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_current_user(&self) -> Result<Option<CurrentUser>, StorageError> {
        self.read_json(&self.root.join(CURRENT_USER_FILE))
    }

    /// Persist the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_current_user(&self, user: &CurrentUser) -> Result<(), StorageError> {
        self.write_json(&self.root.join(CURRENT_USER_FILE), user)
    }

    /// Remove the persisted signed-in user. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    pub fn clear_current_user(&self) -> Result<(), StorageError> {
        let path = self.root.join(CURRENT_USER_FILE);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    // ===== Catalog cache =====

    /// Load the offline catalog fallback, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_catalog_cache(&self) -> Result<Option<CatalogCache>, StorageError> {
        self.read_json(&self.root.join(CATALOG_CACHE_FILE))
    }

    /// Persist the last fetched catalog for offline browsing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_catalog_cache(&self, products: &[Product]) -> Result<(), StorageError> {
        let cache = CatalogCache {
            products: products.to_vec(),
            fetched_at: Utc::now(),
        };
        self.write_json(&self.root.join(CATALOG_CACHE_FILE), &cache)
    }

    // ===== Plumbing =====

    fn cart_path(&self, session: &str) -> PathBuf {
        self.root.join(format!("cart-{session}.json"))
    }

    fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>, StorageError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StorageError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let value = serde_json::from_str(&contents).map_err(|source| StorageError::Corrupt {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Some(value))
    }

    fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<(), StorageError> {
        let io_err = |source| StorageError::Io {
            path: path.to_path_buf(),
            source,
        };

        let contents = serde_json::to_string_pretty(value).map_err(|source| {
            StorageError::Corrupt {
                path: path.to_path_buf(),
                source,
            }
        })?;

        let temp = tempfile::NamedTempFile::new_in(&self.root).map_err(io_err)?;
        fs::write(temp.path(), contents).map_err(io_err)?;
        temp.persist(path).map_err(|e| io_err(e.error))?;
        Ok(())
    }
}
