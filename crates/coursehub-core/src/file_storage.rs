//! File storage abstraction.
//!
//! Uploaded images and resumes are written through the [`FileStorage`]
//! trait. Records keep the public URL returned by [`FileStorage::get_url`];
//! [`FileStorage::key_for_url`] maps it back when a file is replaced or its
//! owner is deleted.
//!
//! Two backends are provided:
//!
//! - [`LocalFileStorage`]: files under a local directory, served by the API
//!   itself under `/files`
//! - [`HttpObjectStorage`]: an object store that accepts authenticated
//!   `PUT`/`DELETE` requests per key
//!
//! # Example
//!
//! ```ignore
//! let storage = LocalFileStorage::new(PathBuf::from("./uploads"), "http://localhost:4000/files".into(), 15 * 1024 * 1024);
//! let key = storage.save("courses/images/1700000000000-cover.png", &bytes).await?;
//! let url = storage.get_url(&key)?;
//! storage.delete(storage.key_for_url(&url).unwrap()).await?;
//! ```

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use thiserror::Error;
use tokio::fs;

pub type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StorageError>> + Send + 'a>>;

/// Storage backend. Implementations can be swapped without touching services.
pub trait FileStorage: Send + Sync {
    /// Store `content` under `key` and return the key.
    fn save<'a>(&'a self, key: &'a str, content: &'a [u8]) -> StorageFuture<'a, String>;

    /// Remove the file at `key`. Missing files are not an error.
    fn delete<'a>(&'a self, key: &'a str) -> StorageFuture<'a, ()>;

    /// Confirm the backend is reachable and writable.
    fn check(&self) -> StorageFuture<'_, ()>;

    /// Public URL prefix under which keys are served.
    fn base_url(&self) -> &str;

    fn get_url(&self, key: &str) -> Result<String, StorageError> {
        validate_key(key)?;
        Ok(format!("{}/{}", self.base_url().trim_end_matches('/'), key))
    }

    /// Recover the storage key from a URL produced by [`FileStorage::get_url`].
    fn key_for_url<'u>(&self, url: &'u str) -> Option<&'u str> {
        let key = url
            .strip_prefix(self.base_url().trim_end_matches('/'))?
            .strip_prefix('/')?;
        validate_key(key).ok().map(|_| key)
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("File exceeds maximum size of {max_bytes} bytes")]
    InvalidFileSize { max_bytes: usize },

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Object store request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Object store rejected {operation} with status {status}")]
    Rejected { operation: &'static str, status: u16 },
}

/// Keys are relative paths of `[A-Za-z0-9._-]` segments.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty() || key.contains("..") || key.starts_with('/') || key.starts_with('\\') {
        return Err(StorageError::InvalidKey(
            "Key must not be empty, contain '..', or start with a separator".to_string(),
        ));
    }

    if !key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '/' | '.'))
    {
        return Err(StorageError::InvalidKey(
            "Key contains invalid characters".to_string(),
        ));
    }

    Ok(())
}

/// Local filesystem storage.
#[derive(Clone, Debug)]
pub struct LocalFileStorage {
    base_dir: PathBuf,
    base_url: String,
    max_file_size: usize,
}

impl LocalFileStorage {
    pub fn new(base_dir: PathBuf, base_url: String, max_file_size: usize) -> Self {
        Self {
            base_dir,
            base_url,
            max_file_size,
        }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }
}

impl FileStorage for LocalFileStorage {
    fn save<'a>(&'a self, key: &'a str, content: &'a [u8]) -> StorageFuture<'a, String> {
        Box::pin(async move {
            validate_key(key)?;

            if content.len() > self.max_file_size {
                return Err(StorageError::InvalidFileSize {
                    max_bytes: self.max_file_size,
                });
            }

            let file_path = self.base_dir.join(key);
            if let Some(parent) = file_path.parent() {
                fs::create_dir_all(parent).await?;
            }
            fs::write(&file_path, content).await?;

            Ok(key.to_string())
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            validate_key(key)?;

            match fs::remove_file(self.base_dir.join(key)).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            }
        })
    }

    fn check(&self) -> StorageFuture<'_, ()> {
        Box::pin(async move {
            fs::create_dir_all(&self.base_dir).await?;
            Ok(())
        })
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Object store reached over HTTP.
///
/// Objects are written with `PUT {endpoint}/{key}` and removed with
/// `DELETE {endpoint}/{key}`, authenticated with a bearer token. Public URLs
/// are built from `public_base_url`.
#[derive(Clone, Debug)]
pub struct HttpObjectStorage {
    client: reqwest::Client,
    endpoint: String,
    public_base_url: String,
    access_token: String,
    max_file_size: usize,
}

impl HttpObjectStorage {
    pub fn new(
        endpoint: String,
        public_base_url: String,
        access_token: String,
        max_file_size: usize,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            public_base_url,
            access_token,
            max_file_size,
        }
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.endpoint, key)
    }
}

impl FileStorage for HttpObjectStorage {
    fn save<'a>(&'a self, key: &'a str, content: &'a [u8]) -> StorageFuture<'a, String> {
        Box::pin(async move {
            validate_key(key)?;

            if content.len() > self.max_file_size {
                return Err(StorageError::InvalidFileSize {
                    max_bytes: self.max_file_size,
                });
            }

            let response = self
                .client
                .put(self.object_url(key))
                .bearer_auth(&self.access_token)
                .body(content.to_vec())
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(StorageError::Rejected {
                    operation: "upload",
                    status: response.status().as_u16(),
                });
            }

            Ok(key.to_string())
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            validate_key(key)?;

            let response = self
                .client
                .delete(self.object_url(key))
                .bearer_auth(&self.access_token)
                .send()
                .await?;

            let status = response.status();
            if status.is_success() || status == reqwest::StatusCode::NOT_FOUND {
                Ok(())
            } else {
                Err(StorageError::Rejected {
                    operation: "delete",
                    status: status.as_u16(),
                })
            }
        })
    }

    fn check(&self) -> StorageFuture<'_, ()> {
        Box::pin(async move {
            let response = self
                .client
                .head(&self.endpoint)
                .bearer_auth(&self.access_token)
                .send()
                .await?;

            if response.status().is_server_error() {
                return Err(StorageError::Rejected {
                    operation: "health check",
                    status: response.status().as_u16(),
                });
            }
            Ok(())
        })
    }

    fn base_url(&self) -> &str {
        &self.public_base_url
    }
}
