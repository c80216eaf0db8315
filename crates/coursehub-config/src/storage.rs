use std::path::PathBuf;

use crate::{env_or, env_parse};

/// 15 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 15 * 1024 * 1024;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    Local,
    Http,
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Directory for the local backend.
    pub local_dir: PathBuf,
    /// URL prefix files are served from.
    pub public_base_url: String,
    /// Object store endpoint for the HTTP backend.
    pub endpoint: String,
    pub access_token: String,
    pub max_upload_bytes: usize,
}

impl StorageConfig {
    pub fn from_env() -> Self {
        let backend = match env_or("STORAGE_BACKEND", "local").to_lowercase().as_str() {
            "http" | "object" | "remote" => StorageBackend::Http,
            _ => StorageBackend::Local,
        };

        Self {
            backend,
            local_dir: PathBuf::from(env_or("STORAGE_LOCAL_DIR", "storage/uploads")),
            public_base_url: env_or("STORAGE_PUBLIC_URL", "http://localhost:4000/files"),
            endpoint: std::env::var("STORAGE_ENDPOINT").unwrap_or_default(),
            access_token: std::env::var("STORAGE_ACCESS_TOKEN").unwrap_or_default(),
            max_upload_bytes: env_parse("UPLOAD_MAX_BYTES", DEFAULT_MAX_UPLOAD_BYTES),
        }
    }
}
