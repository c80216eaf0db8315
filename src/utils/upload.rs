//! Multipart uploads.
//!
//! [`UploadForm`] accepts either `multipart/form-data` or a JSON body. Text
//! parts are collected into a JSON object and deserialized into the target
//! DTO with the same lenient field parsers the JSON path uses; file parts
//! are kept in memory as [`UploadedFile`]s until a service stores them with
//! [`store_upload`].

use anyhow::anyhow;
use axum::{
    Json,
    body::Bytes,
    extract::{FromRequest, Multipart, Request},
    http::header,
};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, error, warn};
use validator::Validate;

use coursehub_core::{AppError, FileStorage, StorageError};

use crate::validator::{describe_body_error, validate_value};

pub const UNSUPPORTED_FILE_TYPE: &str = "Unsupported file type!";

const DOCUMENT_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

#[derive(Debug, Clone)]
pub struct UploadForm<T> {
    pub data: T,
    pub files: Vec<UploadedFile>,
}

impl<T> UploadForm<T> {
    /// Removes and returns the file sent under `field`, if any.
    pub fn take_file(&mut self, field: &str) -> Option<UploadedFile> {
        let index = self.files.iter().position(|f| f.field == field)?;
        Some(self.files.swap_remove(index))
    }
}

fn is_multipart(req: &Request) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("multipart/form-data"))
}

impl<T, S> FromRequest<S> for UploadForm<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !is_multipart(&req) {
            let Json(value) = Json::<Value>::from_request(req, state)
                .await
                .map_err(|_| AppError::bad_request(anyhow!("Invalid request body")))?;
            let data: T = serde_json::from_value(value)
                .map_err(|e| describe_body_error(&e.to_string()))?;
            validate_value(&data)?;
            return Ok(Self {
                data,
                files: Vec::new(),
            });
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::bad_request(anyhow!("Multipart error: {}", e)))?;

        let mut fields = Map::new();
        let mut files = Vec::new();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::bad_request(anyhow!("Multipart error: {}", e)))?
        {
            let name = field.name().unwrap_or("").to_string();
            if name.is_empty() {
                continue;
            }

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::bad_request(anyhow!("Failed to read field: {}", e)))?;
                    // Browsers send an empty part for an untouched file input.
                    if file_name.is_empty() && bytes.is_empty() {
                        continue;
                    }
                    debug!(field = %name, file.size = bytes.len(), file.mime = %content_type, "Received file part");
                    files.push(UploadedFile {
                        field: name,
                        file_name,
                        content_type,
                        bytes,
                    });
                }
                None => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| AppError::bad_request(anyhow!("Failed to read field: {}", e)))?;
                    if !text.trim().is_empty() {
                        fields.insert(name, Value::String(text));
                    }
                }
            }
        }

        let data: T = serde_json::from_value(Value::Object(fields))
            .map_err(|e| describe_body_error(&e.to_string()))?;
        validate_value(&data)?;

        Ok(Self { data, files })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFolder {
    UserImages,
    UserResumes,
    EducatorImages,
    CourseImages,
}

impl UploadFolder {
    pub fn path(&self) -> &'static str {
        match self {
            Self::UserImages => "users/images",
            Self::UserResumes => "users/resumes",
            Self::EducatorImages => "educators/images",
            Self::CourseImages => "courses/images",
        }
    }

    pub fn accepts(&self, mime_type: &str) -> bool {
        let mime_type = mime_type.to_ascii_lowercase();
        match self {
            Self::UserResumes => DOCUMENT_MIME_TYPES.contains(&mime_type.as_str()),
            _ => mime_type.starts_with("image/"),
        }
    }
}

fn sanitize_stem(file_name: &str) -> String {
    let stem = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name)
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(file_name);

    let cleaned: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect();
    let cleaned = cleaned.trim_matches('-');

    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.chars().take(64).collect()
    }
}

fn extension(file_name: &str, mime_type: &str) -> String {
    let from_name = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()));

    from_name.unwrap_or_else(|| {
        match mime_type {
            "image/png" => "png",
            "image/jpeg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            "application/pdf" => "pdf",
            "application/msword" => "doc",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => "docx",
            _ => "bin",
        }
        .to_string()
    })
}

/// `{folder}/{millis}-{stem}.{ext}`
pub fn storage_key(folder: UploadFolder, file: &UploadedFile) -> String {
    format!(
        "{}/{}-{}.{}",
        folder.path(),
        Utc::now().timestamp_millis(),
        sanitize_stem(&file.file_name),
        extension(&file.file_name, &file.content_type)
    )
}

/// Validates and stores `file`, returning its public URL.
pub async fn store_upload(
    storage: &dyn FileStorage,
    folder: UploadFolder,
    file: &UploadedFile,
) -> Result<String, AppError> {
    if !folder.accepts(&file.content_type) {
        warn!(field = %file.field, file.mime = %file.content_type, "Rejected upload type");
        return Err(AppError::bad_request(anyhow!(UNSUPPORTED_FILE_TYPE)));
    }

    let key = storage_key(folder, file);
    storage.save(&key, &file.bytes).await.map_err(|e| match e {
        StorageError::InvalidFileSize { .. } | StorageError::InvalidKey(_) => {
            AppError::bad_request(anyhow!("{}", e))
        }
        other => {
            error!(storage.key = %key, error = %other, "Failed to store upload");
            AppError::internal(other)
        }
    })?;

    storage.get_url(&key).map_err(AppError::internal)
}

/// Removes a previously stored file. Failures are logged, not returned.
pub async fn discard_upload(storage: &dyn FileStorage, url: Option<&str>) {
    let Some(url) = url else {
        return;
    };
    let Some(key) = storage.key_for_url(url) else {
        debug!(url = %url, "Stored URL is not managed by this backend, skipping delete");
        return;
    };
    if let Err(e) = storage.delete(key).await {
        warn!(storage.key = %key, error = %e, "Failed to delete stored file");
    }
}
