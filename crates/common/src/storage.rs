//! Media storage for uploaded images and videos.
//!
//! Supports the local filesystem and the Cloudinary media host.

use std::{path::PathBuf, sync::Arc};

use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::{AppError, AppResult, config::StorageConfig};

/// Location of a file accepted by a [`MediaStore`].
#[derive(Debug, Clone)]
pub struct StoredMedia {
    /// Storage key (path or public id).
    pub key: String,
    /// URL the file is served from. May be root-relative for local storage.
    pub secure_url: String,
    /// File size in bytes.
    pub size: u64,
}

/// Media store trait.
///
/// Services receive an implementation explicitly; there is no global store.
#[async_trait::async_trait]
pub trait MediaStore: Send + Sync {
    /// Upload a file under `folder` and return where it can be fetched.
    async fn upload(
        &self,
        folder: &str,
        file_name: &str,
        data: &[u8],
        content_type: &str,
    ) -> AppResult<StoredMedia>;
}

/// Build the configured media store.
pub fn media_store_from_config(config: &StorageConfig) -> Arc<dyn MediaStore> {
    match config {
        StorageConfig::Local {
            base_path,
            base_url,
        } => Arc::new(LocalStorage::new(base_path.clone(), base_url.clone())),
        StorageConfig::Cloudinary {
            cloud_name,
            api_key,
            api_secret,
            folder_prefix,
        } => Arc::new(CloudinaryStorage::new(
            cloud_name.clone(),
            api_key.clone(),
            api_secret.clone(),
            folder_prefix.clone(),
        )),
    }
}

/// Local filesystem storage backend.
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new local storage backend.
    #[must_use]
    pub const fn new(base_path: PathBuf, base_url: String) -> Self {
        Self {
            base_path,
            base_url,
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }
}

#[async_trait::async_trait]
impl MediaStore for LocalStorage {
    async fn upload(
        &self,
        folder: &str,
        file_name: &str,
        data: &[u8],
        _content_type: &str,
    ) -> AppResult<StoredMedia> {
        let key = generate_storage_key(folder, file_name);
        let path = self.base_path.join(&key);

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Upload(format!("Failed to create directory: {e}")))?;
        }

        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::Upload(format!("Failed to write file: {e}")))?;

        tracing::debug!(key = %key, size = data.len(), "Stored media locally");

        Ok(StoredMedia {
            secure_url: self.public_url(&key),
            key,
            size: data.len() as u64,
        })
    }
}

/// Cloudinary upload backend.
///
/// Uploads go to the `auto` resource type so one endpoint accepts both images
/// and videos. Requests are signed with SHA-256; the account must have that
/// signature algorithm enabled.
pub struct CloudinaryStorage {
    client: reqwest::Client,
    cloud_name: String,
    api_key: String,
    api_secret: String,
    folder_prefix: Option<String>,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct CloudinaryUpload {
    public_id: String,
    secure_url: String,
    #[serde(default)]
    bytes: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct CloudinaryErrorBody {
    error: CloudinaryErrorMessage,
}

#[derive(Debug, Deserialize)]
struct CloudinaryErrorMessage {
    message: String,
}

impl CloudinaryStorage {
    /// Create a new Cloudinary backend.
    #[must_use]
    pub fn new(
        cloud_name: String,
        api_key: String,
        api_secret: String,
        folder_prefix: Option<String>,
    ) -> Self {
        let endpoint = format!("https://api.cloudinary.com/v1_1/{cloud_name}/auto/upload");
        Self {
            client: reqwest::Client::new(),
            cloud_name,
            api_key,
            api_secret,
            folder_prefix,
            endpoint,
        }
    }

    fn full_folder(&self, folder: &str) -> String {
        match &self.folder_prefix {
            Some(prefix) => format!("{}/{}", prefix.trim_end_matches('/'), folder),
            None => folder.to_string(),
        }
    }

    /// Signature over the sorted upload parameters followed by the API secret.
    fn sign(&self, params: &[(&str, &str)]) -> String {
        let mut sorted = params.to_vec();
        sorted.sort_by(|a, b| a.0.cmp(b.0));
        let joined = sorted
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha256::new();
        hasher.update(joined.as_bytes());
        hasher.update(self.api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[async_trait::async_trait]
impl MediaStore for CloudinaryStorage {
    async fn upload(
        &self,
        folder: &str,
        file_name: &str,
        data: &[u8],
        content_type: &str,
    ) -> AppResult<StoredMedia> {
        let folder = self.full_folder(folder);
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = self.sign(&[("folder", &folder), ("timestamp", &timestamp)]);

        let part = reqwest::multipart::Part::bytes(data.to_vec())
            .file_name(file_name.to_string())
            .mime_str(content_type)
            .map_err(|e| AppError::Upload(format!("Invalid content type: {e}")))?;

        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", folder)
            .text("signature", signature)
            .text("signature_algorithm", "sha256");

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::Upload(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Upload(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<CloudinaryErrorBody>(&body)
                .map_or(body, |e| e.error.message);
            tracing::warn!(cloud = %self.cloud_name, status = %status, "Cloudinary rejected upload");
            return Err(AppError::Upload(message));
        }

        let uploaded: CloudinaryUpload = serde_json::from_str(&body)
            .map_err(|e| AppError::Upload(format!("Unexpected media host response: {e}")))?;

        Ok(StoredMedia {
            key: uploaded.public_id,
            secure_url: uploaded.secure_url,
            size: uploaded.bytes.unwrap_or(data.len() as u64),
        })
    }
}

/// Generate a unique storage key for a file.
#[must_use]
pub fn generate_storage_key(folder: &str, original_name: &str) -> String {
    use chrono::Utc;

    let now = Utc::now();
    let date_path = now.format("%Y/%m/%d").to_string();

    // Extract extension from original name
    let extension = original_name
        .rfind('.')
        .filter(|&pos| pos > 0 && pos < original_name.len() - 1)
        .map(|pos| &original_name[pos + 1..])
        .filter(|ext| ext.len() <= 10 && ext.chars().all(char::is_alphanumeric))
        .unwrap_or("bin");

    format!(
        "{}/{}/{}.{}",
        folder.trim_matches('/'),
        date_path,
        uuid::Uuid::new_v4().simple(),
        extension.to_ascii_lowercase()
    )
}
