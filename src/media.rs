//! Profile picture uploads
//!
//! Profile updates may carry the picture inline as a `data:image/...;base64,`
//! URL. Those are decoded and handed to a [`MediaUploader`]; the stored value
//! is the public URL it returns.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;

/// Media upload error
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Invalid image data: {0}")]
    InvalidImage(String),
    #[error("Image upload is not configured")]
    NotConfigured,
    #[error("Upload failed: {0}")]
    Upload(String),
}

/// Options passed along with an upload
#[derive(Debug, Clone)]
pub struct UploadOptions {
    pub content_type: String,
    pub folder: Option<String>,
}

/// An image decoded from a data URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Parse `data:image/<kind>;base64,<payload>`.
///
/// Returns `Ok(None)` when `value` is not a data URL at all.
pub fn parse_data_url(value: &str) -> Result<Option<InlineImage>, MediaError> {
    let Some(rest) = value.strip_prefix("data:") else {
        return Ok(None);
    };

    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| MediaError::InvalidImage("missing payload".to_string()))?;
    let content_type = header
        .strip_suffix(";base64")
        .ok_or_else(|| MediaError::InvalidImage("only base64 data URLs are supported".to_string()))?;
    if !content_type.starts_with("image/") {
        return Err(MediaError::InvalidImage(format!(
            "unsupported content type {content_type}"
        )));
    }

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| MediaError::InvalidImage(e.to_string()))?;
    if bytes.is_empty() {
        return Err(MediaError::InvalidImage("empty image".to_string()));
    }

    Ok(Some(InlineImage {
        content_type: content_type.to_string(),
        bytes,
    }))
}

/// Hosts images and returns their public URL
#[async_trait]
pub trait MediaUploader: Send + Sync {
    async fn upload(&self, image: Vec<u8>, options: UploadOptions) -> Result<String, MediaError>;
}

/// Uploader used when no media service is configured
pub struct DisabledUploader;

#[async_trait]
impl MediaUploader for DisabledUploader {
    async fn upload(&self, _image: Vec<u8>, _options: UploadOptions) -> Result<String, MediaError> {
        Err(MediaError::NotConfigured)
    }
}

/// Unsigned upload to a Cloudinary-style HTTP endpoint
pub struct HttpUploader {
    client: reqwest::Client,
    endpoint: String,
    upload_preset: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

impl HttpUploader {
    pub fn new(endpoint: String, upload_preset: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            upload_preset,
        }
    }
}

#[async_trait]
impl MediaUploader for HttpUploader {
    async fn upload(&self, image: Vec<u8>, options: UploadOptions) -> Result<String, MediaError> {
        let file = format!(
            "data:{};base64,{}",
            options.content_type,
            STANDARD.encode(&image)
        );

        let mut form = vec![("file", file)];
        if let Some(preset) = &self.upload_preset {
            form.push(("upload_preset", preset.clone()));
        }
        if let Some(folder) = options.folder {
            form.push(("folder", folder));
        }

        let response = self
            .client
            .post(&self.endpoint)
            .form(&form)
            .send()
            .await
            .map_err(|e| MediaError::Upload(e.to_string()))?;

        if !response.status().is_success() {
            return Err(MediaError::Upload(format!(
                "media service returned {}",
                response.status()
            )));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| MediaError::Upload(e.to_string()))?;

        tracing::debug!(url = %body.secure_url, bytes = image.len(), "image uploaded");
        Ok(body.secure_url)
    }
}
