//! Image Endpoint: exchanges inline image payloads for signed URLs.
//!
//! # Responsibility
//! - Validate `data:image/...;base64,` payloads before they leave the client.
//! - Upload payloads and re-sign stored paths.
//!
//! # Invariants
//! - A payload that fails local validation is never sent.
//! - A successful upload always yields a non-empty URL.

use super::client::{RemoteClient, RemoteError, RemoteResult};
use crate::model::todo::INLINE_IMAGE_PREFIX;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};

const UPLOAD_PATH: &str = "upload-image";
const SIGN_PATH: &str = "get-image-url";

/// Validated inline image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    data_url: String,
    mime_type: String,
    byte_len: usize,
}

impl InlineImage {
    /// Parses a `data:image/<type>;base64,<payload>` URL.
    pub fn parse(data_url: &str) -> RemoteResult<Self> {
        let rest = data_url
            .strip_prefix("data:")
            .filter(|_| data_url.starts_with(INLINE_IMAGE_PREFIX))
            .ok_or_else(|| RemoteError::InvalidImage("missing data:image/ prefix".to_string()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| RemoteError::InvalidImage("missing payload separator".to_string()))?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| RemoteError::InvalidImage("payload is not base64".to_string()))?;
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|err| RemoteError::InvalidImage(err.to_string()))?;
        if bytes.is_empty() {
            return Err(RemoteError::InvalidImage("payload is empty".to_string()));
        }

        Ok(Self {
            data_url: data_url.to_string(),
            mime_type: mime_type.to_string(),
            byte_len: bytes.len(),
        })
    }

    pub fn data_url(&self) -> &str {
        &self.data_url
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Decoded size in bytes.
    pub fn byte_len(&self) -> usize {
        self.byte_len
    }
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    /// Time-limited signed URL, usable directly as an image source.
    pub url: String,
    /// Storage path, usable with `ImageEndpoint::signed_url` once `url` expires.
    pub path: Option<String>,
}

/// File name used for uploads created at `now`.
pub fn upload_file_name(now: DateTime<Utc>) -> String {
    format!("todo-image-{}.jpg", now.timestamp_millis())
}

#[async_trait]
pub trait ImageEndpoint: Send + Sync {
    async fn upload(
        &self,
        user_id: &str,
        image: &InlineImage,
        file_name: &str,
    ) -> RemoteResult<UploadedImage>;

    /// Issues a fresh signed URL for a previously uploaded path.
    async fn signed_url(&self, user_id: &str, path: &str) -> RemoteResult<String>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadBody<'a> {
    image_data: &'a str,
    file_name: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadAnswer {
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    path: Option<String>,
}

#[derive(Serialize)]
struct SignBody<'a> {
    path: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignAnswer {
    #[serde(default)]
    image_url: Option<String>,
}

#[derive(Clone)]
pub struct HttpImageEndpoint {
    client: RemoteClient,
}

impl HttpImageEndpoint {
    pub fn new(client: RemoteClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageEndpoint for HttpImageEndpoint {
    async fn upload(
        &self,
        user_id: &str,
        image: &InlineImage,
        file_name: &str,
    ) -> RemoteResult<UploadedImage> {
        let request = self
            .client
            .request(Method::POST, UPLOAD_PATH, user_id)
            .json(&UploadBody {
                image_data: image.data_url(),
                file_name,
            });
        let answer: UploadAnswer = self.client.send_json(UPLOAD_PATH, request).await?;
        let url = non_empty(answer.image_url)
            .ok_or_else(|| RemoteError::Decode("upload answer has no imageUrl".to_string()))?;

        Ok(UploadedImage {
            url,
            path: non_empty(answer.path),
        })
    }

    async fn signed_url(&self, user_id: &str, path: &str) -> RemoteResult<String> {
        let request = self
            .client
            .request(Method::POST, SIGN_PATH, user_id)
            .json(&SignBody { path });
        let answer: SignAnswer = self.client.send_json(SIGN_PATH, request).await?;
        non_empty(answer.image_url)
            .ok_or_else(|| RemoteError::Decode("sign answer has no imageUrl".to_string()))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}
