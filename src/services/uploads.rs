use async_trait::async_trait;
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("upload request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("upload service rejected file: status {0}")]
    Rejected(u16),
}

/// Blob storage abstraction for profile images. Returns the public URL of
/// the stored object.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(&self, bytes: Vec<u8>, kind: &str, folder: &str) -> Result<String, UploadError>;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

/// Streams file bytes to an HTTP upload service (Cloudinary-style API).
pub struct HttpBlobStore {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl HttpBlobStore {
    pub fn new(client: reqwest::Client, api_url: String, api_key: String) -> Self {
        Self {
            client,
            api_url,
            api_key,
        }
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn upload(&self, bytes: Vec<u8>, kind: &str, folder: &str) -> Result<String, UploadError> {
        let form = reqwest::multipart::Form::new()
            .text("resource_type", kind.to_string())
            .text("folder", folder.to_string())
            .part("file", reqwest::multipart::Part::bytes(bytes));

        let response = self
            .client
            .post(format!("{}/{}/upload", self.api_url, kind))
            .header("api-key", &self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::Rejected(status.as_u16()));
        }

        let body: UploadResponse = response.json().await?;
        Ok(body.secure_url)
    }
}
