// Blob store upload endpoint.

use serde::Deserialize;
use url::Url;

use crate::client::CatalogClient;
use crate::error::Error;

/// Response of `POST uploads`.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub url: Url,
}

impl CatalogClient {
    /// Upload one file to the blob store and return its public URL.
    pub async fn upload_blob(
        &self,
        file_name: &str,
        content_type: &str,
        body: bytes::Bytes,
    ) -> Result<Url, Error> {
        let resp: UploadResponse = self
            .post_bytes("uploads", &[("filename", file_name)], content_type, body)
            .await?;
        Ok(resp.url)
    }
}
