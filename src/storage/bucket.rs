use anyhow::{Context, Result};
use log::{debug, info};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use crate::errors::{fetch_context, storage_context};

const STORAGE_API: &str = "https://storage.googleapis.com";
const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
}

/// Documents kept as objects in a Cloud Storage bucket, via the JSON API
#[derive(Debug, Clone)]
pub struct BucketStore {
    client: Client,
    bucket: String,
    access_token: Option<String>,
}

impl BucketStore {
    /// Without `access_token` a token is requested from the instance metadata server on each call
    pub fn new(bucket: &str, access_token: Option<String>, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to build storage HTTP client")?;
        Ok(Self {
            client,
            bucket: bucket.to_string(),
            access_token,
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub async fn write(&self, name: &str, contents: &str) -> Result<()> {
        let url = upload_url(&self.bucket, name);
        let token = self.token().await?;
        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .header("Content-Type", "application/json")
            .body(contents.to_string())
            .send()
            .await
            .with_context(|| storage_context("upload", name))?;

        if !response.status().is_success() {
            anyhow::bail!("HTTP error {} uploading gs://{}/{}", response.status(), self.bucket, name);
        }
        info!("Saved gs://{}/{}", self.bucket, name);
        Ok(())
    }

    pub async fn read(&self, name: &str) -> Result<Option<String>> {
        let url = download_url(&self.bucket, name);
        let token = self.token().await?;
        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .with_context(|| storage_context("download", name))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let body = response.text().await.with_context(|| storage_context("read", name))?;
                Ok(Some(body))
            }
            status => anyhow::bail!("HTTP error {} downloading gs://{}/{}", status, self.bucket, name),
        }
    }

    async fn token(&self) -> Result<String> {
        if let Some(token) = &self.access_token {
            return Ok(token.clone());
        }
        debug!("Requesting storage token from metadata server");
        let response = self
            .client
            .get(METADATA_TOKEN_URL)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .with_context(|| fetch_context(METADATA_TOKEN_URL))
            .context("No GCS_ACCESS_TOKEN set and the metadata server is unreachable")?;
        if !response.status().is_success() {
            anyhow::bail!("Metadata server refused a storage token: HTTP {}", response.status());
        }
        let token: MetadataToken = response.json().await.context("Failed to decode metadata token")?;
        Ok(token.access_token)
    }
}

fn upload_url(bucket: &str, name: &str) -> String {
    format!(
        "{}/upload/storage/v1/b/{}/o?uploadType=media&name={}",
        STORAGE_API,
        bucket,
        urlencoding::encode(name)
    )
}

fn download_url(bucket: &str, name: &str) -> String {
    format!(
        "{}/storage/v1/b/{}/o/{}?alt=media",
        STORAGE_API,
        bucket,
        urlencoding::encode(name)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_urls() {
        assert_eq!(
            upload_url("court-slots", "free_slots_tennis.json"),
            "https://storage.googleapis.com/upload/storage/v1/b/court-slots/o?uploadType=media&name=free_slots_tennis.json"
        );
        assert_eq!(
            download_url("court-slots", "archive/free_slots_padel.json"),
            "https://storage.googleapis.com/storage/v1/b/court-slots/o/archive%2Ffree_slots_padel.json?alt=media"
        );
    }
}
