//! Image source
//!
//! Fetches submitted photos from the blob store and decodes them. The
//! service only consumes URLs; how images get stored is someone else's job.

use async_trait::async_trait;
use image::DynamicImage;
use std::time::Duration;

use colorhunt_common::{Error, Result};

const USER_AGENT: &str = concat!("colorhunt/", env!("CARGO_PKG_VERSION"));

/// Fetch-and-decode boundary used by verification
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Fetch `url` and decode it
    ///
    /// Unreachable or undecodable images are `Error::ImageDecode`; a fetch
    /// that outlives the configured wait is `Error::FetchTimeout`.
    async fn fetch_image(&self, url: &str) -> Result<DynamicImage>;
}

/// Reject anything that is not an absolute http(s) URL
pub fn validate_image_url(url: &str) -> Result<reqwest::Url> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput("imageUrl is required".to_string()));
    }

    let parsed = reqwest::Url::parse(trimmed)
        .map_err(|e| Error::InvalidInput(format!("imageUrl is not a valid URL: {}", e)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(Error::InvalidInput(format!(
            "imageUrl scheme '{}' is not supported",
            other
        ))),
    }
}

/// Decode raw bytes on the blocking pool
pub async fn decode_image(bytes: Vec<u8>) -> Result<DynamicImage> {
    tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
        .await
        .map_err(|e| Error::Internal(format!("Image decode task failed: {}", e)))?
        .map_err(|e| Error::ImageDecode(e.to_string()))
}

/// HTTP(S) image source with a bounded wait and body size
pub struct HttpImageSource {
    http_client: reqwest::Client,
    fetch_timeout: Duration,
    max_bytes: usize,
}

impl HttpImageSource {
    pub fn new(fetch_timeout: Duration, max_bytes: usize) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            fetch_timeout,
            max_bytes,
        })
    }

    async fn download(&self, url: reqwest::Url) -> Result<Vec<u8>> {
        let mut response = self
            .http_client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Error::ImageDecode(format!("Fetch failed for {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::ImageDecode(format!(
                "Fetch of {} returned HTTP {}",
                url, status
            )));
        }

        if let Some(length) = response.content_length() {
            if length as usize > self.max_bytes {
                return Err(Error::ImageDecode(format!(
                    "Image is {} bytes, limit is {}",
                    length, self.max_bytes
                )));
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| Error::ImageDecode(format!("Reading {} failed: {}", url, e)))?
        {
            if body.len() + chunk.len() > self.max_bytes {
                return Err(Error::ImageDecode(format!(
                    "Image exceeds {} byte limit",
                    self.max_bytes
                )));
            }
            body.extend_from_slice(&chunk);
        }

        Ok(body)
    }
}

#[async_trait]
impl ImageSource for HttpImageSource {
    async fn fetch_image(&self, url: &str) -> Result<DynamicImage> {
        let url = validate_image_url(url)?;

        tracing::debug!(url = %url, "Fetching image");

        let bytes = match tokio::time::timeout(self.fetch_timeout, self.download(url.clone())).await
        {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(
                    url = %url,
                    timeout_ms = self.fetch_timeout.as_millis() as u64,
                    "Image fetch timed out"
                );
                return Err(Error::FetchTimeout(self.fetch_timeout.as_millis() as u64));
            }
        };

        decode_image(bytes).await
    }
}
