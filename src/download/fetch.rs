//! Fetching a URL into a local file.

use std::path::Path;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};
use crate::fs::temporary_path;
use crate::output::create_download_bar;

/// Minimum file size to show progress bar (20 MB).
const PROGRESS_THRESHOLD: u64 = 20 * 1024 * 1024;

/// Retrieves a URL into a destination path.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url` into `destination`, returning the number of bytes written.
    async fn fetch(&self, url: &str, destination: &Path) -> Result<u64>;
}

/// HTTP fetcher.
///
/// The body is streamed into a hidden temporary sibling and renamed onto
/// the destination only once complete; on failure the temporary file is
/// removed, so the destination either holds the full body or does not exist.
pub struct HttpFetcher {
    client: Client,
    show_progress: bool,
}

impl HttpFetcher {
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| Error::Download(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            show_progress: false,
        })
    }

    /// Show a progress bar for large bodies.
    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    async fn stream_to_file(&self, url: &str, output_path: &Path) -> Result<u64> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(Error::Download(format!(
                "Failed to download file: HTTP {}",
                response.status()
            )));
        }

        let content_length = response.content_length();
        let progress = (self.show_progress
            && content_length.is_some_and(|l| l > PROGRESS_THRESHOLD))
        .then(|| create_download_bar(content_length.unwrap_or(0)));

        let mut file = File::create(output_path).await?;
        let mut stream = response.bytes_stream();
        let mut downloaded: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Error::Download(format!("Stream error: {}", e)))?;
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;

            if let Some(ref pb) = progress {
                pb.set_position(downloaded);
            }
        }

        file.flush().await?;
        file.sync_all().await?;

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        Ok(downloaded)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, destination: &Path) -> Result<u64> {
        let temp_path = temporary_path(destination);

        let result: Result<u64> = async {
            let bytes = self.stream_to_file(url, &temp_path).await?;
            tokio::fs::rename(&temp_path, destination).await?;
            Ok(bytes)
        }
        .await;

        if result.is_err() {
            tracing::debug!("Cleaning up partial file {}", temp_path.display());
            let _ = tokio::fs::remove_file(&temp_path).await;
        }

        result
    }
}
