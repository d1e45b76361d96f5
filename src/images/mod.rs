//! Transient working directory for downloaded product images.
//!
//! Images live only for the duration of one batch: the directory is created
//! if absent and cleared of files at process start. Downloads go through the
//! fixed-delay retry wrapper. No format conversion happens here.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use tracing::info;

use crate::error::Error;
use crate::retry::with_retry;

const DOWNLOAD_ATTEMPTS: u32 = 3;
const DOWNLOAD_DELAY: Duration = Duration::from_secs(1);

/// Creates the working directory if needed and clears any files left over
/// from a previous run. Subdirectories are left alone.
pub fn prepare_workdir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            std::fs::remove_file(entry.path())?;
            info!("Removed leftover file {}", entry.path().display());
        }
    }
    Ok(())
}

pub struct ImageFetcher {
    client: Client,
    workdir: PathBuf,
}

impl ImageFetcher {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            client: Client::new(),
            workdir: workdir.into(),
        }
    }

    /// Downloads a product image into the working directory and returns the
    /// local path. Transient failures are retried with a fixed delay.
    pub async fn download(&self, url: &str) -> Result<PathBuf> {
        let client = self.client.clone();
        let target = url.to_string();

        let bytes = with_retry(DOWNLOAD_ATTEMPTS, DOWNLOAD_DELAY, move || {
            let client = client.clone();
            let url = target.clone();
            async move {
                let response = client.get(&url).send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(Error::Upstream {
                        status: status.as_u16(),
                        message: status.to_string(),
                    });
                }
                Ok(response.bytes().await?)
            }
        })
        .await?;

        let path = self.workdir.join(file_name_for(url));
        tokio::fs::write(&path, &bytes).await?;
        info!("Image saved to {}", path.display());
        Ok(path)
    }
}

/// Derives a stable file name from the source URL.
fn file_name_for(url: &str) -> String {
    let clean = url.split(['?', '#']).next().unwrap_or(url);
    let extension = Path::new(clean)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| e.len() <= 4 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or("png");
    format!("{:x}.{extension}", md5::compute(url))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{Mock, MockServer, ResponseTemplate, matchers};

    #[test]
    fn test_prepare_workdir_clears_files_but_keeps_directories() {
        let dir = tempfile::tempdir().unwrap();
        let stale = dir.path().join("old.png");
        std::fs::write(&stale, b"stale").unwrap();
        let nested = dir.path().join("keep");
        std::fs::create_dir(&nested).unwrap();

        prepare_workdir(dir.path()).unwrap();

        assert!(!stale.exists());
        assert!(nested.exists());
    }

    #[test]
    fn test_prepare_workdir_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("img");
        prepare_workdir(&target).unwrap();
        assert!(target.is_dir());
    }

    #[test]
    fn test_file_name_is_stable_and_keeps_extension() {
        let a = file_name_for("https://cdn.example.com/products/board.jpg");
        let b = file_name_for("https://cdn.example.com/products/board.jpg");
        assert_eq!(a, b);
        assert!(a.ends_with(".jpg"));
    }

    #[test]
    fn test_file_name_defaults_extension_for_odd_urls() {
        let name = file_name_for("https://cdn.example.com/image?id=42");
        assert!(name.ends_with(".png"));
    }

    #[tokio::test]
    async fn test_download_writes_image_to_workdir() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("GET"))
            .and(matchers::path("/board.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fake image".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let fetcher = ImageFetcher::new(dir.path());

        let path = fetcher
            .download(&format!("{}/board.jpg", server.uri()))
            .await
            .unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"fake image");
        assert_eq!(path.parent().unwrap(), dir.path());
    }

    #[tokio::test]
    async fn test_download_retries_transient_failures() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(matchers::method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"late image".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let fetcher = ImageFetcher::new(dir.path());

        let path = fetcher
            .download(&format!("{}/board.jpg", server.uri()))
            .await
            .unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"late image");
    }
}
