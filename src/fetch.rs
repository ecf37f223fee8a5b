use crate::config::FetchConfig;
use anyhow::{Context, Result};
use reqwest::blocking::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

pub struct Fetcher {
    client: Client,
    cache_dir: PathBuf,
    delay: Duration,
}

impl Fetcher {
    pub fn new(config: &FetchConfig, cache_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(cache_dir)
            .with_context(|| format!("failed to create cache dir {}", cache_dir.display()))?;

        let mut builder = Client::builder().timeout(Duration::from_secs(config.timeout_secs));
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        let client = builder.build().context("failed to build http client")?;

        Ok(Self {
            client,
            cache_dir: cache_dir.to_path_buf(),
            delay: Duration::from_millis(config.delay_ms),
        })
    }

    // Cached pages never expire; delete the cache dir to force a refetch.
    // No retries either: one failed request aborts the whole crawl.
    pub fn fetch(&self, url: &str) -> Result<String> {
        let path = self.cache_dir.join(cache_file_name(url));
        if path.exists() {
            debug!(%url, file = %path.display(), "serving page from cache");
            return std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read cached page {}", path.display()));
        }

        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }

        let response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("request to {url} failed"))?
            .error_for_status()
            .with_context(|| format!("request to {url} returned an error status"))?;
        let body = response
            .text()
            .with_context(|| format!("failed to read response body from {url}"))?;

        std::fs::write(&path, &body)
            .with_context(|| format!("failed to write cache file {}", path.display()))?;
        info!(%url, bytes = body.len(), "fetched and cached page");

        Ok(body)
    }
}

pub fn cache_file_name(url: &str) -> String {
    let sanitized: String = url
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{sanitized}.html")
}
