//! Acquisition of the newly-registered-domains feed.
//!
//! The feed publisher exposes a checksum next to each feed file; a download
//! only happens when the local copy's digest no longer matches.

use std::path::Path;
use std::time::Duration;

use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::core::error::SquatError;

/// Which slice of the feed to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedPeriod {
    Day,
    Week,
    Month,
}

impl FeedPeriod {
    pub fn file_name(&self) -> &'static str {
        match self {
            FeedPeriod::Day => "domain-names.txt",
            FeedPeriod::Week => "domain-names-week.txt",
            FeedPeriod::Month => "domain-names-month.txt",
        }
    }
}

pub struct FeedFetcher {
    client: reqwest::Client,
    base_url: String,
    backup_url: String,
    period: FeedPeriod,
}

impl FeedFetcher {
    pub fn new(
        base_url: String,
        backup_url: String,
        user_agent: &str,
        timeout_ms: u64,
        period: FeedPeriod,
    ) -> Result<Self, SquatError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent.to_string())
            .timeout(Duration::from_millis(timeout_ms))
            .build()?;
        Ok(Self {
            client,
            base_url,
            backup_url,
            period,
        })
    }

    /// Download the feed unless the local copy already matches the
    /// published checksum. Returns true when a download happened.
    pub async fn ensure_fresh(&self, target: &Path) -> Result<bool, SquatError> {
        info!("checking for the latest feeds");
        if self.is_current(target).await {
            info!("local domain feed is up to date");
            return Ok(false);
        }
        self.download(target).await?;
        Ok(true)
    }

    async fn is_current(&self, target: &Path) -> bool {
        if !target.exists() {
            return false;
        }
        let checksum_url = format!("{}{}.sha256", self.base_url, self.period.file_name());
        let remote = match self.client.get(&checksum_url).send().await {
            Ok(resp) if resp.status().is_success() => match resp.text().await {
                Ok(text) => text.trim().to_lowercase(),
                Err(_) => return false,
            },
            _ => return false,
        };
        match sha256_file(target) {
            Ok(local) => local == remote,
            Err(_) => false,
        }
    }

    async fn download(&self, target: &Path) -> Result<(), SquatError> {
        let url = format!("{}{}", self.base_url, self.period.file_name());
        info!("downloading fresh domain list: {}", url);

        let mut response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| SquatError::FeedDownload(err.to_string()))?;
        if matches!(response.status().as_u16(), 403 | 404) {
            warn!(
                "{} unavailable ({}), trying the backup url",
                self.period.file_name(),
                response.status()
            );
            response = self
                .client
                .get(&self.backup_url)
                .send()
                .await
                .map_err(|err| SquatError::FeedDownload(err.to_string()))?;
        }
        if !response.status().is_success() {
            return Err(SquatError::FeedDownload(format!(
                "feed request failed with status {}",
                response.status()
            )));
        }

        let data = response
            .bytes()
            .await
            .map_err(|err| SquatError::FeedDownload(err.to_string()))?;
        if data.is_empty() {
            return Err(SquatError::FeedDownload(
                "feed payload was empty".to_string(),
            ));
        }
        info!(
            "download volume: {:.2} MB",
            data.len() as f64 / 1024.0 / 1024.0
        );
        std::fs::write(target, &data)?;
        Ok(())
    }
}

pub fn sha256_file(path: &Path) -> Result<String, SquatError> {
    let data = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}
