//! Sweep of an active-phishing domain feed for keyword hits.

use std::time::Duration;

use tracing::info;

use crate::core::error::SquatError;

pub struct PhishingSweep {
    client: reqwest::Client,
    feed_url: String,
}

impl PhishingSweep {
    pub fn new(feed_url: String, user_agent: &str, timeout_ms: u64) -> Result<Self, SquatError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent.to_string())
            .timeout(Duration::from_millis(timeout_ms))
            .build()?;
        Ok(Self { client, feed_url })
    }

    /// Download the phishing feed once and flag every entry containing a
    /// keyword as substring, in keyword order.
    pub async fn run(&self, keywords: &[String]) -> Result<Vec<String>, SquatError> {
        info!("downloading phishing database: {}", self.feed_url);
        let response = self
            .client
            .get(&self.feed_url)
            .send()
            .await
            .map_err(|err| SquatError::FeedDownload(err.to_string()))?;
        if !response.status().is_success() {
            return Err(SquatError::FeedDownload(format!(
                "phishing feed request failed with status {}",
                response.status()
            )));
        }
        let body = response
            .text()
            .await
            .map_err(|err| SquatError::FeedDownload(err.to_string()))?;

        let entries: Vec<&str> = body
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        let mut hits = Vec::new();
        for keyword in keywords {
            for entry in &entries {
                if entry.to_lowercase().contains(keyword) {
                    info!("phishing domain {} matches keyword {}", entry, keyword);
                    hits.push(entry.to_string());
                }
            }
        }
        Ok(hits)
    }
}
