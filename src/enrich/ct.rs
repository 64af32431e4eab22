//! Certificate transparency lookups against crt.sh.

use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::core::error::SquatError;

/// Issuers whose certificates on a lookalike domain are treated as
/// suspicious rather than reassuring.
const DISTRUSTED_ISSUERS: &[&str] = &["Let's Encrypt Authority X3"];

const MAX_LOG_ENTRIES: usize = 100;

pub struct CtChecker {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct CtEntry {
    #[serde(default)]
    name_value: String,
    #[serde(default)]
    issuer_name: String,
}

impl CtChecker {
    pub fn new(base_url: String, timeout_ms: u64, user_agent: &str) -> Result<Self, SquatError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent.to_string())
            .timeout(Duration::from_millis(timeout_ms))
            .build()?;
        Ok(Self { client, base_url })
    }

    /// True when transparency logs show a certificate from a trusted issuer
    /// matching the domain. No logs at all is treated as untrusted.
    ///
    /// Fails open when the log server is unreachable, so a crt.sh outage
    /// cannot turn every doppelganger into a certificate alert.
    pub async fn has_trusted_certificate(&self, domain: &str) -> bool {
        let url = format!("{}?q={}&output=json", self.base_url, domain);
        let response = match self.client.get(&url).send().await {
            Ok(resp) => resp,
            Err(err) => {
                warn!("cannot fetch ct logs for {}: {}", domain, err);
                return true;
            }
        };
        if !response.status().is_success() {
            warn!("ct log query for {} returned {}", domain, response.status());
            return true;
        }
        let entries: Vec<CtEntry> = match response.json().await {
            Ok(entries) => entries,
            Err(err) => {
                warn!("could not read ct logs for {}: {}", domain, err);
                return false;
            }
        };
        if entries.is_empty() {
            return false;
        }
        for entry in entries.iter().take(MAX_LOG_ENTRIES) {
            if entry.name_value.contains(domain)
                && DISTRUSTED_ISSUERS
                    .iter()
                    .any(|issuer| entry.issuer_name.contains(issuer))
            {
                return false;
            }
        }
        true
    }
}
