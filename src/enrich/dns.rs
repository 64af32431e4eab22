//! DNS-over-HTTPS reputation lookups.
//!
//! Security resolvers signal a blocked (malicious) domain in provider
//! specific ways: Quad9 answers NXDOMAIN with the recursion-available flag
//! cleared, Cloudflare's security resolver answers 0.0.0.0.

use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::core::error::SquatError;
use crate::enrich::Reputation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DohProvider {
    Quad9,
    Cloudflare,
}

impl DohProvider {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "quad9" => Some(DohProvider::Quad9),
            "cloudflare" => Some(DohProvider::Cloudflare),
            _ => None,
        }
    }

    pub fn query_url(&self) -> &'static str {
        match self {
            DohProvider::Quad9 => "https://dns.quad9.net:5053/dns-query",
            DohProvider::Cloudflare => "https://security.cloudflare-dns.com/dns-query",
        }
    }
}

pub struct DohReputation {
    client: reqwest::Client,
    url: String,
    provider: DohProvider,
}

#[derive(Debug, Deserialize)]
struct DohAnswer {
    #[serde(rename = "Status")]
    status: Option<u16>,
    #[serde(rename = "RA", default)]
    recursion_available: bool,
    #[serde(rename = "Answer", default)]
    answer: Vec<DohRecord>,
}

#[derive(Debug, Deserialize)]
struct DohRecord {
    #[serde(default)]
    data: String,
}

impl DohReputation {
    /// `url` overrides the provider's default query endpoint.
    pub fn new(
        provider: DohProvider,
        url: Option<String>,
        timeout_ms: u64,
        user_agent: &str,
    ) -> Result<Self, SquatError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent.to_string())
            .timeout(Duration::from_millis(timeout_ms))
            .build()?;
        Ok(Self {
            client,
            url: url.unwrap_or_else(|| provider.query_url().to_string()),
            provider,
        })
    }

    /// Classify one domain. Transport problems degrade to `Timeout` or
    /// `Unknown`; this never returns an error.
    pub async fn classify(&self, domain: &str) -> Reputation {
        let request = self
            .client
            .get(&self.url)
            .query(&[("name", domain), ("type", "A")])
            .header("Accept", "application/dns-json");
        let response = match request.send().await {
            Ok(resp) => resp,
            Err(err) if err.is_timeout() => return Reputation::Timeout,
            Err(err) => {
                warn!("doh query for {} failed: {}", domain, err);
                return Reputation::Unknown("resolver unreachable".to_string());
            }
        };
        if !response.status().is_success() {
            return Reputation::Unknown(format!("http {}", response.status()));
        }
        let answer: DohAnswer = match response.json().await {
            Ok(body) => body,
            Err(err) => {
                warn!("doh response for {} unreadable: {}", domain, err);
                return Reputation::Unknown("malformed response".to_string());
            }
        };
        match self.provider {
            DohProvider::Quad9 => classify_rcode(&answer),
            DohProvider::Cloudflare => classify_cloudflare(&answer),
        }
    }
}

fn classify_rcode(answer: &DohAnswer) -> Reputation {
    match answer.status {
        Some(0) if answer.answer.is_empty() => Reputation::NoAnswer,
        Some(0) => Reputation::NonMalicious,
        Some(2) => Reputation::NoNameservers,
        Some(3) if answer.recursion_available => Reputation::NxDomain,
        Some(3) => Reputation::Malicious,
        Some(code) => Reputation::Unknown(format!("rcode {}", code)),
        None => Reputation::Unknown("missing rcode".to_string()),
    }
}

fn classify_cloudflare(answer: &DohAnswer) -> Reputation {
    if answer.answer.iter().any(|record| record.data == "0.0.0.0") {
        return Reputation::Malicious;
    }
    match answer.status {
        Some(3) => Reputation::NxDomain,
        _ => classify_rcode(answer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(status: Option<u16>, ra: bool, data: &[&str]) -> DohAnswer {
        DohAnswer {
            status,
            recursion_available: ra,
            answer: data
                .iter()
                .map(|d| DohRecord {
                    data: d.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn quad9_block_is_nxdomain_without_recursion() {
        assert_eq!(
            classify_rcode(&answer(Some(3), false, &[])),
            Reputation::Malicious
        );
        assert_eq!(
            classify_rcode(&answer(Some(3), true, &[])),
            Reputation::NxDomain
        );
    }

    #[test]
    fn resolved_domain_is_non_malicious() {
        assert_eq!(
            classify_rcode(&answer(Some(0), true, &["93.184.216.34"])),
            Reputation::NonMalicious
        );
        assert_eq!(
            classify_rcode(&answer(Some(0), true, &[])),
            Reputation::NoAnswer
        );
    }

    #[test]
    fn cloudflare_block_is_zero_address() {
        assert_eq!(
            classify_cloudflare(&answer(Some(0), true, &["0.0.0.0"])),
            Reputation::Malicious
        );
        assert_eq!(
            classify_cloudflare(&answer(Some(0), true, &["104.18.2.1"])),
            Reputation::NonMalicious
        );
    }

    #[test]
    fn unexpected_rcode_is_unknown() {
        assert_eq!(
            classify_rcode(&answer(Some(5), true, &[])),
            Reputation::Unknown("rcode 5".to_string())
        );
    }
}
