//! The classification core: one keyword against the full domain corpus.

use std::sync::Arc;

use tracing::{info, warn};

use crate::core::homograph;
use crate::core::similarity::{jaro_winkler, levenshtein};
use crate::core::types::{
    jaro_winkler_tier, Confidence, DomainRecord, FlaggedDomain, Method, MetricValue, RunConfig,
    Verdict,
};
use crate::enrich::{Enrichment, Reputation};

const PROGRESS_INTERVAL: usize = 50_000;

/// Scans a domain corpus for squatting candidates of a single keyword.
/// Cheap to share across keyword tasks; holds no per-keyword state.
pub struct SquattingDetector {
    cfg: RunConfig,
    enrich: Option<Arc<Enrichment>>,
}

impl SquattingDetector {
    pub fn new(cfg: RunConfig, enrich: Option<Arc<Enrichment>>) -> Self {
        Self { cfg, enrich }
    }

    /// Classify one record without touching the network.
    pub fn classify(&self, keyword: &str, record: &DomainRecord) -> Verdict {
        let homograph_flag = homograph::contains_homograph(&record.label);
        let label = if homograph_flag {
            homograph::to_latin(&record.label)
        } else {
            record.label.clone()
        };

        if self.cfg.doppelganger_only {
            if label.contains(keyword) {
                return Verdict::Doppelganger {
                    certificate_trusted: None,
                };
            }
            return Verdict::NoMatch;
        }

        match self.cfg.method {
            Method::Levenshtein => {
                self.classify_levenshtein(keyword, &label, homograph_flag, &record.original)
            }
            Method::JaroWinkler => {
                self.classify_jaro_winkler(keyword, &label, homograph_flag, &record.original)
            }
        }
    }

    fn classify_levenshtein(
        &self,
        keyword: &str,
        label: &str,
        homograph_flag: bool,
        original: &str,
    ) -> Verdict {
        let distance = levenshtein(keyword, label);
        if distance <= self.cfg.confidence_level {
            let metric = MetricValue::Distance(distance);
            let tier = Confidence::from_distance(distance);
            if homograph_flag {
                return Verdict::Homograph { metric, tier };
            }
            return Verdict::Similarity { metric, tier };
        }
        if original.to_lowercase().contains(keyword) {
            return Verdict::Substring;
        }
        Verdict::NoMatch
    }

    fn classify_jaro_winkler(
        &self,
        keyword: &str,
        label: &str,
        homograph_flag: bool,
        original: &str,
    ) -> Verdict {
        let score = jaro_winkler(keyword, label);
        let tier = jaro_winkler_tier(score);
        if tier != Confidence::Low {
            let metric = MetricValue::Score(score);
            if homograph_flag {
                return Verdict::Homograph { metric, tier };
            }
            return Verdict::Similarity { metric, tier };
        }
        if original.to_lowercase().contains(keyword) {
            return Verdict::Substring;
        }
        Verdict::NoMatch
    }

    /// Scan the whole corpus for one keyword, in corpus order. Enrichment
    /// failures degrade to neutral signals; the scan itself cannot fail.
    pub async fn check(&self, keyword: &str, corpus: &[DomainRecord]) -> Vec<FlaggedDomain> {
        let mut flagged = Vec::new();
        for (idx, record) in corpus.iter().enumerate() {
            if idx > 0 && idx % PROGRESS_INTERVAL == 0 {
                let progress = (idx as f64 * 100.0) / corpus.len() as f64;
                info!("keyword {}: progress {:.1} %", keyword, progress);
            }

            let verdict = match self.classify(keyword, record) {
                Verdict::NoMatch => continue,
                Verdict::Doppelganger { .. } => self.doppelganger_verdict(keyword, record).await,
                other => other,
            };
            self.log_verdict(keyword, record, &verdict);

            let reputation = if self.cfg.dns_validation && verdict.triggers_reputation() {
                self.dns_reputation(&record.original).await
            } else {
                None
            };

            flagged.push(FlaggedDomain {
                keyword: keyword.to_string(),
                domain: record.original.clone(),
                verdict,
                reputation,
                open_ports: Vec::new(),
            });
        }
        flagged
    }

    async fn doppelganger_verdict(&self, keyword: &str, record: &DomainRecord) -> Verdict {
        let checker = self.enrich.as_ref().and_then(|e| e.ct.as_ref());
        let trusted = match checker {
            Some(ct) => Some(ct.has_trusted_certificate(&record.original).await),
            None => None,
        };
        match trusted {
            Some(false) => warn!(
                "doppelganger with suspicious certificate detected between {} and {}",
                keyword, record.original
            ),
            Some(true) => info!(
                "doppelganger with valid certificate detected between {} and {}",
                keyword, record.original
            ),
            None => info!(
                "doppelganger detected between {} and {}",
                keyword, record.original
            ),
        }
        Verdict::Doppelganger {
            certificate_trusted: trusted,
        }
    }

    fn log_verdict(&self, keyword: &str, record: &DomainRecord, verdict: &Verdict) {
        match verdict {
            Verdict::Similarity { metric, tier } => warn!(
                "similarity detected between {} and {} ({})",
                keyword,
                record.original,
                tier_text(metric, tier)
            ),
            Verdict::Homograph { metric, tier } => warn!(
                "homograph detected between {} and {} ({})",
                keyword,
                record.original,
                tier_text(metric, tier)
            ),
            Verdict::Substring => info!(
                "the word {} is contained in {}",
                keyword, record.original
            ),
            _ => {}
        }
    }

    async fn dns_reputation(&self, domain: &str) -> Option<Reputation> {
        let dns = self.enrich.as_ref()?.dns.as_ref()?;
        let reputation = dns.classify(domain).await;
        match &reputation {
            Reputation::NonMalicious => info!("{}: domain reputation non-malicious", domain),
            Reputation::Malicious => warn!("{}: domain reputation malicious", domain),
            Reputation::Timeout => warn!("{}: dns timeout, possible provider throttling", domain),
            Reputation::NxDomain => info!("{}: dns response non-existent domain", domain),
            Reputation::NoNameservers => warn!("{}: dns server error, no name servers", domain),
            Reputation::NoAnswer => warn!("{}: dns server error, no answer", domain),
            Reputation::Unknown(detail) => warn!("{}: dns response {}", domain, detail),
        }
        Some(reputation)
    }
}

fn tier_text(metric: &MetricValue, tier: &Confidence) -> &'static str {
    match metric {
        MetricValue::Distance(_) => tier.label(),
        MetricValue::Score(_) => tier.score_label(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector(cfg: RunConfig) -> SquattingDetector {
        SquattingDetector::new(cfg, None)
    }

    #[test]
    fn close_edit_distance_is_similarity() {
        let det = detector(RunConfig::default());
        let verdict = det.classify("paypal", &DomainRecord::new("paypai.com"));
        assert_eq!(
            verdict,
            Verdict::Similarity {
                metric: MetricValue::Distance(1),
                tier: Confidence::High,
            }
        );
    }

    #[test]
    fn distant_label_without_substring_is_no_match() {
        let det = detector(RunConfig::default());
        assert_eq!(
            det.classify("paypal", &DomainRecord::new("amazon.com")),
            Verdict::NoMatch
        );
    }

    #[test]
    fn substring_in_full_line_is_caught_after_distance_misses() {
        let det = detector(RunConfig::default());
        assert_eq!(
            det.classify("netflix", &DomainRecord::new("netflix-support.com")),
            Verdict::Substring
        );
    }

    #[test]
    fn substring_match_is_case_insensitive_on_the_original() {
        let det = detector(RunConfig::default());
        assert_eq!(
            det.classify("netflix", &DomainRecord::new("NETFLIX-billing.net")),
            Verdict::Substring
        );
    }

    #[test]
    fn homograph_label_is_normalized_before_scoring() {
        let det = detector(RunConfig::default());
        // Cyrillic а in place of the Latin a.
        let verdict = det.classify("paypal", &DomainRecord::new("p\u{0430}ypal.com"));
        assert_eq!(
            verdict,
            Verdict::Homograph {
                metric: MetricValue::Distance(0),
                tier: Confidence::VeryHigh,
            }
        );
    }

    #[test]
    fn doppelganger_needs_literal_containment() {
        let det = detector(RunConfig {
            doppelganger_only: true,
            ..RunConfig::default()
        });
        // The zero-for-o swap defeats the substring rule.
        assert_eq!(
            det.classify("facebook", &DomainRecord::new("facebo0k-login.com")),
            Verdict::NoMatch
        );
        assert_eq!(
            det.classify("facebook", &DomainRecord::new("facebook-login.com")),
            Verdict::Doppelganger {
                certificate_trusted: None
            }
        );
    }

    #[test]
    fn jaro_winkler_mode_uses_tier_table() {
        let det = detector(RunConfig {
            method: Method::JaroWinkler,
            ..RunConfig::default()
        });
        // Scored against the label "netflix123", not the full line.
        let verdict = det.classify("netflix", &DomainRecord::new("netflix123.com"));
        match verdict {
            Verdict::Similarity {
                metric: MetricValue::Score(score),
                tier,
            } => {
                assert!((score - 0.97).abs() < 1e-6);
                assert_eq!(tier, Confidence::VeryHigh);
            }
            other => panic!("unexpected verdict: {:?}", other),
        }
    }

    #[test]
    fn jaro_winkler_low_tier_does_not_trigger() {
        let det = detector(RunConfig {
            method: Method::JaroWinkler,
            ..RunConfig::default()
        });
        assert_eq!(
            det.classify("netflix", &DomainRecord::new("888888888888.com")),
            Verdict::NoMatch
        );
    }
}
