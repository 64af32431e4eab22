//! Run orchestration: one detector task per keyword over a shared corpus.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::core::detector::SquattingDetector;
use crate::core::error::SquatError;
use crate::core::types::{DomainRecord, FlaggedDomain, RunConfig};
use crate::enrich::{Enrichment, Reputation};

pub struct Engine {
    cfg: RunConfig,
    detector: Arc<SquattingDetector>,
    enrich: Option<Arc<Enrichment>>,
}

/// Totals and results of one complete scan.
#[derive(Debug)]
pub struct RunReport {
    pub keywords_total: usize,
    pub domains_total: usize,
    pub flagged: Vec<FlaggedDomain>,
    /// Domains the reputation provider flagged as malicious.
    pub dns_malicious: Vec<String>,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn flagged_lines(&self) -> Vec<String> {
        self.flagged.iter().map(|f| f.domain.clone()).collect()
    }
}

impl Engine {
    pub fn new(cfg: RunConfig, enrich: Option<Arc<Enrichment>>) -> Self {
        let detector = Arc::new(SquattingDetector::new(cfg.clone(), enrich.clone()));
        Self {
            cfg,
            detector,
            enrich,
        }
    }

    /// Scan every keyword against the corpus and merge the per-keyword
    /// results in keyword order, so output is reproducible regardless of
    /// task completion order.
    pub async fn run(
        &self,
        keywords: &[String],
        corpus: Vec<DomainRecord>,
    ) -> Result<RunReport, SquatError> {
        let started = Instant::now();
        let domains_total = corpus.len();
        let corpus = Arc::new(corpus);

        let mut flagged = Vec::new();
        if self.cfg.parallel {
            let mut handles = Vec::with_capacity(keywords.len());
            for (idx, keyword) in keywords.iter().enumerate() {
                info!(
                    "verifying keyword: {} [{}/{}]",
                    keyword,
                    idx + 1,
                    keywords.len()
                );
                let detector = Arc::clone(&self.detector);
                let corpus = Arc::clone(&corpus);
                let keyword = keyword.clone();
                handles.push(tokio::spawn(async move {
                    detector.check(&keyword, &corpus).await
                }));
            }
            for handle in handles {
                let hits = handle
                    .await
                    .map_err(|err| SquatError::Task(err.to_string()))?;
                flagged.extend(hits);
            }
        } else {
            for (idx, keyword) in keywords.iter().enumerate() {
                info!(
                    "verifying keyword: {} [{}/{}]",
                    keyword,
                    idx + 1,
                    keywords.len()
                );
                flagged.extend(self.detector.check(keyword, &corpus).await);
            }
        }

        if self.cfg.dedupe {
            let mut seen = HashSet::new();
            flagged.retain(|f| seen.insert(f.domain.clone()));
        }

        self.verify_certificates(&flagged).await;
        self.probe_ports(&mut flagged).await;

        let dns_malicious = flagged
            .iter()
            .filter(|f| matches!(f.reputation, Some(Reputation::Malicious)))
            .map(|f| f.domain.clone())
            .collect();

        Ok(RunReport {
            keywords_total: keywords.len(),
            domains_total,
            flagged,
            dns_malicious,
            elapsed: started.elapsed(),
        })
    }

    /// Certificate transparency pass over flagged domains. In doppelganger
    /// mode the detector already checked each hit inline.
    async fn verify_certificates(&self, flagged: &[FlaggedDomain]) {
        if !self.cfg.check_certificates || self.cfg.doppelganger_only {
            return;
        }
        let Some(ct) = self.enrich.as_ref().and_then(|e| e.ct.as_ref()) else {
            return;
        };
        for hit in flagged {
            if ct.has_trusted_certificate(&hit.domain).await {
                info!("{}: certificate from a trusted issuer", hit.domain);
            } else {
                warn!("{}: suspicious certificate issuance", hit.domain);
            }
        }
    }

    async fn probe_ports(&self, flagged: &mut [FlaggedDomain]) {
        let Some(probe) = self.enrich.as_ref().and_then(|e| e.ports.as_ref()) else {
            return;
        };
        for hit in flagged.iter_mut() {
            hit.open_ports = probe.open_ports(&hit.domain).await;
            if hit.open_ports.is_empty() {
                info!("{}: no probed ports open", hit.domain);
            } else {
                info!("{}: open ports {:?}", hit.domain, hit.open_ports);
            }
        }
    }
}
