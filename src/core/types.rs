use tracing::warn;

use crate::enrich::Reputation;

/// Similarity method used for scoring keyword/label pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Levenshtein,
    JaroWinkler,
}

impl Method {
    /// Parse a configured method name. Unrecognized names degrade to
    /// Levenshtein with a warning instead of failing the run.
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "levenshtein" => Method::Levenshtein,
            "jarowinkler" | "jaro-winkler" => Method::JaroWinkler,
            other => {
                warn!("no such method: {}, levenshtein will be used", other);
                Method::Levenshtein
            }
        }
    }
}

/// Match confidence, ordered strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Confidence {
    VeryHigh,
    High,
    Medium,
    Low,
    VeryLow,
}

impl Confidence {
    /// In Levenshtein mode the edit distance is the tier.
    pub fn from_distance(distance: usize) -> Self {
        match distance {
            0 => Confidence::VeryHigh,
            1 => Confidence::High,
            2 => Confidence::Medium,
            3 => Confidence::Low,
            _ => Confidence::VeryLow,
        }
    }

    /// Label used when the tier came from an edit distance.
    pub fn label(&self) -> &'static str {
        match self {
            Confidence::VeryHigh => "very high confidence",
            Confidence::High => "high confidence",
            Confidence::Medium => "medium confidence",
            Confidence::Low => "low confidence",
            Confidence::VeryLow => "very low confidence",
        }
    }

    /// Label used when the tier came from a similarity score.
    pub fn score_label(&self) -> &'static str {
        match self {
            Confidence::VeryHigh => "Very high",
            Confidence::High => "High",
            Confidence::Medium => "Medium",
            Confidence::Low => "Low",
            Confidence::VeryLow => "Very low",
        }
    }
}

/// Ascending Jaro-Winkler thresholds and the tier each one maps to.
/// "Low" is a floor that never triggers a match on its own.
pub const JARO_WINKLER_TIERS: &[(f64, Confidence)] = &[
    (0.80, Confidence::Low),
    (0.89, Confidence::Medium),
    (0.949, Confidence::High),
    (0.95, Confidence::VeryHigh),
];

/// Locate a score in the threshold table with lower-bound insertion
/// semantics; scores past the top threshold clamp to the top tier.
pub fn jaro_winkler_tier(score: f64) -> Confidence {
    let idx = JARO_WINKLER_TIERS.partition_point(|(threshold, _)| *threshold < score);
    let idx = idx.min(JARO_WINKLER_TIERS.len() - 1);
    JARO_WINKLER_TIERS[idx].1
}

/// One line from the domain corpus and its derived comparison label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainRecord {
    /// The full line as it appeared in the feed.
    pub original: String,
    /// Text before the first dot, lower-cased.
    pub label: String,
}

impl DomainRecord {
    pub fn new(line: &str) -> Self {
        let original = line.trim_end_matches(['\r', '\n']).to_string();
        let label = original
            .split('.')
            .next()
            .unwrap_or_default()
            .to_lowercase();
        Self { original, label }
    }
}

/// The score behind a similarity verdict.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Distance(usize),
    Score(f64),
}

/// Outcome of comparing one keyword against one domain record.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    NoMatch,
    Similarity {
        metric: MetricValue,
        tier: Confidence,
    },
    Homograph {
        metric: MetricValue,
        tier: Confidence,
    },
    Substring,
    Doppelganger {
        /// None when no certificate-transparency check ran.
        certificate_trusted: Option<bool>,
    },
}

impl Verdict {
    /// Matches that count as detections for reputation enrichment.
    pub fn triggers_reputation(&self) -> bool {
        matches!(
            self,
            Verdict::Similarity { .. } | Verdict::Homograph { .. } | Verdict::Substring
        )
    }
}

/// A domain that matched a keyword under at least one rule.
#[derive(Debug, Clone, PartialEq)]
pub struct FlaggedDomain {
    pub keyword: String,
    /// The original feed line, untouched.
    pub domain: String,
    pub verdict: Verdict,
    pub reputation: Option<Reputation>,
    pub open_ports: Vec<u16>,
}

/// Per-run scanning configuration; read-only once the scan starts.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub method: Method,
    /// Maximum triggering edit distance in Levenshtein mode, 0..=4.
    pub confidence_level: usize,
    pub doppelganger_only: bool,
    /// Query domain reputation for every triggering verdict (informational).
    pub dns_validation: bool,
    /// Restrict the saved output to reputation-flagged domains.
    pub filter_by_reputation: bool,
    /// Verify flagged domains against certificate transparency logs.
    pub check_certificates: bool,
    /// Drop duplicate domains flagged by multiple keywords.
    pub dedupe: bool,
    pub parallel: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            method: Method::Levenshtein,
            confidence_level: 2,
            doppelganger_only: false,
            dns_validation: false,
            filter_by_reputation: false,
            check_certificates: false,
            dedupe: false,
            parallel: true,
        }
    }
}
