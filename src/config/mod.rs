use std::{fs, path::Path};

use serde::Deserialize;

use crate::core::error::SquatError;

/// Application settings loaded from an optional TOML file; a missing file
/// means defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_feed_url")]
    pub feed_url: String,
    #[serde(default = "default_backup_feed_url")]
    pub backup_feed_url: String,
    #[serde(default = "default_phishing_feed_url")]
    pub phishing_feed_url: String,
    #[serde(default = "default_ct_log_url")]
    pub ct_log_url: String,
    /// Override for the DNS-over-HTTPS query endpoint; the provider's own
    /// endpoint is used when unset.
    #[serde(default)]
    pub doh_url: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_probe_ports")]
    pub probe_ports: Vec<u16>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            feed_url: default_feed_url(),
            backup_feed_url: default_backup_feed_url(),
            phishing_feed_url: default_phishing_feed_url(),
            ct_log_url: default_ct_log_url(),
            doh_url: None,
            timeout_ms: default_timeout_ms(),
            user_agent: default_user_agent(),
            probe_ports: default_probe_ports(),
        }
    }
}

pub fn load_config(path: Option<&str>) -> Result<AppConfig, SquatError> {
    let default_path = Path::new("config/squatwatch.toml");
    let path = path.map(Path::new).unwrap_or(default_path);

    if !path.exists() {
        return Ok(AppConfig::default());
    }

    let content = fs::read_to_string(path).map_err(|e| SquatError::Config(e.to_string()))?;
    let cfg: AppConfig = toml::from_str(&content).map_err(|e| SquatError::Config(e.to_string()))?;
    Ok(cfg)
}

fn default_feed_url() -> String {
    "https://feeds.opensquat.com/".to_string()
}

fn default_backup_feed_url() -> String {
    "https://feeds-backup.opensquat.com/opensquat-nrd-free.txt".to_string()
}

fn default_phishing_feed_url() -> String {
    "https://raw.githubusercontent.com/mitchellkrogza/Phishing.Database/master/phishing-domains-ACTIVE.txt"
        .to_string()
}

fn default_ct_log_url() -> String {
    "https://crt.sh/".to_string()
}

fn default_timeout_ms() -> u64 {
    5_000
}

fn default_user_agent() -> String {
    format!("squatwatch/{}", env!("CARGO_PKG_VERSION"))
}

fn default_probe_ports() -> Vec<u16> {
    vec![80, 443]
}
