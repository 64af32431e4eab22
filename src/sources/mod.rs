pub mod feed;
pub mod phishing;

use std::fs;
use std::path::Path;

use crate::core::error::SquatError;
use crate::core::types::DomainRecord;

/// Load the keyword list in file order: lower-cased, trimmed, comment and
/// blank lines excluded.
pub fn load_keywords(path: &Path) -> Result<Vec<String>, SquatError> {
    let data =
        fs::read_to_string(path).map_err(|_| SquatError::InputNotFound(path.to_path_buf()))?;
    let mut keywords = Vec::new();
    for line in data.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        keywords.push(line.to_lowercase());
    }
    Ok(keywords)
}

/// Load the domain corpus in file order, one record per non-blank line.
pub fn load_domains(path: &Path) -> Result<Vec<DomainRecord>, SquatError> {
    let data =
        fs::read_to_string(path).map_err(|_| SquatError::InputNotFound(path.to_path_buf()))?;
    Ok(data
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(DomainRecord::new)
        .collect())
}
