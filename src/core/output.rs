use std::fs;
use std::path::Path;

use tracing::info;

use crate::core::error::SquatError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Txt,
    Json,
    Csv,
}

/// Persist the flagged domain list. Write failures surface to the caller
/// without touching the in-memory results, so a retry stays possible.
pub fn write_flagged(
    domains: &[String],
    format: OutputFormat,
    path: &Path,
) -> Result<(), SquatError> {
    let rendered = match format {
        OutputFormat::Txt => render_txt(domains),
        OutputFormat::Json => {
            serde_json::to_string(domains).map_err(|err| SquatError::Output(err.to_string()))?
        }
        OutputFormat::Csv => render_csv(domains),
    };
    fs::write(path, rendered).map_err(|err| SquatError::Output(err.to_string()))?;
    info!("file saved: {}", path.display());
    Ok(())
}

fn render_txt(domains: &[String]) -> String {
    let mut out = String::new();
    for domain in domains {
        out.push_str(domain);
        out.push('\n');
    }
    out
}

/// One comma-separated row; fields are quoted only when they need it.
fn render_csv(domains: &[String]) -> String {
    let mut row = domains
        .iter()
        .map(|d| csv_field(d))
        .collect::<Vec<_>>()
        .join(",");
    row.push('\n');
    row
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn txt_is_one_domain_per_line() {
        let domains = vec!["a.com".to_string(), "b.com".to_string()];
        assert_eq!(render_txt(&domains), "a.com\nb.com\n");
    }

    #[test]
    fn csv_is_a_single_row() {
        let domains = vec!["a.com".to_string(), "b.com".to_string()];
        assert_eq!(render_csv(&domains), "a.com,b.com\n");
    }

    #[test]
    fn csv_quotes_awkward_fields() {
        let domains = vec!["a,b.com".to_string()];
        assert_eq!(render_csv(&domains), "\"a,b.com\"\n");
    }
}
