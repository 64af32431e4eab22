use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::{env, fs};

use anyhow::anyhow;
use clap::{Parser, ValueEnum};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use squatwatch::{
    config::{load_config, AppConfig},
    core::{
        engine::{Engine, RunReport},
        output::{write_flagged, OutputFormat},
        types::{Method, RunConfig},
    },
    enrich::{
        ct::CtChecker,
        dns::{DohProvider, DohReputation},
        ports::PortProbe,
        Enrichment,
    },
    sources::{
        feed::{FeedFetcher, FeedPeriod},
        load_domains, load_keywords,
        phishing::PhishingSweep,
    },
};

#[derive(Parser, Debug)]
#[command(
    name = "squatwatch",
    about = "Domain squatting detection over newly registered domain feeds"
)]
struct Cli {
    /// Keywords file, one brand term per line
    #[arg(short, long, default_value = "keywords.txt")]
    keywords: String,
    /// Local domains file; the feed is downloaded when omitted
    #[arg(short, long)]
    domains: Option<String>,
    /// Output file for flagged domains
    #[arg(short, long, default_value = "flagged.json")]
    output: String,
    /// Output file format
    #[arg(short = 't', long = "format", default_value = "json", value_enum)]
    format: FormatArg,
    /// Similarity method (levenshtein or jarowinkler)
    #[arg(short, long, default_value = "levenshtein")]
    method: String,
    /// Triggering edit distance in Levenshtein mode (0 strictest .. 4 loosest)
    #[arg(short, long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(0..=4))]
    confidence: u8,
    /// Feed period when downloading
    #[arg(short, long, default_value = "week", value_enum)]
    period: PeriodArg,
    /// Only flag doppelganger domains (keyword embedded verbatim)
    #[arg(long)]
    doppelganger: bool,
    /// Check flagged domains against a DNS reputation provider (quad9, cloudflare)
    #[arg(long)]
    dns: Option<String>,
    /// Save only domains the DNS provider flags as malicious
    #[arg(long)]
    filter_reputation: bool,
    /// Check flagged domains against certificate transparency logs
    #[arg(long)]
    ct: bool,
    /// Probe flagged domains for open ports
    #[arg(short = 'x', long)]
    openport: bool,
    /// Also sweep the active-phishing feed for keyword hits
    #[arg(long)]
    phishing: bool,
    /// Drop duplicate domains flagged by multiple keywords
    #[arg(long)]
    dedupe: bool,
    /// Scan keywords one at a time instead of in parallel
    #[arg(long)]
    sequential: bool,
    /// Path to config file (TOML). Default: config/squatwatch.toml
    #[arg(long)]
    config: Option<String>,
    /// Increase verbosity (info, debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Optional log file path
    #[arg(long, default_value = "data/squatwatch.log")]
    log_file: String,
}

#[derive(ValueEnum, Clone, Debug)]
enum FormatArg {
    Txt,
    Json,
    Csv,
}

impl From<FormatArg> for OutputFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Txt => OutputFormat::Txt,
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Csv => OutputFormat::Csv,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PeriodArg {
    Day,
    Week,
    Month,
}

impl From<PeriodArg> for FeedPeriod {
    fn from(value: PeriodArg) -> Self {
        match value {
            PeriodArg::Day => FeedPeriod::Day,
            PeriodArg::Week => FeedPeriod::Week,
            PeriodArg::Month => FeedPeriod::Month,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli)?;

    let cfg = load_config(cli.config.as_deref())?;

    let run_cfg = RunConfig {
        method: Method::parse(&cli.method),
        confidence_level: cli.confidence as usize,
        doppelganger_only: cli.doppelganger,
        dns_validation: cli.dns.is_some(),
        filter_by_reputation: cli.filter_reputation,
        check_certificates: cli.ct,
        dedupe: cli.dedupe,
        parallel: !cli.sequential,
    };

    let domains_path = resolve_domains_file(&cli, &cfg).await?;
    let keywords = load_keywords(Path::new(&cli.keywords))?;
    let corpus = load_domains(&domains_path)?;

    tracing::info!("keywords: {} ({} total)", cli.keywords, keywords.len());
    tracing::info!(
        "domains: {} ({} total)",
        domains_path.display(),
        corpus.len()
    );

    let enrichment = build_enrichment(&cli, &cfg)?;
    let engine = Engine::new(run_cfg.clone(), enrichment);
    let report = engine.run(&keywords, corpus).await?;

    let mut saved = if run_cfg.filter_by_reputation {
        report.dns_malicious.clone()
    } else {
        report.flagged_lines()
    };

    if cli.phishing {
        let sweep = PhishingSweep::new(
            cfg.phishing_feed_url.clone(),
            &cfg.user_agent,
            cfg.timeout_ms,
        )?;
        match sweep.run(&keywords).await {
            Ok(hits) => {
                tracing::info!("phishing feed matches: {}", hits.len());
                saved.extend(hits);
            }
            Err(err) => tracing::warn!("phishing sweep failed: {}", err),
        }
    }

    write_flagged(&saved, cli.format.into(), Path::new(&cli.output))?;
    print_summary(&report, saved.len());
    Ok(())
}

async fn resolve_domains_file(cli: &Cli, cfg: &AppConfig) -> anyhow::Result<PathBuf> {
    if let Some(path) = &cli.domains {
        return Ok(PathBuf::from(path));
    }
    let period: FeedPeriod = cli.period.into();
    let fetcher = FeedFetcher::new(
        cfg.feed_url.clone(),
        cfg.backup_feed_url.clone(),
        &cfg.user_agent,
        cfg.timeout_ms,
        period,
    )?;
    let target = env::temp_dir().join(period.file_name());
    fetcher.ensure_fresh(&target).await?;
    Ok(target)
}

fn build_enrichment(cli: &Cli, cfg: &AppConfig) -> anyhow::Result<Option<Arc<Enrichment>>> {
    let wants_ct = cli.ct || cli.doppelganger;
    if cli.dns.is_none() && !wants_ct && !cli.openport {
        return Ok(None);
    }

    let dns = match &cli.dns {
        Some(name) => {
            let provider = DohProvider::parse(name)
                .ok_or_else(|| anyhow!("unknown dns provider: {}", name))?;
            Some(DohReputation::new(
                provider,
                cfg.doh_url.clone(),
                cfg.timeout_ms,
                &cfg.user_agent,
            )?)
        }
        None => None,
    };
    let ct = if wants_ct {
        Some(CtChecker::new(
            cfg.ct_log_url.clone(),
            cfg.timeout_ms,
            &cfg.user_agent,
        )?)
    } else {
        None
    };
    let ports = cli.openport.then(|| PortProbe::new(cfg.probe_ports.clone()));

    Ok(Some(Arc::new(Enrichment { dns, ct, ports })))
}

fn print_summary(report: &RunReport, saved: usize) {
    tracing::info!("keywords total: {}", report.keywords_total);
    tracing::info!("domains total: {}", report.domains_total);
    tracing::info!("domains flagged: {}", saved);
    tracing::info!("running time: {:.2} seconds", report.elapsed.as_secs_f64());
}

fn init_tracing(cli: &Cli) -> anyhow::Result<()> {
    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let log_path = Path::new(&cli.log_file);
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)?;
    }
    if log_path.exists() {
        if let Ok(meta) = fs::metadata(log_path) {
            if meta.len() > 1_000_000 {
                let rotated = log_path.with_extension("log.1");
                let _ = fs::rename(log_path, rotated);
            }
        }
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;

    let file_layer = fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_target(false);

    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .try_init()
        .map_err(|e| anyhow!("tracing init failed: {}", e))
}
