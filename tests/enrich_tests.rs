use std::sync::Arc;

use httpmock::prelude::*;

use squatwatch::core::engine::Engine;
use squatwatch::core::types::{DomainRecord, RunConfig, Verdict};
use squatwatch::enrich::{
    ct::CtChecker,
    dns::{DohProvider, DohReputation},
    Enrichment, Reputation,
};
use squatwatch::sources::feed::{sha256_file, FeedFetcher, FeedPeriod};
use squatwatch::sources::phishing::PhishingSweep;

fn ct_checker(server: &MockServer) -> CtChecker {
    CtChecker::new(format!("{}/", server.base_url()), 2_000, "sw-test").expect("ct checker")
}

#[tokio::test]
async fn ct_trusts_certificates_from_regular_issuers() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET)
            .path("/")
            .query_param("q", "paypal-login.com");
        then.status(200).json_body(serde_json::json!([
            {"name_value": "paypal-login.com", "issuer_name": "C=US, O=DigiCert Inc"}
        ]));
    });

    assert!(
        ct_checker(&server)
            .has_trusted_certificate("paypal-login.com")
            .await
    );
}

#[tokio::test]
async fn ct_distrusts_flagged_issuers_and_empty_logs() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/").query_param("q", "bad.com");
        then.status(200).json_body(serde_json::json!([
            {"name_value": "bad.com", "issuer_name": "Let's Encrypt Authority X3"}
        ]));
    });
    server.mock(|when, then| {
        when.method(GET).path("/").query_param("q", "unlogged.com");
        then.status(200).json_body(serde_json::json!([]));
    });

    let checker = ct_checker(&server);
    assert!(!checker.has_trusted_certificate("bad.com").await);
    assert!(!checker.has_trusted_certificate("unlogged.com").await);
}

#[tokio::test]
async fn ct_fails_open_when_the_log_server_is_down() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/");
        then.status(503);
    });

    assert!(ct_checker(&server).has_trusted_certificate("any.com").await);
}

#[tokio::test]
async fn doppelganger_hits_record_certificate_state_but_flag_either_way() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/");
        then.status(200).json_body(serde_json::json!([]));
    });

    let enrichment = Arc::new(Enrichment {
        dns: None,
        ct: Some(ct_checker(&server)),
        ports: None,
    });
    let cfg = RunConfig {
        doppelganger_only: true,
        ..RunConfig::default()
    };
    let engine = Engine::new(cfg, Some(enrichment));
    let report = engine
        .run(
            &["facebook".to_string()],
            vec![DomainRecord::new("facebook-login.com")],
        )
        .await
        .expect("scan");

    assert_eq!(report.flagged_lines(), vec!["facebook-login.com"]);
    assert_eq!(
        report.flagged[0].verdict,
        Verdict::Doppelganger {
            certificate_trusted: Some(false)
        }
    );
}

fn doh_client(server: &MockServer) -> DohReputation {
    DohReputation::new(
        DohProvider::Quad9,
        Some(server.url("/dns-query")),
        2_000,
        "sw-test",
    )
    .expect("doh client")
}

#[tokio::test]
async fn doh_maps_blocked_and_resolved_domains() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET)
            .path("/dns-query")
            .query_param("name", "blocked.com");
        then.status(200)
            .json_body(serde_json::json!({"Status": 3, "RA": false}));
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/dns-query")
            .query_param("name", "fine.com");
        then.status(200).json_body(serde_json::json!({
            "Status": 0, "RA": true,
            "Answer": [{"name": "fine.com", "data": "93.184.216.34"}]
        }));
    });

    let doh = doh_client(&server);
    assert_eq!(doh.classify("blocked.com").await, Reputation::Malicious);
    assert_eq!(doh.classify("fine.com").await, Reputation::NonMalicious);
}

#[tokio::test]
async fn doh_degrades_to_unknown_on_server_errors() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/dns-query");
        then.status(502);
    });

    let doh = doh_client(&server);
    assert!(matches!(
        doh.classify("whatever.com").await,
        Reputation::Unknown(_)
    ));
}

#[tokio::test]
async fn malicious_reputation_is_collected_without_suppressing_the_flag() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/dns-query");
        then.status(200)
            .json_body(serde_json::json!({"Status": 3, "RA": false}));
    });

    let enrichment = Arc::new(Enrichment {
        dns: Some(doh_client(&server)),
        ct: None,
        ports: None,
    });
    let cfg = RunConfig {
        dns_validation: true,
        ..RunConfig::default()
    };
    let engine = Engine::new(cfg, Some(enrichment));
    let report = engine
        .run(
            &["netflix".to_string()],
            vec![
                DomainRecord::new("netflix-support.com"),
                DomainRecord::new("bing.com"),
            ],
        )
        .await
        .expect("scan");

    assert_eq!(report.flagged_lines(), vec!["netflix-support.com"]);
    assert_eq!(report.dns_malicious, vec!["netflix-support.com"]);
    assert_eq!(report.flagged[0].reputation, Some(Reputation::Malicious));
}

fn scratch_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("squatwatch-feed-{}-{}", std::process::id(), name))
}

#[tokio::test]
async fn feed_is_not_downloaded_when_checksum_matches() {
    let server = MockServer::start();
    let target = scratch_path("current.txt");
    std::fs::write(&target, "fresh.com\n").expect("seed feed");
    let local_checksum = sha256_file(&target).expect("digest");

    server.mock(|when, then| {
        when.method(GET).path("/domain-names-week.txt.sha256");
        then.status(200).body(&local_checksum);
    });

    let fetcher = FeedFetcher::new(
        format!("{}/", server.base_url()),
        server.url("/backup.txt"),
        "sw-test",
        2_000,
        FeedPeriod::Week,
    )
    .expect("fetcher");

    let downloaded = fetcher.ensure_fresh(&target).await.expect("ensure");
    assert!(!downloaded);
    std::fs::remove_file(target).ok();
}

#[tokio::test]
async fn stale_feed_is_downloaded_and_replaced() {
    let server = MockServer::start();
    let target = scratch_path("stale.txt");
    std::fs::write(&target, "old-feed.com\n").expect("seed feed");

    server.mock(|when, then| {
        when.method(GET).path("/domain-names-week.txt.sha256");
        then.status(200).body("0000");
    });
    server.mock(|when, then| {
        when.method(GET).path("/domain-names-week.txt");
        then.status(200).body("brand-new.com\n");
    });

    let fetcher = FeedFetcher::new(
        format!("{}/", server.base_url()),
        server.url("/backup.txt"),
        "sw-test",
        2_000,
        FeedPeriod::Week,
    )
    .expect("fetcher");

    let downloaded = fetcher.ensure_fresh(&target).await.expect("ensure");
    assert!(downloaded);
    let content = std::fs::read_to_string(&target).expect("read feed");
    assert_eq!(content, "brand-new.com\n");
    std::fs::remove_file(target).ok();
}

#[tokio::test]
async fn primary_miss_falls_back_to_the_backup_url() {
    let server = MockServer::start();
    let target = scratch_path("backup.txt");

    server.mock(|when, then| {
        when.method(GET).path("/domain-names-week.txt");
        then.status(404);
    });
    server.mock(|when, then| {
        when.method(GET).path("/backup.txt");
        then.status(200).body("backup-feed.com\n");
    });

    let fetcher = FeedFetcher::new(
        format!("{}/", server.base_url()),
        server.url("/backup.txt"),
        "sw-test",
        2_000,
        FeedPeriod::Week,
    )
    .expect("fetcher");

    let downloaded = fetcher.ensure_fresh(&target).await.expect("ensure");
    assert!(downloaded);
    let content = std::fs::read_to_string(&target).expect("read feed");
    assert_eq!(content, "backup-feed.com\n");
    std::fs::remove_file(target).ok();
}

#[tokio::test]
async fn empty_feed_payload_is_a_fatal_download_error() {
    let server = MockServer::start();
    let target = scratch_path("empty.txt");

    server.mock(|when, then| {
        when.method(GET).path("/domain-names-week.txt");
        then.status(200).body("");
    });

    let fetcher = FeedFetcher::new(
        format!("{}/", server.base_url()),
        server.url("/backup.txt"),
        "sw-test",
        2_000,
        FeedPeriod::Week,
    )
    .expect("fetcher");

    assert!(fetcher.ensure_fresh(&target).await.is_err());
    assert!(!target.exists());
}

#[tokio::test]
async fn phishing_sweep_reports_keyword_hits_in_keyword_order() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/phishing.txt");
        then.status(200)
            .body("login-paypal.example\nnetflix-billing.example\nrandom.example\n");
    });

    let sweep = PhishingSweep::new(server.url("/phishing.txt"), "sw-test", 2_000).expect("sweep");
    let hits = sweep
        .run(&["netflix".to_string(), "paypal".to_string()])
        .await
        .expect("sweep run");

    assert_eq!(hits, vec!["netflix-billing.example", "login-paypal.example"]);
}
