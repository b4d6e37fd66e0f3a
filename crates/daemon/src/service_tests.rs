// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use aires_config::Document;
use wiremock::matchers::{method, path as url_path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_from(text: &str) -> Config {
    Config::bind(&Document::parse(text))
}

#[test]
fn parser_dialect_parses() {
    assert_eq!("csharp".parse::<ParserDialect>().unwrap(), ParserDialect::CSharp);
    assert_eq!("General".parse::<ParserDialect>().unwrap(), ParserDialect::General);
    assert!("fortran".parse::<ParserDialect>().is_err());
}

#[test]
fn gateway_is_single_endpoint_when_balancing_disabled() {
    let config = config_from("[AI_Services]\nOllamaBaseUrl = http://localhost:11434\n");
    let gateway = build_gateway(&config);
    assert_eq!(gateway.snapshot().len(), 1);
}

#[test]
fn gateway_balances_configured_gpu_endpoints() {
    let config = config_from(
        "[AI_Services]\nEnableGpuLoadBalancing = true\n\
         GpuEndpoints = http://gpu0:11434, http://gpu1:11434\n",
    );
    let gateway = build_gateway(&config);

    let snapshot = gateway.snapshot();
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot[0].id.as_str(), "gpu0");
    assert_eq!(snapshot[1].id.as_str(), "gpu1");
}

#[test]
fn alert_bus_respects_channel_toggles() {
    let all = config_from("[Alerting]\nEnabled = true\nConsoleAlerts = true\nFileAlerts = true\n");
    assert_eq!(build_alert_bus(&all).sink_count(), 2);

    let disabled = config_from("[Alerting]\nEnabled = false\n");
    assert_eq!(build_alert_bus(&disabled).sink_count(), 0);

    let file_only = config_from("[Alerting]\nConsoleAlerts = false\nFileAlerts = true\n");
    assert_eq!(build_alert_bus(&file_only).sink_count(), 1);
}

#[test]
fn status_exit_codes() {
    let healthy = HealthReport {
        aggregate: HealthLevel::Healthy,
        statuses: Vec::new(),
    };
    assert_eq!(status_exit_code(&healthy), 0);

    let degraded = HealthReport {
        aggregate: HealthLevel::Degraded,
        statuses: Vec::new(),
    };
    assert_eq!(status_exit_code(&degraded), 0);

    let unhealthy = HealthReport {
        aggregate: HealthLevel::Unhealthy,
        statuses: Vec::new(),
    };
    assert_eq!(status_exit_code(&unhealthy), 3);
}

async fn mount_inference_mocks(server: &MockServer) {
    Mock::given(method("POST"))
        .and(url_path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "response": "analysis text",
            "done": true,
            "total_duration": 1_000_000u64,
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(url_path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "models": [{"name": "mistral"}],
        })))
        .mount(server)
        .await;
}

fn write_service_config(dir: &std::path::Path, base_url: &str) -> std::path::PathBuf {
    let text = format!(
        "[Directories]\n\
         InputDirectory = {0}/input\n\
         OutputDirectory = {0}/output\n\
         TempDirectory = {0}/temp\n\
         AlertDirectory = {0}/alerts\n\
         LogDirectory = {0}/logs\n\
         [AI_Services]\n\
         OllamaBaseUrl = {1}\n\
         OllamaTimeout = 10\n\
         [Pipeline]\n\
         MaxRetries = 1\n\
         RetryDelay = 1\n\
         EnableParallelProcessing = true\n\
         [Watchdog]\n\
         PollingIntervalSeconds = 1\n\
         FileAgeThresholdMinutes = 0\n\
         ProcessingThreads = 2\n\
         [Monitoring]\n\
         MetricsInterval = 1\n",
        dir.display(),
        base_url
    );
    let path = dir.join("aires.ini");
    std::fs::write(&path, text).unwrap();
    path
}

#[tokio::test]
async fn process_single_file_end_to_end() {
    let server = MockServer::start().await;
    mount_inference_mocks(&server).await;
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_service_config(dir.path(), &server.uri());
    let store = ConfigStore::load(&config_path).unwrap();
    std::fs::create_dir_all(dir.path().join("input")).unwrap();

    let input = dir.path().join("input/build-001.txt");
    std::fs::write(&input, "Program.cs(1,2): error CS1503: cannot convert\n").unwrap();

    let saved = process_single_file(store, &input, ParserDialect::CSharp)
        .await
        .unwrap();

    assert_eq!(saved, dir.path().join("output/build-001.md"));
    let text = std::fs::read_to_string(&saved).unwrap();
    assert!(text.contains("## AI Research Summary"));
    assert!(text.contains("- concurrent: true"));
}

#[tokio::test]
async fn run_daemon_processes_inbox_then_shuts_down_cleanly() {
    let server = MockServer::start().await;
    mount_inference_mocks(&server).await;
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_service_config(dir.path(), &server.uri());
    let store = ConfigStore::load(&config_path).unwrap();

    // Seed the inbox before the daemon starts.
    std::fs::create_dir_all(dir.path().join("input")).unwrap();
    std::fs::write(
        dir.path().join("input/build-001.txt"),
        "Program.cs(1,2): error CS1503: cannot convert\n",
    )
    .unwrap();

    let shutdown = CancelSource::new();
    let daemon = {
        let token = shutdown.token();
        tokio::spawn(async move { run_daemon(store, token, DaemonOptions::default()).await })
    };

    let booklet = dir.path().join("output/build-001.md");
    for _ in 0..200 {
        if booklet.exists() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(booklet.exists(), "daemon never produced the booklet");

    shutdown.cancel();
    daemon.await.unwrap().unwrap();

    assert!(dir.path().join("input/processed/build-001.txt").exists());
    assert!(dir.path().join("logs/aires.pid").exists());
}

#[tokio::test]
async fn status_report_reflects_unreachable_inference_server() {
    let dir = tempfile::tempdir().unwrap();
    // Point at a closed port; the service probe must fail.
    let config_path = write_service_config(dir.path(), "http://127.0.0.1:9");
    let store = ConfigStore::load(&config_path).unwrap();

    let report = status_report(store).await;
    assert_eq!(report.aggregate, HealthLevel::Unhealthy);
    assert_eq!(status_exit_code(&report), 3);

    let unhealthy: Vec<_> = report
        .statuses
        .iter()
        .filter(|s| s.level == HealthLevel::Unhealthy)
        .collect();
    assert_eq!(unhealthy.len(), 1);
    assert_eq!(unhealthy[0].component, "llm-service");
}
