//! 端到端探测测试
//!
//! 使用真实的 HTTP/TCP/DNS 策略探测本地回环上的端点

use pinger::config::{ConfigLoader, TomlConfigLoader};
use pinger::health::{BatchRunner, ProbeStatus, RunSettings};
use pinger::output::{render_json, JsonReport};
use pinger::{CheckType, Target};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// 绑定后立即释放的端口，连接会被拒绝
async fn closed_port() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);
    addr
}

/// 只接受连接、从不响应的HTTP端点
async fn silent_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("http://{addr}/")
}

#[tokio::test]
async fn test_mixed_batch_against_loopback() {
    let mut server = mockito::Server::new_async().await;
    let _ok = server
        .mock("GET", "/ok")
        .with_status(200)
        .create_async()
        .await;
    let _down = server
        .mock("GET", "/down")
        .with_status(503)
        .create_async()
        .await;

    let open = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let open_addr = open.local_addr().unwrap().to_string();
    let timeout = Duration::from_secs(5);

    let targets = vec![
        Target::new("http-ok", format!("{}/ok", server.url()), CheckType::Http, timeout),
        Target::new("http-down", format!("{}/down", server.url()), CheckType::Http, timeout),
        Target::new("tcp-open", open_addr, CheckType::Tcp, timeout),
        Target::new("tcp-closed", closed_port().await, CheckType::Tcp, timeout),
        Target::new("dns-localhost", "localhost", CheckType::Dns, timeout),
    ];

    let runner = BatchRunner::new().unwrap();
    let report = runner.run(&targets, &RunSettings::new(3)).await.unwrap();

    assert_eq!(report.results.len(), targets.len());
    assert!(report.unresolved.is_empty());

    let by_name: HashMap<&str, ProbeStatus> = report
        .results
        .iter()
        .map(|r| (r.name.as_str(), r.status))
        .collect();
    assert_eq!(by_name["http-ok"], ProbeStatus::Healthy);
    assert_eq!(by_name["http-down"], ProbeStatus::Unhealthy);
    assert_eq!(by_name["tcp-open"], ProbeStatus::Healthy);
    assert_eq!(by_name["tcp-closed"], ProbeStatus::Unhealthy);
    assert_eq!(by_name["dns-localhost"], ProbeStatus::Healthy);

    let summary = report.summary();
    assert_eq!(summary.total, 5);
    assert_eq!(summary.healthy, 3);
    assert_eq!(summary.unhealthy, 2);
    assert!(!report.all_healthy());
}

#[tokio::test]
async fn test_slow_endpoint_times_out_without_blocking_others() {
    let mut server = mockito::Server::new_async().await;
    let _ok = server
        .mock("GET", "/")
        .with_status(200)
        .create_async()
        .await;

    let targets = vec![
        Target::http(silent_endpoint().await, Duration::from_millis(300)),
        Target::http(format!("{}/", server.url()), Duration::from_secs(5)),
    ];

    let start = Instant::now();
    let report = BatchRunner::new()
        .unwrap()
        .run(&targets, &RunSettings::new(2))
        .await
        .unwrap()
        .into_submission_order();

    assert!(start.elapsed() < Duration::from_secs(3));
    assert_eq!(report.results[0].status, ProbeStatus::Timeout);
    assert_eq!(report.results[0].error.as_deref(), Some("request timed out"));
    assert!(report.results[0].latency >= Duration::from_millis(300));
    assert_eq!(report.results[1].status, ProbeStatus::Healthy);
}

#[tokio::test]
async fn test_many_silent_endpoints_report_request_timeout() {
    let silent = silent_endpoint().await;
    let targets: Vec<Target> = (0..400)
        .map(|i| {
            Target::new(
                format!("silent-{i}"),
                silent.clone(),
                CheckType::Http,
                Duration::from_millis(50),
            )
        })
        .collect();

    let report = BatchRunner::new()
        .unwrap()
        .run(&targets, &RunSettings::new(100))
        .await
        .unwrap();

    assert_eq!(report.results.len(), 400);
    for result in &report.results {
        assert_eq!(result.status, ProbeStatus::Timeout);
        assert_eq!(result.error.as_deref(), Some("request timed out"));
    }
}

#[tokio::test]
async fn test_url_without_scheme_is_an_error_row() {
    let targets = vec![Target::http("example.com", Duration::from_secs(1))];

    let report = BatchRunner::new()
        .unwrap()
        .run(&targets, &RunSettings::default())
        .await
        .unwrap();

    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].status, ProbeStatus::Error);
    assert!(report.results[0].error.is_some());
}

#[tokio::test]
async fn test_interrupted_run_lists_unresolved_targets() {
    let silent = silent_endpoint().await;
    let targets: Vec<Target> = (0..4)
        .map(|i| {
            Target::new(
                format!("silent-{i}"),
                silent.clone(),
                CheckType::Http,
                Duration::from_secs(30),
            )
        })
        .collect();

    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let start = Instant::now();
    let report = BatchRunner::new()
        .unwrap()
        .run_until_cancelled(&targets, &RunSettings::new(2), token)
        .await
        .unwrap();

    assert!(start.elapsed() < Duration::from_secs(5));
    assert!(report.results.is_empty());
    assert_eq!(report.unresolved.len(), 4);

    let mut buf = Vec::new();
    render_json(&JsonReport::new(&report), &mut buf).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
    assert_eq!(value["summary"]["total"], 0);
    assert_eq!(value["unresolved"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_config_file_drives_a_run() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/status")
        .match_header("x-probe", "pinger")
        .match_header("authorization", "Bearer local")
        .with_status(204)
        .create_async()
        .await;

    let content = format!(
        r#"
[global]
concurrency = 2
timeout_seconds = 2

[global.headers]
"X-Probe" = "pinger"

[[targets]]
name = "status"
url = "{}/status"
expected_status = 204

[targets.headers]
Authorization = "Bearer local"

[[targets]]
name = "resolver"
url = "127.0.0.1"
type = "dns"
"#,
        server.url()
    );

    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("pinger.toml");
    std::fs::write(&path, content).unwrap();

    let config = TomlConfigLoader::new(true)
        .load_from_file(&path)
        .await
        .unwrap();
    let targets = config.targets();
    let report = BatchRunner::new()
        .unwrap()
        .run(&targets, &RunSettings::new(config.global.concurrency))
        .await
        .unwrap();

    mock.assert_async().await;
    assert!(report.all_healthy());
    assert_eq!(report.results.len(), 2);
}
