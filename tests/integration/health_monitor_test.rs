// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use statuswatch::engines::health_monitor::{
    HealthCheckConfig, PortalHealth, PortalHealthMonitor,
};
use statuswatch::engines::traits::EngineError;
use std::time::Duration;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_healthy_portal_passes_preflight() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let monitor = PortalHealthMonitor::new(server.uri());
    let info = monitor.preflight().await.unwrap();

    assert_eq!(info.health, PortalHealth::Healthy);
    assert_eq!(info.consecutive_failures, 0);
    assert!(info.response_time_ms.is_some());
}

#[tokio::test]
async fn test_server_error_fails_preflight() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let monitor = PortalHealthMonitor::new(server.uri());
    let err = monitor.preflight().await.unwrap_err();

    assert!(matches!(err, EngineError::Unavailable(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_unreachable_portal_counts_consecutive_failures() {
    // 占用后立即释放的端口，连接必然被拒绝
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/", listener.local_addr().unwrap());
    drop(listener);

    let config = HealthCheckConfig {
        timeout: Duration::from_secs(2),
        ..Default::default()
    };
    let monitor = PortalHealthMonitor::new_with_config(url, config);

    let first = monitor.check_now().await;
    assert_eq!(first.health, PortalHealth::Unhealthy);
    assert_eq!(first.consecutive_failures, 1);

    let second = monitor.check_now().await;
    assert_eq!(second.consecutive_failures, 2);
    assert!(second.error_message.is_some());

    let latest = monitor.latest().await.unwrap();
    assert_eq!(latest.consecutive_failures, 2);
}

#[tokio::test]
async fn test_slow_portal_is_degraded_but_reachable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(50)))
        .mount(&server)
        .await;

    // 阈值压到0毫秒，任何真实响应都会被判为降级
    let config = HealthCheckConfig {
        degraded_threshold_ms: 0,
        ..Default::default()
    };
    let monitor = PortalHealthMonitor::new_with_config(server.uri(), config);

    let info = monitor.preflight().await.unwrap();
    assert_eq!(info.health, PortalHealth::Degraded);
}
