//! Exporter regression tests.
//!
//! Drives the full HTTP surface against scripted devices: registry,
//! orchestrator, assembler and exposition wired the way the daemon does.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use fritz_api::build_router;
use fritz_collector::{DeviceRegistry, ScrapeOrchestrator};
use fritz_core::DeviceDescriptor;
use fritz_tr064::fake::{FakeCaller, FakeConnector};
use http_body_util::BodyExt;
use tower::ServiceExt;

fn scripted_device(serial: &str) -> FakeCaller {
    FakeCaller::new()
        .respond(
            "DeviceInfo:1",
            "GetInfo",
            vec![
                ("NewModelName", "FRITZ!Box 7530"),
                ("NewSoftwareVersion", "164.07.29"),
                ("NewSerialNumber", serial),
                ("NewUpTime", "7200"),
            ],
        )
        .respond(
            "UserInterface:1",
            "GetInfo",
            vec![("NewUpgradeAvailable", "0")],
        )
        .respond(
            "LANEthernetInterfaceConfig:1",
            "GetInfo",
            vec![("NewEnable", "1"), ("NewStatus", "Up")],
        )
        .respond(
            "LANEthernetInterfaceConfig:1",
            "GetStatistics",
            vec![
                ("NewBytesReceived", "4096"),
                ("NewBytesSent", "8192"),
                ("NewPacketsReceived", "32"),
                ("NewPacketsSent", "64"),
            ],
        )
        .respond(
            "WANDSLInterfaceConfig:1",
            "GetInfo",
            vec![
                ("NewEnable", "1"),
                ("NewStatus", "Up"),
                ("NewUpstreamCurrRate", "10000"),
                ("NewDownstreamCurrRate", "50000"),
                ("NewUpstreamMaxRate", "12000"),
                ("NewDownstreamMaxRate", "60000"),
                ("NewUpstreamNoiseMargin", "80"),
                ("NewDownstreamNoiseMargin", "70"),
                ("NewUpstreamAttenuation", "95"),
                ("NewDownstreamAttenuation", "110"),
            ],
        )
        .respond(
            "WANCommonInterfaceConfig",
            "X_AVM-DE_GetOnlineMonitor",
            vec![
                ("Newmax_us", "1250000"),
                ("Newmax_ds", "6250000"),
                ("Newus_current_bps", "2000,1000"),
                ("Newds_current_bps", "9000,3000"),
            ],
        )
        .respond(
            "WANPPPConnection:1",
            "GetStatusInfo",
            vec![
                ("NewConnectionStatus", "Connected"),
                ("NewUptime", "600"),
                ("NewLastConnectionError", "ERROR_NONE"),
            ],
        )
        .respond(
            "WANCommonIFC1",
            "GetAddonInfos",
            vec![
                ("NewX_AVM_DE_TotalBytesReceived64", "123456"),
                ("NewX_AVM_DE_TotalBytesSent64", "654321"),
            ],
        )
        .respond(
            "WANCommonInterfaceConfig:1",
            "GetTotalPacketsReceived",
            vec![("NewTotalPacketsReceived", "900")],
        )
        .respond(
            "WANCommonInterfaceConfig:1",
            "GetTotalPacketsSent",
            vec![("NewTotalPacketsSent", "800")],
        )
        .respond(
            "WANDSLInterfaceConfig1",
            "X_AVM-DE_GetDSLInfo",
            vec![
                ("NewCRCErrors", "0"),
                ("NewFECErrors", "2"),
                ("NewUpstreamPower", "480"),
                ("NewDownstreamPower", "500"),
            ],
        )
}

/// Two reachable devices; `b.fritz` loses its PPP service mid-scrape.
async fn exporter_router() -> axum::Router {
    let healthy = Arc::new(scripted_device("A1"));
    let flaky = Arc::new(scripted_device("B2").fail(
        "WANPPPConnection:1",
        "GetStatusInfo",
        "connection reset",
    ));
    let connector = FakeConnector::new()
        .with_device("a.fritz", healthy)
        .with_device("b.fritz", flaky);

    let devices = vec![
        DeviceDescriptor::new("a.fritz", "monitor", "secret"),
        DeviceDescriptor::new("b.fritz", "monitor", "secret"),
        DeviceDescriptor::new("gone.fritz", "monitor", "secret"),
    ];
    let registry = DeviceRegistry::connect(&devices, &connector).await;
    assert_eq!(registry.len(), 2);

    let orchestrator = ScrapeOrchestrator::new(registry, Duration::from_secs(2));
    build_router(Arc::new(orchestrator))
}

async fn get(router: axum::Router, uri: &str) -> (StatusCode, String, String) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = router.oneshot(req).await.unwrap();
    let status = resp.status();
    let content_type = resp
        .headers()
        .get("content-type")
        .map(|v| v.to_str().unwrap().to_string())
        .unwrap_or_default();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    (status, content_type, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn exporter_metrics_scrape() {
    let router = exporter_router().await;
    let (status, content_type, body) = get(router, "/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.starts_with("text/plain; version=0.0.4"));

    assert!(body.contains("# HELP fritzbox_uptime FritzBox uptime"));
    assert!(body.contains("# TYPE fritzbox_uptime counter"));
    assert!(body.contains(
        "fritzbox_uptime_total{ModelName=\"FRITZ!Box 7530\",SoftwareVersion=\"164.07.29\",Serial=\"A1\"} 7200"
    ));
    assert!(body.contains("fritzbox_update_available{Serial=\"A1\",NewSoftwareVersion=\"n/a\"} 0"));
    assert!(body.contains("fritzbox_ppp_conection_state{Serial=\"A1\",last_error=\"ERROR_NONE\"} 1"));
}

#[tokio::test]
async fn exporter_failed_device_is_absent() {
    let router = exporter_router().await;
    let (status, _, body) = get(router, "/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Serial=\"A1\""));
    // A device that fails any action contributes nothing, not even its uptime.
    assert!(!body.contains("Serial=\"B2\""));
}

#[tokio::test]
async fn exporter_every_family_is_described() {
    let router = exporter_router().await;
    let (_, _, body) = get(router, "/metrics").await;

    let help_lines = body.lines().filter(|l| l.starts_with("# HELP ")).count();
    let type_lines = body.lines().filter(|l| l.starts_with("# TYPE ")).count();
    assert_eq!(help_lines, fritz_collector::FAMILY_COUNT);
    assert_eq!(type_lines, fritz_collector::FAMILY_COUNT);
}

#[tokio::test]
async fn exporter_empty_registry_still_serves() {
    let orchestrator = ScrapeOrchestrator::new(DeviceRegistry::default(), Duration::from_secs(1));
    let router = build_router(Arc::new(orchestrator));
    let (status, _, body) = get(router, "/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("# TYPE fritzbox_dsl_power_downstream gauge"));
    assert!(body.lines().all(|l| l.is_empty() || l.starts_with('#')));
}

#[tokio::test]
async fn exporter_healthz() {
    let router = exporter_router().await;
    let (status, _, body) = get(router, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn exporter_unknown_route() {
    let router = exporter_router().await;
    let (status, _, _) = get(router, "/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
