//! End-to-end checks of the api service against a mock server.

use std::time::Duration;

use httpmock::prelude::*;
use serde_json::json;

use aqms::api::{ApiClient, AqmsService, DECODE_ERROR};
use aqms::domain::{
    ChartInterval, ChartRange, ExportFormat, ExportParams, HistoryFilters, LiveRange, Status,
    StatusFilter,
};
use aqms::settings::{Notifications, SettingsPatch, Theme};

fn service(server: &MockServer) -> AqmsService {
    let client = ApiClient::new(server.base_url(), Duration::from_secs(5)).unwrap();
    AqmsService::new(client)
}

fn reading() -> serde_json::Value {
    json!({
        "sensorId": "aq-01",
        "co2": 712.0,
        "temperature": 24.3,
        "humidity": 48.0,
        "timestamp": "2024-01-15T14:30:00.000Z",
        "status": "warning"
    })
}

// ── plain envelopes ─────────────────────────────────────────────

#[tokio::test]
async fn current_status_unwraps_data() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/aqms/sensors/current");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"success": true, "data": reading(), "message": "ok"}));
        })
        .await;

    let current = service(&server).current_status().await.unwrap();

    mock.assert_async().await;
    assert_eq!(current.co2, 712.0);
    assert_eq!(current.status, Status::Warning);
    assert_eq!(current.sensor_id.as_deref(), Some("aq-01"));
}

#[tokio::test]
async fn stats_with_nested_count_still_unwraps_data() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v1/aqms/history/stats")
                .query_param("startDate", "2024-01-08T00:00:00.000Z")
                .query_param_missing("endDate");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "success": true,
                    "data": {
                        "count": 3,
                        "co2": {"min": 400, "max": 900, "avg": 600},
                        "temperature": {"min": 20, "max": 25, "avg": 22.5},
                        "humidity": {"min": 40, "max": 60, "avg": 50},
                        "statusDistribution": {"safe": 1, "warning": 1, "danger": 1}
                    }
                }));
        })
        .await;

    let stats = service(&server)
        .statistics(Some("2024-01-08T00:00:00.000Z"), None)
        .await
        .unwrap();

    assert_eq!(stats.count, 3);
    assert_eq!(stats.co2.max, 900.0);
    assert_eq!(stats.status_distribution.warning, 1);
}

// ── metadata envelopes ──────────────────────────────────────────

#[tokio::test]
async fn history_keeps_pagination_and_sends_filters() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v1/aqms/history")
                .query_param("status", "danger")
                .query_param("limit", "10")
                .query_param("offset", "20")
                .query_param_missing("startDate")
                .query_param_missing("endDate");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "success": true,
                    "data": [{
                        "id": 41, "sensorId": "aq-01", "co2": 1150, "temperature": 25.1,
                        "humidity": 42, "status": "danger", "timestamp": "2024-01-14T22:00:00Z"
                    }],
                    "total": 57,
                    "limit": 10,
                    "offset": 20
                }));
        })
        .await;

    let filters = HistoryFilters {
        status: Some(StatusFilter::Danger),
        limit: Some(10),
        offset: Some(20),
        ..HistoryFilters::default()
    };
    let page = service(&server).history(&filters).await.unwrap();

    mock.assert_async().await;
    assert_eq!(page.total, 57);
    assert_eq!(page.offset, 20);
    assert_eq!(page.data.len(), 1);
    assert_eq!(page.data[0].status, Status::Danger);
}

#[tokio::test]
async fn sensor_range_returns_range_and_count() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v1/aqms/sensors/range")
                .query_param("range", "8h");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "success": true,
                    "data": [reading(), reading()],
                    "range": "8h",
                    "count": 2
                }));
        })
        .await;

    let data = service(&server).sensor_range(LiveRange::EightHours).await.unwrap();
    assert_eq!(data.range, LiveRange::EightHours);
    assert_eq!(data.count, 2);
    assert_eq!(data.data.len(), 2);
}

#[tokio::test]
async fn chart_omits_interval_when_unset() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v1/aqms/history/chart")
                .query_param("range", "7d")
                .query_param_missing("interval");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "success": true,
                    "data": [{
                        "timestamp": "2024-01-15T00:00:00Z",
                        "co2": 640, "temperature": 23, "humidity": 50, "status": "warning"
                    }],
                    "range": "7d",
                    "interval": "4h"
                }));
        })
        .await;

    let series = service(&server).chart(ChartRange::SevenDays, None).await.unwrap();

    mock.assert_async().await;
    assert_eq!(series.interval, ChartInterval::FourHours);
    assert_eq!(series.data[0].co2, 640.0);
}

// ── failures ────────────────────────────────────────────────────

#[tokio::test]
async fn html_error_page_maps_to_status_text() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/aqms/latest");
            then.status(500)
                .header("content-type", "text/html")
                .body("<html><body>oops</body></html>");
        })
        .await;

    let err = service(&server).latest().await.unwrap_err();

    assert_eq!(err.message, "HTTP 500: Internal Server Error");
    assert_eq!(err.status, Some(500));
    assert_eq!(err.code.as_deref(), Some("HTTP_500"));
    assert!(!err.is_network());
}

#[tokio::test]
async fn json_error_body_supplies_message_and_code() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/aqms/settings");
            then.status(404)
                .header("content-type", "application/json")
                .json_body(json!({"success": false, "message": "No settings", "code": "NOT_FOUND"}));
        })
        .await;

    let err = service(&server).settings().await.unwrap_err();

    assert_eq!(err.message, "No settings");
    assert_eq!(err.status, Some(404));
    assert_eq!(err.code.as_deref(), Some("NOT_FOUND"));
}

#[tokio::test]
async fn non_json_success_reads_as_empty_object() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/aqms/settings");
            then.status(200).header("content-type", "text/plain").body("OK");
        })
        .await;

    // the body becomes `{}`, which carries no settings document
    let settings = service(&server).settings().await.unwrap();
    assert_eq!(settings, None);
}

#[tokio::test]
async fn malformed_json_for_typed_reading_is_a_decode_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/aqms/latest");
            then.status(200)
                .header("content-type", "application/json")
                .body("{\"success\": true, \"data\": ");
        })
        .await;

    let err = service(&server).latest().await.unwrap_err();
    assert_eq!(err.code.as_deref(), Some(DECODE_ERROR));
    assert_eq!(err.status, None);
}

#[tokio::test]
async fn unreachable_host_is_a_network_error() {
    // port 1 is never served in test environments
    let client = ApiClient::new("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();
    let err = AqmsService::new(client).current_status().await.unwrap_err();

    assert!(err.is_network());
    assert_eq!(err.status, None);
}

// ── writes and downloads ────────────────────────────────────────

#[tokio::test]
async fn update_settings_puts_only_present_keys() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/api/v1/aqms/settings")
                .json_body(json!({"notifications": {"enabled": false}}));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "success": true,
                    "data": {
                        "notifications": {"enabled": false},
                        "thresholds": {"warning": 600, "danger": 1000},
                        "theme": "dark"
                    }
                }));
        })
        .await;

    let patch = SettingsPatch::notifications(Notifications { enabled: Some(false), push_enabled: None });
    let echoed = service(&server).update_settings(&patch).await.unwrap().expect("echo");

    mock.assert_async().await;
    assert_eq!(echoed.theme, Theme::Dark);
    assert_eq!(echoed.notifications.enabled, Some(false));
    assert_eq!(echoed.notifications.push_enabled, None);
}

#[tokio::test]
async fn export_returns_raw_bytes() {
    let csv = "timestamp,co2\n2024-01-15T14:30:00Z,712\n";
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v1/aqms/history/export")
                .query_param("format", "csv")
                .query_param("startDate", "2024-01-08T00:00:00.000Z")
                .query_param("endDate", "2024-01-15T00:00:00.000Z");
            then.status(200).header("content-type", "text/csv").body(csv);
        })
        .await;

    let params = ExportParams {
        format: ExportFormat::Csv,
        start_date: "2024-01-08T00:00:00.000Z".into(),
        end_date: "2024-01-15T00:00:00.000Z".into(),
    };
    let bytes = service(&server).export(&params).await.unwrap();
    assert_eq!(bytes, csv.as_bytes());
}

#[tokio::test]
async fn failed_export_names_the_status() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/aqms/history/export");
            then.status(503);
        })
        .await;

    let params = ExportParams {
        format: ExportFormat::Json,
        start_date: "a".into(),
        end_date: "b".into(),
    };
    let err = service(&server).export(&params).await.unwrap_err();
    assert_eq!(err.message, "Failed to download: Service Unavailable");
    assert_eq!(err.status, Some(503));
}
