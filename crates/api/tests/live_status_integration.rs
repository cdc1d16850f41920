//! Integration tests for live application status reporting.

mod common;

use axum::http::{Method, StatusCode};
use axum::Router;
use chrono::Duration;
use common::{default_app, get_request, json_request, parse_response_body, unique_mac};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn send(router: &Router, request: axum::http::Request<axum::body::Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, parse_response_body(response).await)
}

async fn registered_uuid(router: &Router) -> String {
    let (_, body) = send(
        router,
        json_request(
            Method::POST,
            "/api/v1/devices/register",
            json!({ "macAddress": unique_mac(), "machineName": "LAB-12" }),
        ),
    )
    .await;
    body["deviceUuid"].as_str().unwrap().to_string()
}

async fn report(router: &Router, body: Value) -> (StatusCode, Value) {
    send(router, json_request(Method::POST, "/api/v1/live-status", body)).await
}

fn app_names(body: &Value) -> Vec<String> {
    let mut names: Vec<String> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["appName"].as_str().unwrap().to_string())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_snapshot_replaces_running_set() {
    let app = default_app();
    let uuid = registered_uuid(&app.router).await;

    let (status, body) = report(
        &app.router,
        json!({
            "deviceUuid": uuid,
            "apps": [
                { "appName": "chrome", "windowTitle": "Inbox" },
                { "appName": "notepad" }
            ]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app_names(&body), vec!["chrome", "notepad"]);

    report(
        &app.router,
        json!({ "deviceUuid": uuid, "apps": [{ "appName": "notepad", "windowTitle": "todo.txt" }] }),
    )
    .await;

    let (status, body) = send(
        &app.router,
        get_request(&format!("/api/v1/live-status?deviceUuid={}", uuid)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app_names(&body), vec!["notepad"]);
    assert_eq!(body[0]["windowTitle"], "todo.txt");
}

#[tokio::test]
async fn test_empty_snapshot_stops_everything() {
    let app = default_app();
    let uuid = registered_uuid(&app.router).await;

    report(&app.router, json!({ "deviceUuid": uuid, "apps": [{ "appName": "chrome" }] })).await;
    let (status, body) = report(&app.router, json!({ "deviceUuid": uuid, "apps": [] })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (_, body) = send(
        &app.router,
        get_request(&format!("/api/v1/live-status?deviceUuid={}", uuid)),
    )
    .await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_stale_seconds_filters_old_sightings() {
    let app = default_app();
    let uuid = registered_uuid(&app.router).await;

    report(&app.router, json!({ "deviceUuid": uuid, "apps": [{ "appName": "chrome" }] })).await;
    app.clock.advance(Duration::seconds(120));

    let (_, body) = send(
        &app.router,
        get_request(&format!("/api/v1/live-status?deviceUuid={}&staleSeconds=60", uuid)),
    )
    .await;
    assert_eq!(body, json!([]));

    let (_, body) = send(
        &app.router,
        get_request(&format!("/api/v1/live-status?deviceUuid={}&staleSeconds=300", uuid)),
    )
    .await;
    assert_eq!(app_names(&body), vec!["chrome"]);

    let (_, body) = send(
        &app.router,
        get_request(&format!("/api/v1/live-status?deviceUuid={}&staleSeconds=0", uuid)),
    )
    .await;
    assert_eq!(app_names(&body), vec!["chrome"]);
}

#[tokio::test]
async fn test_report_resolves_by_machine_name() {
    let app = default_app();
    registered_uuid(&app.router).await;

    let (status, body) = report(
        &app.router,
        json!({ "machineName": "LAB-12", "apps": [{ "appName": "excel" }] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app_names(&body), vec!["excel"]);
}

#[tokio::test]
async fn test_report_rejections() {
    let app = default_app();
    let uuid = registered_uuid(&app.router).await;

    let (status, body) = report(
        &app.router,
        json!({ "deviceUuid": "never-registered", "apps": [] }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "device_not_found");

    let (status, _) = report(&app.router, json!({ "apps": [] })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = report(
        &app.router,
        json!({ "deviceUuid": uuid, "apps": [{ "appName": "  " }] }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_query_for_unknown_device_is_empty() {
    let app = default_app();

    let (status, body) = send(
        &app.router,
        get_request("/api/v1/live-status?deviceUuid=never-registered"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, body) = send(&app.router, get_request("/api/v1/live-status")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, _) = send(&app.router, get_request("/api/v1/live-status?deviceId=-4")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_extreme_stale_seconds_returns_everything_running() {
    let app = default_app();
    let uuid = registered_uuid(&app.router).await;

    report(&app.router, json!({ "deviceUuid": uuid, "apps": [{ "appName": "chrome" }] })).await;
    app.clock.advance(Duration::days(365));

    for stale in ["9223372036854775807", "10000000000000"] {
        let (status, body) = send(
            &app.router,
            get_request(&format!(
                "/api/v1/live-status?deviceUuid={}&staleSeconds={}",
                uuid, stale
            )),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(app_names(&body), vec!["chrome"]);
    }

    let (status, _) = send(
        &app.router,
        get_request(&format!(
            "/api/v1/live-status?deviceUuid={}&staleSeconds=99999999999999999999",
            uuid
        )),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_query_rejects_non_positive_device_id() {
    let app = default_app();
    let uuid = registered_uuid(&app.router).await;
    report(&app.router, json!({ "deviceUuid": uuid, "apps": [{ "appName": "chrome" }] })).await;

    for id in ["0", "-1", "-9223372036854775808"] {
        let (status, body) = send(
            &app.router,
            get_request(&format!("/api/v1/live-status?deviceId={}", id)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"]
            .as_str()
            .unwrap()
            .contains("deviceId must be a positive integer"));
    }
}
