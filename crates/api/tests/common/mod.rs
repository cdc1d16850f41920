//! Shared fixtures for HTTP integration tests.
//!
//! The router runs against the in-memory store and a manual clock, so these
//! tests need no database.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request},
    response::Response,
    Router,
};
use chrono::{TimeZone, Utc};
use fake::{faker::name::en::Name, Fake};
use std::sync::Arc;

use agent_sync_api::{
    app::create_app,
    config::{
        Config, DatabaseConfig, LoggingConfig, SecurityConfig, ServerConfig, SyncConfig,
    },
};
use domain::services::SyncService;
use domain::{InMemorySyncStore, ManualClock};

pub struct TestApp {
    pub router: Router,
    pub clock: Arc<ManualClock>,
}

pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            request_timeout_secs: 30,
        },
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout_secs: 5,
            idle_timeout_secs: 60,
        },
        logging: LoggingConfig {
            level: "warn".to_string(),
            format: "pretty".to_string(),
        },
        security: SecurityConfig {
            rate_limit_per_minute: 0,
            ..SecurityConfig::default()
        },
        sync: SyncConfig::default(),
    }
}

pub fn create_test_app(config: Config) -> TestApp {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
    ));
    let service = Arc::new(SyncService::new(
        Arc::new(InMemorySyncStore::new()),
        clock.clone(),
        config.sync.limits(),
    ));
    TestApp {
        router: create_app(config, service),
        clock,
    }
}

pub fn default_app() -> TestApp {
    create_test_app(test_config())
}

pub fn unique_mac() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..12].to_uppercase()
}

pub fn machine_name() -> String {
    Name().fake()
}

pub fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn with_bearer(mut request: Request<Body>, token: &str) -> Request<Body> {
    request.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Bearer {}", token).parse().unwrap(),
    );
    request
}

pub async fn parse_response_body(response: Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null)
}
