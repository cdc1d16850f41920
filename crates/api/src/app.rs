use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, rate_limit_middleware, require_token, trace_id,
    RateLimiterState,
};
use crate::routes::{commands, devices, health, live_status};
use domain::services::SyncService;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SyncService>,
    pub config: Arc<Config>,
    pub rate_limiter: Option<Arc<RateLimiterState>>,
}

pub fn create_app(config: Config, service: Arc<SyncService>) -> Router {
    let config = Arc::new(config);
    let rate_limiter = RateLimiterState::new(config.security.rate_limit_per_minute).map(Arc::new);

    let state = AppState {
        service,
        config: config.clone(),
        rate_limiter,
    };

    let cors = cors_layer(&config.security.cors_origins);

    let sync_routes = Router::new()
        .route("/devices", get(devices::list_devices))
        .route("/devices/register", post(devices::register_device))
        .route("/devices/update", post(devices::update_device))
        .route("/devices/unassigned", get(devices::list_unassigned_devices))
        .route("/devices/uuid-by-mac", get(devices::lookup_by_mac))
        .route("/commands/kill", post(commands::issue_kill))
        .route("/commands/relaunch", post(commands::issue_relaunch))
        .route("/commands/schedule", post(commands::issue_schedule))
        .route("/commands/pending", get(commands::poll_pending))
        .route("/commands/ack/:id", post(commands::ack_command))
        .route("/commands/history", get(commands::command_history))
        .route(
            "/live-status",
            get(live_status::get_live_status).post(live_status::post_live_status),
        )
        // route_layer order: the last one added runs first
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_token));

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/live", get(health::liveness))
        .route("/api/health/ready", get(health::readiness))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .nest("/api/v1", sync_routes)
        .merge(public_routes)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}

/// Any origin when none are configured.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins.iter().filter_map(|o| o.parse().ok()))
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}
