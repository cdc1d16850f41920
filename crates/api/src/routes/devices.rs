//! Device registry handlers.

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use super::SuccessResponse;
use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics;
use domain::models::{Device, DeviceResponse, RegisterDeviceRequest};

#[derive(Debug, Serialize)]
pub struct DeviceListResponse {
    pub devices: Vec<Device>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MacLookupQuery {
    pub mac_address: Option<String>,
}

/// Registers a device, or updates the one already holding the MAC address.
///
/// POST /api/v1/devices/register
pub async fn register_device(
    State(state): State<AppState>,
    payload: Result<Json<RegisterDeviceRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<DeviceResponse>), ApiError> {
    let Json(request) = payload?;
    let registration = state.service.register_device(request).await?;
    metrics::record_device_registered(registration.created);

    let status = if registration.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(registration.device.into())))
}

/// Same upsert as registration, acknowledged without the identity payload.
///
/// POST /api/v1/devices/update
pub async fn update_device(
    State(state): State<AppState>,
    payload: Result<Json<RegisterDeviceRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Json(request) = payload?;
    let registration = state.service.register_device(request).await?;
    metrics::record_device_registered(registration.created);
    Ok(Json(SuccessResponse::ok()))
}

/// GET /api/v1/devices
pub async fn list_devices(
    State(state): State<AppState>,
) -> Result<Json<DeviceListResponse>, ApiError> {
    let devices = state.service.list_devices().await?;
    Ok(Json(DeviceListResponse { devices }))
}

/// Devices with no owner assigned.
///
/// GET /api/v1/devices/unassigned
pub async fn list_unassigned_devices(
    State(state): State<AppState>,
) -> Result<Json<DeviceListResponse>, ApiError> {
    let devices = state.service.list_unassigned_devices().await?;
    Ok(Json(DeviceListResponse { devices }))
}

/// GET /api/v1/devices/uuid-by-mac?macAddress=
pub async fn lookup_by_mac(
    State(state): State<AppState>,
    query: Result<Query<MacLookupQuery>, QueryRejection>,
) -> Result<Json<DeviceResponse>, ApiError> {
    let Query(query) = query?;
    let device = state
        .service
        .lookup_by_mac(query.mac_address.as_deref())
        .await?;
    Ok(Json(device))
}
