//! Device domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::DomainError;
use shared::validation::non_blank;

/// Represents one physical endpoint running an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: i64,
    pub device_uuid: String,
    pub mac_address: Option<String>,
    pub machine_name: Option<String>,
    pub user_name: Option<String>,
    pub os: Option<String>,
    pub child_id: Option<i64>,
    pub last_seen: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request payload for device registration and update.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDeviceRequest {
    #[validate(length(max = 64, message = "macAddress must be at most 64 characters"))]
    pub mac_address: Option<String>,

    #[validate(length(max = 128, message = "deviceUuid must be at most 128 characters"))]
    pub device_uuid: Option<String>,

    #[validate(length(max = 255, message = "machineName must be at most 255 characters"))]
    pub machine_name: Option<String>,

    #[validate(length(max = 255, message = "userName must be at most 255 characters"))]
    pub user_name: Option<String>,

    #[validate(length(max = 255, message = "os must be at most 255 characters"))]
    pub os: Option<String>,

    pub child_id: Option<i64>,
}

/// Normalized write set for the register-or-update upsert keyed on MAC.
///
/// `supplied_uuid` replaces the stored uuid of an existing device;
/// `generated_uuid` is only used when a new row is inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceUpsert {
    pub mac_address: String,
    pub supplied_uuid: Option<String>,
    pub generated_uuid: String,
    pub machine_name: Option<String>,
    pub user_name: Option<String>,
    pub os: Option<String>,
    pub child_id: Option<i64>,
}

/// Outcome of a register-or-update call.
#[derive(Debug, Clone)]
pub struct DeviceRegistration {
    pub device: Device,
    pub created: bool,
}

/// Response payload for registration and MAC lookups.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceResponse {
    pub device_id: i64,
    pub device_uuid: String,
    pub child_id: Option<i64>,
}

impl From<Device> for DeviceResponse {
    fn from(device: Device) -> Self {
        Self {
            device_id: device.id,
            device_uuid: device.device_uuid,
            child_id: device.child_id,
        }
    }
}

/// The identifiers a caller may present for a device.
///
/// Blank strings are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityHints {
    pub device_uuid: Option<String>,
    pub device_id: Option<i64>,
    pub mac_address: Option<String>,
    pub machine_name: Option<String>,
}

impl IdentityHints {
    pub fn new(
        device_uuid: Option<&str>,
        device_id: Option<i64>,
        mac_address: Option<&str>,
        machine_name: Option<&str>,
    ) -> Self {
        Self {
            device_uuid: non_blank(device_uuid).map(str::to_string),
            device_id,
            mac_address: non_blank(mac_address).map(str::to_string),
            machine_name: non_blank(machine_name).map(str::to_string),
        }
    }

    pub fn by_uuid(device_uuid: &str) -> Self {
        Self::new(Some(device_uuid), None, None, None)
    }

    pub fn is_empty(&self) -> bool {
        self.device_uuid.is_none()
            && self.device_id.is_none()
            && self.mac_address.is_none()
            && self.machine_name.is_none()
    }

    /// Rejects surrogate ids that can never exist.
    pub fn check_ids(&self) -> Result<(), DomainError> {
        match self.device_id {
            Some(id) if shared::validation::validate_positive_id(id).is_err() => Err(
                DomainError::validation("deviceId must be a positive integer"),
            ),
            _ => Ok(()),
        }
    }
}
