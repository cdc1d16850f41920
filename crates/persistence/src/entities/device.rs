//! Device entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database row mapping for the devices table.
#[derive(Debug, Clone, FromRow)]
pub struct DeviceEntity {
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

/// Row returned by the register upsert; `inserted` is derived from `xmax`.
#[derive(Debug, Clone, FromRow)]
pub struct UpsertedDeviceEntity {
    #[sqlx(flatten)]
    pub device: DeviceEntity,
    pub inserted: bool,
}

impl From<DeviceEntity> for domain::models::Device {
    fn from(entity: DeviceEntity) -> Self {
        Self {
            id: entity.id,
            device_uuid: entity.device_uuid,
            mac_address: entity.mac_address,
            machine_name: entity.machine_name,
            user_name: entity.user_name,
            os: entity.os,
            child_id: entity.child_id,
            last_seen: entity.last_seen,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
