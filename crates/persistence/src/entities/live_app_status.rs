//! Live application status entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database row mapping for the live_app_status table.
#[derive(Debug, Clone, FromRow)]
pub struct LiveAppStatusEntity {
    pub id: i64,
    pub device_id: i64,
    pub app_name: String,
    pub window_title: Option<String>,
    pub is_running: bool,
    pub last_seen: DateTime<Utc>,
}

impl From<LiveAppStatusEntity> for domain::models::LiveAppStatus {
    fn from(entity: LiveAppStatusEntity) -> Self {
        Self {
            id: entity.id,
            device_id: entity.device_id,
            app_name: entity.app_name,
            window_title: entity.window_title,
            is_running: entity.is_running,
            last_seen: entity.last_seen,
        }
    }
}
