//! Device repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::entities::{DeviceEntity, UpsertedDeviceEntity};
use crate::metrics::QueryTimer;

const DEVICE_COLUMNS: &str = "id, device_uuid, mac_address, machine_name, user_name, os, \
                              child_id, last_seen, created_at, updated_at";

/// Column values for the register upsert.
#[derive(Debug, Clone)]
pub struct DeviceWrite<'a> {
    pub mac_address: &'a str,
    pub supplied_uuid: Option<&'a str>,
    pub generated_uuid: &'a str,
    pub machine_name: Option<&'a str>,
    pub user_name: Option<&'a str>,
    pub os: Option<&'a str>,
    pub child_id: Option<i64>,
}

/// Repository for device-related database operations.
#[derive(Clone)]
pub struct DeviceRepository {
    pool: PgPool,
}

impl DeviceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<DeviceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_device_by_id");
        let result = sqlx::query_as::<_, DeviceEntity>(&format!(
            "SELECT {DEVICE_COLUMNS} FROM devices WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(&result);
        result
    }

    pub async fn find_by_uuid(&self, uuid: &str) -> Result<Option<DeviceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_device_by_uuid");
        let result = sqlx::query_as::<_, DeviceEntity>(&format!(
            "SELECT {DEVICE_COLUMNS} FROM devices WHERE device_uuid = $1"
        ))
        .bind(uuid)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(&result);
        result
    }

    pub async fn find_by_mac(&self, mac: &str) -> Result<Option<DeviceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_device_by_mac");
        let result = sqlx::query_as::<_, DeviceEntity>(&format!(
            "SELECT {DEVICE_COLUMNS} FROM devices WHERE mac_address = $1"
        ))
        .bind(mac)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(&result);
        result
    }

    /// Machine names may repeat; the oldest device wins.
    pub async fn find_by_machine_name(
        &self,
        machine_name: &str,
    ) -> Result<Option<DeviceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_device_by_machine_name");
        let result = sqlx::query_as::<_, DeviceEntity>(&format!(
            "SELECT {DEVICE_COLUMNS} FROM devices WHERE machine_name = $1 ORDER BY id LIMIT 1"
        ))
        .bind(machine_name)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(&result);
        result
    }

    /// Insert or update keyed on `mac_address` in one statement.
    ///
    /// The stored uuid is only replaced when one is supplied. A supplied uuid
    /// held by another row fails with a unique violation.
    pub async fn upsert_by_mac(
        &self,
        write: &DeviceWrite<'_>,
        now: DateTime<Utc>,
    ) -> Result<UpsertedDeviceEntity, sqlx::Error> {
        let timer = QueryTimer::new("upsert_device_by_mac");
        let result = sqlx::query_as::<_, UpsertedDeviceEntity>(&format!(
            r#"
            INSERT INTO devices (device_uuid, mac_address, machine_name, user_name, os,
                                 child_id, last_seen, created_at, updated_at)
            VALUES (COALESCE($1, $2), $3, $4, $5, $6, $7, $8, $8, $8)
            ON CONFLICT (mac_address) DO UPDATE SET
                device_uuid = COALESCE($1, devices.device_uuid),
                machine_name = EXCLUDED.machine_name,
                user_name = EXCLUDED.user_name,
                os = EXCLUDED.os,
                child_id = EXCLUDED.child_id,
                last_seen = EXCLUDED.last_seen,
                updated_at = EXCLUDED.updated_at
            RETURNING {DEVICE_COLUMNS}, (xmax = 0) AS inserted
            "#
        ))
        .bind(write.supplied_uuid)
        .bind(write.generated_uuid)
        .bind(write.mac_address)
        .bind(write.machine_name)
        .bind(write.user_name)
        .bind(write.os)
        .bind(write.child_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await;
        timer.finish(&result);
        result
    }

    pub async fn list_all(&self) -> Result<Vec<DeviceEntity>, sqlx::Error> {
        sqlx::query_as::<_, DeviceEntity>(&format!(
            "SELECT {DEVICE_COLUMNS} FROM devices ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await
    }

    pub async fn list_unassigned(&self) -> Result<Vec<DeviceEntity>, sqlx::Error> {
        sqlx::query_as::<_, DeviceEntity>(&format!(
            "SELECT {DEVICE_COLUMNS} FROM devices WHERE child_id IS NULL ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await
    }

    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
