//! Live application status repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::entities::LiveAppStatusEntity;
use crate::metrics::timed;

/// One app from a presence snapshot.
#[derive(Debug, Clone, Copy)]
pub struct AppSighting<'a> {
    pub app_name: &'a str,
    pub window_title: Option<&'a str>,
}

/// Repository for presence rows.
#[derive(Debug, Clone)]
pub struct LiveAppStatusRepository {
    pool: PgPool,
}

impl LiveAppStatusRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Replaces the running set of a device.
    ///
    /// The device row is locked first so snapshots for one device apply one
    /// at a time. Fails with `RowNotFound` when the device does not exist.
    pub async fn replace_running(
        &self,
        device_id: i64,
        sightings: &[AppSighting<'_>],
        now: DateTime<Utc>,
    ) -> Result<Vec<LiveAppStatusEntity>, sqlx::Error> {
        timed("reconcile_snapshot", async {
            let mut tx = self.pool.begin().await?;

            sqlx::query_scalar::<_, i64>("SELECT id FROM devices WHERE id = $1 FOR UPDATE")
                .bind(device_id)
                .fetch_one(&mut *tx)
                .await?;

            sqlx::query(
                "UPDATE live_app_status SET is_running = false WHERE device_id = $1 AND is_running",
            )
            .bind(device_id)
            .execute(&mut *tx)
            .await?;

            let mut rows = Vec::with_capacity(sightings.len());
            for sighting in sightings {
                let row = sqlx::query_as::<_, LiveAppStatusEntity>(
                    r#"
                    INSERT INTO live_app_status (device_id, app_name, window_title, is_running, last_seen)
                    VALUES ($1, $2, $3, true, $4)
                    ON CONFLICT (device_id, app_name) DO UPDATE SET
                        window_title = EXCLUDED.window_title,
                        is_running = true,
                        last_seen = EXCLUDED.last_seen
                    RETURNING id, device_id, app_name, window_title, is_running, last_seen
                    "#,
                )
                .bind(device_id)
                .bind(sighting.app_name)
                .bind(sighting.window_title)
                .bind(now)
                .fetch_one(&mut *tx)
                .await?;
                rows.push(row);
            }

            sqlx::query("UPDATE devices SET last_seen = $2 WHERE id = $1")
                .bind(device_id)
                .bind(now)
                .execute(&mut *tx)
                .await?;

            tx.commit().await?;
            Ok::<_, sqlx::Error>(rows)
        })
        .await
    }

    /// Running rows, optionally restricted to those seen at or after `since`.
    pub async fn find_running(
        &self,
        device_id: i64,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<LiveAppStatusEntity>, sqlx::Error> {
        sqlx::query_as::<_, LiveAppStatusEntity>(
            r#"
            SELECT id, device_id, app_name, window_title, is_running, last_seen
            FROM live_app_status
            WHERE device_id = $1
              AND is_running
              AND ($2::TIMESTAMPTZ IS NULL OR last_seen >= $2)
            ORDER BY app_name
            "#,
        )
        .bind(device_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn find_by_device(
        &self,
        device_id: i64,
    ) -> Result<Vec<LiveAppStatusEntity>, sqlx::Error> {
        sqlx::query_as::<_, LiveAppStatusEntity>(
            r#"
            SELECT id, device_id, app_name, window_title, is_running, last_seen
            FROM live_app_status
            WHERE device_id = $1
            ORDER BY app_name
            "#,
        )
        .bind(device_id)
        .fetch_all(&self.pool)
        .await
    }
}
