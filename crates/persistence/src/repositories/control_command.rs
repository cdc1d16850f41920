//! Control command repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::entities::ControlCommandEntity;
use crate::metrics::timed;

/// Repository for control command operations.
#[derive(Debug, Clone)]
pub struct ControlCommandRepository {
    pool: PgPool,
}

impl ControlCommandRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Deactivates `supersedes` actions for the same app and upserts the
    /// `(device, app, action)` row as active, in one transaction.
    pub async fn upsert_active(
        &self,
        device_id: i64,
        app_name: &str,
        action: &str,
        schedule: Option<&str>,
        supersedes: &[String],
        now: DateTime<Utc>,
    ) -> Result<ControlCommandEntity, sqlx::Error> {
        timed("issue_command", async {
            let mut tx = self.pool.begin().await?;

            if !supersedes.is_empty() {
                sqlx::query(
                    r#"
                    UPDATE control_commands
                    SET is_active = false
                    WHERE device_id = $1 AND app_name = $2 AND action = ANY($3) AND is_active
                    "#,
                )
                .bind(device_id)
                .bind(app_name)
                .bind(supersedes)
                .execute(&mut *tx)
                .await?;
            }

            let row = sqlx::query_as::<_, ControlCommandEntity>(
                r#"
                INSERT INTO control_commands (device_id, app_name, action, schedule, is_active, created_at)
                VALUES ($1, $2, $3, $4, true, $5)
                ON CONFLICT (device_id, app_name, action) DO UPDATE SET
                    schedule = EXCLUDED.schedule,
                    is_active = true,
                    created_at = EXCLUDED.created_at
                RETURNING id, device_id, app_name, action, schedule, is_active, created_at
                "#,
            )
            .bind(device_id)
            .bind(app_name)
            .bind(action)
            .bind(schedule)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;

            tx.commit().await?;
            Ok::<_, sqlx::Error>(row)
        })
        .await
    }

    /// Locks and returns active rows, deactivating those whose action is in
    /// `consume_actions`.
    pub async fn take_active(
        &self,
        device_id: i64,
        consume_actions: &[&str],
    ) -> Result<Vec<ControlCommandEntity>, sqlx::Error> {
        timed("take_pending_commands", async {
            let mut tx = self.pool.begin().await?;

            let rows = sqlx::query_as::<_, ControlCommandEntity>(
                r#"
                SELECT id, device_id, app_name, action, schedule, is_active, created_at
                FROM control_commands
                WHERE device_id = $1 AND is_active
                ORDER BY created_at, id
                FOR UPDATE
                "#,
            )
            .bind(device_id)
            .fetch_all(&mut *tx)
            .await?;

            let consumed: Vec<i64> = rows
                .iter()
                .filter(|r| consume_actions.contains(&r.action.as_str()))
                .map(|r| r.id)
                .collect();

            if !consumed.is_empty() {
                sqlx::query("UPDATE control_commands SET is_active = false WHERE id = ANY($1)")
                    .bind(&consumed)
                    .execute(&mut *tx)
                    .await?;
            }

            tx.commit().await?;
            Ok::<_, sqlx::Error>(rows)
        })
        .await
    }

    /// Returns the number of rows deactivated (0 or 1).
    pub async fn deactivate(&self, id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE control_commands SET is_active = false WHERE id = $1 AND is_active",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn list_by_device(
        &self,
        device_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ControlCommandEntity>, sqlx::Error> {
        sqlx::query_as::<_, ControlCommandEntity>(
            r#"
            SELECT id, device_id, app_name, action, schedule, is_active, created_at
            FROM control_commands
            WHERE device_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(device_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn count_by_device(&self, device_id: i64) -> Result<i64, sqlx::Error> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM control_commands WHERE device_id = $1")
                .bind(device_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count.0)
    }
}
