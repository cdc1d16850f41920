//! Presence reconciliation from running-app snapshots.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::error::DomainError;
use crate::models::{LiveAppResponse, ReportedApp};
use crate::store::SyncStore;

#[derive(Clone)]
pub struct PresenceReconciler {
    store: Arc<dyn SyncStore>,
}

impl PresenceReconciler {
    pub fn new(store: Arc<dyn SyncStore>) -> Self {
        Self { store }
    }

    /// Replaces the device's running set with `apps`.
    ///
    /// Duplicate names collapse into one row with the last entry's window
    /// title; the result keeps first-occurrence order.
    pub async fn report(
        &self,
        device_id: i64,
        apps: Vec<ReportedApp>,
        now: DateTime<Utc>,
    ) -> Result<Vec<LiveAppResponse>, DomainError> {
        let apps = collapse_duplicates(apps);
        let rows = self.store.reconcile_snapshot(device_id, &apps, now).await?;

        tracing::debug!(device_id, running = rows.len(), "Presence snapshot reconciled");
        Ok(rows.into_iter().map(LiveAppResponse::from).collect())
    }

    /// Running apps; with `stale_seconds > 0` only those reported within
    /// that window.
    pub async fn running(
        &self,
        device_id: i64,
        stale_seconds: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<Vec<LiveAppResponse>, DomainError> {
        let since = stale_seconds.and_then(|s| stale_cutoff(now, s));
        let rows = self.store.running_apps(device_id, since).await?;
        Ok(rows.into_iter().map(LiveAppResponse::from).collect())
    }
}

/// Oldest `last_seen` still inside the window. A window reaching back past
/// the epoch covers every row, so it yields no cutoff.
fn stale_cutoff(now: DateTime<Utc>, stale_seconds: i64) -> Option<DateTime<Utc>> {
    if stale_seconds <= 0 {
        return None;
    }
    Duration::try_seconds(stale_seconds)
        .and_then(|window| now.checked_sub_signed(window))
        .filter(|cutoff| *cutoff > DateTime::UNIX_EPOCH)
}

fn collapse_duplicates(apps: Vec<ReportedApp>) -> Vec<ReportedApp> {
    let mut collapsed: Vec<ReportedApp> = Vec::with_capacity(apps.len());
    for app in apps {
        match collapsed.iter_mut().find(|a| a.app_name == app.app_name) {
            Some(existing) => existing.window_title = app.window_title,
            None => collapsed.push(app),
        }
    }
    collapsed
}
