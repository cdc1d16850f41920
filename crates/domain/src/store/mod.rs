//! Storage seam consumed by the synchronization engine.
//!
//! Every method is one atomic unit: implementations either apply all of a
//! call's writes or none of them. Uniqueness of `(device, app, action)` and
//! `(device, app)` is the store's responsibility.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::DomainError;
use crate::models::{
    ControlCommand, Device, DeviceUpsert, LiveAppStatus, NewCommand, ReportedApp,
};

pub use memory::InMemorySyncStore;

/// Device records and point lookups by each identity key.
#[async_trait]
pub trait DeviceStore: Send + Sync {
    async fn find_device_by_id(&self, id: i64) -> Result<Option<Device>, DomainError>;

    async fn find_device_by_uuid(&self, uuid: &str) -> Result<Option<Device>, DomainError>;

    async fn find_device_by_mac(&self, mac: &str) -> Result<Option<Device>, DomainError>;

    /// Machine names are not unique; the lowest id wins.
    async fn find_device_by_machine_name(
        &self,
        machine_name: &str,
    ) -> Result<Option<Device>, DomainError>;

    /// Insert or update keyed on MAC address. Returns the row and whether it
    /// was created.
    async fn upsert_device_by_mac(
        &self,
        upsert: &DeviceUpsert,
        now: DateTime<Utc>,
    ) -> Result<(Device, bool), DomainError>;

    async fn list_devices(&self) -> Result<Vec<Device>, DomainError>;

    async fn list_unassigned_devices(&self) -> Result<Vec<Device>, DomainError>;

    /// Cheap liveness probe for health checks.
    async fn ping(&self) -> Result<(), DomainError>;
}

/// Control command ledger.
#[async_trait]
pub trait CommandStore: Send + Sync {
    /// Deactivates active rows for the actions the new command supersedes,
    /// then upserts the `(device, app, action)` row as active.
    async fn issue_command(
        &self,
        command: &NewCommand,
        now: DateTime<Utc>,
    ) -> Result<ControlCommand, DomainError>;

    /// Returns active commands ordered by `(created_at, id)` and deactivates
    /// the one-shot ones among them.
    async fn take_pending(&self, device_id: i64) -> Result<Vec<ControlCommand>, DomainError>;

    /// Returns whether an active row was deactivated.
    async fn deactivate_command(&self, id: i64) -> Result<bool, DomainError>;

    /// All commands for a device, newest first.
    async fn list_commands(
        &self,
        device_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ControlCommand>, DomainError>;

    async fn count_commands(&self, device_id: i64) -> Result<i64, DomainError>;
}

/// Live application presence.
#[async_trait]
pub trait PresenceStore: Send + Sync {
    /// Marks every running row of the device stopped, upserts each reported
    /// app as running and refreshes the device's `last_seen`.
    ///
    /// `apps` must already be free of duplicate names.
    async fn reconcile_snapshot(
        &self,
        device_id: i64,
        apps: &[ReportedApp],
        now: DateTime<Utc>,
    ) -> Result<Vec<LiveAppStatus>, DomainError>;

    /// Running rows ordered by app name, optionally only those seen at or
    /// after `since`.
    async fn running_apps(
        &self,
        device_id: i64,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<LiveAppStatus>, DomainError>;

    /// Every row for the device, running or not.
    async fn app_statuses(&self, device_id: i64) -> Result<Vec<LiveAppStatus>, DomainError>;
}

/// Full store used by the synchronization service.
pub trait SyncStore: DeviceStore + CommandStore + PresenceStore {}

impl<T> SyncStore for T where T: DeviceStore + CommandStore + PresenceStore {}
