//! PostgreSQL implementation of the domain store traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use domain::error::DomainError;
use domain::models::{
    CommandAction, ControlCommand, Delivery, Device, DeviceUpsert, LiveAppStatus, NewCommand,
    ReportedApp,
};
use domain::store::{CommandStore, DeviceStore, PresenceStore};

use crate::repositories::{
    AppSighting, ControlCommandRepository, DeviceRepository, DeviceWrite, LiveAppStatusRepository,
};

/// Sync store backed by the repositories in this crate.
#[derive(Clone)]
pub struct PgSyncStore {
    devices: DeviceRepository,
    commands: ControlCommandRepository,
    statuses: LiveAppStatusRepository,
}

impl PgSyncStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            devices: DeviceRepository::new(pool.clone()),
            commands: ControlCommandRepository::new(pool.clone()),
            statuses: LiveAppStatusRepository::new(pool),
        }
    }

    pub fn pool(&self) -> &PgPool {
        self.devices.pool()
    }
}

fn one_shot_actions() -> Vec<&'static str> {
    CommandAction::ALL
        .iter()
        .filter(|a| a.delivery() == Delivery::OneShot)
        .map(|a| a.as_str())
        .collect()
}

#[async_trait]
impl DeviceStore for PgSyncStore {
    async fn find_device_by_id(&self, id: i64) -> Result<Option<Device>, DomainError> {
        Ok(self.devices.find_by_id(id).await?.map(Into::into))
    }

    async fn find_device_by_uuid(&self, uuid: &str) -> Result<Option<Device>, DomainError> {
        Ok(self.devices.find_by_uuid(uuid).await?.map(Into::into))
    }

    async fn find_device_by_mac(&self, mac: &str) -> Result<Option<Device>, DomainError> {
        Ok(self.devices.find_by_mac(mac).await?.map(Into::into))
    }

    async fn find_device_by_machine_name(
        &self,
        machine_name: &str,
    ) -> Result<Option<Device>, DomainError> {
        Ok(self
            .devices
            .find_by_machine_name(machine_name)
            .await?
            .map(Into::into))
    }

    async fn upsert_device_by_mac(
        &self,
        upsert: &DeviceUpsert,
        now: DateTime<Utc>,
    ) -> Result<(Device, bool), DomainError> {
        let write = DeviceWrite {
            mac_address: &upsert.mac_address,
            supplied_uuid: upsert.supplied_uuid.as_deref(),
            generated_uuid: &upsert.generated_uuid,
            machine_name: upsert.machine_name.as_deref(),
            user_name: upsert.user_name.as_deref(),
            os: upsert.os.as_deref(),
            child_id: upsert.child_id,
        };
        let row = self.devices.upsert_by_mac(&write, now).await?;
        Ok((row.device.into(), row.inserted))
    }

    async fn list_devices(&self) -> Result<Vec<Device>, DomainError> {
        Ok(self
            .devices
            .list_all()
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    async fn list_unassigned_devices(&self) -> Result<Vec<Device>, DomainError> {
        Ok(self
            .devices
            .list_unassigned()
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    async fn ping(&self) -> Result<(), DomainError> {
        Ok(self.devices.ping().await?)
    }
}

#[async_trait]
impl CommandStore for PgSyncStore {
    async fn issue_command(
        &self,
        command: &NewCommand,
        now: DateTime<Utc>,
    ) -> Result<ControlCommand, DomainError> {
        let supersedes: Vec<String> = command
            .action
            .supersedes()
            .iter()
            .map(|a| a.as_str().to_string())
            .collect();

        self.commands
            .upsert_active(
                command.device_id,
                &command.app_name,
                command.action.as_str(),
                command.schedule.as_deref(),
                &supersedes,
                now,
            )
            .await?
            .try_into()
    }

    async fn take_pending(&self, device_id: i64) -> Result<Vec<ControlCommand>, DomainError> {
        self.commands
            .take_active(device_id, &one_shot_actions())
            .await?
            .into_iter()
            .map(ControlCommand::try_from)
            .collect()
    }

    async fn deactivate_command(&self, id: i64) -> Result<bool, DomainError> {
        Ok(self.commands.deactivate(id).await? > 0)
    }

    async fn list_commands(
        &self,
        device_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ControlCommand>, DomainError> {
        self.commands
            .list_by_device(device_id, limit, offset)
            .await?
            .into_iter()
            .map(ControlCommand::try_from)
            .collect()
    }

    async fn count_commands(&self, device_id: i64) -> Result<i64, DomainError> {
        Ok(self.commands.count_by_device(device_id).await?)
    }
}

#[async_trait]
impl PresenceStore for PgSyncStore {
    async fn reconcile_snapshot(
        &self,
        device_id: i64,
        apps: &[ReportedApp],
        now: DateTime<Utc>,
    ) -> Result<Vec<LiveAppStatus>, DomainError> {
        let sightings: Vec<AppSighting<'_>> = apps
            .iter()
            .map(|app| AppSighting {
                app_name: &app.app_name,
                window_title: app.window_title.as_deref(),
            })
            .collect();

        Ok(self
            .statuses
            .replace_running(device_id, &sightings, now)
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    async fn running_apps(
        &self,
        device_id: i64,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<LiveAppStatus>, DomainError> {
        Ok(self
            .statuses
            .find_running(device_id, since)
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    async fn app_statuses(&self, device_id: i64) -> Result<Vec<LiveAppStatus>, DomainError> {
        Ok(self
            .statuses
            .find_by_device(device_id)
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }
}
