//! In-memory [`SyncStore`](super::SyncStore) for tests and local development.
//!
//! All state sits behind one mutex, so each trait call observes and mutates
//! a consistent snapshot.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{CommandStore, DeviceStore, PresenceStore};
use crate::error::DomainError;
use crate::models::{
    CommandAction, ControlCommand, Delivery, Device, DeviceUpsert, LiveAppStatus, NewCommand,
    ReportedApp,
};

#[derive(Debug, Default)]
struct State {
    devices: BTreeMap<i64, Device>,
    commands: BTreeMap<i64, ControlCommand>,
    statuses: BTreeMap<i64, LiveAppStatus>,
    next_device_id: i64,
    next_command_id: i64,
    next_status_id: i64,
}

impl State {
    fn next_id(counter: &mut i64) -> i64 {
        *counter += 1;
        *counter
    }

    fn device_by_mac(&self, mac: &str) -> Option<&Device> {
        self.devices
            .values()
            .find(|d| d.mac_address.as_deref() == Some(mac))
    }

    fn uuid_owner(&self, uuid: &str) -> Option<i64> {
        self.devices
            .values()
            .find(|d| d.device_uuid == uuid)
            .map(|d| d.id)
    }

    fn command_key(&self, device_id: i64, app_name: &str, action: CommandAction) -> Option<i64> {
        self.commands
            .values()
            .find(|c| c.device_id == device_id && c.app_name == app_name && c.action == action)
            .map(|c| c.id)
    }

    fn status_key(&self, device_id: i64, app_name: &str) -> Option<i64> {
        self.statuses
            .values()
            .find(|s| s.device_id == device_id && s.app_name == app_name)
            .map(|s| s.id)
    }
}

/// Mutex-guarded maps standing in for the relational store.
#[derive(Debug, Default)]
pub struct InMemorySyncStore {
    state: Mutex<State>,
}

impl InMemorySyncStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Overwrites a presence row's `last_seen`. Test hook for staleness.
    pub fn set_status_last_seen(&self, device_id: i64, app_name: &str, last_seen: DateTime<Utc>) {
        let mut state = self.lock();
        if let Some(id) = state.status_key(device_id, app_name) {
            if let Some(status) = state.statuses.get_mut(&id) {
                status.last_seen = last_seen;
            }
        }
    }

    /// Number of stored command rows, active or not.
    pub fn command_row_count(&self) -> usize {
        self.lock().commands.len()
    }
}

#[async_trait]
impl DeviceStore for InMemorySyncStore {
    async fn find_device_by_id(&self, id: i64) -> Result<Option<Device>, DomainError> {
        Ok(self.lock().devices.get(&id).cloned())
    }

    async fn find_device_by_uuid(&self, uuid: &str) -> Result<Option<Device>, DomainError> {
        let state = self.lock();
        Ok(state
            .uuid_owner(uuid)
            .and_then(|id| state.devices.get(&id).cloned()))
    }

    async fn find_device_by_mac(&self, mac: &str) -> Result<Option<Device>, DomainError> {
        Ok(self.lock().device_by_mac(mac).cloned())
    }

    async fn find_device_by_machine_name(
        &self,
        machine_name: &str,
    ) -> Result<Option<Device>, DomainError> {
        Ok(self
            .lock()
            .devices
            .values()
            .find(|d| d.machine_name.as_deref() == Some(machine_name))
            .cloned())
    }

    async fn upsert_device_by_mac(
        &self,
        upsert: &DeviceUpsert,
        now: DateTime<Utc>,
    ) -> Result<(Device, bool), DomainError> {
        let mut state = self.lock();
        let existing = state.device_by_mac(&upsert.mac_address).map(|d| d.id);

        if let Some(uuid) = upsert.supplied_uuid.as_deref() {
            match state.uuid_owner(uuid) {
                Some(owner) if Some(owner) != existing => {
                    return Err(DomainError::Conflict(
                        "Identity already registered to another device".into(),
                    ));
                }
                _ => {}
            }
        }

        match existing.and_then(|id| state.devices.get_mut(&id)) {
            Some(device) => {
                if let Some(uuid) = &upsert.supplied_uuid {
                    device.device_uuid = uuid.clone();
                }
                device.machine_name = upsert.machine_name.clone();
                device.user_name = upsert.user_name.clone();
                device.os = upsert.os.clone();
                device.child_id = upsert.child_id;
                device.last_seen = Some(now);
                device.updated_at = now;
                Ok((device.clone(), false))
            }
            None => {
                let id = State::next_id(&mut state.next_device_id);
                let device = Device {
                    id,
                    device_uuid: upsert
                        .supplied_uuid
                        .clone()
                        .unwrap_or_else(|| upsert.generated_uuid.clone()),
                    mac_address: Some(upsert.mac_address.clone()),
                    machine_name: upsert.machine_name.clone(),
                    user_name: upsert.user_name.clone(),
                    os: upsert.os.clone(),
                    child_id: upsert.child_id,
                    last_seen: Some(now),
                    created_at: now,
                    updated_at: now,
                };
                if state.uuid_owner(&device.device_uuid).is_some() {
                    return Err(DomainError::Conflict(
                        "Identity already registered to another device".into(),
                    ));
                }
                state.devices.insert(id, device.clone());
                Ok((device, true))
            }
        }
    }

    async fn list_devices(&self) -> Result<Vec<Device>, DomainError> {
        Ok(self.lock().devices.values().cloned().collect())
    }

    async fn list_unassigned_devices(&self) -> Result<Vec<Device>, DomainError> {
        Ok(self
            .lock()
            .devices
            .values()
            .filter(|d| d.child_id.is_none())
            .cloned()
            .collect())
    }

    async fn ping(&self) -> Result<(), DomainError> {
        Ok(())
    }
}

#[async_trait]
impl CommandStore for InMemorySyncStore {
    async fn issue_command(
        &self,
        command: &NewCommand,
        now: DateTime<Utc>,
    ) -> Result<ControlCommand, DomainError> {
        let mut state = self.lock();
        if !state.devices.contains_key(&command.device_id) {
            return Err(DomainError::NotFound("Referenced device not found".into()));
        }

        for superseded in command.action.supersedes() {
            if let Some(id) = state.command_key(command.device_id, &command.app_name, *superseded)
            {
                if let Some(row) = state.commands.get_mut(&id) {
                    row.is_active = false;
                }
            }
        }

        let existing = state.command_key(command.device_id, &command.app_name, command.action);
        let id = match existing {
            Some(id) => id,
            None => State::next_id(&mut state.next_command_id),
        };
        let row = state.commands.entry(id).or_insert_with(|| ControlCommand {
            id,
            device_id: command.device_id,
            app_name: command.app_name.clone(),
            action: command.action,
            schedule: None,
            is_active: true,
            created_at: now,
        });
        row.is_active = true;
        row.created_at = now;
        if command.action.carries_schedule() {
            row.schedule = command.schedule.clone();
        }
        Ok(row.clone())
    }

    async fn take_pending(&self, device_id: i64) -> Result<Vec<ControlCommand>, DomainError> {
        let mut state = self.lock();
        let mut pending: Vec<ControlCommand> = state
            .commands
            .values()
            .filter(|c| c.device_id == device_id && c.is_active)
            .cloned()
            .collect();
        pending.sort_by_key(|c| (c.created_at, c.id));

        for command in &pending {
            if command.action.delivery() == Delivery::OneShot {
                if let Some(row) = state.commands.get_mut(&command.id) {
                    row.is_active = false;
                }
            }
        }
        Ok(pending)
    }

    async fn deactivate_command(&self, id: i64) -> Result<bool, DomainError> {
        let mut state = self.lock();
        match state.commands.get_mut(&id) {
            Some(row) if row.is_active => {
                row.is_active = false;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_commands(
        &self,
        device_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ControlCommand>, DomainError> {
        let state = self.lock();
        let mut rows: Vec<ControlCommand> = state
            .commands
            .values()
            .filter(|c| c.device_id == device_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(rows
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count_commands(&self, device_id: i64) -> Result<i64, DomainError> {
        Ok(self
            .lock()
            .commands
            .values()
            .filter(|c| c.device_id == device_id)
            .count() as i64)
    }
}

#[async_trait]
impl PresenceStore for InMemorySyncStore {
    async fn reconcile_snapshot(
        &self,
        device_id: i64,
        apps: &[ReportedApp],
        now: DateTime<Utc>,
    ) -> Result<Vec<LiveAppStatus>, DomainError> {
        let mut state = self.lock();
        if !state.devices.contains_key(&device_id) {
            return Err(DomainError::NotFound("Referenced device not found".into()));
        }

        for status in state.statuses.values_mut() {
            if status.device_id == device_id && status.is_running {
                status.is_running = false;
            }
        }

        let mut upserted = Vec::with_capacity(apps.len());
        for app in apps {
            let id = match state.status_key(device_id, &app.app_name) {
                Some(id) => id,
                None => State::next_id(&mut state.next_status_id),
            };
            let row = state.statuses.entry(id).or_insert_with(|| LiveAppStatus {
                id,
                device_id,
                app_name: app.app_name.clone(),
                window_title: None,
                is_running: true,
                last_seen: now,
            });
            row.window_title = app.window_title.clone();
            row.is_running = true;
            row.last_seen = now;
            upserted.push(row.clone());
        }

        if let Some(device) = state.devices.get_mut(&device_id) {
            device.last_seen = Some(now);
        }
        Ok(upserted)
    }

    async fn running_apps(
        &self,
        device_id: i64,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<LiveAppStatus>, DomainError> {
        let state = self.lock();
        let mut rows: Vec<LiveAppStatus> = state
            .statuses
            .values()
            .filter(|s| s.device_id == device_id && s.is_running)
            .filter(|s| since.map_or(true, |cutoff| s.last_seen >= cutoff))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.app_name.cmp(&b.app_name));
        Ok(rows)
    }

    async fn app_statuses(&self, device_id: i64) -> Result<Vec<LiveAppStatus>, DomainError> {
        let state = self.lock();
        let mut rows: Vec<LiveAppStatus> = state
            .statuses
            .values()
            .filter(|s| s.device_id == device_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.app_name.cmp(&b.app_name));
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn upsert(mac: &str, uuid: Option<&str>) -> DeviceUpsert {
        DeviceUpsert {
            mac_address: mac.to_string(),
            supplied_uuid: uuid.map(str::to_string),
            generated_uuid: uuid::Uuid::new_v4().to_string(),
            machine_name: Some("PC".to_string()),
            user_name: None,
            os: None,
            child_id: None,
        }
    }

    #[tokio::test]
    async fn test_upsert_creates_then_updates() {
        let store = InMemorySyncStore::new();
        let now = Utc::now();

        let (first, created) = store.upsert_device_by_mac(&upsert("AA", None), now).await.unwrap();
        assert!(created);
        assert_eq!(first.id, 1);

        let (second, created) = store.upsert_device_by_mac(&upsert("AA", None), now).await.unwrap();
        assert!(!created);
        assert_eq!(second.id, first.id);
        assert_eq!(second.device_uuid, first.device_uuid);
    }

    #[tokio::test]
    async fn test_upsert_rejects_uuid_owned_by_other_device() {
        let store = InMemorySyncStore::new();
        let now = Utc::now();
        store.upsert_device_by_mac(&upsert("AA", Some("u-1")), now).await.unwrap();

        let err = store
            .upsert_device_by_mac(&upsert("BB", Some("u-1")), now)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_issue_requires_existing_device() {
        let store = InMemorySyncStore::new();
        let err = store
            .issue_command(
                &NewCommand {
                    device_id: 42,
                    app_name: "chrome".into(),
                    action: CommandAction::Kill,
                    schedule: None,
                },
                Utc::now(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_commands_newest_first_and_paged() {
        let store = InMemorySyncStore::new();
        let start = Utc::now();
        let (device, _) = store.upsert_device_by_mac(&upsert("AA", None), start).await.unwrap();

        for (i, app) in ["a", "b", "c"].iter().enumerate() {
            store
                .issue_command(
                    &NewCommand {
                        device_id: device.id,
                        app_name: app.to_string(),
                        action: CommandAction::Kill,
                        schedule: None,
                    },
                    start + Duration::seconds(i as i64),
                )
                .await
                .unwrap();
        }

        let page = store.list_commands(device.id, 2, 0).await.unwrap();
        let names: Vec<_> = page.iter().map(|c| c.app_name.as_str()).collect();
        assert_eq!(names, vec!["c", "b"]);

        let rest = store.list_commands(device.id, 2, 2).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].app_name, "a");
        assert_eq!(store.count_commands(device.id).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_reconcile_refreshes_device_last_seen() {
        let store = InMemorySyncStore::new();
        let start = Utc::now() - Duration::hours(1);
        let (device, _) = store.upsert_device_by_mac(&upsert("AA", None), start).await.unwrap();

        let later = start + Duration::minutes(30);
        let apps = vec![ReportedApp {
            app_name: "chrome".into(),
            window_title: None,
        }];
        store.reconcile_snapshot(device.id, &apps, later).await.unwrap();

        let device = store.find_device_by_id(device.id).await.unwrap().unwrap();
        assert_eq!(device.last_seen, Some(later));
    }
}
