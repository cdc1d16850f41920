//! Request-facing synchronization service.
//!
//! Validates caller input, resolves device identity and delegates to the
//! command ledger and presence reconciler. Holds no state besides its
//! collaborators and clock.

use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::clock::Clock;
use crate::error::DomainError;
use crate::models::{
    CommandAction, CommandHistoryQuery, CommandHistoryResponse, ControlCommand, Device,
    DeviceRegistration, DeviceResponse, DeviceUpsert, IdentityHints, IssueCommandRequest,
    LiveAppResponse, LiveStatusQuery, LiveStatusReport, PendingCommand, RegisterDeviceRequest,
    ReportedApp,
};
use crate::services::commands::CommandLedger;
use crate::services::identity::{self, IdentityResolver};
use crate::services::presence::PresenceReconciler;
use crate::store::SyncStore;
use shared::pagination::PageRequest;
use shared::validation::{non_blank, normalize_app_name};

/// Bounds applied to caller-controlled sizes.
#[derive(Debug, Clone, Copy)]
pub struct SyncLimits {
    pub max_snapshot_apps: usize,
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for SyncLimits {
    fn default() -> Self {
        Self {
            max_snapshot_apps: 500,
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

const MISSING_IDENTITY: &str = "deviceUuid, deviceId, macAddress or machineName is required";

pub struct SyncService {
    store: Arc<dyn SyncStore>,
    clock: Arc<dyn Clock>,
    limits: SyncLimits,
    resolver: IdentityResolver,
    ledger: CommandLedger,
    presence: PresenceReconciler,
}

impl SyncService {
    pub fn new(store: Arc<dyn SyncStore>, clock: Arc<dyn Clock>, limits: SyncLimits) -> Self {
        Self {
            resolver: IdentityResolver::new(store.clone()),
            ledger: CommandLedger::new(store.clone()),
            presence: PresenceReconciler::new(store.clone()),
            store,
            clock,
            limits,
        }
    }

    pub fn limits(&self) -> SyncLimits {
        self.limits
    }

    // Device registry

    /// Registers a device or updates the one holding the same MAC address.
    pub async fn register_device(
        &self,
        request: RegisterDeviceRequest,
    ) -> Result<DeviceRegistration, DomainError> {
        request.validate()?;

        let mac_address = non_blank(request.mac_address.as_deref())
            .ok_or_else(|| DomainError::validation("macAddress is required"))?
            .to_string();

        let upsert = DeviceUpsert {
            mac_address,
            supplied_uuid: non_blank(request.device_uuid.as_deref()).map(str::to_string),
            generated_uuid: Uuid::new_v4().to_string(),
            machine_name: non_blank(request.machine_name.as_deref()).map(str::to_string),
            user_name: non_blank(request.user_name.as_deref()).map(str::to_string),
            os: non_blank(request.os.as_deref()).map(str::to_string),
            child_id: request.child_id,
        };

        let (device, created) = self
            .store
            .upsert_device_by_mac(&upsert, self.clock.now())
            .await?;

        tracing::info!(
            device_id = device.id,
            device_uuid = %device.device_uuid,
            created,
            "Device registered"
        );

        Ok(DeviceRegistration { device, created })
    }

    pub async fn list_devices(&self) -> Result<Vec<Device>, DomainError> {
        self.store.list_devices().await
    }

    pub async fn list_unassigned_devices(&self) -> Result<Vec<Device>, DomainError> {
        self.store.list_unassigned_devices().await
    }

    pub async fn lookup_by_mac(
        &self,
        mac_address: Option<&str>,
    ) -> Result<DeviceResponse, DomainError> {
        let mac = non_blank(mac_address)
            .ok_or_else(|| DomainError::validation("macAddress is required"))?;

        self.store
            .find_device_by_mac(mac)
            .await?
            .map(DeviceResponse::from)
            .ok_or_else(|| DomainError::NotFound(format!("No device with macAddress {}", mac)))
    }

    // Command ledger

    pub async fn issue_command(
        &self,
        action: CommandAction,
        request: IssueCommandRequest,
    ) -> Result<ControlCommand, DomainError> {
        request.validate()?;

        let hints = IdentityHints::new(
            request.device_uuid.as_deref(),
            request.device_id,
            request.mac_address.as_deref(),
            None,
        );
        require_hints(&hints)?;

        let app_name = non_blank(request.app_name.as_deref())
            .map(normalize_app_name)
            .ok_or_else(|| DomainError::validation("appName is required"))?;

        let schedule = non_blank(request.schedule.as_deref()).map(str::to_string);
        if action.carries_schedule() && schedule.is_none() {
            return Err(DomainError::validation("schedule is required"));
        }

        let device = self
            .resolver
            .resolve_required(&hints, identity::COMMAND_ISSUE)
            .await?;

        self.ledger
            .issue(device.id, app_name, action, schedule, self.clock.now())
            .await
    }

    pub async fn poll_pending(
        &self,
        hints: IdentityHints,
    ) -> Result<Vec<PendingCommand>, DomainError> {
        require_hints(&hints)?;
        let device = self
            .resolver
            .resolve_required(&hints, identity::AGENT_REPORT)
            .await?;
        self.ledger.pending(device.id).await
    }

    /// Acknowledges a command. Unknown ids are not an error.
    pub async fn ack_command(&self, command_id: i64) -> Result<(), DomainError> {
        self.ledger.ack(command_id).await
    }

    pub async fn command_history(
        &self,
        query: CommandHistoryQuery,
    ) -> Result<CommandHistoryResponse, DomainError> {
        query.validate()?;

        let hints = IdentityHints::new(query.device_uuid.as_deref(), query.device_id, None, None);
        require_hints(&hints)?;
        let device = self
            .resolver
            .resolve_required(&hints, identity::COMMAND_ISSUE)
            .await?;

        let page = PageRequest::new(
            query.page,
            query.per_page,
            self.limits.default_page_size,
            self.limits.max_page_size,
        );
        let (data, pagination) = self.ledger.history(device.id, page).await?;
        Ok(CommandHistoryResponse { data, pagination })
    }

    // Presence

    pub async fn post_live_status(
        &self,
        report: LiveStatusReport,
    ) -> Result<Vec<LiveAppResponse>, DomainError> {
        report.validate()?;

        let hints = IdentityHints::new(
            report.device_uuid.as_deref(),
            report.device_id,
            report.mac_address.as_deref(),
            report.machine_name.as_deref(),
        );
        require_hints(&hints)?;

        if report.apps.len() > self.limits.max_snapshot_apps {
            return Err(DomainError::validation(format!(
                "apps must contain at most {} entries",
                self.limits.max_snapshot_apps
            )));
        }

        let apps = report
            .apps
            .iter()
            .map(|entry| {
                let app_name = non_blank(entry.app_name.as_deref())
                    .ok_or_else(|| DomainError::validation("apps[].appName is required"))?;
                Ok(ReportedApp {
                    app_name: app_name.to_string(),
                    window_title: entry.window_title.clone(),
                })
            })
            .collect::<Result<Vec<_>, DomainError>>()?;

        let device = self
            .resolver
            .resolve_required(&hints, identity::AGENT_REPORT)
            .await?;

        self.presence.report(device.id, apps, self.clock.now()).await
    }

    /// Running apps for a device. Unknown devices yield an empty list.
    pub async fn get_live_status(
        &self,
        query: LiveStatusQuery,
    ) -> Result<Vec<LiveAppResponse>, DomainError> {
        let hints = IdentityHints::new(query.device_uuid.as_deref(), query.device_id, None, None);
        hints.check_ids()?;
        if hints.is_empty() {
            return Ok(Vec::new());
        }

        match self.resolver.resolve(&hints, identity::PRESENCE_QUERY).await? {
            Some(device) => {
                self.presence
                    .running(device.id, query.stale_seconds, self.clock.now())
                    .await
            }
            None => Ok(Vec::new()),
        }
    }

    pub async fn ping(&self) -> Result<(), DomainError> {
        self.store.ping().await
    }
}

fn require_hints(hints: &IdentityHints) -> Result<(), DomainError> {
    hints.check_ids()?;
    if hints.is_empty() {
        return Err(DomainError::validation(MISSING_IDENTITY));
    }
    Ok(())
}
