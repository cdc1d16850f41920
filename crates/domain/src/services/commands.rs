//! Command ledger: issuance, delivery and acknowledgment.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::DomainError;
use crate::models::{CommandAction, ControlCommand, Delivery, NewCommand, PendingCommand};
use crate::store::SyncStore;
use shared::pagination::{PageRequest, Pagination};

#[derive(Clone)]
pub struct CommandLedger {
    store: Arc<dyn SyncStore>,
}

impl CommandLedger {
    pub fn new(store: Arc<dyn SyncStore>) -> Self {
        Self { store }
    }

    /// Activates the `(device, app, action)` command, cancelling whatever the
    /// action supersedes.
    pub async fn issue(
        &self,
        device_id: i64,
        app_name: String,
        action: CommandAction,
        schedule: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<ControlCommand, DomainError> {
        let command = NewCommand {
            device_id,
            app_name,
            action,
            schedule: if action.carries_schedule() { schedule } else { None },
        };
        let issued = self.store.issue_command(&command, now).await?;

        tracing::info!(
            device_id,
            app_name = %issued.app_name,
            action = %action,
            command_id = issued.id,
            "Command issued"
        );
        Ok(issued)
    }

    /// Active commands for delivery. One-shot commands are consumed.
    pub async fn pending(&self, device_id: i64) -> Result<Vec<PendingCommand>, DomainError> {
        let commands = self.store.take_pending(device_id).await?;

        let consumed = commands
            .iter()
            .filter(|c| c.action.delivery() == Delivery::OneShot)
            .count();
        tracing::debug!(
            device_id,
            delivered = commands.len(),
            consumed,
            "Pending commands delivered"
        );

        Ok(commands.into_iter().map(PendingCommand::from).collect())
    }

    /// Deactivates a command. Unknown or inactive ids are ignored.
    pub async fn ack(&self, command_id: i64) -> Result<(), DomainError> {
        let deactivated = self.store.deactivate_command(command_id).await?;
        tracing::debug!(command_id, deactivated, "Command acknowledged");
        Ok(())
    }

    pub async fn history(
        &self,
        device_id: i64,
        page: PageRequest,
    ) -> Result<(Vec<ControlCommand>, Pagination), DomainError> {
        let total = self.store.count_commands(device_id).await?;
        let rows = self
            .store
            .list_commands(device_id, page.limit(), page.offset())
            .await?;
        Ok((rows, Pagination::new(page, total)))
    }
}
