//! Control command entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::error::DomainError;
use domain::models::{CommandAction, ControlCommand};
use sqlx::FromRow;

/// Database row mapping for the control_commands table.
#[derive(Debug, Clone, FromRow)]
pub struct ControlCommandEntity {
    pub id: i64,
    pub device_id: i64,
    pub app_name: String,
    pub action: String,
    pub schedule: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<ControlCommandEntity> for ControlCommand {
    type Error = DomainError;

    fn try_from(entity: ControlCommandEntity) -> Result<Self, Self::Error> {
        let action: CommandAction = entity
            .action
            .parse()
            .map_err(DomainError::Storage)?;
        Ok(Self {
            id: entity.id,
            device_id: entity.device_id,
            app_name: entity.app_name,
            action,
            schedule: entity.schedule,
            is_active: entity.is_active,
            created_at: entity.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(action: &str) -> ControlCommandEntity {
        ControlCommandEntity {
            id: 1,
            device_id: 2,
            app_name: "chrome".to_string(),
            action: action.to_string(),
            schedule: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_entity_to_domain() {
        let command = ControlCommand::try_from(entity("relaunch")).unwrap();
        assert_eq!(command.action, CommandAction::Relaunch);
        assert_eq!(command.device_id, 2);
    }

    #[test]
    fn test_unknown_action_is_storage_error() {
        let err = ControlCommand::try_from(entity("reboot")).unwrap_err();
        assert!(matches!(err, DomainError::Storage(_)));
    }
}
