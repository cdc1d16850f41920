//! Control command domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use shared::pagination::Pagination;

/// Action a command asks the agent to perform on an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandAction {
    Kill,
    Relaunch,
    Schedule,
}

/// How long a command stays visible to polling agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Returned on every poll until acknowledged or superseded.
    Persistent,
    /// Returned on exactly one poll, then deactivated.
    OneShot,
}

impl CommandAction {
    pub const ALL: [CommandAction; 3] = [Self::Kill, Self::Relaunch, Self::Schedule];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kill => "kill",
            Self::Relaunch => "relaunch",
            Self::Schedule => "schedule",
        }
    }

    pub fn delivery(&self) -> Delivery {
        match self {
            Self::Kill => Delivery::Persistent,
            Self::Relaunch | Self::Schedule => Delivery::OneShot,
        }
    }

    /// Actions on the same app that issuing this one cancels.
    pub fn supersedes(&self) -> &'static [CommandAction] {
        match self {
            Self::Relaunch => &[Self::Kill],
            Self::Kill | Self::Schedule => &[],
        }
    }

    pub fn carries_schedule(&self) -> bool {
        matches!(self, Self::Schedule)
    }
}

impl std::fmt::Display for CommandAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CommandAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "kill" => Ok(Self::Kill),
            "relaunch" => Ok(Self::Relaunch),
            "schedule" => Ok(Self::Schedule),
            _ => Err(format!("Invalid command action: {}", s)),
        }
    }
}

/// One instruction directed at a device for a target application.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlCommand {
    pub id: i64,
    pub device_id: i64,
    pub app_name: String,
    pub action: CommandAction,
    pub schedule: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Write set for issuing a command.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCommand {
    pub device_id: i64,
    /// Already normalized to lowercase.
    pub app_name: String,
    pub action: CommandAction,
    pub schedule: Option<String>,
}

/// Request payload for the kill/relaunch/schedule endpoints.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IssueCommandRequest {
    pub device_id: Option<i64>,

    #[validate(length(max = 128, message = "deviceUuid must be at most 128 characters"))]
    pub device_uuid: Option<String>,

    #[validate(length(max = 64, message = "macAddress must be at most 64 characters"))]
    pub mac_address: Option<String>,

    #[validate(
        length(max = 255, message = "appName must be at most 255 characters"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub app_name: Option<String>,

    #[validate(length(max = 1024, message = "schedule must be at most 1024 characters"))]
    pub schedule: Option<String>,
}

/// A command as delivered to a polling agent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingCommand {
    pub id: i64,
    pub app_name: String,
    pub action: CommandAction,
    pub schedule: Option<String>,
}

impl From<ControlCommand> for PendingCommand {
    fn from(command: ControlCommand) -> Self {
        Self {
            id: command.id,
            app_name: command.app_name,
            action: command.action,
            schedule: command.schedule,
        }
    }
}

/// Query parameters for the command history listing.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CommandHistoryQuery {
    pub device_id: Option<i64>,
    pub device_uuid: Option<String>,
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    #[validate(range(min = 1))]
    pub per_page: Option<u32>,
}

/// One page of command history.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandHistoryResponse {
    pub data: Vec<ControlCommand>,
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_round_trips_through_str() {
        for action in CommandAction::ALL {
            assert_eq!(action.as_str().parse::<CommandAction>().unwrap(), action);
        }
        assert!("wipe".parse::<CommandAction>().is_err());
    }

    #[test]
    fn test_only_kill_is_persistent() {
        assert_eq!(CommandAction::Kill.delivery(), Delivery::Persistent);
        assert_eq!(CommandAction::Relaunch.delivery(), Delivery::OneShot);
        assert_eq!(CommandAction::Schedule.delivery(), Delivery::OneShot);
    }

    #[test]
    fn test_relaunch_supersedes_kill() {
        assert_eq!(CommandAction::Relaunch.supersedes(), &[CommandAction::Kill]);
        assert!(CommandAction::Kill.supersedes().is_empty());
        assert!(CommandAction::Schedule.supersedes().is_empty());
    }

    #[test]
    fn test_action_serializes_lowercase() {
        let json = serde_json::to_value(CommandAction::Relaunch).unwrap();
        assert_eq!(json, "relaunch");
    }

    #[test]
    fn test_pending_command_shape() {
        let command = ControlCommand {
            id: 11,
            device_id: 2,
            app_name: "chrome".to_string(),
            action: CommandAction::Schedule,
            schedule: Some("mon-fri 08:00-15:00".to_string()),
            is_active: true,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(PendingCommand::from(command)).unwrap();
        assert_eq!(json["id"], 11);
        assert_eq!(json["appName"], "chrome");
        assert_eq!(json["action"], "schedule");
        assert_eq!(json["schedule"], "mon-fri 08:00-15:00");
        assert!(json.get("deviceId").is_none());
    }

    #[test]
    fn test_issue_request_deserializes() {
        let req: IssueCommandRequest =
            serde_json::from_str(r#"{"deviceUuid":"abc","appName":"Chrome"}"#).unwrap();
        assert_eq!(req.device_uuid.as_deref(), Some("abc"));
        assert_eq!(req.app_name.as_deref(), Some("Chrome"));
        assert!(req.device_id.is_none());
    }

    #[test]
    fn test_issue_request_rejects_blank_app_name() {
        let blank = IssueCommandRequest {
            device_id: Some(1),
            app_name: Some(" \t".into()),
            ..Default::default()
        };
        let err = blank.validate().unwrap_err();
        assert!(err.field_errors().contains_key("app_name"));

        let missing = IssueCommandRequest {
            device_id: Some(1),
            ..Default::default()
        };
        assert!(missing.validate().is_ok());
    }
}
