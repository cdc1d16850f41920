//! Live application status (presence) domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Last-known running state of one application on one device.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveAppStatus {
    pub id: i64,
    pub device_id: i64,
    pub app_name: String,
    pub window_title: Option<String>,
    pub is_running: bool,
    pub last_seen: DateTime<Utc>,
}

/// One application entry in a presence snapshot.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEntry {
    #[validate(
        length(max = 255, message = "appName must be at most 255 characters"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub app_name: Option<String>,

    #[validate(length(max = 1024, message = "windowTitle must be at most 1024 characters"))]
    pub window_title: Option<String>,
}

/// Snapshot entry after validation, ready for the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportedApp {
    pub app_name: String,
    pub window_title: Option<String>,
}

/// Presence snapshot posted by an agent.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LiveStatusReport {
    pub device_uuid: Option<String>,
    pub device_id: Option<i64>,
    pub mac_address: Option<String>,
    pub machine_name: Option<String>,

    #[serde(default)]
    #[validate(nested)]
    pub apps: Vec<SnapshotEntry>,
}

/// Query parameters for reading live status.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveStatusQuery {
    pub device_uuid: Option<String>,
    pub device_id: Option<i64>,
    pub stale_seconds: Option<i64>,
}

/// Live status as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveAppResponse {
    pub app_name: String,
    pub window_title: Option<String>,
    pub last_seen: DateTime<Utc>,
}

impl From<LiveAppStatus> for LiveAppResponse {
    fn from(status: LiveAppStatus) -> Self {
        Self {
            app_name: status.app_name,
            window_title: status.window_title,
            last_seen: status.last_seen,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_deserializes_without_apps() {
        let report: LiveStatusReport = serde_json::from_str(r#"{"deviceId":4}"#).unwrap();
        assert_eq!(report.device_id, Some(4));
        assert!(report.apps.is_empty());
    }

    #[test]
    fn test_report_deserializes_apps() {
        let report: LiveStatusReport = serde_json::from_str(
            r#"{"deviceUuid":"u-1","apps":[{"appName":"chrome","windowTitle":"tab1"},{"appName":"edge"}]}"#,
        )
        .unwrap();
        assert_eq!(report.apps.len(), 2);
        assert_eq!(report.apps[0].window_title.as_deref(), Some("tab1"));
        assert!(report.apps[1].window_title.is_none());
    }

    #[test]
    fn test_report_nested_validation() {
        let report = LiveStatusReport {
            apps: vec![SnapshotEntry {
                app_name: Some("x".repeat(300)),
                window_title: None,
            }],
            ..Default::default()
        };
        assert!(report.validate().is_err());
    }

    #[test]
    fn test_snapshot_entry_rejects_blank_app_name() {
        let blank = SnapshotEntry {
            app_name: Some("   ".into()),
            window_title: None,
        };
        assert!(blank.validate().is_err());

        let named = SnapshotEntry {
            app_name: Some("chrome".into()),
            window_title: Some(String::new()),
        };
        assert!(named.validate().is_ok());
    }

    #[test]
    fn test_response_shape() {
        let status = LiveAppStatus {
            id: 1,
            device_id: 9,
            app_name: "edge".to_string(),
            window_title: Some("tabX".to_string()),
            is_running: true,
            last_seen: Utc::now(),
        };
        let json = serde_json::to_value(LiveAppResponse::from(status)).unwrap();
        assert_eq!(json["appName"], "edge");
        assert_eq!(json["windowTitle"], "tabX");
        assert!(json["lastSeen"].is_string());
        assert!(json.get("isRunning").is_none());
    }

    #[test]
    fn test_query_deserializes_stale_seconds() {
        let query: LiveStatusQuery =
            serde_json::from_str(r#"{"deviceUuid":"u","staleSeconds":60}"#).unwrap();
        assert_eq!(query.stale_seconds, Some(60));
    }
}
