//! Device identity resolution across alternative keys.
//!
//! Agents present whatever identifiers they have at hand. The resolver walks
//! an ordered list of lookup keys; a key whose hint is absent is skipped and
//! a key whose hint misses falls through to the next one.

use std::sync::Arc;

use crate::error::DomainError;
use crate::models::{Device, IdentityHints};
use crate::store::SyncStore;

/// One identity key a device can be looked up by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKey {
    Uuid,
    Id,
    MacAddress,
    MachineName,
}

impl LookupKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uuid => "uuid",
            Self::Id => "id",
            Self::MacAddress => "mac_address",
            Self::MachineName => "machine_name",
        }
    }
}

impl std::fmt::Display for LookupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order used for agent polls and presence reports.
pub const AGENT_REPORT: &[LookupKey] = &[
    LookupKey::Uuid,
    LookupKey::Id,
    LookupKey::MacAddress,
    LookupKey::MachineName,
];

/// Order used when an operator issues a command.
pub const COMMAND_ISSUE: &[LookupKey] = &[LookupKey::Id, LookupKey::Uuid, LookupKey::MacAddress];

/// Order used when reading presence.
pub const PRESENCE_QUERY: &[LookupKey] = &[LookupKey::Uuid, LookupKey::Id];

/// Resolves identity hints to a single device. Read-only.
#[derive(Clone)]
pub struct IdentityResolver {
    store: Arc<dyn SyncStore>,
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn SyncStore>) -> Self {
        Self { store }
    }

    /// First device matched by `order`, or `None`.
    pub async fn resolve(
        &self,
        hints: &IdentityHints,
        order: &[LookupKey],
    ) -> Result<Option<Device>, DomainError> {
        for key in order {
            let found = match key {
                LookupKey::Uuid => match hints.device_uuid.as_deref() {
                    Some(uuid) => self.store.find_device_by_uuid(uuid).await?,
                    None => continue,
                },
                LookupKey::Id => match hints.device_id {
                    Some(id) => self.store.find_device_by_id(id).await?,
                    None => continue,
                },
                LookupKey::MacAddress => match hints.mac_address.as_deref() {
                    Some(mac) => self.store.find_device_by_mac(mac).await?,
                    None => continue,
                },
                LookupKey::MachineName => match hints.machine_name.as_deref() {
                    Some(name) => self.store.find_device_by_machine_name(name).await?,
                    None => continue,
                },
            };

            if let Some(device) = found {
                tracing::debug!(device_id = device.id, key = %key, "Resolved device identity");
                return Ok(Some(device));
            }
        }

        Ok(None)
    }

    /// Like [`resolve`](Self::resolve) but a miss is `DeviceNotFound`.
    pub async fn resolve_required(
        &self,
        hints: &IdentityHints,
        order: &[LookupKey],
    ) -> Result<Device, DomainError> {
        match self.resolve(hints, order).await? {
            Some(device) => Ok(device),
            None => {
                tracing::warn!(
                    device_uuid = ?hints.device_uuid,
                    device_id = ?hints.device_id,
                    mac_address = ?hints.mac_address,
                    machine_name = ?hints.machine_name,
                    "No device matches the supplied identity"
                );
                Err(DomainError::DeviceNotFound)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DeviceUpsert;
    use crate::store::{DeviceStore, InMemorySyncStore};
    use chrono::Utc;

    async fn register(store: &InMemorySyncStore, mac: &str, uuid: &str, name: &str) -> Device {
        let (device, _) = store
            .upsert_device_by_mac(
                &DeviceUpsert {
                    mac_address: mac.to_string(),
                    supplied_uuid: Some(uuid.to_string()),
                    generated_uuid: String::new(),
                    machine_name: Some(name.to_string()),
                    user_name: None,
                    os: None,
                    child_id: None,
                },
                Utc::now(),
            )
            .await
            .unwrap();
        device
    }

    async fn setup() -> (IdentityResolver, Device, Device) {
        let store = Arc::new(InMemorySyncStore::new());
        let a = register(&store, "AA", "uuid-a", "PC-A").await;
        let b = register(&store, "BB", "uuid-b", "PC-B").await;
        (IdentityResolver::new(store), a, b)
    }

    #[tokio::test]
    async fn test_first_present_key_wins() {
        let (resolver, a, b) = setup().await;
        // uuid points at A, id points at B
        let hints = IdentityHints::new(Some("uuid-a"), Some(b.id), None, None);

        let agent = resolver.resolve(&hints, AGENT_REPORT).await.unwrap().unwrap();
        assert_eq!(agent.id, a.id);

        let operator = resolver.resolve(&hints, COMMAND_ISSUE).await.unwrap().unwrap();
        assert_eq!(operator.id, b.id);
    }

    #[tokio::test]
    async fn test_miss_falls_through_to_next_key() {
        let (resolver, a, _) = setup().await;
        let hints = IdentityHints::new(Some("unknown"), Some(999), Some("AA"), None);

        let device = resolver.resolve(&hints, AGENT_REPORT).await.unwrap().unwrap();
        assert_eq!(device.id, a.id);
    }

    #[tokio::test]
    async fn test_machine_name_only_in_agent_order() {
        let (resolver, _, b) = setup().await;
        let hints = IdentityHints::new(None, None, None, Some("PC-B"));

        let device = resolver.resolve(&hints, AGENT_REPORT).await.unwrap().unwrap();
        assert_eq!(device.id, b.id);
        assert!(resolver.resolve(&hints, COMMAND_ISSUE).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_presence_order_ignores_mac() {
        let (resolver, _, _) = setup().await;
        let hints = IdentityHints::new(None, None, Some("AA"), None);
        assert!(resolver.resolve(&hints, PRESENCE_QUERY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_resolve_required_not_found() {
        let (resolver, _, _) = setup().await;
        let err = resolver
            .resolve_required(&IdentityHints::by_uuid("nope"), AGENT_REPORT)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::DeviceNotFound));
    }
}
