//! Identifiers and entity records exchanged with the platform.
//!
//! Identifiers are kept opaque: the platform issues UUIDs, but nothing
//! in provisioning depends on their structure.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Entity type name of a tenant.
pub const ENTITY_TYPE_TENANT: &str = "TENANT";

/// Entity type name of a rule chain.
pub const ENTITY_TYPE_RULE_CHAIN: &str = "RULE_CHAIN";

/// Tenant id the platform reports for users outside any tenant
/// (system administrators).
pub const SYSTEM_TENANT_UUID: Uuid = Uuid::from_u128(0x1381_4000_1dd2_11b2_8080_8080_8080_8080);

/// Typed reference to a platform entity, as serialized by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityId {
    pub entity_type: String,
    pub id: String,
}

impl EntityId {
    pub fn new(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }
}

/// Identifier of the tenant being provisioned. Resolved once per session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` for an empty id or the platform's system tenant.
    pub fn is_system(&self) -> bool {
        self.0.is_empty()
            || Uuid::parse_str(&self.0)
                .map(|id| id == SYSTEM_TENANT_UUID || id.is_nil())
                .unwrap_or(false)
    }

    /// Entity reference used for tenant-scoped attribute writes.
    pub fn entity_id(&self) -> EntityId {
        EntityId::new(ENTITY_TYPE_TENANT, self.0.clone())
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier assigned by the platform to a saved rule chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleChainId(String);

impl RuleChainId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn entity_id(&self) -> EntityId {
        EntityId::new(ENTITY_TYPE_RULE_CHAIN, self.0.clone())
    }
}

impl fmt::Display for RuleChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Profile of the authenticated user. Only the fields provisioning needs.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub authority: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<EntityId>,
}

impl CurrentUser {
    /// The user's tenant, or `None` for users outside any tenant.
    pub fn tenant(&self) -> Option<TenantId> {
        self.tenant_id
            .as_ref()
            .map(|entity| TenantId::new(entity.id.clone()))
            .filter(|tenant| !tenant.is_system())
    }
}

/// A rule chain as returned by the platform after save or lookup.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleChainInfo {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub root: bool,
}

impl RuleChainInfo {
    pub fn rule_chain_id(&self) -> RuleChainId {
        RuleChainId::new(self.id.id.clone())
    }
}

/// A dashboard as returned by the platform after save.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardInfo {
    pub id: EntityId,
    pub title: String,
}

/// A widgets bundle as returned by the platform after save.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetsBundleInfo {
    pub id: EntityId,
    pub alias: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// Attribute scope for entity attribute writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttributeScope {
    #[default]
    Server,
    Shared,
    Client,
}

impl AttributeScope {
    /// Wire name used in the telemetry endpoint path.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Server => "SERVER_SCOPE",
            Self::Shared => "SHARED_SCOPE",
            Self::Client => "CLIENT_SCOPE",
        }
    }
}
