//! The remote platform operations provisioning depends on.
//!
//! [`PlatformApi`] is implemented over HTTP by `tbprov-client` and by
//! recording fakes in tests. Request bodies are passed through as raw
//! JSON so template fields the platform knows about but provisioning
//! does not are preserved.

use std::future::Future;

use serde_json::Value;

use crate::error::RemoteError;
use crate::types::{
    AttributeScope, CurrentUser, DashboardInfo, EntityId, RuleChainId, RuleChainInfo,
    WidgetsBundleInfo,
};

/// Result type of every platform call.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// REST operations against the IoT platform, scoped to one logged-in user.
pub trait PlatformApi: Send + Sync {
    /// Authenticate and keep the session token for subsequent calls.
    fn login(
        &mut self,
        username: &str,
        password: &str,
    ) -> impl Future<Output = RemoteResult<()>> + Send;

    /// Profile of the authenticated user.
    fn current_user(&self) -> impl Future<Output = RemoteResult<CurrentUser>> + Send;

    /// Find an existing rule chain by exact name.
    fn find_rule_chain(
        &self,
        name: &str,
    ) -> impl Future<Output = RemoteResult<Option<RuleChainInfo>>> + Send;

    /// Create a rule chain from its definition (without metadata).
    fn save_rule_chain(
        &self,
        rule_chain: &Value,
    ) -> impl Future<Output = RemoteResult<RuleChainInfo>> + Send;

    /// Save nodes and connections of a rule chain. `metadata.ruleChainId`
    /// identifies the chain.
    fn save_rule_chain_metadata(
        &self,
        metadata: &Value,
    ) -> impl Future<Output = RemoteResult<()>> + Send;

    /// Make the given chain the tenant's root rule chain.
    fn set_root_rule_chain(
        &self,
        id: &RuleChainId,
    ) -> impl Future<Output = RemoteResult<()>> + Send;

    fn save_dashboard(
        &self,
        dashboard: &Value,
    ) -> impl Future<Output = RemoteResult<DashboardInfo>> + Send;

    fn save_widgets_bundle(
        &self,
        bundle: &Value,
    ) -> impl Future<Output = RemoteResult<WidgetsBundleInfo>> + Send;

    fn save_widget_type(
        &self,
        widget_type: &Value,
    ) -> impl Future<Output = RemoteResult<()>> + Send;

    /// Write `attributes` (a JSON object) onto `entity` in `scope`.
    fn save_entity_attributes(
        &self,
        entity: &EntityId,
        scope: AttributeScope,
        attributes: &Value,
    ) -> impl Future<Output = RemoteResult<()>> + Send;
}
