//! Shared fixtures: a recording in-memory [`PlatformApi`] and helpers to
//! lay out template data directories.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use serde_json::{json, Value};

use tbprov_core::error::RemoteError;
use tbprov_core::platform::{PlatformApi, RemoteResult};
use tbprov_core::template::{TemplateCategory, TemplateStore, MANIFEST_FILE};
use tbprov_core::types::{
    AttributeScope, CurrentUser, DashboardInfo, EntityId, RuleChainId, RuleChainInfo,
    WidgetsBundleInfo,
};
use tbprov_provision::config::Credentials;

/// A remote call as observed by [`FakePlatform`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Login(String),
    CurrentUser,
    FindRuleChain(String),
    SaveRuleChain(Value),
    SaveRuleChainMetadata(Value),
    SetRootRuleChain(RuleChainId),
    SaveDashboard(Value),
    SaveWidgetsBundle(Value),
    SaveWidgetType(Value),
    SaveAttributes {
        entity: EntityId,
        scope: &'static str,
        attributes: Value,
    },
}

/// In-memory platform that records every call and assigns sequential ids
/// (`rc-1`, `rc-2`, ...) to saved rule chains.
pub struct FakePlatform {
    tenant_id: String,
    existing: HashMap<String, String>,
    calls: Mutex<Vec<Call>>,
    next_id: Mutex<usize>,
}

impl FakePlatform {
    pub fn for_tenant(tenant_id: &str) -> Self {
        Self {
            tenant_id: tenant_id.to_string(),
            existing: HashMap::new(),
            calls: Mutex::new(Vec::new()),
            next_id: Mutex::new(0),
        }
    }

    /// Add a rule chain that already exists on the platform.
    pub fn with_existing(mut self, name: &str, id: &str) -> Self {
        self.existing.insert(name.to_string(), id.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls after login and tenant resolution.
    pub fn writes(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| !matches!(call, Call::Login(_) | Call::CurrentUser | Call::FindRuleChain(_)))
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn next_rule_chain_id(&self) -> String {
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        format!("rc-{next}")
    }
}

impl PlatformApi for FakePlatform {
    async fn login(&mut self, username: &str, _password: &str) -> RemoteResult<()> {
        self.record(Call::Login(username.to_string()));
        Ok(())
    }

    async fn current_user(&self) -> RemoteResult<CurrentUser> {
        self.record(Call::CurrentUser);
        serde_json::from_value(json!({
            "email": "tenant@thingsboard.org",
            "authority": "TENANT_ADMIN",
            "tenantId": { "entityType": "TENANT", "id": self.tenant_id }
        }))
        .map_err(|e| RemoteError::Decode(e.to_string()))
    }

    async fn find_rule_chain(&self, name: &str) -> RemoteResult<Option<RuleChainInfo>> {
        self.record(Call::FindRuleChain(name.to_string()));
        Ok(self.existing.get(name).map(|id| RuleChainInfo {
            id: EntityId::new("RULE_CHAIN", id.clone()),
            name: name.to_string(),
            root: false,
        }))
    }

    async fn save_rule_chain(&self, rule_chain: &Value) -> RemoteResult<RuleChainInfo> {
        self.record(Call::SaveRuleChain(rule_chain.clone()));
        Ok(RuleChainInfo {
            id: EntityId::new("RULE_CHAIN", self.next_rule_chain_id()),
            name: rule_chain["name"].as_str().unwrap_or_default().to_string(),
            root: false,
        })
    }

    async fn save_rule_chain_metadata(&self, metadata: &Value) -> RemoteResult<()> {
        self.record(Call::SaveRuleChainMetadata(metadata.clone()));
        Ok(())
    }

    async fn set_root_rule_chain(&self, id: &RuleChainId) -> RemoteResult<()> {
        self.record(Call::SetRootRuleChain(id.clone()));
        Ok(())
    }

    async fn save_dashboard(&self, dashboard: &Value) -> RemoteResult<DashboardInfo> {
        self.record(Call::SaveDashboard(dashboard.clone()));
        Ok(DashboardInfo {
            id: EntityId::new("DASHBOARD", "dash-1"),
            title: dashboard["title"].as_str().unwrap_or_default().to_string(),
        })
    }

    async fn save_widgets_bundle(&self, bundle: &Value) -> RemoteResult<WidgetsBundleInfo> {
        self.record(Call::SaveWidgetsBundle(bundle.clone()));
        let alias = bundle["alias"]
            .as_str()
            .unwrap_or("generated_alias")
            .to_string();
        Ok(WidgetsBundleInfo {
            id: EntityId::new("WIDGETS_BUNDLE", "wb-1"),
            alias,
            title: bundle["title"].as_str().map(str::to_string),
        })
    }

    async fn save_widget_type(&self, widget_type: &Value) -> RemoteResult<()> {
        self.record(Call::SaveWidgetType(widget_type.clone()));
        Ok(())
    }

    async fn save_entity_attributes(
        &self,
        entity: &EntityId,
        scope: AttributeScope,
        attributes: &Value,
    ) -> RemoteResult<()> {
        self.record(Call::SaveAttributes {
            entity: entity.clone(),
            scope: scope.as_str(),
            attributes: attributes.clone(),
        });
        Ok(())
    }
}

pub fn credentials() -> Credentials {
    Credentials {
        username: "tenant@thingsboard.org".to_string(),
        password: "tenant".to_string(),
    }
}

/// Write `value` as JSON to `path`, creating parent directories.
pub fn write_json(path: &Path, value: &Value) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, serde_json::to_vec_pretty(value).unwrap()).unwrap();
}

pub fn write_template(store: &TemplateStore, category: TemplateCategory, file: &str, value: Value) {
    write_json(&store.template_path(category, file), &value);
}

pub fn write_manifest(store: &TemplateStore, value: Value) {
    write_json(&store.root().join(MANIFEST_FILE), &value);
}

/// A rule chain template named `name` whose metadata connects to the
/// given template-local node ids.
pub fn rule_chain_template(name: &str, node_refs: &[&str]) -> Value {
    let connections: Vec<Value> = node_refs
        .iter()
        .map(|node_ref| {
            json!({
                "fromIndex": 0,
                "targetRuleChainId": { "entityType": "RULE_CHAIN", "id": "00000000-0000-0000-0000-000000000000" },
                "additionalInfo": { "ruleChainNodeId": node_ref },
                "type": "Success"
            })
        })
        .collect();

    json!({
        "ruleChain": {
            "name": name,
            "root": false,
            "debugMode": false,
            "additionalInfo": null
        },
        "metadata": {
            "firstNodeIndex": 0,
            "nodes": [
                {
                    "type": "org.thingsboard.rule.engine.filter.TbJsFilterNode",
                    "name": "Filter",
                    "configuration": { "jsScript": "return true;" }
                }
            ],
            "connections": [],
            "ruleChainConnections": connections
        }
    })
}
