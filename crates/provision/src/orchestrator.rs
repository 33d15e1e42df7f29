//! Rule chain import with cross-chain reference resolution.
//!
//! Rule chain templates reference other rule chains through
//! `metadata.ruleChainConnections`. Each connection names its target by a
//! template-local node id (`additionalInfo.ruleChainNodeId`); the caller
//! maps those node ids to rule chain names, and the names are resolved to
//! real ids through the session's [`ImportRegistry`]. Targets must
//! therefore be imported before the chains that reference them.

use std::collections::HashMap;
use std::path::Path;

use serde_json::{json, Map, Value};

use tbprov_core::error::{ProvisionError, ProvisionResult};
use tbprov_core::platform::PlatformApi;
use tbprov_core::registry::ImportRegistry;
use tbprov_core::rewrite::rewrite_tenant_refs;
use tbprov_core::template::{TemplateCategory, TemplateStore};
use tbprov_core::types::{RuleChainInfo, TenantId, ENTITY_TYPE_RULE_CHAIN};

const RULE_CHAIN_FIELD: &str = "ruleChain";
const METADATA_FIELD: &str = "metadata";
const CONNECTIONS_FIELD: &str = "ruleChainConnections";
const NODE_ID_FIELD: &str = "ruleChainNodeId";

/// Imports rule chain templates for one session.
pub struct RuleChainImporter<'a, P> {
    api: &'a P,
    store: &'a TemplateStore,
    registry: &'a mut ImportRegistry,
    tenant: &'a TenantId,
}

impl<'a, P: PlatformApi> RuleChainImporter<'a, P> {
    pub fn new(
        api: &'a P,
        store: &'a TemplateStore,
        registry: &'a mut ImportRegistry,
        tenant: &'a TenantId,
    ) -> Self {
        Self {
            api,
            store,
            registry,
            tenant,
        }
    }

    /// Import the rule chain template `file`.
    ///
    /// `references` maps template-local node ids to rule chain names.
    /// When it is non-empty every connection in the template must resolve
    /// to an already imported chain; otherwise nothing is sent to the
    /// platform. A root chain becomes the tenant's root rule chain; any
    /// other chain is registered for later references.
    pub async fn import(
        &mut self,
        file: &str,
        root: bool,
        references: &HashMap<String, String>,
    ) -> ProvisionResult<RuleChainInfo> {
        let path = self.store.template_path(TemplateCategory::RuleChains, file);
        let mut template = self.store.load(TemplateCategory::RuleChains, file)?;
        check_shape(&path, &template)?;

        if !references.is_empty() {
            let resolved = self.resolve_connections(file, &path, &mut template, references)?;
            tracing::debug!(file, resolved, "Resolved rule chain connections");
        }

        let rewritten = rewrite_tenant_refs(&mut template, self.tenant);
        tracing::debug!(file, rewritten, "Rewrote tenant references");

        let (rule_chain, mut metadata) = take_parts(template);

        let saved = self.api.save_rule_chain(&rule_chain).await?;
        let id = saved.rule_chain_id();

        if let Value::Object(fields) = &mut metadata {
            fields.insert(
                "ruleChainId".to_string(),
                json!({ "entityType": ENTITY_TYPE_RULE_CHAIN, "id": id.as_str() }),
            );
        }
        self.api.save_rule_chain_metadata(&metadata).await?;

        if root {
            self.api.set_root_rule_chain(&id).await?;
            tracing::info!(rule_chain = %saved.name, id = %id, file, "Imported root rule chain");
        } else {
            self.registry.register(saved.name.clone(), id.clone());
            tracing::info!(rule_chain = %saved.name, id = %id, file, "Imported rule chain");
        }

        Ok(saved)
    }

    /// Point every connection's `targetRuleChainId` at the imported chain
    /// it names. Returns the number of connections resolved.
    fn resolve_connections(
        &self,
        file: &str,
        path: &Path,
        template: &mut Value,
        references: &HashMap<String, String>,
    ) -> ProvisionResult<usize> {
        let connections = match template[METADATA_FIELD].get_mut(CONNECTIONS_FIELD) {
            None | Some(Value::Null) => return Ok(0),
            Some(Value::Array(connections)) => connections,
            Some(_) => {
                return Err(ProvisionError::template(
                    path,
                    format!("'{METADATA_FIELD}.{CONNECTIONS_FIELD}' must be an array"),
                ))
            }
        };

        for (idx, connection) in connections.iter_mut().enumerate() {
            let connection = connection.as_object_mut().ok_or_else(|| {
                ProvisionError::template(path, format!("rule chain connection {idx} is not an object"))
            })?;

            let node_ref = node_ref(connection).ok_or_else(|| {
                ProvisionError::template(
                    path,
                    format!("rule chain connection {idx} has no 'additionalInfo.{NODE_ID_FIELD}'"),
                )
            })?;

            let name = references
                .get(&node_ref)
                .ok_or_else(|| ProvisionError::UnmappedConnection {
                    template: file.to_string(),
                    node_ref: node_ref.clone(),
                })?;

            let Some(target) = self.registry.get(name) else {
                tracing::warn!(
                    file,
                    rule_chain = %name,
                    "Incorrect order of imported rule chains: referenced chain is not imported yet"
                );
                return Err(ProvisionError::OutOfOrderImport {
                    template: file.to_string(),
                    rule_chain: name.clone(),
                });
            };

            connection.insert(
                "targetRuleChainId".to_string(),
                json!({ "entityType": ENTITY_TYPE_RULE_CHAIN, "id": target.as_str() }),
            );
        }

        Ok(connections.len())
    }
}

/// Template-local node id a connection points at.
fn node_ref(connection: &Map<String, Value>) -> Option<String> {
    match connection.get("additionalInfo")?.get(NODE_ID_FIELD)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A rule chain template is an object with `ruleChain` and `metadata`
/// objects.
fn check_shape(path: &Path, template: &Value) -> ProvisionResult<()> {
    for field in [RULE_CHAIN_FIELD, METADATA_FIELD] {
        if !template.get(field).is_some_and(Value::is_object) {
            return Err(ProvisionError::template(
                path,
                format!("missing object field '{field}'"),
            ));
        }
    }
    Ok(())
}

fn take_parts(mut template: Value) -> (Value, Value) {
    let rule_chain = template[RULE_CHAIN_FIELD].take();
    let metadata = template[METADATA_FIELD].take();
    (rule_chain, metadata)
}
