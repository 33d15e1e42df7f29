//! A provisioning session: one authenticated platform client, one
//! resolved tenant and the registry of rule chains known so far.
//!
//! Every operation is a sequence of awaited remote calls; nothing runs
//! concurrently. Nothing is deduplicated either, so re-running against a
//! provisioned tenant creates duplicates.

use std::collections::HashMap;

use serde_json::Value;

use tbprov_core::error::{ProvisionError, ProvisionResult};
use tbprov_core::platform::PlatformApi;
use tbprov_core::registry::ImportRegistry;
use tbprov_core::rewrite::rewrite_tenant_refs;
use tbprov_core::template::{TemplateCategory, TemplateStore};
use tbprov_core::types::{
    AttributeScope, DashboardInfo, EntityId, RuleChainInfo, TenantId, WidgetsBundleInfo,
};

use crate::config::Credentials;
use crate::orchestrator::RuleChainImporter;

/// A widgets bundle and the number of widget types created in it.
#[derive(Debug, Clone)]
pub struct CreatedWidgetsBundle {
    pub bundle: WidgetsBundleInfo,
    pub widget_types: usize,
}

/// Session state owned by the provisioning driver.
pub struct ProvisioningSession<P> {
    api: P,
    store: TemplateStore,
    tenant: TenantId,
    registry: ImportRegistry,
}

impl<P: PlatformApi> ProvisioningSession<P> {
    /// Log in and resolve the tenant the credentials belong to.
    ///
    /// Credentials outside any tenant (e.g. a system administrator) are a
    /// configuration error: there is nothing to provision into.
    pub async fn start(
        mut api: P,
        store: TemplateStore,
        credentials: &Credentials,
    ) -> ProvisionResult<Self> {
        api.login(&credentials.username, &credentials.password).await?;

        let user = api.current_user().await?;
        let tenant = user.tenant().ok_or_else(|| {
            ProvisionError::Configuration(format!(
                "User '{}' is not a tenant administrator",
                credentials.username
            ))
        })?;
        tracing::info!(tenant_id = %tenant, username = %credentials.username, "Resolved tenant");

        Ok(Self {
            api,
            store,
            tenant,
            registry: ImportRegistry::new(),
        })
    }

    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant
    }

    pub fn registry(&self) -> &ImportRegistry {
        &self.registry
    }

    pub fn store(&self) -> &TemplateStore {
        &self.store
    }

    pub fn api(&self) -> &P {
        &self.api
    }

    /// Register rule chains that already exist on the platform so that
    /// imported chains can reference them. Names not found are skipped.
    pub async fn seed_existing(&mut self, names: &[String]) -> ProvisionResult<usize> {
        let mut seeded = 0;
        for name in names {
            match self.api.find_rule_chain(name).await? {
                Some(chain) => {
                    self.registry.register(chain.name.clone(), chain.rule_chain_id());
                    seeded += 1;
                }
                None => {
                    tracing::warn!(rule_chain = %name, "Existing rule chain not found on platform, skipping");
                }
            }
        }
        Ok(seeded)
    }

    /// Import one rule chain template. See [`RuleChainImporter::import`].
    pub async fn import_rule_chain(
        &mut self,
        file: &str,
        root: bool,
        references: &HashMap<String, String>,
    ) -> ProvisionResult<RuleChainInfo> {
        RuleChainImporter::new(&self.api, &self.store, &mut self.registry, &self.tenant)
            .import(file, root, references)
            .await
    }

    /// Create a dashboard from template `file`.
    ///
    /// Tenant references are rewritten only inside
    /// `configuration.entityAliases`.
    pub async fn create_dashboard(&self, file: &str) -> ProvisionResult<DashboardInfo> {
        let path = self.store.template_path(TemplateCategory::Dashboards, file);
        let mut template = self.store.load(TemplateCategory::Dashboards, file)?;

        let title = template
            .get("title")
            .and_then(Value::as_str)
            .ok_or_else(|| ProvisionError::template(&path, "missing string field 'title'"))?
            .to_string();

        let configuration = template
            .get_mut("configuration")
            .filter(|configuration| configuration.is_object())
            .ok_or_else(|| ProvisionError::template(&path, "missing object field 'configuration'"))?;

        let mut rewritten = 0;
        match configuration.get_mut("entityAliases") {
            None | Some(Value::Null) => {}
            Some(Value::Object(aliases)) => {
                for alias in aliases.values_mut() {
                    rewritten += rewrite_tenant_refs(alias, &self.tenant);
                }
            }
            Some(_) => {
                return Err(ProvisionError::template(
                    &path,
                    "'configuration.entityAliases' must be an object",
                ))
            }
        }
        tracing::debug!(file, rewritten, "Rewrote tenant references in entity aliases");

        let body = serde_json::json!({
            "title": title,
            "configuration": configuration.take(),
        });
        let dashboard = self.api.save_dashboard(&body).await?;
        tracing::info!(title = %dashboard.title, id = %dashboard.id.id, file, "Created dashboard");
        Ok(dashboard)
    }

    /// Create a widgets bundle from template `file`, then each of its
    /// widget types tagged with the new bundle's alias.
    pub async fn create_widgets_bundle(&self, file: &str) -> ProvisionResult<CreatedWidgetsBundle> {
        let path = self.store.template_path(TemplateCategory::WidgetsBundles, file);
        let template = self.store.load(TemplateCategory::WidgetsBundles, file)?;

        let bundle_json = template
            .get("widgetsBundle")
            .filter(|bundle| bundle.is_object())
            .ok_or_else(|| ProvisionError::template(&path, "missing object field 'widgetsBundle'"))?;

        let widget_types = template
            .get("widgetTypes")
            .and_then(Value::as_array)
            .ok_or_else(|| ProvisionError::template(&path, "missing array field 'widgetTypes'"))?;

        if let Some(idx) = widget_types.iter().position(|wt| !wt.is_object()) {
            return Err(ProvisionError::template(
                &path,
                format!("widget type {idx} is not an object"),
            ));
        }

        let bundle = self.api.save_widgets_bundle(bundle_json).await?;

        for widget_type in widget_types {
            let mut widget_type = widget_type.clone();
            if let Value::Object(fields) = &mut widget_type {
                fields.insert("bundleAlias".to_string(), Value::String(bundle.alias.clone()));
            }
            self.api.save_widget_type(&widget_type).await?;
        }

        tracing::info!(
            alias = %bundle.alias,
            widget_types = widget_types.len(),
            file,
            "Created widgets bundle"
        );
        Ok(CreatedWidgetsBundle {
            bundle,
            widget_types: widget_types.len(),
        })
    }

    /// Read an optional definitions file from the solution directory.
    /// Missing or malformed files yield `None`.
    pub fn read_definitions(&self, file: &str) -> Option<Value> {
        self.store.load_optional(file)
    }

    /// Write `attributes` as server-side attributes of `entity`.
    ///
    /// Only non-empty JSON objects are written. Null and empty values are
    /// skipped quietly, anything else with a warning.
    /// Returns whether a write happened.
    pub async fn save_server_side_attributes(
        &self,
        entity: &EntityId,
        attributes: &Value,
    ) -> ProvisionResult<bool> {
        match attributes {
            Value::Object(fields) if !fields.is_empty() => {}
            Value::Object(_) | Value::Null => return Ok(false),
            Value::Array(items) if items.is_empty() => return Ok(false),
            other => {
                tracing::warn!(entity_id = %entity.id, value = %other, "Attributes must be a JSON object, skipping");
                return Ok(false);
            }
        }

        tracing::info!(
            entity_type = %entity.entity_type,
            entity_id = %entity.id,
            attributes = %attributes,
            "Saving attributes"
        );
        self.api
            .save_entity_attributes(entity, AttributeScope::Server, attributes)
            .await?;
        Ok(true)
    }

    /// Write the optional attributes file `file` onto the tenant.
    pub async fn save_tenant_attributes(&self, file: &str) -> ProvisionResult<bool> {
        match self.read_definitions(file) {
            Some(attributes) => {
                self.save_server_side_attributes(&self.tenant.entity_id(), &attributes)
                    .await
            }
            None => Ok(false),
        }
    }
}
