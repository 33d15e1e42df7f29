//! Template store: JSON templates laid out by category under a data
//! directory, plus the solution manifest that orders them.
//!
//! ```text
//! <data_dir>/json/<solution>/
//!     solution.json
//!     tenant_attributes.json
//!     rule_chains/*.json
//!     dashboards/*.json
//!     widgets_bundles/*.json
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use crate::error::{ProvisionError, ProvisionResult};

/// Directory under the data directory holding all JSON solutions.
pub const JSON_DIR: &str = "json";

/// File name of the solution manifest inside a solution directory.
pub const MANIFEST_FILE: &str = "solution.json";

/// Template category, one subdirectory each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateCategory {
    RuleChains,
    Dashboards,
    WidgetsBundles,
}

impl TemplateCategory {
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::RuleChains => "rule_chains",
            Self::Dashboards => "dashboards",
            Self::WidgetsBundles => "widgets_bundles",
        }
    }
}

/// Read-only access to one solution's templates.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    root: PathBuf,
}

impl TemplateStore {
    /// Store rooted at `<data_dir>/json/<solution_dir>`.
    pub fn new(data_dir: impl AsRef<Path>, solution_dir: &str) -> Self {
        Self {
            root: data_dir.as_ref().join(JSON_DIR).join(solution_dir),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn category_dir(&self, category: TemplateCategory) -> PathBuf {
        self.root.join(category.dir_name())
    }

    /// Path a template of `category` named `file` is read from.
    pub fn template_path(&self, category: TemplateCategory, file: &str) -> PathBuf {
        self.category_dir(category).join(file)
    }

    /// Load a required template. A missing or malformed file is fatal.
    pub fn load(&self, category: TemplateCategory, file: &str) -> ProvisionResult<Value> {
        read_json(&self.template_path(category, file))
    }

    /// Load an optional definitions file from the solution directory.
    ///
    /// Missing or unreadable files are logged and reported as `None` so
    /// the session can carry on without them.
    pub fn load_optional(&self, file: &str) -> Option<Value> {
        let path = self.root.join(file);
        match read_json(&path) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(file, error = %e, "Could not read definitions file, skipping");
                None
            }
        }
    }

    /// Load and parse `solution.json`.
    pub fn load_manifest(&self) -> ProvisionResult<SolutionManifest> {
        let path = self.root.join(MANIFEST_FILE);
        let value = read_json(&path)?;
        serde_json::from_value(value).map_err(|e| ProvisionError::template(&path, e.to_string()))
    }
}

fn read_json(path: &Path) -> ProvisionResult<Value> {
    let bytes = fs::read(path).map_err(|e| ProvisionError::template(path, e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| ProvisionError::template(path, e.to_string()))
}

// ---------------------------------------------------------------------------
// Solution manifest
// ---------------------------------------------------------------------------

/// Ordered description of what a solution provisions.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SolutionManifest {
    /// Rule chains that already exist on the platform and may be
    /// referenced by imported chains.
    pub existing_rule_chains: Vec<String>,
    /// Rule chains in import order. Dependencies must come first.
    pub rule_chains: Vec<RuleChainEntry>,
    pub dashboards: Vec<String>,
    pub widgets_bundles: Vec<String>,
    pub attributes: Vec<AttributesEntry>,
}

/// One rule chain to import.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleChainEntry {
    pub file: String,
    #[serde(default)]
    pub root: bool,
    /// Template-local rule chain node id → name of the referenced chain.
    #[serde(default)]
    pub references: HashMap<String, String>,
}

/// An optional attributes file written as server-side attributes of the
/// tenant.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributesEntry {
    pub file: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn paths_follow_layout() {
        let store = TemplateStore::new("/srv/data", "cli");
        assert_eq!(
            store.template_path(TemplateCategory::WidgetsBundles, "w.json"),
            PathBuf::from("/srv/data/json/cli/widgets_bundles/w.json")
        );
        assert_eq!(
            store.category_dir(TemplateCategory::RuleChains),
            PathBuf::from("/srv/data/json/cli/rule_chains")
        );
    }

    #[test]
    fn load_reads_template() {
        let dir = tempfile::tempdir().unwrap();
        let store = TemplateStore::new(dir.path(), "cli");
        write(
            &store.template_path(TemplateCategory::Dashboards, "d.json"),
            r#"{"title":"Dash1"}"#,
        );

        let value = store.load(TemplateCategory::Dashboards, "d.json").unwrap();
        assert_eq!(value, json!({ "title": "Dash1" }));
    }

    #[test]
    fn missing_template_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let store = TemplateStore::new(dir.path(), "cli");

        let err = store.load(TemplateCategory::RuleChains, "nope.json").unwrap_err();
        assert_matches!(err, ProvisionError::TemplateParse { path, .. } if path.ends_with("rule_chains/nope.json"));
    }

    #[test]
    fn malformed_template_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let store = TemplateStore::new(dir.path(), "cli");
        write(&store.template_path(TemplateCategory::RuleChains, "bad.json"), "{ not json");

        assert_matches!(
            store.load(TemplateCategory::RuleChains, "bad.json"),
            Err(ProvisionError::TemplateParse { .. })
        );
    }

    #[test]
    fn optional_file_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = TemplateStore::new(dir.path(), "cli");
        assert!(store.load_optional("tenant_attributes.json").is_none());
    }

    #[test]
    fn optional_file_malformed_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = TemplateStore::new(dir.path(), "cli");
        write(&store.root().join("attrs.json"), "[1,");
        assert!(store.load_optional("attrs.json").is_none());
    }

    #[test]
    fn manifest_defaults_and_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = TemplateStore::new(dir.path(), "cli");
        write(
            &store.root().join(MANIFEST_FILE),
            r#"{
                "ruleChains": [
                    { "file": "alarms.json" },
                    { "file": "root.json", "root": true,
                      "references": { "rule-chain-node-4": "Thermostat Alarms" } }
                ],
                "dashboards": ["thermostats.json"]
            }"#,
        );

        let manifest = store.load_manifest().unwrap();
        assert!(manifest.existing_rule_chains.is_empty());
        assert_eq!(manifest.rule_chains.len(), 2);
        assert!(!manifest.rule_chains[0].root);
        assert!(manifest.rule_chains[0].references.is_empty());
        assert!(manifest.rule_chains[1].root);
        assert_eq!(
            manifest.rule_chains[1].references["rule-chain-node-4"],
            "Thermostat Alarms"
        );
        assert_eq!(manifest.dashboards, vec!["thermostats.json".to_string()]);
        assert!(manifest.widgets_bundles.is_empty());
        assert!(manifest.attributes.is_empty());
    }

    #[test]
    fn manifest_with_wrong_shape_is_template_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = TemplateStore::new(dir.path(), "cli");
        write(&store.root().join(MANIFEST_FILE), r#"{ "ruleChains": "alarms.json" }"#);

        assert_matches!(store.load_manifest(), Err(ProvisionError::TemplateParse { .. }));
    }
}
