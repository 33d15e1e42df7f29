//! Tenant reference rewriting for JSON templates.
//!
//! Templates are exported from a reference tenant, so every entity
//! reference that points at "the tenant" carries the exporting tenant's
//! id. Such a reference is an object with exactly two fields:
//!
//! ```json
//! { "entityType": "TENANT", "id": "<exporting tenant id>" }
//! ```
//!
//! [`rewrite_tenant_refs`] replaces the `id` of every such object with the
//! id of the tenant being provisioned.

use serde_json::{Map, Value};

use crate::types::{TenantId, ENTITY_TYPE_TENANT};

const ID_FIELD: &str = "id";
const ENTITY_TYPE_FIELD: &str = "entityType";

/// Whether `obj` is a tenant placeholder: exactly the fields `id` and
/// `entityType`, with an `entityType` string equal to `TENANT` in any case.
pub fn is_tenant_placeholder(obj: &Map<String, Value>) -> bool {
    obj.len() == 2
        && obj.contains_key(ID_FIELD)
        && obj
            .get(ENTITY_TYPE_FIELD)
            .and_then(Value::as_str)
            .is_some_and(|entity_type| entity_type.eq_ignore_ascii_case(ENTITY_TYPE_TENANT))
}

/// Rewrite every tenant placeholder in `node` to point at `tenant`.
///
/// Traversal is depth-first. A rewritten placeholder is not descended
/// into. Returns the number of placeholders rewritten.
pub fn rewrite_tenant_refs(node: &mut Value, tenant: &TenantId) -> usize {
    match node {
        Value::Array(items) => items
            .iter_mut()
            .map(|item| rewrite_tenant_refs(item, tenant))
            .sum(),
        Value::Object(obj) => {
            if is_tenant_placeholder(obj) {
                obj.insert(ID_FIELD.to_string(), Value::String(tenant.to_string()));
                return 1;
            }
            obj.values_mut()
                .map(|value| rewrite_tenant_refs(value, tenant))
                .sum()
        }
        _ => 0,
    }
}
