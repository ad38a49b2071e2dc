//! Tenancy and soft-delete scoping applied to every read and write.

use crate::config::{CREATED_BY, DELETED_AT, DELETED_BY, ID, ORGANIZATION_ID, UPDATED_BY};
use crate::store::{Filter, Record};
use chrono::{SecondsFormat, Utc};
use serde_json::Value;

/// Caller's tenant and actor, taken from the authenticated request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TenantScope {
    pub organization_id: String,
    pub actor_id: String,
}

impl TenantScope {
    pub fn new(organization_id: impl Into<String>, actor_id: impl Into<String>) -> Self {
        TenantScope {
            organization_id: organization_id.into(),
            actor_id: actor_id.into(),
        }
    }

    /// Active rows of this tenant.
    pub fn active(&self) -> Filter {
        Filter::new()
            .is_null(DELETED_AT)
            .eq(ORGANIZATION_ID, self.organization_id.clone())
    }

    /// The active row with `id`, if this tenant owns it.
    pub fn by_id(&self, id: i64) -> Filter {
        self.active().eq(ID, id)
    }

    /// Active rows of this tenant whose `foreign_key` references `parent_id`.
    pub fn by_reference(&self, foreign_key: &str, parent_id: i64) -> Filter {
        self.active().eq(foreign_key, parent_id)
    }

    /// Tenant and audit columns written on create. Overwrites anything the body carried.
    pub fn stamp_create(&self, values: &mut Record) {
        values.insert(ORGANIZATION_ID.into(), Value::String(self.organization_id.clone()));
        values.insert(CREATED_BY.into(), Value::String(self.actor_id.clone()));
        values.insert(UPDATED_BY.into(), Value::String(self.actor_id.clone()));
    }

    pub fn stamp_update(&self, values: &mut Record) {
        values.insert(UPDATED_BY.into(), Value::String(self.actor_id.clone()));
    }

    /// Values that soft-delete a row.
    pub fn soft_delete_values(&self) -> Record {
        let mut values = Record::new();
        values.insert(
            DELETED_AT.into(),
            Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        values.insert(DELETED_BY.into(), Value::String(self.actor_id.clone()));
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(org: &str, deleted: Value) -> Record {
        let mut r = Record::new();
        r.insert(ID.into(), json!(1));
        r.insert(ORGANIZATION_ID.into(), json!(org));
        r.insert(DELETED_AT.into(), deleted);
        r.insert("taskId".into(), json!(7));
        r
    }

    #[test]
    fn active_filter_excludes_other_tenants_and_deleted_rows() {
        let scope = TenantScope::new("org-a", "user-1");
        assert!(scope.active().matches(&row("org-a", Value::Null)));
        assert!(!scope.active().matches(&row("org-b", Value::Null)));
        assert!(!scope.active().matches(&row("org-a", json!("2024-01-01T00:00:00.000Z"))));
        assert!(scope.by_id(1).matches(&row("org-a", Value::Null)));
        assert!(!scope.by_id(2).matches(&row("org-a", Value::Null)));
        assert!(scope.by_reference("taskId", 7).matches(&row("org-a", Value::Null)));
    }

    #[test]
    fn create_stamp_overrides_client_values() {
        let scope = TenantScope::new("org-a", "user-1");
        let mut values = Record::new();
        values.insert(ORGANIZATION_ID.into(), json!("org-evil"));
        scope.stamp_create(&mut values);
        assert_eq!(values[ORGANIZATION_ID], json!("org-a"));
        assert_eq!(values[CREATED_BY], json!("user-1"));
        assert_eq!(values[UPDATED_BY], json!("user-1"));
    }

    #[test]
    fn soft_delete_sets_timestamp_and_actor() {
        let values = TenantScope::new("org-a", "user-1").soft_delete_values();
        assert!(values[DELETED_AT].is_string());
        assert_eq!(values[DELETED_BY], json!("user-1"));
    }
}
