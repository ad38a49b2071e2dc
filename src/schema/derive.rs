//! Schema Deriver: select/insert/patch schemas from a resource descriptor.
//!
//! Explicit overrides replace derivation entirely and are not checked against the
//! table: an override may name columns the table lacks, and the override wins.

use crate::case;
use crate::config::{FieldRules, FieldType, ResourceDescriptor, ID, SELECT_OMITTED};
use crate::error::ConfigError;
use crate::schema::{ObjectSchema, SchemaField};
use serde_json::{json, Value};

/// Default and maximum page size for list endpoints.
pub const DEFAULT_PAGE_LIMIT: u32 = 50;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// The three client-facing shapes of one entity.
#[derive(Clone, Debug, PartialEq)]
pub struct DerivedSchemas {
    pub select: ObjectSchema,
    pub insert: ObjectSchema,
    pub patch: ObjectSchema,
}

fn schema_name(descriptor: &ResourceDescriptor, suffix: &str) -> String {
    format!("{}{}", case::to_pascal_case(&descriptor.name), suffix)
}

/// Full column set minus tenant, timestamp and audit columns.
pub fn derive_select(descriptor: &ResourceDescriptor, override_: Option<&ObjectSchema>) -> ObjectSchema {
    if let Some(schema) = override_ {
        return schema.clone();
    }
    ObjectSchema::from_columns("", &descriptor.table.columns())
        .omit(schema_name(descriptor, "Select"), &SELECT_OMITTED)
}

/// Business columns only. Nullable columns and columns with a storage default are optional.
pub fn derive_insert(descriptor: &ResourceDescriptor, override_: Option<&ObjectSchema>) -> ObjectSchema {
    if let Some(schema) = override_ {
        return schema.clone();
    }
    let mut omitted: Vec<&str> = SELECT_OMITTED.to_vec();
    omitted.push(ID);
    let mut schema = ObjectSchema::from_columns("", &descriptor.table.columns())
        .omit(schema_name(descriptor, "Insert"), &omitted);
    for field in &mut schema.fields {
        let has_default = descriptor
            .table
            .fields
            .iter()
            .any(|f| f.name == field.name && f.default.is_some());
        field.optional = field.nullable || has_default;
    }
    schema
}

/// Every insert field made optional. Fails if the result would reject `{}`.
pub fn derive_patch(insert: &ObjectSchema, override_: Option<&ObjectSchema>) -> Result<ObjectSchema, ConfigError> {
    let schema = match override_ {
        Some(s) => s.clone(),
        None => {
            let base = insert.name.strip_suffix("Insert").unwrap_or(&insert.name);
            insert.partial(format!("{}Patch", base))
        }
    };
    if let Err(e) = schema.validate(&Value::Object(serde_json::Map::new())) {
        return Err(ConfigError::Schema(format!(
            "patch schema {} must accept an empty object: {}",
            schema.name, e
        )));
    }
    Ok(schema)
}

/// Derive all three schemas, honouring the descriptor's overrides.
pub fn derive_all(descriptor: &ResourceDescriptor) -> Result<DerivedSchemas, ConfigError> {
    let overrides = &descriptor.overrides;
    let select = derive_select(descriptor, overrides.select.as_ref());
    let insert = derive_insert(descriptor, overrides.insert.as_ref());
    let patch = derive_patch(&insert, overrides.patch.as_ref())?;
    Ok(DerivedSchemas { select, insert, patch })
}

/// Query parameters of list endpoints.
pub fn list_query_schema() -> ObjectSchema {
    ObjectSchema::new("ListQuery")
        .field(
            SchemaField::new("limit", FieldType::Integer)
                .default_value(json!(DEFAULT_PAGE_LIMIT))
                .rules(FieldRules {
                    minimum: Some(1.0),
                    maximum: Some(f64::from(MAX_PAGE_LIMIT)),
                    ..FieldRules::default()
                })
                .example(json!(DEFAULT_PAGE_LIMIT)),
        )
        .field(
            SchemaField::new("pageNumber", FieldType::Integer)
                .default_value(json!(1))
                .rules(FieldRules {
                    minimum: Some(0.0),
                    maximum: Some(f64::from(u32::MAX)),
                    ..FieldRules::default()
                })
                .example(json!(1)),
        )
}

/// Path parameters of by-id endpoints.
pub fn id_params_schema() -> ObjectSchema {
    ObjectSchema::new("IdParams").field(
        SchemaField::new("id", FieldType::Integer)
            .rules(FieldRules {
                minimum: Some(1.0),
                ..FieldRules::default()
            })
            .example(json!(42)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FieldDef, SchemaOverrides, TableDef};
    use rstest::rstest;

    fn tasks() -> ResourceDescriptor {
        ResourceDescriptor::new(
            "tasks",
            TableDef::new("tasks")
                .field(FieldDef::text("title"))
                .field(FieldDef::text("description").nullable())
                .field(FieldDef::boolean("completed").default_value(json!(false))),
        )
    }

    fn expenses() -> ResourceDescriptor {
        ResourceDescriptor::new(
            "expenses",
            TableDef::new("expenses")
                .field(FieldDef::text("title"))
                .field(FieldDef::text("amount"))
                .field(FieldDef::text("category"))
                .field(FieldDef::date("date")),
        )
    }

    #[rstest]
    #[case(tasks())]
    #[case(expenses())]
    fn select_never_exposes_tenant_or_audit_columns(#[case] d: ResourceDescriptor) {
        let select = derive_select(&d, None);
        for omitted in SELECT_OMITTED {
            assert!(!select.contains(omitted), "{} leaked into select", omitted);
        }
        assert!(select.contains(ID));
    }

    #[rstest]
    #[case(tasks())]
    #[case(expenses())]
    fn insert_never_includes_id_or_managed_columns(#[case] d: ResourceDescriptor) {
        let insert = derive_insert(&d, None);
        assert!(!insert.contains(ID));
        for omitted in SELECT_OMITTED {
            assert!(!insert.contains(omitted));
        }
        assert_eq!(insert.fields.len(), d.table.fields.len());
    }

    #[test]
    fn insert_optionality_follows_nullable_and_default() {
        let insert = derive_insert(&tasks(), None);
        assert!(!insert.get("title").unwrap().optional);
        assert!(insert.get("description").unwrap().optional);
        assert!(insert.get("completed").unwrap().optional);
        assert_eq!(insert.name, "TasksInsert");
    }

    #[test]
    fn patch_accepts_empty_object() {
        let d = tasks();
        let patch = derive_patch(&derive_insert(&d, None), None).unwrap();
        assert_eq!(patch.name, "TasksPatch");
        assert!(patch.fields.iter().all(|f| f.optional));
        assert!(patch.validate(&json!({})).is_ok());
    }

    #[test]
    fn select_override_replaces_derivation_without_cross_check() {
        let custom = ObjectSchema::new("TaskSummary")
            .field(SchemaField::new("id", FieldType::Integer))
            .field(SchemaField::new("not_a_column", FieldType::Text));
        let d = tasks().overrides(SchemaOverrides {
            select: Some(custom.clone()),
            ..SchemaOverrides::default()
        });
        let schemas = derive_all(&d).unwrap();
        assert_eq!(schemas.select, custom);
        assert_eq!(schemas.insert.name, "TasksInsert");
    }

    #[test]
    fn insert_override_feeds_patch() {
        let custom = ObjectSchema::new("TasksInsert")
            .field(SchemaField::new("title", FieldType::Text));
        let d = tasks().overrides(SchemaOverrides {
            insert: Some(custom),
            ..SchemaOverrides::default()
        });
        let schemas = derive_all(&d).unwrap();
        assert_eq!(schemas.patch.field_names().collect::<Vec<_>>(), vec!["title"]);
    }

    #[test]
    fn patch_override_must_accept_empty_object() {
        let strict = ObjectSchema::new("StrictPatch").field(SchemaField::new("title", FieldType::Text));
        let insert = derive_insert(&tasks(), None);
        let err = derive_patch(&insert, Some(&strict)).unwrap_err();
        assert!(matches!(err, ConfigError::Schema(_)));
    }

    #[test]
    fn page_number_is_bounded() {
        let mut raw = std::collections::HashMap::new();
        raw.insert("pageNumber".to_string(), "5000000000".to_string());
        let err = list_query_schema().validate_coerced(&raw).unwrap_err();
        assert_eq!(err.issues[0].code, "too_big");
        raw.insert("pageNumber".to_string(), u32::MAX.to_string());
        assert!(list_query_schema().validate_coerced(&raw).is_ok());
    }

    #[test]
    fn id_params_reject_zero() {
        let mut raw = std::collections::HashMap::new();
        raw.insert("id".to_string(), "0".to_string());
        let err = id_params_schema().validate_coerced(&raw).unwrap_err();
        assert_eq!(err.issues[0].code, "too_small");
    }
}
