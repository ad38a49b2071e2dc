//! Create entity tables from their definitions. Idempotent: existing tables are left alone.

use crate::config::{FieldDef, FieldType, ResourceRegistry, TableDef, CREATED_AT, DELETED_AT, ID, ORGANIZATION_ID, UPDATED_AT};
use crate::error::StoreError;
use crate::sql::quoted;
use serde_json::Value;
use sqlx::PgPool;

fn column_type(type_: FieldType) -> &'static str {
    match type_ {
        FieldType::Text => "TEXT",
        FieldType::Integer => "BIGINT",
        FieldType::Number => "DOUBLE PRECISION",
        FieldType::Boolean => "BOOLEAN",
        FieldType::Date => "DATE",
        FieldType::Timestamp => "TIMESTAMPTZ",
        FieldType::Uuid => "UUID",
        FieldType::Json => "JSONB",
    }
}

fn literal(v: &Value) -> String {
    match v {
        Value::Null => "NULL".into(),
        Value::Bool(true) => "TRUE".into(),
        Value::Bool(false) => "FALSE".into(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("'{}'", s.replace('\'', "''")),
        Value::Array(_) | Value::Object(_) => format!("'{}'::jsonb", v.to_string().replace('\'', "''")),
    }
}

fn column_def(c: &FieldDef) -> String {
    let mut def = format!("{} {}", quoted(&c.name), column_type(c.type_));
    if !c.nullable {
        def.push_str(" NOT NULL");
    }
    if let Some(d) = &c.default {
        def.push_str(" DEFAULT ");
        def.push_str(&literal(d));
    }
    def
}

/// CREATE TABLE with the common columns followed by the business columns.
pub fn create_table_sql(table: &TableDef) -> String {
    let mut defs = vec![format!("{} SERIAL PRIMARY KEY", quoted(ID))];
    for c in table.columns() {
        let def = match c.name.as_str() {
            ID => continue,
            CREATED_AT | UPDATED_AT => format!("{} TIMESTAMPTZ NOT NULL DEFAULT NOW()", quoted(&c.name)),
            _ => column_def(&c),
        };
        defs.push(def);
    }
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quoted(&table.name),
        defs.join(", ")
    )
}

/// Index on the tenant scope every query filters by.
pub fn scope_index_sql(table: &TableDef) -> String {
    format!(
        "CREATE INDEX IF NOT EXISTS {} ON {} ({}, {})",
        quoted(&format!("{}_scope_idx", table.name)),
        quoted(&table.name),
        quoted(ORGANIZATION_ID),
        quoted(DELETED_AT)
    )
}

pub async fn ensure_tables(pool: &PgPool, registry: &ResourceRegistry) -> Result<(), StoreError> {
    for resource in registry.iter() {
        let table = resource.table();
        for sql in [create_table_sql(table), scope_index_sql(table)] {
            tracing::debug!(sql = %sql, "ddl");
            sqlx::query(&sql).execute(pool).await?;
        }
        tracing::info!(entity = %resource.name(), table = %table.name, "table ready");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_table_includes_common_and_business_columns() {
        let table = TableDef::new("tasks")
            .field(FieldDef::text("title"))
            .field(FieldDef::text("description").nullable())
            .field(FieldDef::boolean("completed").default_value(json!(false)));
        let sql = create_table_sql(&table);
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS \"tasks\" (\"id\" SERIAL PRIMARY KEY, \"organizationId\" TEXT NOT NULL"));
        assert!(sql.contains("\"created_at\" TIMESTAMPTZ NOT NULL DEFAULT NOW()"));
        assert!(sql.contains("\"deleted_at\" TIMESTAMPTZ,"));
        assert!(sql.contains("\"description\" TEXT,"));
        assert!(sql.ends_with("\"completed\" BOOLEAN NOT NULL DEFAULT FALSE)"));
    }

    #[test]
    fn string_defaults_are_escaped() {
        assert_eq!(literal(&json!("it's")), "'it''s'");
        assert_eq!(literal(&json!({"a": 1})), "'{\"a\":1}'::jsonb");
    }
}
