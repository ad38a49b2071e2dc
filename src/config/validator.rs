//! Descriptor validation: naming, column and relation consistency.

use crate::config::{common_columns, FieldType, ResourceDescriptor};
use crate::error::ConfigError;
use regex::Regex;
use std::collections::HashSet;

fn is_path_safe(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

pub fn validate(descriptors: &[ResourceDescriptor]) -> Result<(), ConfigError> {
    let reserved: HashSet<String> = common_columns().into_iter().map(|c| c.name).collect();
    let mut names = HashSet::new();
    let mut tables = HashSet::new();

    for d in descriptors {
        if !is_path_safe(&d.name) {
            return Err(ConfigError::Validation(format!(
                "resource name '{}' must be non-empty and contain only letters, digits, '_' or '-'",
                d.name
            )));
        }
        if !names.insert(d.name.as_str()) {
            return Err(ConfigError::Duplicate {
                kind: "resource",
                name: d.name.clone(),
            });
        }
        if d.table.name.is_empty() {
            return Err(ConfigError::Validation(format!("resource '{}' has an empty table name", d.name)));
        }
        if !tables.insert(d.table.name.as_str()) {
            return Err(ConfigError::Duplicate {
                kind: "table",
                name: d.table.name.clone(),
            });
        }

        let mut fields = HashSet::new();
        for f in &d.table.fields {
            if reserved.contains(&f.name) {
                return Err(ConfigError::ReservedColumn {
                    table: d.table.name.clone(),
                    column: f.name.clone(),
                });
            }
            if f.name.is_empty() || !fields.insert(f.name.as_str()) {
                return Err(ConfigError::Duplicate {
                    kind: "column",
                    name: format!("{}.{}", d.table.name, f.name),
                });
            }
            if let Some(pattern) = &f.rules.pattern {
                Regex::new(pattern).map_err(|e| {
                    ConfigError::Validation(format!("{}.{}: invalid pattern: {}", d.table.name, f.name, e))
                })?;
            }
        }
    }

    for d in descriptors {
        for rel in &d.relations {
            let child = descriptors
                .iter()
                .find(|c| c.name == rel.child)
                .ok_or_else(|| ConfigError::MissingReference {
                    kind: "resource",
                    id: rel.child.clone(),
                })?;
            let invalid = |reason: String| ConfigError::InvalidRelation {
                parent: d.name.clone(),
                child: rel.child.clone(),
                reason,
            };
            let fk = child
                .table
                .fields
                .iter()
                .find(|f| f.name == rel.foreign_key)
                .ok_or_else(|| invalid(format!("{} has no column {}", child.table.name, rel.foreign_key)))?;
            if fk.type_ != FieldType::Integer {
                return Err(invalid(format!(
                    "{}.{} must be an integer column, found {}",
                    child.table.name,
                    rel.foreign_key,
                    fk.type_.label()
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FieldDef, FieldRules, TableDef};

    fn tasks() -> ResourceDescriptor {
        ResourceDescriptor::new("tasks", TableDef::new("tasks").field(FieldDef::text("title")))
    }

    fn comments() -> ResourceDescriptor {
        ResourceDescriptor::new(
            "comments",
            TableDef::new("comments")
                .field(FieldDef::text("body"))
                .field(FieldDef::integer("taskId")),
        )
    }

    #[test]
    fn accepts_conventional_relation() {
        validate(&[tasks().dependent("comments"), comments()]).unwrap();
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = validate(&[tasks(), tasks()]).unwrap_err();
        assert!(matches!(err, ConfigError::Duplicate { kind: "resource", .. }));
    }

    #[test]
    fn rejects_reserved_column() {
        let d = ResourceDescriptor::new("tasks", TableDef::new("tasks").field(FieldDef::text("organizationId")));
        assert!(matches!(validate(&[d]), Err(ConfigError::ReservedColumn { .. })));
    }

    #[test]
    fn rejects_relation_to_missing_child_or_column() {
        assert!(matches!(
            validate(&[tasks().dependent("comments")]),
            Err(ConfigError::MissingReference { .. })
        ));
        let bare = ResourceDescriptor::new("comments", TableDef::new("comments").field(FieldDef::text("body")));
        assert!(matches!(
            validate(&[tasks().dependent("comments"), bare]),
            Err(ConfigError::InvalidRelation { .. })
        ));
    }

    #[test]
    fn rejects_non_integer_foreign_key() {
        let c = ResourceDescriptor::new("comments", TableDef::new("comments").field(FieldDef::text("taskId")));
        assert!(matches!(
            validate(&[tasks().dependent("comments"), c]),
            Err(ConfigError::InvalidRelation { .. })
        ));
    }

    #[test]
    fn rejects_bad_pattern_and_unsafe_name() {
        let rules = FieldRules {
            pattern: Some("([a-z".into()),
            ..FieldRules::default()
        };
        let d = ResourceDescriptor::new("tasks", TableDef::new("tasks").field(FieldDef::text("code").rules(rules)));
        assert!(matches!(validate(&[d]), Err(ConfigError::Validation(_))));
        let d = ResourceDescriptor::new("my tasks", TableDef::new("tasks"));
        assert!(matches!(validate(&[d]), Err(ConfigError::Validation(_))));
    }
}
