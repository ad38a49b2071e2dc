//! Build the resource registry from descriptors, in code or from a JSON manifest.

use crate::config::resolved::{CascadeTarget, ResolvedResource, ResourceRegistry};
use crate::config::{validate, ResourceDescriptor};
use crate::error::ConfigError;
use crate::route_config::build_routes;
use crate::schema::derive_all;
use std::path::Path;

/// Validate descriptors, derive schemas, build route sets and cascade targets.
pub fn resolve(descriptors: Vec<ResourceDescriptor>) -> Result<ResourceRegistry, ConfigError> {
    validate(&descriptors)?;

    let mut resources = Vec::with_capacity(descriptors.len());
    for d in &descriptors {
        let schemas = derive_all(d)?;
        let routes = build_routes(d, &schemas);
        let cascades = d
            .relations
            .iter()
            .map(|rel| {
                let child = descriptors
                    .iter()
                    .find(|c| c.name == rel.child)
                    .ok_or_else(|| ConfigError::MissingReference {
                        kind: "resource",
                        id: rel.child.clone(),
                    })?;
                Ok(CascadeTarget {
                    child: child.name.clone(),
                    table: child.table.clone(),
                    foreign_key: rel.foreign_key.clone(),
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        tracing::debug!(
            entity = %d.name,
            routes = routes.len(),
            cascades = cascades.len(),
            "resolved resource"
        );
        resources.push(ResolvedResource {
            descriptor: d.clone(),
            schemas,
            routes,
            cascades,
        });
    }

    Ok(ResourceRegistry::new(resources))
}

/// Read a JSON array of resource descriptors.
pub fn load_descriptors(path: impl AsRef<Path>) -> Result<Vec<ResourceDescriptor>, ConfigError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&raw).map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FieldDef, Operation, TableDef};
    use std::io::Write;

    fn tasks() -> ResourceDescriptor {
        ResourceDescriptor::new("tasks", TableDef::new("tasks").field(FieldDef::text("title"))).dependent("comments")
    }

    fn comments() -> ResourceDescriptor {
        ResourceDescriptor::new(
            "comments",
            TableDef::new("task_comments").field(FieldDef::integer("taskId")),
        )
        .disable(Operation::Delete)
    }

    #[test]
    fn resolves_cascade_targets_to_child_tables() {
        let registry = resolve(vec![tasks(), comments()]).unwrap();
        assert_eq!(registry.len(), 2);
        let t = registry.get("tasks").unwrap();
        assert_eq!(t.cascades.len(), 1);
        assert_eq!(t.cascades[0].table.name, "task_comments");
        assert_eq!(t.cascades[0].foreign_key, "taskId");
        assert_eq!(t.routes.len(), 5);
        assert_eq!(registry.get("comments").unwrap().routes.len(), 4);
        assert!(registry.get("comments").unwrap().cascades.is_empty());
    }

    #[test]
    fn propagates_validation_failure() {
        assert!(resolve(vec![tasks()]).is_err());
    }

    #[test]
    fn loads_manifest_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let manifest = serde_json::json!([
            { "name": "tasks", "table": { "name": "tasks", "fields": [{ "name": "title", "type": "text" }] } }
        ]);
        write!(file, "{}", manifest).unwrap();
        let descriptors = load_descriptors(file.path()).unwrap();
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].table.fields[0].name, "title");
    }

    #[test]
    fn missing_manifest_is_load_error() {
        assert!(matches!(
            load_descriptors("/definitely/not/here.json"),
            Err(ConfigError::Load(_))
        ));
    }
}
