//! Resolved resource model: descriptors validated and expanded for runtime use.

use crate::config::{ResourceDescriptor, TableDef};
use crate::route_config::RouteSet;
use crate::schema::DerivedSchemas;
use std::collections::HashMap;
use std::sync::Arc;

/// A dependent table soft-deleted together with its parent row.
#[derive(Clone, Debug, PartialEq)]
pub struct CascadeTarget {
    pub child: String,
    pub table: TableDef,
    pub foreign_key: String,
}

#[derive(Clone, Debug)]
pub struct ResolvedResource {
    pub descriptor: ResourceDescriptor,
    pub schemas: DerivedSchemas,
    pub routes: RouteSet,
    /// One level deep; dependents of dependents are not listed.
    pub cascades: Vec<CascadeTarget>,
}

impl ResolvedResource {
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn table(&self) -> &TableDef {
        &self.descriptor.table
    }
}

#[derive(Clone, Debug, Default)]
pub struct ResourceRegistry {
    resources: Vec<Arc<ResolvedResource>>,
    by_name: HashMap<String, usize>,
}

impl ResourceRegistry {
    pub fn new(resources: Vec<ResolvedResource>) -> Self {
        let by_name = resources
            .iter()
            .enumerate()
            .map(|(i, r)| (r.descriptor.name.clone(), i))
            .collect();
        ResourceRegistry {
            resources: resources.into_iter().map(Arc::new).collect(),
            by_name,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<ResolvedResource>> {
        self.by_name.get(name).and_then(|i| self.resources.get(*i))
    }

    /// Resources in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ResolvedResource>> {
        self.resources.iter()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
