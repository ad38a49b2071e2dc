//! Generic tenant-scoped CRUD over a [`RecordStore`]. Independent of HTTP.

use crate::config::ResolvedResource;
use crate::error::AppError;
use crate::service::pagination::{PageRequest, Pagination};
use crate::store::{Record, RecordStore};
use crate::tenant::TenantScope;
use futures_util::future::try_join_all;
use serde_json::Value;

#[derive(Clone, Debug, PartialEq)]
pub struct ListResult {
    pub data: Vec<Record>,
    pub pagination: Pagination,
}

pub struct CrudService;

impl CrudService {
    /// Page of active rows for the tenant. Page and count run concurrently, not in one snapshot.
    pub async fn list(
        store: &dyn RecordStore,
        resource: &ResolvedResource,
        scope: &TenantScope,
        page: PageRequest,
    ) -> Result<ListResult, AppError> {
        let filter = scope.active();
        let table = resource.table();
        let (rows, count) = tokio::try_join!(
            store.select(table, &filter, Some(page.to_page())),
            store.count(table, &filter),
        )?;
        let data = rows
            .iter()
            .map(|r| Self::present(resource, r))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ListResult {
            data,
            pagination: Pagination::new(page, count),
        })
    }

    pub async fn get(
        store: &dyn RecordStore,
        resource: &ResolvedResource,
        scope: &TenantScope,
        id: i64,
    ) -> Result<Record, AppError> {
        let row = Self::load_active(store, resource, scope, id).await?;
        Self::present(resource, &row)
    }

    /// Insert a validated body stamped with tenant and actor.
    pub async fn create(
        store: &dyn RecordStore,
        resource: &ResolvedResource,
        scope: &TenantScope,
        body: Record,
    ) -> Result<Record, AppError> {
        let mut values = body;
        scope.stamp_create(&mut values);
        let row = store.insert(resource.table(), values).await?;
        Self::present(resource, &row)
    }

    /// Fields present in `body` overwrite; absent fields keep the stored value.
    /// No lock is held between load and write: concurrent patches are last-write-wins.
    pub async fn patch(
        store: &dyn RecordStore,
        resource: &ResolvedResource,
        scope: &TenantScope,
        id: i64,
        body: Record,
    ) -> Result<Record, AppError> {
        let existing = Self::load_active(store, resource, scope, id).await?;
        let mut merged = Record::new();
        for name in resource.schemas.patch.field_names() {
            let value = body
                .get(name)
                .or_else(|| existing.get(name))
                .cloned()
                .unwrap_or(Value::Null);
            merged.insert(name.to_string(), value);
        }
        scope.stamp_update(&mut merged);
        let row = store
            .update(resource.table(), &scope.by_id(id), merged)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(resource.name().to_string()))?;
        Self::present(resource, &row)
    }

    /// Soft-delete the row and, one level deep, its active dependents in the same tenant.
    /// Writes are issued concurrently and are not atomic.
    pub async fn delete(
        store: &dyn RecordStore,
        resource: &ResolvedResource,
        scope: &TenantScope,
        id: i64,
    ) -> Result<(), AppError> {
        Self::load_active(store, resource, scope, id).await?;
        let values = scope.soft_delete_values();
        let own = scope.by_id(id);
        let cascade_filters: Vec<_> = resource
            .cascades
            .iter()
            .map(|c| (c, scope.by_reference(&c.foreign_key, id)))
            .collect();
        let mut writes = vec![store.update(resource.table(), &own, values.clone())];
        for (target, filter) in &cascade_filters {
            writes.push(store.update(&target.table, filter, values.clone()));
        }
        let results = try_join_all(writes).await?;
        for ((target, _), rows) in cascade_filters.iter().zip(results.iter().skip(1)) {
            if !rows.is_empty() {
                tracing::debug!(entity = %resource.name(), id, child = %target.child, count = rows.len(), "cascade soft delete");
            }
        }
        Ok(())
    }

    async fn load_active(
        store: &dyn RecordStore,
        resource: &ResolvedResource,
        scope: &TenantScope,
        id: i64,
    ) -> Result<Record, AppError> {
        store
            .select(resource.table(), &scope.by_id(id), None)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(resource.name().to_string()))
    }

    /// Shape a stored row through the select schema.
    fn present(resource: &ResolvedResource, row: &Record) -> Result<Record, AppError> {
        resource
            .schemas
            .select
            .validate(&Value::Object(row.clone()))
            .map_err(|e| AppError::Internal(format!("stored {} row does not match its schema: {}", resource.name(), e)))
    }
}
