//! Storage collaborator contract: filtered select, count, insert and update with returned rows.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::{ensure_database_exists, PgStore};

use crate::config::TableDef;
use crate::error::StoreError;
use async_trait::async_trait;
use serde_json::Value;

/// One row, keyed by column name.
pub type Record = serde_json::Map<String, Value>;

#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    Eq(String, Value),
    IsNull(String),
}

impl Condition {
    pub fn matches(&self, row: &Record) -> bool {
        match self {
            Condition::Eq(col, v) => row.get(col).map(|r| r == v).unwrap_or(false),
            Condition::IsNull(col) => row.get(col).map(Value::is_null).unwrap_or(true),
        }
    }
}

/// AND-composition of conditions. An empty filter matches every row.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Filter {
    pub conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Filter::default()
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Eq(column.into(), value.into()));
        self
    }

    pub fn is_null(mut self, column: impl Into<String>) -> Self {
        self.conditions.push(Condition::IsNull(column.into()));
        self
    }

    pub fn matches(&self, row: &Record) -> bool {
        self.conditions.iter().all(|c| c.matches(row))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
    pub limit: u32,
    pub offset: u64,
}

/// What the controller needs from a storage engine. Each call is one independent statement;
/// no cross-call atomicity is assumed.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Rows matching `filter`, no guaranteed order.
    async fn select(&self, table: &TableDef, filter: &Filter, page: Option<Page>) -> Result<Vec<Record>, StoreError>;

    async fn count(&self, table: &TableDef, filter: &Filter) -> Result<u64, StoreError>;

    /// Insert one row; storage assigns `id`, timestamps and column defaults. Returns the stored row.
    async fn insert(&self, table: &TableDef, values: Record) -> Result<Record, StoreError>;

    /// Set `values` on every matching row and refresh `updated_at`. Returns the modified rows.
    async fn update(&self, table: &TableDef, filter: &Filter, values: Record) -> Result<Vec<Record>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}
