//! Process-local store. Tables are created on first use; rows live in insertion order.

use super::{Filter, Page, Record, RecordStore};
use crate::config::{TableDef, CREATED_AT, ID, UPDATED_AT};
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Default)]
struct MemTable {
    next_id: i64,
    rows: Vec<Record>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, MemTable>>,
}

fn now() -> Value {
    Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn poisoned() -> StoreError {
    StoreError::Other("memory store lock poisoned".into())
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Every stored row of `table`, soft-deleted ones included.
    pub fn raw_rows(&self, table: &str) -> Vec<Record> {
        self.tables
            .read()
            .map(|t| t.get(table).map(|t| t.rows.clone()).unwrap_or_default())
            .unwrap_or_default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn select(&self, table: &TableDef, filter: &Filter, page: Option<Page>) -> Result<Vec<Record>, StoreError> {
        let tables = self.tables.read().map_err(|_| poisoned())?;
        let Some(t) = tables.get(&table.name) else {
            return Ok(Vec::new());
        };
        let matching = t.rows.iter().filter(|r| filter.matches(r));
        let rows = match page {
            Some(p) => matching
                .skip(usize::try_from(p.offset).unwrap_or(usize::MAX))
                .take(p.limit as usize)
                .cloned()
                .collect(),
            None => matching.cloned().collect(),
        };
        Ok(rows)
    }

    async fn count(&self, table: &TableDef, filter: &Filter) -> Result<u64, StoreError> {
        let tables = self.tables.read().map_err(|_| poisoned())?;
        Ok(tables
            .get(&table.name)
            .map(|t| t.rows.iter().filter(|r| filter.matches(r)).count() as u64)
            .unwrap_or(0))
    }

    async fn insert(&self, table: &TableDef, mut values: Record) -> Result<Record, StoreError> {
        let mut tables = self.tables.write().map_err(|_| poisoned())?;
        let t = tables.entry(table.name.clone()).or_default();
        t.next_id += 1;
        let mut row = Record::new();
        for col in table.columns() {
            let v = values
                .remove(&col.name)
                .or(col.default)
                .unwrap_or(Value::Null);
            row.insert(col.name, v);
        }
        let ts = now();
        row.insert(ID.to_string(), Value::from(t.next_id));
        row.insert(CREATED_AT.to_string(), ts.clone());
        row.insert(UPDATED_AT.to_string(), ts);
        t.rows.push(row.clone());
        Ok(row)
    }

    async fn update(&self, table: &TableDef, filter: &Filter, values: Record) -> Result<Vec<Record>, StoreError> {
        let mut tables = self.tables.write().map_err(|_| poisoned())?;
        let Some(t) = tables.get_mut(&table.name) else {
            return Ok(Vec::new());
        };
        let ts = now();
        let mut out = Vec::new();
        for row in t.rows.iter_mut().filter(|r| filter.matches(r)) {
            for (k, v) in &values {
                if k != ID && row.contains_key(k) {
                    row.insert(k.clone(), v.clone());
                }
            }
            row.insert(UPDATED_AT.to_string(), ts.clone());
            out.push(row.clone());
        }
        Ok(out)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.tables.read().map(|_| ()).map_err(|_| poisoned())
    }
}
