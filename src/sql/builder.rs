//! Builds parameterized SELECT, COUNT, INSERT and UPDATE from a table definition and filter.

use crate::config::{FieldType, TableDef, CREATED_AT, ID, UPDATED_AT};
use crate::sql::params::PgBindValue;
use crate::store::{Condition, Filter, Page, Record};
use serde_json::Value;

/// Quote identifier for PostgreSQL (safe: only from descriptors).
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// SQL type a parameter is cast to for a column of this type.
pub fn pg_type(type_: FieldType) -> &'static str {
    match type_ {
        FieldType::Text => "text",
        FieldType::Integer => "bigint",
        FieldType::Number => "double precision",
        FieldType::Boolean => "boolean",
        FieldType::Date => "date",
        FieldType::Timestamp => "timestamptz",
        FieldType::Uuid => "uuid",
        FieldType::Json => "jsonb",
    }
}

#[derive(Debug, Default)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<PgBindValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf::default()
    }

    fn push_param(&mut self, v: PgBindValue) -> usize {
        self.params.push(v);
        self.params.len()
    }

    /// Push a parameter and return its placeholder, cast to the column type when known.
    /// The bind type follows the column, so scalars headed for a json column bind as jsonb.
    fn placeholder(&mut self, table: &TableDef, column: &str, v: Value) -> String {
        let type_ = table.column_type(column);
        let n = self.push_param(PgBindValue::for_column(type_, &v));
        match type_ {
            Some(t) => format!("${}::{}", n, pg_type(t)),
            None => format!("${}", n),
        }
    }
}

fn column_list(table: &TableDef) -> String {
    table
        .columns()
        .iter()
        .map(|c| quoted(&c.name))
        .collect::<Vec<_>>()
        .join(", ")
}

fn where_clause(q: &mut QueryBuf, table: &TableDef, filter: &Filter) -> String {
    let parts: Vec<String> = filter
        .conditions
        .iter()
        .map(|c| match c {
            Condition::Eq(col, v) => {
                let ph = q.placeholder(table, col, v.clone());
                format!("{} = {}", quoted(col), ph)
            }
            Condition::IsNull(col) => format!("{} IS NULL", quoted(col)),
        })
        .collect();
    if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    }
}

/// Columns storage manages itself; never written from a value map.
fn is_managed(column: &str) -> bool {
    column == ID || column == CREATED_AT || column == UPDATED_AT
}

/// SELECT with filter and optional LIMIT/OFFSET. No ORDER BY: row order is unspecified.
pub fn select(table: &TableDef, filter: &Filter, page: Option<Page>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_ = where_clause(&mut q, table, filter);
    let page_clause = page
        .map(|p| format!(" LIMIT {} OFFSET {}", p.limit, p.offset))
        .unwrap_or_default();
    q.sql = format!(
        "SELECT {} FROM {}{}{}",
        column_list(table),
        quoted(&table.name),
        where_,
        page_clause
    );
    q
}

pub fn count(table: &TableDef, filter: &Filter) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_ = where_clause(&mut q, table, filter);
    q.sql = format!("SELECT COUNT(*) AS \"count\" FROM {}{}", quoted(&table.name), where_);
    q
}

/// INSERT of the known columns present in `values`. Omitted columns take their DB default.
pub fn insert(table: &TableDef, values: &Record) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for c in table.columns() {
        if is_managed(&c.name) {
            continue;
        }
        let Some(v) = values.get(&c.name) else { continue };
        placeholders.push(q.placeholder(table, &c.name, v.clone()));
        cols.push(quoted(&c.name));
    }
    let target = if cols.is_empty() {
        " DEFAULT VALUES".to_string()
    } else {
        format!(" ({}) VALUES ({})", cols.join(", "), placeholders.join(", "))
    };
    q.sql = format!(
        "INSERT INTO {}{} RETURNING {}",
        quoted(&table.name),
        target,
        column_list(table)
    );
    q
}

/// UPDATE matching rows: SET known columns from `values`, always refreshing updated_at.
pub fn update(table: &TableDef, filter: &Filter, values: &Record) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for c in table.columns() {
        if is_managed(&c.name) {
            continue;
        }
        let Some(v) = values.get(&c.name) else { continue };
        let ph = q.placeholder(table, &c.name, v.clone());
        sets.push(format!("{} = {}", quoted(&c.name), ph));
    }
    sets.push(format!("{} = NOW()", quoted(UPDATED_AT)));
    let where_ = where_clause(&mut q, table, filter);
    q.sql = format!(
        "UPDATE {} SET {}{} RETURNING {}",
        quoted(&table.name),
        sets.join(", "),
        where_,
        column_list(table)
    );
    q
}
