//! Resource descriptor types: the declarative, per-entity definition routes are generated from.

use crate::case;
use crate::schema::ObjectSchema;
use serde::{Deserialize, Serialize};

pub const ID: &str = "id";
pub const ORGANIZATION_ID: &str = "organizationId";
pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";
pub const DELETED_AT: &str = "deleted_at";
pub const CREATED_BY: &str = "created_by";
pub const UPDATED_BY: &str = "updated_by";
pub const DELETED_BY: &str = "deleted_by";

/// Tenant, timestamp and audit columns. Never part of a client-facing schema.
pub const SELECT_OMITTED: [&str; 7] = [
    ORGANIZATION_ID,
    CREATED_AT,
    UPDATED_AT,
    DELETED_AT,
    CREATED_BY,
    UPDATED_BY,
    DELETED_BY,
];

/// Semantic column type. Drives validation, SQL casts and documentation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Integer,
    Number,
    Boolean,
    /// Calendar date, `YYYY-MM-DD`.
    Date,
    /// RFC 3339 timestamp with offset.
    Timestamp,
    Uuid,
    Json,
}

impl FieldType {
    pub fn label(&self) -> &'static str {
        match self {
            FieldType::Text => "string",
            FieldType::Integer => "integer",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Timestamp => "timestamp",
            FieldType::Uuid => "uuid",
            FieldType::Json => "json",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRules {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
}

/// One declared business column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: FieldType,
    #[serde(default)]
    pub nullable: bool,
    /// Column default applied by storage when an insert omits the field.
    #[serde(default)]
    pub default: Option<serde_json::Value>,
    #[serde(default)]
    pub rules: FieldRules,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub example: Option<serde_json::Value>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, type_: FieldType) -> Self {
        FieldDef {
            name: name.into(),
            type_,
            nullable: false,
            default: None,
            rules: FieldRules::default(),
            description: None,
            example: None,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Text)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Integer)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Boolean)
    }

    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Date)
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn default_value(mut self, value: serde_json::Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn rules(mut self, rules: FieldRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn example(mut self, example: serde_json::Value) -> Self {
        self.example = Some(example);
        self
    }
}

/// Storage shape of one entity: table name plus declared business columns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TableDef {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

impl TableDef {
    pub fn new(name: impl Into<String>) -> Self {
        TableDef {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Full column set: fixed common columns followed by business columns.
    pub fn columns(&self) -> Vec<FieldDef> {
        let mut out = common_columns();
        out.extend(self.fields.iter().cloned());
        out
    }

    pub fn column_type(&self, name: &str) -> Option<FieldType> {
        common_columns()
            .into_iter()
            .chain(self.fields.iter().cloned())
            .find(|c| c.name == name)
            .map(|c| c.type_)
    }
}

/// Columns every entity table carries.
pub fn common_columns() -> Vec<FieldDef> {
    vec![
        FieldDef::integer(ID).example(serde_json::json!(1)),
        FieldDef::text(ORGANIZATION_ID),
        FieldDef::new(CREATED_AT, FieldType::Timestamp),
        FieldDef::new(UPDATED_AT, FieldType::Timestamp),
        FieldDef::new(DELETED_AT, FieldType::Timestamp).nullable(),
        FieldDef::text(CREATED_BY).nullable(),
        FieldDef::text(UPDATED_BY).nullable(),
        FieldDef::text(DELETED_BY).nullable(),
    ]
}

/// A dependent entity whose rows reference this entity through `foreign_key`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    /// Name of the dependent resource.
    pub child: String,
    pub foreign_key: String,
}

impl Relation {
    pub fn new(child: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        Relation {
            child: child.into(),
            foreign_key: foreign_key.into(),
        }
    }

    /// Relation keyed by `<parent-singular>Id`, e.g. `tasks` -> `taskId`.
    pub fn conventional(parent: &str, child: impl Into<String>) -> Self {
        Self::new(child, case::foreign_key_for(parent))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    List,
    Get,
    Create,
    Patch,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::List,
        Operation::Get,
        Operation::Create,
        Operation::Patch,
        Operation::Delete,
    ];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Operations {
    pub list: bool,
    pub get: bool,
    pub create: bool,
    pub patch: bool,
    pub delete: bool,
}

impl Default for Operations {
    fn default() -> Self {
        Operations {
            list: true,
            get: true,
            create: true,
            patch: true,
            delete: true,
        }
    }
}

impl Operations {
    pub fn is_enabled(&self, op: Operation) -> bool {
        match op {
            Operation::List => self.list,
            Operation::Get => self.get,
            Operation::Create => self.create,
            Operation::Patch => self.patch,
            Operation::Delete => self.delete,
        }
    }

    pub fn disable(mut self, op: Operation) -> Self {
        match op {
            Operation::List => self.list = false,
            Operation::Get => self.get = false,
            Operation::Create => self.create = false,
            Operation::Patch => self.patch = false,
            Operation::Delete => self.delete = false,
        }
        self
    }
}

/// Explicit schemas that replace derivation. Not cross-checked against the table.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaOverrides {
    #[serde(default)]
    pub select: Option<ObjectSchema>,
    #[serde(default)]
    pub insert: Option<ObjectSchema>,
    #[serde(default)]
    pub patch: Option<ObjectSchema>,
}

/// Declarative bundle for one entity. Built once at startup, shared behind `Arc` afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    /// Used for paths, tags and messages.
    pub name: String,
    pub table: TableDef,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub relations: Vec<Relation>,
    #[serde(default)]
    pub overrides: SchemaOverrides,
    #[serde(default)]
    pub operations: Operations,
}

impl ResourceDescriptor {
    pub fn new(name: impl Into<String>, table: TableDef) -> Self {
        ResourceDescriptor {
            name: name.into(),
            table,
            tags: Vec::new(),
            relations: Vec::new(),
            overrides: SchemaOverrides::default(),
            operations: Operations::default(),
        }
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn relation(mut self, relation: Relation) -> Self {
        self.relations.push(relation);
        self
    }

    /// Declare `child` as dependent through the conventional `<name-singular>Id` key.
    pub fn dependent(self, child: impl Into<String>) -> Self {
        let relation = Relation::conventional(&self.name, child);
        self.relation(relation)
    }

    pub fn overrides(mut self, overrides: SchemaOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn disable(mut self, op: Operation) -> Self {
        self.operations = self.operations.disable(op);
        self
    }
}
