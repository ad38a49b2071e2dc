//! Object schemas and request validation against them.
//!
//! An [`ObjectSchema`] is a flat list of typed fields. The same value drives live
//! validation (here) and API documentation (`crate::openapi`).

use crate::config::{FieldDef, FieldRules, FieldType};
use crate::error::{PathSegment, ValidationError, ValidationIssue};
use crate::store::Record;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: FieldType,
    #[serde(default)]
    pub nullable: bool,
    /// Field may be absent from the input.
    #[serde(default)]
    pub optional: bool,
    /// Value filled in when the field is absent.
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(default)]
    pub rules: FieldRules,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub example: Option<Value>,
}

impl SchemaField {
    pub fn new(name: impl Into<String>, type_: FieldType) -> Self {
        SchemaField {
            name: name.into(),
            type_,
            nullable: false,
            optional: false,
            default: None,
            rules: FieldRules::default(),
            description: None,
            example: None,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn rules(mut self, rules: FieldRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn example(mut self, example: Value) -> Self {
        self.example = Some(example);
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Documentation example: explicit example, else default, else a placeholder for the type.
    pub fn example_value(&self) -> Value {
        if let Some(e) = &self.example {
            return e.clone();
        }
        if let Some(d) = &self.default {
            return d.clone();
        }
        if let Some(first) = self.rules.allowed.as_ref().and_then(|a| a.first()) {
            return first.clone();
        }
        match self.type_ {
            FieldType::Text => Value::String("string".into()),
            FieldType::Integer => Value::from(self.rules.minimum.map(|m| m as i64).unwrap_or(1)),
            FieldType::Number => Value::from(self.rules.minimum.unwrap_or(0.0)),
            FieldType::Boolean => Value::Bool(true),
            FieldType::Date => Value::String("2025-01-01".into()),
            FieldType::Timestamp => Value::String("2025-01-01T00:00:00Z".into()),
            FieldType::Uuid => Value::String("00000000-0000-0000-0000-000000000000".into()),
            FieldType::Json => Value::Object(serde_json::Map::new()),
        }
    }
}

impl From<&FieldDef> for SchemaField {
    fn from(def: &FieldDef) -> Self {
        SchemaField {
            name: def.name.clone(),
            type_: def.type_,
            nullable: def.nullable,
            optional: false,
            default: None,
            rules: def.rules.clone(),
            description: def.description.clone(),
            example: def.example.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectSchema {
    /// Component name used in generated documentation.
    pub name: String,
    #[serde(default)]
    pub fields: Vec<SchemaField>,
}

impl ObjectSchema {
    pub fn new(name: impl Into<String>) -> Self {
        ObjectSchema {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: SchemaField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn from_columns(name: impl Into<String>, columns: &[FieldDef]) -> Self {
        ObjectSchema {
            name: name.into(),
            fields: columns.iter().map(SchemaField::from).collect(),
        }
    }

    /// Copy without the named fields.
    pub fn omit(&self, name: impl Into<String>, keys: &[&str]) -> Self {
        ObjectSchema {
            name: name.into(),
            fields: self
                .fields
                .iter()
                .filter(|f| !keys.contains(&f.name.as_str()))
                .cloned()
                .collect(),
        }
    }

    /// Copy with every field optional and no defaults: absent means "leave unchanged".
    pub fn partial(&self, name: impl Into<String>) -> Self {
        ObjectSchema {
            name: name.into(),
            fields: self
                .fields
                .iter()
                .cloned()
                .map(|mut f| {
                    f.optional = true;
                    f.default = None;
                    f
                })
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Validate a JSON value. Unknown keys are dropped, defaults applied, all issues collected.
    pub fn validate(&self, input: &Value) -> Result<Record, ValidationError> {
        let Value::Object(obj) = input else {
            return Err(ValidationError::single(
                "invalid_type",
                Vec::new(),
                format!("Expected object, received {}", received(input)),
            ));
        };
        let mut out = Record::new();
        let mut issues = Vec::new();
        for field in &self.fields {
            match obj.get(&field.name) {
                None => {
                    if let Some(d) = &field.default {
                        out.insert(field.name.clone(), d.clone());
                    } else if !field.optional {
                        issues.push(ValidationIssue::new(
                            "invalid_type",
                            vec![field.name.as_str().into()],
                            "Required",
                        ));
                    }
                }
                Some(Value::Null) => {
                    if field.nullable {
                        out.insert(field.name.clone(), Value::Null);
                    } else {
                        issues.push(ValidationIssue::new(
                            "invalid_type",
                            vec![field.name.as_str().into()],
                            format!("Expected {}, received null", field.type_.label()),
                        ));
                    }
                }
                Some(v) => match validate_field(field, v) {
                    Ok(normalized) => {
                        out.insert(field.name.clone(), normalized);
                    }
                    Err(mut field_issues) => issues.append(&mut field_issues),
                },
            }
        }
        if issues.is_empty() {
            Ok(out)
        } else {
            Err(ValidationError::new(issues))
        }
    }

    /// Validate raw query or path strings, coercing each to its field type first.
    pub fn validate_coerced(&self, raw: &HashMap<String, String>) -> Result<Record, ValidationError> {
        let mut obj = serde_json::Map::new();
        for field in &self.fields {
            if let Some(s) = raw.get(&field.name) {
                obj.insert(field.name.clone(), coerce(field.type_, s));
            }
        }
        self.validate(&Value::Object(obj))
    }
}

fn coerce(type_: FieldType, s: &str) -> Value {
    let trimmed = s.trim();
    match type_ {
        FieldType::Integer | FieldType::Number => {
            if let Ok(n) = trimmed.parse::<i64>() {
                return Value::from(n);
            }
            trimmed
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(s.to_string()))
        }
        FieldType::Boolean => match trimmed {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::String(s.to_string()),
        },
        _ => Value::String(s.to_string()),
    }
}

fn received(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn type_mismatch(field: &SchemaField, v: &Value) -> Vec<ValidationIssue> {
    vec![ValidationIssue::new(
        "invalid_type",
        vec![field.name.as_str().into()],
        format!("Expected {}, received {}", field.type_.label(), received(v)),
    )]
}

/// Check the type, normalize integers, then apply rules.
fn validate_field(field: &SchemaField, v: &Value) -> Result<Value, Vec<ValidationIssue>> {
    let path = || -> Vec<PathSegment> { vec![field.name.as_str().into()] };
    let normalized = match field.type_ {
        FieldType::Text => match v {
            Value::String(_) => v.clone(),
            _ => return Err(type_mismatch(field, v)),
        },
        FieldType::Integer => match v.as_i64() {
            Some(n) => Value::from(n),
            None => match v.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Value::from(f as i64),
                _ => return Err(type_mismatch(field, v)),
            },
        },
        FieldType::Number => match v {
            Value::Number(_) => v.clone(),
            _ => return Err(type_mismatch(field, v)),
        },
        FieldType::Boolean => match v {
            Value::Bool(_) => v.clone(),
            _ => return Err(type_mismatch(field, v)),
        },
        FieldType::Date => match v.as_str() {
            Some(s) => {
                if chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_err() {
                    return Err(vec![ValidationIssue::new("invalid_string", path(), "Invalid date")]);
                }
                v.clone()
            }
            None => return Err(type_mismatch(field, v)),
        },
        FieldType::Timestamp => match v.as_str() {
            Some(s) => {
                if chrono::DateTime::parse_from_rfc3339(s).is_err() {
                    return Err(vec![ValidationIssue::new("invalid_string", path(), "Invalid datetime")]);
                }
                v.clone()
            }
            None => return Err(type_mismatch(field, v)),
        },
        FieldType::Uuid => match v.as_str() {
            Some(s) => {
                if uuid::Uuid::parse_str(s).is_err() {
                    return Err(vec![ValidationIssue::new("invalid_string", path(), "Invalid uuid")]);
                }
                v.clone()
            }
            None => return Err(type_mismatch(field, v)),
        },
        FieldType::Json => v.clone(),
    };
    let issues = check_rules(field, &normalized);
    if issues.is_empty() {
        Ok(normalized)
    } else {
        Err(issues)
    }
}

fn check_rules(field: &SchemaField, v: &Value) -> Vec<ValidationIssue> {
    let rule = &field.rules;
    let path = || -> Vec<PathSegment> { vec![field.name.as_str().into()] };
    let mut issues = Vec::new();
    if let Some(s) = v.as_str() {
        if let Some(format) = &rule.format {
            if let Some(message) = check_format(s, format) {
                issues.push(ValidationIssue::new("invalid_string", path(), message));
            }
        }
        let len = s.chars().count();
        if let Some(min) = rule.min_length {
            if len < min as usize {
                issues.push(ValidationIssue::new(
                    "too_small",
                    path(),
                    format!("String must contain at least {} character(s)", min),
                ));
            }
        }
        if let Some(max) = rule.max_length {
            if len > max as usize {
                issues.push(ValidationIssue::new(
                    "too_big",
                    path(),
                    format!("String must contain at most {} character(s)", max),
                ));
            }
        }
        if let Some(pattern) = &rule.pattern {
            match Regex::new(pattern) {
                Ok(re) if re.is_match(s) => {}
                Ok(_) => issues.push(ValidationIssue::new("invalid_string", path(), "Invalid")),
                Err(_) => issues.push(ValidationIssue::new(
                    "invalid_string",
                    path(),
                    format!("invalid pattern for {}", field.name),
                )),
            }
        }
    }
    if let Some(allowed) = &rule.allowed {
        if !allowed.iter().any(|a| value_eq(v, a)) {
            let options: Vec<String> = allowed.iter().map(|a| a.to_string()).collect();
            issues.push(ValidationIssue::new(
                "invalid_enum_value",
                path(),
                format!("Invalid enum value. Expected {}", options.join(" | ")),
            ));
        }
    }
    if let Some(n) = v.as_f64() {
        if let Some(min) = rule.minimum {
            if n < min {
                issues.push(ValidationIssue::new(
                    "too_small",
                    path(),
                    format!("Number must be greater than or equal to {}", min),
                ));
            }
        }
        if let Some(max) = rule.maximum {
            if n > max {
                issues.push(ValidationIssue::new(
                    "too_big",
                    path(),
                    format!("Number must be less than or equal to {}", max),
                ));
            }
        }
    }
    issues
}

fn value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(n), Value::Number(m)) => n.as_f64() == m.as_f64(),
        _ => a == b,
    }
}

fn check_format(s: &str, format: &str) -> Option<&'static str> {
    match format.to_lowercase().as_str() {
        "email" => {
            let valid = s
                .split_once('@')
                .map(|(local, domain)| !local.is_empty() && domain.contains('.'))
                .unwrap_or(false);
            (!valid).then_some("Invalid email")
        }
        "uuid" => uuid::Uuid::parse_str(s).is_err().then_some("Invalid uuid"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn task_insert() -> ObjectSchema {
        ObjectSchema::new("TasksInsert")
            .field(SchemaField::new("title", FieldType::Text).rules(FieldRules {
                min_length: Some(1),
                max_length: Some(10),
                ..FieldRules::default()
            }))
            .field(SchemaField::new("description", FieldType::Text).nullable().optional())
            .field(SchemaField::new("completed", FieldType::Boolean).optional())
    }

    #[test]
    fn strips_unknown_keys() {
        let out = task_insert()
            .validate(&json!({"title": "Buy milk", "organizationId": "evil"}))
            .unwrap();
        assert_eq!(out.get("title"), Some(&json!("Buy milk")));
        assert!(!out.contains_key("organizationId"));
    }

    #[test]
    fn collects_every_issue() {
        let err = task_insert()
            .validate(&json!({"description": 3, "completed": "yes"}))
            .unwrap_err();
        assert_eq!(err.issues.len(), 3);
        assert_eq!(err.issues[0].message, "Required");
        assert_eq!(err.issues[1].message, "Expected string, received number");
        assert_eq!(err.issues[2].path, vec![PathSegment::Key("completed".into())]);
    }

    #[test]
    fn rejects_null_on_non_nullable() {
        let err = task_insert().validate(&json!({"title": null})).unwrap_err();
        assert_eq!(err.issues[0].code, "invalid_type");
        assert_eq!(err.issues[0].message, "Expected string, received null");
    }

    #[test]
    fn rejects_non_object() {
        let err = task_insert().validate(&json!([1, 2])).unwrap_err();
        assert!(err.issues[0].path.is_empty());
        assert_eq!(err.issues[0].message, "Expected object, received array");
    }

    #[test]
    fn length_rules_apply() {
        let err = task_insert().validate(&json!({"title": ""})).unwrap_err();
        assert_eq!(err.issues[0].code, "too_small");
        let err = task_insert()
            .validate(&json!({"title": "far too long a title"}))
            .unwrap_err();
        assert_eq!(err.issues[0].code, "too_big");
    }

    #[test]
    fn coerces_query_strings() {
        let schema = ObjectSchema::new("Query").field(
            SchemaField::new("limit", FieldType::Integer)
                .default_value(json!(50))
                .rules(FieldRules {
                    minimum: Some(1.0),
                    maximum: Some(100.0),
                    ..FieldRules::default()
                }),
        );
        let mut raw = HashMap::new();
        assert_eq!(schema.validate_coerced(&raw).unwrap()["limit"], json!(50));
        raw.insert("limit".to_string(), "20".to_string());
        assert_eq!(schema.validate_coerced(&raw).unwrap()["limit"], json!(20));
        raw.insert("limit".to_string(), "abc".to_string());
        let err = schema.validate_coerced(&raw).unwrap_err();
        assert_eq!(err.issues[0].message, "Expected integer, received string");
        raw.insert("limit".to_string(), "101".to_string());
        assert_eq!(schema.validate_coerced(&raw).unwrap_err().issues[0].code, "too_big");
    }

    #[test]
    fn integer_accepts_whole_floats() {
        let schema = ObjectSchema::new("N").field(SchemaField::new("n", FieldType::Integer));
        assert_eq!(schema.validate(&json!({"n": 3.0})).unwrap()["n"], json!(3));
        assert!(schema.validate(&json!({"n": 3.5})).is_err());
    }

    #[test]
    fn formats_and_enums() {
        let schema = ObjectSchema::new("Contact")
            .field(SchemaField::new("email", FieldType::Text).rules(FieldRules {
                format: Some("email".into()),
                ..FieldRules::default()
            }))
            .field(SchemaField::new("kind", FieldType::Text).rules(FieldRules {
                allowed: Some(vec![json!("home"), json!("work")]),
                ..FieldRules::default()
            }));
        let err = schema
            .validate(&json!({"email": "nope", "kind": "other"}))
            .unwrap_err();
        assert_eq!(err.issues[0].message, "Invalid email");
        assert_eq!(err.issues[1].code, "invalid_enum_value");
        assert!(schema
            .validate(&json!({"email": "a@b.io", "kind": "work"}))
            .is_ok());
    }

    #[test]
    fn dates_must_parse() {
        let schema = ObjectSchema::new("E").field(SchemaField::new("date", FieldType::Date));
        assert!(schema.validate(&json!({"date": "2025-02-30"})).is_err());
        assert!(schema.validate(&json!({"date": "2025-02-28"})).is_ok());
    }

    #[test]
    fn partial_accepts_empty_object() {
        let patch = task_insert().partial("TasksPatch");
        assert!(patch.validate(&json!({})).unwrap().is_empty());
    }
}
