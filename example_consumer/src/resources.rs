//! Built-in resources served when no RESOURCES_PATH manifest is configured.

use serde_json::json;
use tenant_crud::config::{FieldDef, FieldRules, FieldType, TableDef};
use tenant_crud::ResourceDescriptor;

pub fn tasks() -> ResourceDescriptor {
    ResourceDescriptor::new(
        "tasks",
        TableDef::new("tasks")
            .field(
                FieldDef::text("title")
                    .rules(FieldRules {
                        min_length: Some(1),
                        ..FieldRules::default()
                    })
                    .example(json!("Buy milk")),
            )
            .field(FieldDef::text("description").nullable().example(json!("Two litres, semi-skimmed")))
            .field(FieldDef::boolean("completed").default_value(json!(false))),
    )
    .tag("Tasks")
}

pub fn expenses() -> ResourceDescriptor {
    ResourceDescriptor::new(
        "expenses",
        TableDef::new("expenses")
            .field(FieldDef::text("title").example(json!("Team lunch")))
            .field(FieldDef::text("amount").example(json!("42.50")))
            .field(FieldDef::text("category").example(json!("Food")))
            .field(FieldDef::new("date", FieldType::Date).example(json!("2025-01-31"))),
    )
}

pub fn builtin() -> Vec<ResourceDescriptor> {
    vec![tasks(), expenses()]
}
