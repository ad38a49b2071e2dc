//! OpenAPI 3.1 document rendered from the registry's route descriptors.

use crate::config::{FieldType, ResourceRegistry};
use crate::error::ValidationError;
use crate::route_config::{ResponseContent, ResponseSpec, RouteDescriptor};
use crate::schema::{ObjectSchema, SchemaField};
use axum::http::Method;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use utoipa::openapi::path::{HttpMethod, OperationBuilder, ParameterBuilder, ParameterIn, PathItemBuilder};
use utoipa::openapi::request_body::RequestBodyBuilder;
use utoipa::openapi::schema::{Array, KnownFormat, ObjectBuilder, Schema, SchemaFormat, SchemaType, Type};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityRequirement, SecurityScheme};
use utoipa::openapi::tag::TagBuilder;
use utoipa::openapi::{
    ComponentsBuilder, ContentBuilder, InfoBuilder, OpenApi, OpenApiBuilder, PathsBuilder, Ref, RefOr,
    Required, ResponseBuilder, Server,
};
use utoipa::Number;

pub const SECURITY_SCHEME: &str = "apiKeyCookie";
pub const SESSION_COOKIE: &str = "session_token";

const JSON: &str = "application/json";

#[derive(Clone, Debug)]
pub struct DocInfo {
    pub title: String,
    pub version: String,
    /// Server URL the paths are relative to, usually the API base path.
    pub server_url: String,
}

impl DocInfo {
    pub fn new(title: impl Into<String>, version: impl Into<String>, server_url: impl Into<String>) -> Self {
        DocInfo {
            title: title.into(),
            version: version.into(),
            server_url: server_url.into(),
        }
    }
}

fn wrap(schema: Schema) -> RefOr<Schema> {
    RefOr::T(schema)
}

fn typed(type_: Type, nullable: bool) -> SchemaType {
    if nullable {
        SchemaType::Array(vec![type_, Type::Null])
    } else {
        SchemaType::Type(type_)
    }
}

fn number(value: f64, integer: bool) -> Number {
    if integer && value.fract() == 0.0 {
        Number::Int(value as isize)
    } else {
        Number::Float(value)
    }
}

/// JSON schema of one field, rules included.
pub fn field_schema(field: &SchemaField) -> RefOr<Schema> {
    let (schema_type, format) = match field.type_ {
        FieldType::Text => (typed(Type::String, field.nullable), None),
        FieldType::Integer => (typed(Type::Integer, field.nullable), Some(KnownFormat::Int64)),
        FieldType::Number => (typed(Type::Number, field.nullable), Some(KnownFormat::Double)),
        FieldType::Boolean => (typed(Type::Boolean, field.nullable), None),
        FieldType::Date => (typed(Type::String, field.nullable), Some(KnownFormat::Date)),
        FieldType::Timestamp => (typed(Type::String, field.nullable), Some(KnownFormat::DateTime)),
        FieldType::Uuid => (typed(Type::String, field.nullable), Some(KnownFormat::Uuid)),
        FieldType::Json => (SchemaType::AnyValue, None),
    };
    let integer = field.type_ == FieldType::Integer;
    let rules = &field.rules;
    let mut b = ObjectBuilder::new()
        .schema_type(schema_type)
        .description(field.description.clone())
        .default(field.default.clone())
        .min_length(rules.min_length.map(|n| n as usize))
        .max_length(rules.max_length.map(|n| n as usize))
        .pattern(rules.pattern.clone())
        .minimum(rules.minimum.map(|n| number(n, integer)))
        .maximum(rules.maximum.map(|n| number(n, integer)))
        .enum_values(rules.allowed.clone());
    if let Some(f) = format {
        b = b.format(Some(SchemaFormat::KnownFormat(f)));
    }
    if let Some(f) = &rules.format {
        b = b.format(Some(SchemaFormat::Custom(f.clone())));
    }
    wrap(Schema::Object(b.build()))
}

/// Object schema with required fields for everything neither optional nor defaulted.
pub fn object_schema(schema: &ObjectSchema) -> RefOr<Schema> {
    let mut b = ObjectBuilder::new().schema_type(SchemaType::Type(Type::Object));
    for f in &schema.fields {
        b = b.property(f.name.clone(), field_schema(f));
        if !f.optional && f.default.is_none() {
            b = b.required(f.name.clone());
        }
    }
    wrap(Schema::Object(b.build()))
}

fn component_ref(name: &str) -> RefOr<Schema> {
    RefOr::Ref(Ref::from_schema_name(name))
}

fn envelope_components() -> Vec<(String, RefOr<Schema>)> {
    let boolean = || wrap(Schema::Object(ObjectBuilder::new().schema_type(SchemaType::Type(Type::Boolean)).build()));
    let string = || wrap(Schema::Object(ObjectBuilder::new().schema_type(SchemaType::Type(Type::String)).build()));
    let integer = || wrap(Schema::Object(ObjectBuilder::new().schema_type(SchemaType::Type(Type::Integer)).build()));
    let path_item = wrap(Schema::Object(
        ObjectBuilder::new()
            .schema_type(SchemaType::Array(vec![Type::String, Type::Integer]))
            .build(),
    ));
    let issue = ObjectBuilder::new()
        .schema_type(SchemaType::Type(Type::Object))
        .property("code", string())
        .property("path", wrap(Schema::Array(Array::new(path_item))))
        .property("message", string())
        .required("code")
        .required("path")
        .required("message")
        .build();
    let errors = ObjectBuilder::new()
        .schema_type(SchemaType::Type(Type::Object))
        .property("name", string())
        .property("issues", wrap(Schema::Array(Array::new(wrap(Schema::Object(issue))))))
        .required("name")
        .required("issues")
        .build();
    vec![
        (
            "Pagination".into(),
            wrap(Schema::Object(
                ObjectBuilder::new()
                    .schema_type(SchemaType::Type(Type::Object))
                    .property("totalPages", integer())
                    .property("page", integer())
                    .property("limit", integer())
                    .required("totalPages")
                    .required("page")
                    .required("limit")
                    .build(),
            )),
        ),
        (
            "ErrorResponse".into(),
            wrap(Schema::Object(
                ObjectBuilder::new()
                    .schema_type(SchemaType::Type(Type::Object))
                    .property("success", boolean())
                    .property("error", string())
                    .required("success")
                    .required("error")
                    .build(),
            )),
        ),
        (
            "ValidationErrorResponse".into(),
            wrap(Schema::Object(
                ObjectBuilder::new()
                    .schema_type(SchemaType::Type(Type::Object))
                    .property("success", boolean())
                    .property("message", string())
                    .property("errors", wrap(Schema::Object(errors)))
                    .required("message")
                    .required("errors")
                    .build(),
            )),
        ),
    ]
}

fn success_schema(schema_name: &str, list: bool) -> RefOr<Schema> {
    let data = if list {
        wrap(Schema::Array(Array::new(component_ref(schema_name))))
    } else {
        component_ref(schema_name)
    };
    let mut b = ObjectBuilder::new()
        .schema_type(SchemaType::Type(Type::Object))
        .property(
            "success",
            wrap(Schema::Object(ObjectBuilder::new().schema_type(SchemaType::Type(Type::Boolean)).build())),
        )
        .property("data", data)
        .required("success")
        .required("data");
    if list {
        b = b.property("pagination", component_ref("Pagination")).required("pagination");
    }
    wrap(Schema::Object(b.build()))
}

/// Example record built from field examples, falling back to per-type placeholders.
pub fn example_record(schema: &ObjectSchema) -> Value {
    let mut m = Map::new();
    for f in &schema.fields {
        m.insert(f.name.clone(), f.example_value());
    }
    Value::Object(m)
}

/// Issues a client sees when sending nothing useful: `{}` first, then every field null.
fn validation_example(schemas: &[ObjectSchema]) -> Value {
    let mut issues = Vec::new();
    for s in schemas {
        let empty = Value::Object(Map::new());
        let nulls = Value::Object(s.fields.iter().map(|f| (f.name.clone(), Value::Null)).collect());
        if let Err(e) = s.validate(&empty).and_then(|_| s.validate(&nulls)) {
            issues.extend(e.issues);
        }
    }
    json!({
        "success": false,
        "message": "Validation Error",
        "errors": ValidationError::new(issues),
    })
}

fn response(spec: &ResponseSpec) -> utoipa::openapi::Response {
    let b = ResponseBuilder::new().description(spec.description.clone());
    let content = match &spec.content {
        ResponseContent::Empty => return b.build(),
        ResponseContent::Success { schema, list } => {
            let record = example_record(schema);
            let example = if *list {
                json!({ "success": true, "data": [record], "pagination": { "totalPages": 1, "page": 1, "limit": 50 } })
            } else {
                json!({ "success": true, "data": record })
            };
            ContentBuilder::new()
                .schema(Some(success_schema(&schema.name, *list)))
                .example(Some(example))
                .build()
        }
        ResponseContent::Failure { example } => ContentBuilder::new()
            .schema(Some(component_ref("ErrorResponse")))
            .example(Some(json!({ "success": false, "error": example })))
            .build(),
        ResponseContent::ValidationFailure { schemas } => ContentBuilder::new()
            .schema(Some(component_ref("ValidationErrorResponse")))
            .example(Some(validation_example(schemas)))
            .build(),
    };
    b.content(JSON, content).build()
}

fn http_method(method: &Method) -> HttpMethod {
    match *method {
        Method::POST => HttpMethod::Post,
        Method::PUT => HttpMethod::Put,
        Method::PATCH => HttpMethod::Patch,
        Method::DELETE => HttpMethod::Delete,
        Method::HEAD => HttpMethod::Head,
        Method::OPTIONS => HttpMethod::Options,
        _ => HttpMethod::Get,
    }
}

/// One documented operation from a route descriptor.
pub fn operation(route: &RouteDescriptor) -> utoipa::openapi::path::Operation {
    let mut b = OperationBuilder::new()
        .tags(Some(route.tags.clone()))
        .summary(Some(route.summary.clone()))
        .description(Some(route.description.clone()))
        .operation_id(Some(route.operation_id.clone()));

    let params = route
        .request
        .params
        .iter()
        .flat_map(|s| s.fields.iter().map(|f| (ParameterIn::Path, f)));
    let query = route
        .request
        .query
        .iter()
        .flat_map(|s| s.fields.iter().map(|f| (ParameterIn::Query, f)));
    for (location, field) in params.chain(query) {
        let required = if matches!(location, ParameterIn::Path) || !(field.optional || field.default.is_some()) {
            Required::True
        } else {
            Required::False
        };
        b = b.parameter(
            ParameterBuilder::new()
                .name(field.name.clone())
                .parameter_in(location)
                .required(required)
                .description(field.description.clone())
                .schema(Some(field_schema(field)))
                .build(),
        );
    }

    if let Some(body) = &route.request.body {
        b = b.request_body(Some(
            RequestBodyBuilder::new()
                .description(Some(body.description.clone()))
                .content(
                    JSON,
                    ContentBuilder::new()
                        .schema(Some(component_ref(&body.schema.name)))
                        .example(Some(example_record(&body.schema)))
                        .build(),
                )
                .required(Some(Required::True))
                .build(),
        ));
    }

    for spec in &route.responses {
        b = b.response(spec.status.as_u16().to_string(), response(spec));
    }
    b.build()
}

/// Full document: every resource's routes, schemas, tags and the cookie security scheme.
pub fn build_document(registry: &ResourceRegistry, info: &DocInfo) -> OpenApi {
    let mut components = ComponentsBuilder::new().security_scheme(
        SECURITY_SCHEME,
        SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
            SESSION_COOKIE,
            "Authentication cookie for session management",
        ))),
    );
    for (name, schema) in envelope_components() {
        components = components.schema(name, schema);
    }

    let mut by_path: BTreeMap<&str, Vec<&RouteDescriptor>> = BTreeMap::new();
    let mut tags: Vec<String> = Vec::new();
    for resource in registry.iter() {
        let s = &resource.schemas;
        for schema in [&s.select, &s.insert, &s.patch] {
            components = components.schema(schema.name.clone(), object_schema(schema));
        }
        for route in resource.routes.iter() {
            by_path.entry(route.path.as_str()).or_default().push(route);
            for t in &route.tags {
                if !tags.contains(t) {
                    tags.push(t.clone());
                }
            }
        }
    }

    let mut paths = PathsBuilder::new();
    for (path, routes) in by_path {
        let mut item = PathItemBuilder::new();
        for route in routes {
            item = item.operation(http_method(&route.method), operation(route));
        }
        paths = paths.path(path, item.build());
    }

    OpenApiBuilder::new()
        .info(
            InfoBuilder::new()
                .title(info.title.clone())
                .version(info.version.clone())
                .build(),
        )
        .servers(Some(vec![Server::new(info.server_url.clone())]))
        .paths(paths.build())
        .components(Some(components.build()))
        .security(Some(vec![SecurityRequirement::new(SECURITY_SCHEME, Vec::<String>::new())]))
        .tags(Some(tags.into_iter().map(|t| TagBuilder::new().name(t).build())))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{resolve, FieldDef, FieldRules, Operation, ResourceDescriptor, TableDef};

    fn registry() -> ResourceRegistry {
        let rules = FieldRules {
            min_length: Some(1),
            ..FieldRules::default()
        };
        resolve(vec![
            ResourceDescriptor::new(
                "tasks",
                TableDef::new("tasks")
                    .field(FieldDef::text("title").rules(rules).example(json!("Buy milk")))
                    .field(FieldDef::boolean("completed").default_value(json!(false))),
            )
            .tag("Productivity"),
            ResourceDescriptor::new("expenses", TableDef::new("expenses").field(FieldDef::integer("amount")))
                .disable(Operation::Delete),
        ])
        .unwrap()
    }

    fn document() -> Value {
        let doc = build_document(&registry(), &DocInfo::new("Test API", "1.0.0", "/api"));
        serde_json::to_value(doc).unwrap()
    }

    #[test]
    fn renders_one_path_item_per_path() {
        let doc = document();
        assert!(doc["openapi"].as_str().unwrap().starts_with("3.1"));
        let paths = doc["paths"].as_object().unwrap();
        assert_eq!(paths.len(), 4);
        let member = &doc["paths"]["/tasks/{id}"];
        assert!(member["get"].is_object());
        assert!(member["patch"].is_object());
        assert!(member["delete"].is_object());
        assert!(doc["paths"]["/expenses/{id}"]["delete"].is_null());
        assert_eq!(doc["servers"][0]["url"], "/api");
    }

    #[test]
    fn registers_entity_and_envelope_components() {
        let doc = document();
        let schemas = doc["components"]["schemas"].as_object().unwrap();
        for name in ["TasksSelect", "TasksInsert", "TasksPatch", "ExpensesSelect", "Pagination", "ErrorResponse"] {
            assert!(schemas.contains_key(name), "missing {}", name);
        }
        let insert = &schemas["TasksInsert"];
        assert_eq!(insert["required"], json!(["title"]));
        assert!(insert["properties"].get("organizationId").is_none());
        assert_eq!(doc["components"]["securitySchemes"][SECURITY_SCHEME]["in"], "cookie");
        assert_eq!(doc["security"][0][SECURITY_SCHEME], json!([]));
    }

    #[test]
    fn operations_carry_tags_and_examples() {
        let doc = document();
        let create = &doc["paths"]["/tasks"]["post"];
        assert_eq!(create["tags"], json!(["Tasks", "Productivity"]));
        assert_eq!(create["operationId"], "createTasks");
        let ok = &create["responses"]["201"]["content"][JSON]["example"];
        assert_eq!(ok["success"], true);
        assert_eq!(ok["data"]["title"], "Buy milk");
        let invalid = &create["responses"]["422"]["content"][JSON]["example"];
        assert_eq!(invalid["errors"]["issues"][0]["message"], "Required");
        let unauthorized = &create["responses"]["401"]["content"][JSON]["example"];
        assert_eq!(unauthorized["error"], "Unauthorized. You are not logged in.");
        assert!(doc["paths"]["/tasks/{id}"]["delete"]["responses"]["204"]["content"].is_null());
    }

    #[test]
    fn list_documents_query_parameters() {
        let doc = document();
        let params = doc["paths"]["/tasks"]["get"]["parameters"].as_array().unwrap();
        let names: Vec<&str> = params.iter().filter_map(|p| p["name"].as_str()).collect();
        assert_eq!(names, vec!["limit", "pageNumber"]);
        assert!(params.iter().all(|p| p["in"] == "query"));
    }
}
