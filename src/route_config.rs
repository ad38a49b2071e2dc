//! Route Config Builder: five machine-readable route descriptors per resource.
//!
//! A [`RouteDescriptor`] is consumed twice: the handlers validate requests against its
//! schemas, and `crate::openapi` renders it as documentation. Both read the same value.

use crate::case;
use crate::config::{Operation, ResourceDescriptor};
use crate::error::UNAUTHORIZED_MESSAGE;
use crate::schema::{id_params_schema, list_query_schema, DerivedSchemas, ObjectSchema};
use axum::http::{Method, StatusCode};

#[derive(Clone, Debug, PartialEq)]
pub enum ResponseContent {
    /// No body.
    Empty,
    /// `{ success: true, data }`; with `list`, data is an array and pagination is attached.
    Success { schema: ObjectSchema, list: bool },
    /// `{ success: false, error }`.
    Failure { example: String },
    /// 422 issue list. Examples are produced by validating `{}` against these schemas.
    ValidationFailure { schemas: Vec<ObjectSchema> },
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResponseSpec {
    pub status: StatusCode,
    pub description: String,
    pub content: ResponseContent,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BodySpec {
    pub description: String,
    pub schema: ObjectSchema,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RequestSpec {
    pub params: Option<ObjectSchema>,
    pub query: Option<ObjectSchema>,
    pub body: Option<BodySpec>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RouteDescriptor {
    pub operation: Operation,
    pub method: Method,
    /// Path in OpenAPI template syntax, e.g. `/tasks/{id}`.
    pub path: String,
    pub operation_id: String,
    pub tags: Vec<String>,
    pub summary: String,
    pub description: String,
    pub request: RequestSpec,
    /// Ordered by status code.
    pub responses: Vec<ResponseSpec>,
}

impl RouteDescriptor {
    pub fn response(&self, status: StatusCode) -> Option<&ResponseSpec> {
        self.responses.iter().find(|r| r.status == status)
    }

    /// Path in the router's `:param` syntax.
    pub fn axum_path(&self) -> String {
        axum_path(&self.path)
    }
}

/// `/tasks/{id}` -> `/tasks/:id`.
pub fn axum_path(openapi_path: &str) -> String {
    openapi_path
        .split('/')
        .map(|seg| match seg.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(name) => format!(":{}", name),
            None => seg.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RouteSet {
    pub routes: Vec<RouteDescriptor>,
}

impl RouteSet {
    pub fn get(&self, op: Operation) -> Option<&RouteDescriptor> {
        self.routes.iter().find(|r| r.operation == op)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RouteDescriptor> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Capitalized entity name first, then declared tags, without duplicates.
pub fn tags_for(descriptor: &ResourceDescriptor) -> Vec<String> {
    let mut tags = vec![case::capitalize(&descriptor.name)];
    for t in &descriptor.tags {
        if !tags.contains(t) {
            tags.push(t.clone());
        }
    }
    tags
}

fn unauthorized() -> ResponseSpec {
    ResponseSpec {
        status: StatusCode::UNAUTHORIZED,
        description: "Unauthorized".into(),
        content: ResponseContent::Failure {
            example: UNAUTHORIZED_MESSAGE.into(),
        },
    }
}

fn not_found(entity: &str) -> ResponseSpec {
    ResponseSpec {
        status: StatusCode::NOT_FOUND,
        description: "Not Found".into(),
        content: ResponseContent::Failure {
            example: format!("The requested {} was not found.", entity),
        },
    }
}

fn invalid(schemas: Vec<ObjectSchema>) -> ResponseSpec {
    ResponseSpec {
        status: StatusCode::UNPROCESSABLE_ENTITY,
        description: "The validation error(s)".into(),
        content: ResponseContent::ValidationFailure { schemas },
    }
}

fn success(status: StatusCode, description: &str, schema: &ObjectSchema, list: bool) -> ResponseSpec {
    ResponseSpec {
        status,
        description: description.into(),
        content: ResponseContent::Success {
            schema: schema.clone(),
            list,
        },
    }
}

fn sorted(mut responses: Vec<ResponseSpec>) -> Vec<ResponseSpec> {
    responses.sort_by_key(|r| r.status.as_u16());
    responses
}

/// Build the route descriptor of one operation.
pub fn build_route(descriptor: &ResourceDescriptor, schemas: &DerivedSchemas, op: Operation) -> RouteDescriptor {
    let e = descriptor.name.as_str();
    let pascal = case::to_pascal_case(e);
    let collection = format!("/{}", e);
    let member = format!("/{}/{{id}}", e);
    let tags = tags_for(descriptor);
    let id_params = id_params_schema();

    let (method, path, operation_id, summary, description, request, responses) = match op {
        Operation::List => (
            Method::GET,
            collection,
            format!("list{}", pascal),
            format!("Get all {}", e),
            format!("Retrieve a list of all {}", e),
            RequestSpec {
                query: Some(list_query_schema()),
                ..RequestSpec::default()
            },
            vec![
                success(StatusCode::OK, "List of all entities", &schemas.select, true),
                unauthorized(),
                invalid(vec![list_query_schema()]),
            ],
        ),
        Operation::Get => (
            Method::GET,
            member,
            format!("get{}", pascal),
            format!("Get {} by ID", e),
            format!("Retrieve a single {} by its ID", e),
            RequestSpec {
                params: Some(id_params.clone()),
                ..RequestSpec::default()
            },
            vec![
                success(StatusCode::OK, "The requested entity", &schemas.select, false),
                unauthorized(),
                not_found(e),
                invalid(vec![id_params]),
            ],
        ),
        Operation::Create => (
            Method::POST,
            collection,
            format!("create{}", pascal),
            format!("Create a new {}", e),
            format!("Create a new {}", e),
            RequestSpec {
                body: Some(BodySpec {
                    description: format!("The {} to create", e),
                    schema: schemas.insert.clone(),
                }),
                ..RequestSpec::default()
            },
            vec![
                success(StatusCode::CREATED, "The created entity", &schemas.select, false),
                unauthorized(),
                invalid(vec![schemas.insert.clone()]),
            ],
        ),
        Operation::Patch => (
            Method::PATCH,
            member,
            format!("patch{}", pascal),
            format!("Update {} by ID", e),
            format!("Update a single {} by its ID", e),
            RequestSpec {
                params: Some(id_params.clone()),
                body: Some(BodySpec {
                    description: format!("Patch data for {}", e),
                    schema: schemas.patch.clone(),
                }),
                ..RequestSpec::default()
            },
            vec![
                success(StatusCode::OK, "The updated entity", &schemas.select, false),
                unauthorized(),
                not_found(e),
                invalid(vec![schemas.patch.clone(), id_params]),
            ],
        ),
        Operation::Delete => (
            Method::DELETE,
            member,
            format!("delete{}", pascal),
            format!("Delete {} by ID", e),
            format!("Delete a single {} by its ID", e),
            RequestSpec {
                params: Some(id_params),
                ..RequestSpec::default()
            },
            vec![
                ResponseSpec {
                    status: StatusCode::NO_CONTENT,
                    description: "No Content".into(),
                    content: ResponseContent::Empty,
                },
                unauthorized(),
                not_found(e),
            ],
        ),
    };

    RouteDescriptor {
        operation: op,
        method,
        path,
        operation_id,
        tags,
        summary,
        description,
        request,
        responses: sorted(responses),
    }
}

/// Route descriptors for every enabled operation, in List, Get, Create, Patch, Delete order.
pub fn build_routes(descriptor: &ResourceDescriptor, schemas: &DerivedSchemas) -> RouteSet {
    RouteSet {
        routes: Operation::ALL
            .into_iter()
            .filter(|op| descriptor.operations.is_enabled(*op))
            .map(|op| build_route(descriptor, schemas, op))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FieldDef, TableDef};
    use crate::schema::derive_all;

    fn tasks() -> ResourceDescriptor {
        ResourceDescriptor::new("tasks", TableDef::new("tasks").field(FieldDef::text("title")))
    }

    fn routes_for(d: &ResourceDescriptor) -> RouteSet {
        build_routes(d, &derive_all(d).unwrap())
    }

    #[test]
    fn builds_five_routes_in_table_order() {
        let set = routes_for(&tasks());
        let summary: Vec<(Method, &str)> = set.iter().map(|r| (r.method.clone(), r.path.as_str())).collect();
        assert_eq!(
            summary,
            vec![
                (Method::GET, "/tasks"),
                (Method::GET, "/tasks/{id}"),
                (Method::POST, "/tasks"),
                (Method::PATCH, "/tasks/{id}"),
                (Method::DELETE, "/tasks/{id}"),
            ]
        );
    }

    #[test]
    fn failure_statuses_match_operation() {
        let set = routes_for(&tasks());
        let statuses = |op| -> Vec<u16> {
            set.get(op)
                .unwrap()
                .responses
                .iter()
                .map(|r| r.status.as_u16())
                .collect()
        };
        assert_eq!(statuses(Operation::List), vec![200, 401, 422]);
        assert_eq!(statuses(Operation::Get), vec![200, 401, 404, 422]);
        assert_eq!(statuses(Operation::Create), vec![201, 401, 422]);
        assert_eq!(statuses(Operation::Patch), vec![200, 401, 404, 422]);
        assert_eq!(statuses(Operation::Delete), vec![204, 401, 404]);
    }

    #[test]
    fn disabled_operations_are_skipped() {
        let d = tasks().disable(Operation::Delete).disable(Operation::List);
        let set = routes_for(&d);
        assert_eq!(set.len(), 3);
        assert!(set.get(Operation::Delete).is_none());
    }

    #[test]
    fn tags_start_with_capitalized_name_and_dedupe() {
        let d = tasks().tag("Tasks").tag("Productivity");
        assert_eq!(tags_for(&d), vec!["Tasks".to_string(), "Productivity".to_string()]);
    }

    #[test]
    fn request_schemas_come_from_derivation() {
        let d = tasks();
        let schemas = derive_all(&d).unwrap();
        let set = build_routes(&d, &schemas);
        let create = set.get(Operation::Create).unwrap();
        assert_eq!(create.request.body.as_ref().unwrap().schema, schemas.insert);
        let patch = set.get(Operation::Patch).unwrap();
        assert_eq!(patch.request.body.as_ref().unwrap().schema, schemas.patch);
        assert!(patch.request.params.is_some());
        assert_eq!(create.summary, "Create a new tasks");
        assert_eq!(
            set.get(Operation::Get).unwrap().response(StatusCode::NOT_FOUND).unwrap().content,
            ResponseContent::Failure {
                example: "The requested tasks was not found.".into()
            }
        );
    }

    #[test]
    fn converts_template_paths() {
        assert_eq!(axum_path("/tasks/{id}"), "/tasks/:id");
        assert_eq!(axum_path("/tasks"), "/tasks");
    }
}
