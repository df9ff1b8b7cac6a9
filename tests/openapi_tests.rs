use std::fs;

use http::Method;
use reqbind::config::OpenApiConfig;
use reqbind::error::ConfigError;
use reqbind::openapi::{self, convert_path_params, OpenApiDocument};
use reqbind::router::Route;
use reqbind::{Api, Bind, Context, FileHeader, Liveness, Middleware, Operation, Responses, RouterGroup};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Default, Bind)]
struct Node {
    #[bind(json = "value", desc = "Node payload")]
    value: i64,
    #[bind(json = "children,omitempty")]
    children: Vec<Node>,
    #[bind(json = "parent,omitempty")]
    parent: Option<Box<Node>>,
}

#[derive(Debug, Default, Deserialize, Bind)]
struct Audit {
    #[bind(json = "by")]
    by: String,
}

#[derive(Debug, Default, Deserialize, Bind)]
#[serde(default)]
struct User {
    #[bind(json = "id,string", desc = "Identifier, serialized as text")]
    id: u64,
    #[bind(json = "score,omitempty")]
    score: f32,
    #[bind(json = "-")]
    secret: String,
    nickname: String,
    #[bind(flatten)]
    audit: Audit,
}

#[derive(Debug, Default, Bind)]
struct Token {
    #[bind(in = "header", name = "Authorization,omitempty", desc = "Bearer token")]
    token: String,
}

impl Operation for Token {
    type Output = ();

    fn output(&self, _ctx: &Context<'_>) -> anyhow::Result<()> {
        Ok(())
    }
}

impl Middleware for Token {}

#[derive(Debug, Default, Bind)]
struct BodyMiddleware {
    #[bind(in = "body")]
    body: Audit,
}

impl Operation for BodyMiddleware {
    type Output = ();

    fn output(&self, _ctx: &Context<'_>) -> anyhow::Result<()> {
        Ok(())
    }
}

impl Middleware for BodyMiddleware {}

#[derive(Debug, Default, Bind)]
struct GetTree {
    #[bind(in = "path", name = "id", desc = "Tree ID")]
    id: u64,
    #[bind(in = "query", name = "depth,omitempty", default = "3")]
    depth: u8,
    #[bind(in = "query", name = "kind,omitempty", default = "full")]
    kind: String,
}

impl Operation for GetTree {
    type Output = ();

    fn output(&self, _ctx: &Context<'_>) -> anyhow::Result<()> {
        Ok(())
    }
}

impl Api for GetTree {
    fn method(&self) -> Method {
        Method::GET
    }

    fn path(&self) -> String {
        "/:id".to_string()
    }

    fn summary(&self) -> &str {
        "Get a tree"
    }

    fn responses(&self) -> Responses {
        Responses::new().with::<Node>(200).empty(404)
    }
}

#[derive(Debug, Default, Bind)]
struct PutUser {
    #[bind(in = "body")]
    body: User,
}

impl Operation for PutUser {
    type Output = ();

    fn output(&self, _ctx: &Context<'_>) -> anyhow::Result<()> {
        Ok(())
    }
}

impl Api for PutUser {
    fn method(&self) -> Method {
        Method::PUT
    }

    fn path(&self) -> String {
        "/user".to_string()
    }
}

#[derive(Debug, Default, Bind)]
struct Attachment {
    #[bind(name = "file", desc = "Attachment")]
    file: FileHeader,
    #[bind(name = "pages,omitempty")]
    pages: Vec<FileHeader>,
    #[bind(name = "note,omitempty")]
    note: String,
}

#[derive(Debug, Default, Bind)]
struct Attach {
    #[bind(in = "body", mime = "multipart")]
    body: Attachment,
}

impl Operation for Attach {
    type Output = ();

    fn output(&self, _ctx: &Context<'_>) -> anyhow::Result<()> {
        Ok(())
    }
}

impl Api for Attach {
    fn method(&self) -> Method {
        Method::POST
    }

    fn path(&self) -> String {
        "/:id/attachments".to_string()
    }
}

fn groups() -> Vec<RouterGroup> {
    let mut trees = RouterGroup::new("/trees").with_middleware(Token::default());
    trees
        .register_api(GetTree::default())
        .register_api(Attach::default())
        .register_api(PutUser::default());

    let mut root = RouterGroup::new("/");
    root.register_api(Liveness::new("/liveness"))
        .register_api(OpenApiDocument::new("/openapi.json", "openapi.json"));
    root.register_group(trees);
    vec![root]
}

fn document() -> Value {
    openapi::generate(&groups(), &OpenApiConfig::default()).unwrap()
}

#[test]
fn test_path_conversion() {
    assert_eq!(convert_path_params("/trees/:id/attachments"), "/trees/{id}/attachments");
    assert_eq!(convert_path_params(":id"), "{id}");
}

#[test]
fn test_document_skeleton() {
    let doc = document();
    assert_eq!(doc["openapi"], "3.0.3");
    assert_eq!(doc["info"], json!({"title": "RESTful API", "version": "1.0.0"}));
    assert_eq!(doc["tags"], json!([{"name": "/trees", "description": "APIs"}]));

    let paths = doc["paths"].as_object().unwrap();
    let mut keys: Vec<&String> = paths.keys().collect();
    keys.sort();
    assert_eq!(keys, vec!["/trees/user", "/trees/{id}", "/trees/{id}/attachments"]);
    assert!(doc["paths"]["/liveness"].is_null());
}

#[test]
fn test_parameters_include_middleware_first() {
    let doc = document();
    let op = &doc["paths"]["/trees/{id}"]["get"];
    assert_eq!(op["summary"], "Get a tree");
    assert_eq!(op["tags"], json!(["/trees"]));
    assert_eq!(
        op["parameters"],
        json!([
            {
                "name": "Authorization",
                "in": "header",
                "required": false,
                "schema": {"type": "string"},
                "description": "Bearer token"
            },
            {
                "name": "id",
                "in": "path",
                "required": true,
                "schema": {"type": "integer"},
                "description": "Tree ID"
            },
            {
                "name": "depth",
                "in": "query",
                "required": false,
                "schema": {"type": "integer", "default": 3}
            },
            {
                "name": "kind",
                "in": "query",
                "required": false,
                "schema": {"type": "string", "default": "full"}
            }
        ])
    );
}

#[test]
fn test_declared_and_default_responses() {
    let doc = document();
    let responses = &doc["paths"]["/trees/{id}"]["get"]["responses"];
    assert_eq!(
        responses["default"],
        json!({
            "description": "Default response with error",
            "content": {"application/json": {"schema": {"$ref": "#/components/schemas/ReqbindErrorHttpError"}}}
        })
    );
    assert_eq!(
        responses["200"],
        json!({
            "description": "Response with status code 200",
            "content": {"application/json": {"schema": {"$ref": "#/components/schemas/OpenapiTestsNode"}}}
        })
    );
    assert_eq!(responses["404"], json!({"description": "Response with status code 404"}));

    let put = &doc["paths"]["/trees/user"]["put"]["responses"];
    assert_eq!(put["200"], json!({"description": "Successful response"}));
}

#[test]
fn test_self_referential_type_is_one_component() {
    let doc = document();
    let node = &doc["components"]["schemas"]["OpenapiTestsNode"];
    assert_eq!(
        *node,
        json!({
            "type": "object",
            "properties": {
                "value": {"type": "integer", "description": "Node payload"},
                "children": {"type": "array", "items": {"$ref": "#/components/schemas/OpenapiTestsNode"}},
                "parent": {"$ref": "#/components/schemas/OpenapiTestsNode"}
            },
            "required": ["value"]
        })
    );
}

#[test]
fn test_json_body_schema() {
    let doc = document();
    let body = &doc["paths"]["/trees/user"]["put"]["requestBody"];
    assert_eq!(
        *body,
        json!({"content": {"application/json": {"schema": {"$ref": "#/components/schemas/OpenapiTestsUser"}}}})
    );

    let user = &doc["components"]["schemas"]["OpenapiTestsUser"];
    assert_eq!(
        user["properties"]["id"],
        json!({"type": "string", "description": "Identifier, serialized as text"})
    );
    assert_eq!(user["properties"]["score"], json!({"type": "number", "format": "double"}));
    assert_eq!(user["properties"]["nickname"], json!({"type": "string"}));
    // flattened fields are merged, skipped fields are absent
    assert_eq!(user["properties"]["by"], json!({"type": "string"}));
    assert!(user["properties"]["secret"].is_null());
    assert_eq!(user["required"], json!(["id", "by"]));
}

#[test]
fn test_multipart_body_schema() {
    let doc = document();
    let body = &doc["paths"]["/trees/{id}/attachments"]["post"]["requestBody"];
    let schema_ref = &body["content"]["multipart/form-data"]["schema"]["$ref"];
    assert_eq!(*schema_ref, "#/components/schemas/OpenapiTestsAttachment");

    let attachment = &doc["components"]["schemas"]["OpenapiTestsAttachment"];
    assert_eq!(
        attachment["properties"]["file"],
        json!({"type": "string", "format": "binary", "description": "Attachment"})
    );
    assert_eq!(
        attachment["properties"]["pages"],
        json!({"type": "array", "items": {"type": "string", "format": "binary"}})
    );
    assert_eq!(attachment["required"], json!(["file"]));
}

#[test]
fn test_middleware_body_is_rejected() {
    let mut group = RouterGroup::new("/").with_middleware(BodyMiddleware::default());
    group.register_api(GetTree::default());
    let err = openapi::generate(&[group], &OpenApiConfig::default()).unwrap_err();
    assert!(matches!(err, ConfigError::MiddlewareBody { ref name, .. } if name == "body"));
}

#[test]
fn test_write_json_and_yaml() {
    let dir = tempfile::tempdir().unwrap();

    let json_config = OpenApiConfig {
        output: dir.path().join("docs/openapi.json"),
        title: "Trees".to_string(),
        version: "2.0.0".to_string(),
    };
    let path = openapi::generate_to_file(&groups(), &json_config).unwrap();
    let written: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written["info"]["title"], "Trees");

    let yaml_config = OpenApiConfig {
        output: dir.path().join("openapi.yaml"),
        ..json_config
    };
    let path = openapi::generate_to_file(&groups(), &yaml_config).unwrap();
    let contents = fs::read_to_string(&path).unwrap();
    let parsed: Value = serde_yaml::from_str(&contents).unwrap();
    assert_eq!(parsed["openapi"], "3.0.3");
    assert_eq!(parsed["info"]["version"], "2.0.0");
}

#[test]
fn test_document_route_serves_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("openapi.json");
    fs::write(&path, r#"{"openapi": "3.0.3"}"#).unwrap();

    let mut group = RouterGroup::new("/");
    group.register_api(OpenApiDocument::new("/openapi.json", &path));
    let route = &group.apis()[0];
    let req = reqbind::BindRequest::from_http(http::Request::builder().uri("/openapi.json").body(Vec::new()).unwrap());
    let doc = route.handle(&req, &reqbind::BindConfig::default()).unwrap();
    assert_eq!(doc, json!({"openapi": "3.0.3"}));

    let mut missing = RouterGroup::new("/");
    missing.register_api(OpenApiDocument::new("/openapi.json", dir.path().join("absent.json")));
    let err = missing.apis()[0].handle(&req, &reqbind::BindConfig::default()).unwrap_err();
    assert_eq!(err.code, 500);
    assert!(err.msg.starts_with("open "), "{}", err.msg);
}
