//! # OpenAPI Document Generation
//!
//! Derives an OpenAPI 3.0.3 document from the route declaration tree and the
//! same type metadata the binder uses.
//!
//! ## Per API
//!
//! - **Path** - group prefixes joined with the API path; `:id` becomes `{id}`
//! - **Tag** - the enclosing group's full path
//! - **Parameters** - path, query and header descriptors of the API, after
//!   the parameters of every middleware of the enclosing groups
//! - **Request body** - `application/json` or `multipart/form-data`
//! - **Responses** - a `default` error response referencing [`HttpError`],
//!   plus the declared responses or a single `200 Successful response`
//!
//! Struct types land in `components/schemas` once, named by their module
//! path and type name in PascalCase; every use is a `$ref`.
//!
//! ## Output
//!
//! The document is written as pretty JSON, or as YAML when the output file
//! ends in `.yaml` / `.yml`.

mod schema;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use http::Method;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::binding::Location;
use crate::config::OpenApiConfig;
use crate::convert;
use crate::descriptor::{self, FieldDescriptor};
use crate::error::{ConfigError, HttpError};
use crate::reflect::{Field, ScalarKind};
use crate::router::{join_paths, Api, Context, Operation, Route, RouterGroup};
use crate::Bind;
use schema::Components;

static PATH_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(^|/):([^/]+)").expect("path parameter regex should be valid"));

/// `/user/:id/posts` to `/user/{id}/posts`.
pub fn convert_path_params(path: &str) -> String {
    PATH_PARAM.replace_all(path, "$1{$2}").into_owned()
}

struct Builder {
    components: Components,
    paths: BTreeMap<String, Map<String, Value>>,
    tags: Vec<String>,
}

/// Builds the document for `groups`.
pub fn generate(groups: &[RouterGroup], config: &OpenApiConfig) -> Result<Value, ConfigError> {
    let mut builder = Builder {
        components: Components::default(),
        paths: BTreeMap::new(),
        tags: Vec::new(),
    };
    for group in groups {
        builder.group(group, "", &[])?;
    }

    let tags: Vec<Value> = builder
        .tags
        .iter()
        .map(|name| json!({"name": name, "description": "APIs"}))
        .collect();
    debug!(
        paths = builder.paths.len(),
        components = builder.components.len(),
        "OpenAPI document built"
    );
    Ok(json!({
        "openapi": "3.0.3",
        "info": {
            "title": config.title,
            "version": config.version,
        },
        "tags": tags,
        "paths": builder.paths,
        "components": {
            "schemas": builder.components.into_schemas(),
        },
    }))
}

impl Builder {
    fn group(&mut self, group: &RouterGroup, parent: &str, inherited: &[Value]) -> Result<(), ConfigError> {
        let base = join_paths(parent, group.path());

        let mut parameters = inherited.to_vec();
        for middleware in group.middlewares() {
            if !middleware.openapi() {
                continue;
            }
            let info = middleware.type_info();
            for descriptor in descriptor::describe(info)?.iter() {
                if descriptor.location == Location::Body {
                    return Err(ConfigError::MiddlewareBody {
                        middleware: info.qualified_name(),
                        name: descriptor.name.clone(),
                    });
                }
                parameters.push(self.parameter(descriptor));
            }
        }

        for api in group.apis() {
            if !api.openapi() {
                continue;
            }
            self.api(api.as_ref(), &base, &parameters)?;
        }

        for child in group.children() {
            self.group(child, &base, &parameters)?;
        }
        Ok(())
    }

    fn api(&mut self, api: &dyn Route, base: &str, inherited: &[Value]) -> Result<(), ConfigError> {
        let Some(method) = api.method() else {
            return Ok(());
        };
        let path = convert_path_params(&join_paths(base, &api.path()));
        if !self.tags.iter().any(|tag| tag == base) {
            self.tags.push(base.to_string());
        }

        let mut parameters = inherited.to_vec();
        let mut request_body = None;
        for descriptor in descriptor::describe(api.type_info())?.iter() {
            if descriptor.location == Location::Body {
                request_body = Some(self.request_body(descriptor));
            } else {
                parameters.push(self.parameter(descriptor));
            }
        }

        let mut operation = Map::new();
        let summary = api.summary();
        if !summary.is_empty() {
            operation.insert("summary".into(), json!(summary));
        }
        operation.insert("tags".into(), json!([base]));
        if !parameters.is_empty() {
            operation.insert("parameters".into(), Value::Array(parameters));
        }
        if let Some(body) = request_body {
            operation.insert("requestBody".into(), body);
        }
        operation.insert("responses".into(), self.responses(api));

        debug!(method = %method, path = %path, "Documented API");
        self.paths
            .entry(path)
            .or_default()
            .insert(method.as_str().to_lowercase(), Value::Object(operation));
        Ok(())
    }

    fn parameter(&mut self, descriptor: &FieldDescriptor) -> Value {
        let mut schema = self.components.schema_for(descriptor.shape, false);
        if let (Some(default), Some(kind)) = (descriptor.default, descriptor.element.scalar_kind()) {
            schema["default"] = default_value(default, kind);
        }
        let mut parameter = json!({
            "name": descriptor.name,
            "in": descriptor.location.as_str(),
            "required": descriptor.required,
            "schema": schema,
        });
        if let Some(desc) = descriptor.desc {
            parameter["description"] = json!(desc);
        }
        parameter
    }

    fn request_body(&mut self, descriptor: &FieldDescriptor) -> Value {
        let multipart = descriptor.is_multipart();
        let content_type = if multipart {
            "multipart/form-data"
        } else {
            "application/json"
        };
        let schema = self.components.schema_for(descriptor.shape, multipart);
        json!({ "content": { content_type: { "schema": schema } } })
    }

    fn responses(&mut self, api: &dyn Route) -> Value {
        let mut responses = Map::new();
        responses.insert(
            "default".into(),
            json!({
                "description": "Default response with error",
                "content": {
                    "application/json": { "schema": self.components.schema_for(HttpError::shape(), false) }
                },
            }),
        );

        let declared = api.responses();
        if declared.is_empty() {
            responses.insert("200".into(), json!({"description": "Successful response"}));
        }
        for (code, shape) in declared.iter() {
            let mut response = json!({ "description": format!("Response with status code {code}") });
            if let Some(shape) = shape {
                response["content"] = json!({
                    "application/json": { "schema": self.components.schema_for(shape, false) }
                });
            }
            responses.insert(code.to_string(), response);
        }
        Value::Object(responses)
    }
}

/// Default literal as a JSON value of the parameter's type.
fn default_value(literal: &str, kind: ScalarKind) -> Value {
    let parsed = match kind {
        ScalarKind::Int => convert::parse_int::<i64>(literal, "").ok().map(Value::from),
        ScalarKind::Uint => convert::parse_uint::<u64>(literal, "").ok().map(Value::from),
        ScalarKind::Float => convert::parse_float(literal, "").ok().map(Value::from),
        ScalarKind::Bool => convert::parse_bool(literal, "").ok().map(Value::from),
        ScalarKind::String | ScalarKind::DateTime => None,
    };
    parsed.unwrap_or_else(|| json!(literal))
}

/// Serializes `doc` to `path`, as YAML for `.yaml`/`.yml`.
pub fn write(doc: &Value, path: &Path) -> anyhow::Result<()> {
    let contents = match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => serde_yaml::to_string(doc)?,
        _ => serde_json::to_string_pretty(doc)?,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Builds the document and writes it to `config.output`.
pub fn generate_to_file(groups: &[RouterGroup], config: &OpenApiConfig) -> anyhow::Result<PathBuf> {
    let doc = generate(groups, config)?;
    write(&doc, &config.output)?;
    info!(path = %config.output.display(), "Generated OpenAPI document");
    Ok(config.output.clone())
}

/// Serves the generated document file; excluded from both generators.
#[derive(Debug, Clone, Default, Bind)]
pub struct OpenApiDocument {
    #[bind(skip)]
    path: String,
    #[bind(skip)]
    file: PathBuf,
}

impl OpenApiDocument {
    pub fn new(path: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        OpenApiDocument {
            path: path.into(),
            file: file.into(),
        }
    }
}

impl Operation for OpenApiDocument {
    type Output = Value;

    fn output(&self, _ctx: &Context<'_>) -> anyhow::Result<Value> {
        let name = self.file.display().to_string();
        let contents = fs::read_to_string(&self.file)
            .map_err(|err| HttpError::new(500, format!("open {name} error"), err.to_string()))?;
        let doc = match self.file.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&contents)?,
            _ => serde_json::from_str(&contents)?,
        };
        Ok(doc)
    }
}

impl Api for OpenApiDocument {
    fn method(&self) -> Method {
        Method::GET
    }

    fn path(&self) -> String {
        self.path.clone()
    }

    fn openapi(&self) -> bool {
        false
    }

    fn codegen(&self) -> bool {
        false
    }
}
