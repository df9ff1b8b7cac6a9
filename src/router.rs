//! # Route Declarations
//!
//! The application describes its API surface as a tree of [`RouterGroup`]s.
//! Each group has a path prefix, middlewares, APIs and child groups. The
//! binding code generator and the schema generator read the tree; neither
//! modifies it.
//!
//! ## Declaring an API
//!
//! ```rust,ignore
//! use http::Method;
//! use reqbind::{Api, Bind, Context, Operation, Responses, RouterGroup};
//!
//! #[derive(Debug, Default, Bind)]
//! pub struct GetUser {
//!     #[bind(in = "path", name = "id", desc = "User ID")]
//!     pub id: u64,
//! }
//!
//! impl Operation for GetUser {
//!     type Output = RespUser;
//!     fn output(&self, _ctx: &Context<'_>) -> anyhow::Result<RespUser> { ... }
//! }
//!
//! impl Api for GetUser {
//!     fn method(&self) -> Method { Method::GET }
//!     fn path(&self) -> String { "/:id".into() }
//!     fn summary(&self) -> &str { "Get user" }
//!     fn responses(&self) -> Responses { Responses::new().with::<RespUser>(200) }
//! }
//!
//! let mut group = RouterGroup::new("/user");
//! group.register_api(GetUser::default());
//! ```
//!
//! Middlewares are declared the same way through [`Middleware`]; their
//! parameters are documented on every API of the group and its children.
//! A middleware may not read the request body.
//!
//! ## Serving
//!
//! [`RouterGroup::endpoints`] flattens the tree into [`Endpoint`]s. Serving
//! an endpoint runs its middlewares outermost first, then the API. The
//! output of every middleware is recorded for the rest of the request:
//!
//! ```rust,ignore
//! impl Operation for GetMe {
//!     type Output = RespUser;
//!     fn output(&self, ctx: &Context<'_>) -> anyhow::Result<RespUser> {
//!         let principal = ctx.middleware_output::<MustAuth>().context("not authenticated")?;
//!         ...
//!     }
//! }
//! ```

use std::fmt;
use std::sync::Arc;

use http::{Extensions, Method};
use serde::Serialize;
use tracing::{debug, warn};

use crate::binder;
use crate::config::BindConfig;
use crate::error::{render_error, HttpError};
use crate::reflect::{Bind, Field, Reflect, Shape, TypeInfo};
use crate::request::RequestParts;
use crate::Bind as DeriveBind;

/// Per-request context handed to [`Operation::output`].
pub struct Context<'a> {
    request: &'a dyn RequestParts,
    route: &'a str,
    outputs: &'a Extensions,
}

impl<'a> Context<'a> {
    pub fn new(request: &'a dyn RequestParts, route: &'a str, outputs: &'a Extensions) -> Self {
        Context { request, route, outputs }
    }

    pub fn request(&self) -> &'a dyn RequestParts {
        self.request
    }

    /// Type name of the operation being served.
    pub fn route(&self) -> &'a str {
        self.route
    }

    /// Output of middleware `M` if it already ran for this request.
    pub fn middleware_output<M: Middleware>(&self) -> Option<&'a M::Output> {
        self.outputs.get::<MiddlewareOutput<M>>().map(|stored| &stored.0)
    }
}

/// Extension key of a middleware output: one slot per middleware type.
struct MiddlewareOutput<M: Middleware>(M::Output);

impl<M: Middleware> Clone for MiddlewareOutput<M> {
    fn clone(&self) -> Self {
        MiddlewareOutput(self.0.clone())
    }
}

/// A bindable request type with behavior.
pub trait Operation: Bind + Sync {
    type Output: Serialize;

    fn output(&self, ctx: &Context<'_>) -> anyhow::Result<Self::Output>;
}

/// An endpoint: an operation with a method and a path.
pub trait Api: Operation {
    fn method(&self) -> Method;

    /// Path relative to the enclosing group, `:name` for path parameters.
    fn path(&self) -> String;

    fn summary(&self) -> &str {
        ""
    }

    /// Declared responses; empty means a single generic success response.
    fn responses(&self) -> Responses {
        Responses::new()
    }

    /// `false` keeps the API out of the schema document.
    fn openapi(&self) -> bool {
        true
    }

    /// `false` keeps the type out of generated binding code.
    fn codegen(&self) -> bool {
        true
    }
}

/// An operation that runs before every API of its group.
///
/// Its output stays readable through [`Context::middleware_output`] for the
/// rest of the request.
pub trait Middleware: Operation<Output: Clone + Send + Sync + 'static> {
    fn openapi(&self) -> bool {
        true
    }

    fn codegen(&self) -> bool {
        true
    }
}

/// Status code to response type mapping of an API.
#[derive(Debug, Clone, Default)]
pub struct Responses {
    entries: Vec<(u16, Option<Shape>)>,
}

impl Responses {
    pub fn new() -> Self {
        Self::default()
    }

    /// A response with a body of type `T`.
    pub fn with<T: Field>(mut self, status: u16) -> Self {
        self.entries.push((status, Some(T::shape())));
        self
    }

    /// A response without a body.
    pub fn empty(mut self, status: u16) -> Self {
        self.entries.push((status, None));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, Option<Shape>)> + '_ {
        self.entries.iter().copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    Api,
    Middleware,
}

/// Type-erased API or middleware registered in a group.
pub trait Route: Send + Sync {
    fn kind(&self) -> RouteKind;

    fn type_info(&self) -> &'static TypeInfo;

    /// `None` for middlewares.
    fn method(&self) -> Option<Method>;

    fn path(&self) -> String;

    fn summary(&self) -> String;

    fn responses(&self) -> Responses;

    fn openapi(&self) -> bool;

    fn codegen(&self) -> bool;

    /// Binds a fresh instance from `req`, runs it and serializes the output.
    ///
    /// `outputs` holds the outputs of the middlewares that ran before; a
    /// middleware adds its own.
    fn serve(
        &self,
        req: &dyn RequestParts,
        config: &BindConfig,
        outputs: &mut Extensions,
    ) -> Result<serde_json::Value, HttpError>;

    /// [`Route::serve`] outside of any middleware chain.
    fn handle(&self, req: &dyn RequestParts, config: &BindConfig) -> Result<serde_json::Value, HttpError> {
        self.serve(req, config, &mut Extensions::new())
    }
}

impl fmt::Debug for dyn Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("kind", &self.kind())
            .field("type", &self.type_info().name)
            .field("method", &self.method())
            .field("path", &self.path())
            .finish()
    }
}

struct ApiRoute<A>(A);

impl<A: Api> Route for ApiRoute<A> {
    fn kind(&self) -> RouteKind {
        RouteKind::Api
    }

    fn type_info(&self) -> &'static TypeInfo {
        self.0.info()
    }

    fn method(&self) -> Option<Method> {
        Some(self.0.method())
    }

    fn path(&self) -> String {
        self.0.path()
    }

    fn summary(&self) -> String {
        self.0.summary().to_string()
    }

    fn responses(&self) -> Responses {
        self.0.responses()
    }

    fn openapi(&self) -> bool {
        self.0.openapi()
    }

    fn codegen(&self) -> bool {
        self.0.codegen()
    }

    fn serve(
        &self,
        req: &dyn RequestParts,
        config: &BindConfig,
        outputs: &mut Extensions,
    ) -> Result<serde_json::Value, HttpError> {
        let output = run::<A>(req, config, outputs)?;
        to_json(&output)
    }
}

struct MiddlewareRoute<M>(M);

impl<M: Middleware> Route for MiddlewareRoute<M> {
    fn kind(&self) -> RouteKind {
        RouteKind::Middleware
    }

    fn type_info(&self) -> &'static TypeInfo {
        self.0.info()
    }

    fn method(&self) -> Option<Method> {
        None
    }

    fn path(&self) -> String {
        String::new()
    }

    fn summary(&self) -> String {
        String::new()
    }

    fn responses(&self) -> Responses {
        Responses::new()
    }

    fn openapi(&self) -> bool {
        self.0.openapi()
    }

    fn codegen(&self) -> bool {
        self.0.codegen()
    }

    fn serve(
        &self,
        req: &dyn RequestParts,
        config: &BindConfig,
        outputs: &mut Extensions,
    ) -> Result<serde_json::Value, HttpError> {
        let output = run::<M>(req, config, outputs)?;
        let body = to_json(&output)?;
        outputs.insert(MiddlewareOutput::<M>(output));
        Ok(body)
    }
}

fn run<T: Operation>(
    req: &dyn RequestParts,
    config: &BindConfig,
    outputs: &Extensions,
) -> Result<T::Output, HttpError> {
    let info = T::type_info();
    let bound: T = binder::bind(req, config).map_err(|err| {
        debug!(type_name = info.name, error = %err, "Binding failed");
        HttpError::from(err)
    })?;
    let ctx = Context::new(req, info.name, outputs);
    bound.output(&ctx).map_err(|err| {
        let rendered = render_error(&err);
        warn!(type_name = info.name, status = rendered.code, error = %err, "Operation failed");
        rendered
    })
}

fn to_json<O: Serialize>(output: &O) -> Result<serde_json::Value, HttpError> {
    serde_json::to_value(output).map_err(|err| HttpError::wrap(err, 500, "Internal Server Error"))
}

/// An API together with the middlewares of every enclosing group.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub method: Method,
    /// Full route path, `:name` for path parameters
    pub path: String,
    /// Outermost group first
    pub middlewares: Vec<Arc<dyn Route>>,
    pub api: Arc<dyn Route>,
}

impl Endpoint {
    /// Serves one request: the middlewares in order, then the API.
    ///
    /// The first failing middleware ends the request with its error.
    pub fn handle(
        &self,
        req: &dyn RequestParts,
        config: &BindConfig,
    ) -> Result<serde_json::Value, HttpError> {
        let mut outputs = Extensions::new();
        for middleware in &self.middlewares {
            middleware.serve(req, config, &mut outputs)?;
        }
        self.api.serve(req, config, &mut outputs)
    }
}

/// A node of the route declaration tree.
#[derive(Debug)]
pub struct RouterGroup {
    path: String,
    middlewares: Vec<Arc<dyn Route>>,
    apis: Vec<Arc<dyn Route>>,
    children: Vec<RouterGroup>,
}

impl RouterGroup {
    pub fn new(path: impl Into<String>) -> Self {
        RouterGroup {
            path: path.into(),
            middlewares: Vec::new(),
            apis: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_middleware<M: Middleware>(mut self, middleware: M) -> Self {
        self.middlewares.push(Arc::new(MiddlewareRoute(middleware)));
        self
    }

    pub fn register_api<A: Api>(&mut self, api: A) -> &mut Self {
        self.apis.push(Arc::new(ApiRoute(api)));
        self
    }

    pub fn register_group(&mut self, group: RouterGroup) -> &mut Self {
        self.children.push(group);
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn middlewares(&self) -> &[Arc<dyn Route>] {
        &self.middlewares
    }

    pub fn apis(&self) -> &[Arc<dyn Route>] {
        &self.apis
    }

    pub fn children(&self) -> &[RouterGroup] {
        &self.children
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty() && self.apis.is_empty() && self.children.is_empty()
    }

    /// Every API of the tree in declaration order, with its full path and
    /// middleware chain.
    pub fn endpoints(&self) -> Vec<Endpoint> {
        let mut endpoints = Vec::new();
        self.collect_endpoints("", &[], &mut endpoints);
        endpoints
    }

    fn collect_endpoints(&self, parent: &str, inherited: &[Arc<dyn Route>], out: &mut Vec<Endpoint>) {
        let base = join_paths(parent, &self.path);
        let mut middlewares = inherited.to_vec();
        middlewares.extend(self.middlewares.iter().cloned());
        for api in &self.apis {
            let Some(method) = api.method() else { continue };
            out.push(Endpoint {
                method,
                path: join_paths(&base, &api.path()),
                middlewares: middlewares.clone(),
                api: Arc::clone(api),
            });
        }
        for child in &self.children {
            child.collect_endpoints(&base, &middlewares, out);
        }
    }
}

/// Joins route segments the way file paths are joined: one leading slash,
/// no duplicate or trailing slashes.
pub fn join_paths(base: &str, path: &str) -> String {
    let segments: Vec<&str> = base
        .split('/')
        .chain(path.split('/'))
        .filter(|segment| !segment.is_empty())
        .collect();
    format!("/{}", segments.join("/"))
}

/// Health endpoint answering `"ok"`; excluded from both generators.
#[derive(Debug, Clone, Default, DeriveBind)]
pub struct Liveness {
    #[bind(skip)]
    path: String,
}

impl Liveness {
    pub fn new(path: impl Into<String>) -> Self {
        Liveness { path: path.into() }
    }
}

impl Operation for Liveness {
    type Output = &'static str;

    fn output(&self, _ctx: &Context<'_>) -> anyhow::Result<&'static str> {
        Ok("ok")
    }
}

impl Api for Liveness {
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
