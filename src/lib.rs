//! # reqbind
//!
//! **reqbind** binds HTTP requests into plain Rust structs declared with
//! field attributes, and documents the same structs as an OpenAPI 3
//! document.
//!
//! ## Overview
//!
//! A request type says where each field comes from:
//!
//! ```rust,ignore
//! use reqbind::Bind;
//!
//! #[derive(Debug, Default, Bind)]
//! pub struct ListUsers {
//!     #[bind(in = "query", name = "page,omitempty", default = "1", desc = "Page number")]
//!     pub page: u32,
//!     #[bind(in = "header", name = "X-Trace-Id,omitempty")]
//!     pub trace_id: Option<String>,
//!     #[bind(in = "query", name = "tag,omitempty")]
//!     pub tags: Vec<String>,
//! }
//! ```
//!
//! and the binder fills it from a request:
//!
//! ```rust,ignore
//! let req = BindRequest::from_http(http_request);
//! let params: ListUsers = reqbind::bind(&req, &BindConfig::default())?;
//! ```
//!
//! ## Architecture
//!
//! - **[`reflect`]** - static type metadata emitted by `#[derive(Bind)]`
//! - **[`descriptor`]** - per-type field descriptors, built once and cached
//! - **[`convert`]** - string to scalar conversion
//! - **[`binding`]** - the shared binding policy (absent values, zero
//!   literals, defaults, required checks)
//! - **[`binder`]** - descriptor-driven runtime binding
//! - **[`validate`]** - required/default pass over decoded JSON bodies
//! - **[`router`]** - the route declaration tree read by both generators
//! - **[`codegen`]** - ahead-of-time binding code, one file per module
//! - **[`openapi`]** - OpenAPI 3.0.3 document generation
//! - **[`cli`]** - `gen` / `openapi` subcommands
//!
//! ### Two Binding Backends
//!
//! The runtime binder and the generated code call the same functions in
//! [`binding`], so a request binds to the same value (or fails with the same
//! message) either way. A type opts into generated code with
//! `#[bind(generated)]` once its `BindParameters` implementation exists.
//!
//! ## Configuration
//!
//! Runtime switches live in [`BindConfig`] and may be read from the
//! environment:
//!
//! | Variable | Effect |
//! |---|---|
//! | `REQBIND_VALIDATE_JSON_BODY` | Run the JSON body validator after decoding |
//! | `REQBIND_MULTIPART_LIMIT` | Maximum multipart body size in bytes |
//!
//! Generator settings come from `reqbind.toml` ([`ToolConfig`]).
//!
//! ## Logging
//!
//! Everything logs through `tracing`. Descriptor builds and binding
//! decisions are at `debug`, generator output at `info`, suspicious route
//! declarations at `warn`. [`logging::init_logging`] installs a subscriber
//! for binaries.

extern crate self as reqbind;

pub mod binder;
pub mod binding;
pub mod cli;
pub mod codegen;
pub mod config;
pub mod convert;
pub mod descriptor;
pub mod error;
pub mod logging;
pub mod multipart;
pub mod openapi;
pub mod reflect;
pub mod request;
pub mod router;
pub mod validate;

pub use binder::{bind, bind_into, bind_reflective};
pub use config::{BindConfig, ToolConfig};
pub use error::{render_error, BindError, ConfigError, HttpError};
pub use reflect::{Bind, BindParameters, Field, Reflect};
pub use reqbind_macros::Bind;
pub use request::{BindRequest, FileHeader, RequestParts};
pub use router::{Api, Context, Endpoint, Liveness, Middleware, Operation, Responses, RouterGroup};
