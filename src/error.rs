//! # Errors
//!
//! Three families of failure:
//!
//! - [`ConfigError`] - a declaration is wrong (a default literal that does not
//!   parse as the field's type, a body parameter on a middleware). Detected
//!   when a descriptor is built or code is generated, never deferred.
//! - [`BindError`] - one request could not be bound. Carries the parameter
//!   name and, where it applies, the request location. Client error.
//! - [`HttpError`] - the structured application error handlers return,
//!   rendered as `{"code", "msg", "desc"}`.
//!
//! [`render_error`] is the single boundary that turns any error into the
//! response body.

use std::fmt;
use std::sync::Arc;

use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::binding::Location;
use crate::Bind;

/// Fatal configuration error in a bindable type declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A default literal does not parse as the field's type.
    InvalidDefault {
        /// External parameter name
        name: String,
        /// The offending literal
        value: String,
    },
    /// Middlewares run before the body is available to the handler.
    MiddlewareBody {
        /// Qualified name of the middleware type
        middleware: String,
        /// External parameter name
        name: String,
    },
    /// A struct flattens itself, directly or through other embedded structs.
    RecursiveEmbedding {
        /// Qualified name of the type seen twice
        type_name: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidDefault { name, value } => write!(
                f,
                "default value '{value}' does not match the field type for parameter '{name}'"
            ),
            ConfigError::MiddlewareBody { middleware, name } => write!(
                f,
                "middleware '{middleware}' cannot bind parameter '{name}' from the request body"
            ),
            ConfigError::RecursiveEmbedding { type_name } => {
                write!(f, "type '{type_name}' embeds itself")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Request-scoped binding failure.
///
/// The wording of every variant is shared by the runtime binder and the
/// generated binding code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    /// A required path, query, header or form value is absent or empty.
    MissingParameter { name: String, location: Location },
    /// A required multipart file part is absent.
    MissingFile { name: String, multiple: bool },
    /// A required JSON body field holds its zero value.
    MissingField { name: String },
    /// The raw value does not convert to the field's type.
    InvalidParameter { name: String, cause: String },
    /// Date-time values must be RFC 3339.
    InvalidTime { name: String, cause: String },
    /// The field's type cannot be produced from request text.
    Unsupported { name: String, kind: String },
    InvalidBody { cause: String },
    Multipart { cause: String },
    Config(ConfigError),
}

impl BindError {
    pub fn invalid(name: &str, cause: impl fmt::Display) -> Self {
        BindError::InvalidParameter {
            name: name.to_string(),
            cause: cause.to_string(),
        }
    }

    pub fn unsupported(name: &str, kind: &str) -> Self {
        BindError::Unsupported {
            name: name.to_string(),
            kind: kind.to_string(),
        }
    }

    /// 500 for configuration errors, 400 for everything caused by the request.
    pub fn status(&self) -> StatusCode {
        match self {
            BindError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindError::MissingParameter { name, location } => {
                write!(f, "missing required parameter '{name}' in {location}")
            }
            BindError::MissingFile { name, multiple: false } => {
                write!(f, "missing required file '{name}' in form")
            }
            BindError::MissingFile { name, multiple: true } => {
                write!(f, "missing required files '{name}' in form")
            }
            BindError::MissingField { name } => write!(f, "missing required field '{name}' in body"),
            BindError::InvalidParameter { name, cause } => {
                write!(f, "invalid parameter '{name}': {cause}")
            }
            BindError::InvalidTime { name, cause } => {
                write!(f, "invalid time format for parameter '{name}': {cause}")
            }
            BindError::Unsupported { name, kind } => {
                write!(f, "unsupported parameter type: {kind}, field name: {name}")
            }
            BindError::InvalidBody { cause } => {
                write!(f, "invalid body parameter: parse json failed: {cause}")
            }
            BindError::Multipart { cause } => write!(f, "parse multipart form failed: {cause}"),
            BindError::Config(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for BindError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BindError::Config(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConfigError> for BindError {
    fn from(err: ConfigError) -> Self {
        BindError::Config(err)
    }
}

/// Structured application error with a status code, a message and a
/// description.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Bind)]
pub struct HttpError {
    #[bind(json = "code", desc = "Status code")]
    pub code: u16,
    #[bind(json = "msg", desc = "Error message")]
    pub msg: String,
    #[bind(json = "desc", desc = "Error description")]
    pub desc: String,
    #[serde(skip)]
    #[bind(skip)]
    source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl HttpError {
    pub fn new(code: u16, msg: impl Into<String>, desc: impl Into<String>) -> Self {
        HttpError {
            code,
            msg: msg.into(),
            desc: desc.into(),
            source: None,
        }
    }

    /// Wraps `err`, using its message as the description.
    pub fn wrap<E>(err: E, code: u16, msg: impl Into<String>) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        HttpError {
            code,
            msg: msg.into(),
            desc: err.to_string(),
            source: Some(Arc::new(err)),
        }
    }

    pub fn with_code(mut self, code: u16) -> Self {
        self.code = code;
        self
    }

    pub fn with_msg(mut self, msg: impl Into<String>) -> Self {
        self.msg = msg.into();
        self
    }

    pub fn with_desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = desc.into();
        self
    }

    pub fn with_source<E>(mut self, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Arc::new(err));
        self
    }

    /// Falls back to 500 when `code` is not a valid HTTP status.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl PartialEq for HttpError {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code && self.msg == other.msg && self.desc == other.desc
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.desc.is_empty() {
            write!(f, "{}", self.msg)
        } else {
            write!(f, "{}: {}", self.msg, self.desc)
        }
    }
}

impl std::error::Error for HttpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|err| err as &(dyn std::error::Error + 'static))
    }
}

impl From<BindError> for HttpError {
    fn from(err: BindError) -> Self {
        let code = err.status().as_u16();
        let desc = if code == StatusCode::BAD_REQUEST.as_u16() {
            "invalid parameters"
        } else {
            "Internal Server Error"
        };
        HttpError::new(code, err.to_string(), desc).with_source(err)
    }
}

/// Error boundary: structured errors keep their status, binding errors
/// become `400 invalid parameters`, anything else is a 500.
pub fn render_error(err: &anyhow::Error) -> HttpError {
    if let Some(http) = err.downcast_ref::<HttpError>() {
        return http.clone();
    }
    if let Some(bind) = err.downcast_ref::<BindError>() {
        return HttpError::from(bind.clone());
    }
    HttpError::new(
        StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
        err.to_string(),
        "Internal Server Error",
    )
}
