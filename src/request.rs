//! # Request Accessors
//!
//! The binder reads requests only through [`RequestParts`]: path parameters,
//! query parameters (single and repeated), headers and the raw body. Any host
//! framework can implement it; [`BindRequest`] is the implementation over the
//! `http` crate's request type used by the tests and the demo service.
//!
//! ## Query Parameters
//!
//! The query string is decoded with `url::form_urlencoded`, keeping every
//! occurrence in order. [`RequestParts::query`] returns the first occurrence,
//! [`RequestParts::query_all`] returns all of them.
//!
//! ## Headers
//!
//! Header names are matched case-insensitively (RFC 7230).

use std::sync::Arc;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::HeaderMap;
use smallvec::SmallVec;
use tracing::debug;

/// Maximum number of path/query parameters stored inline before spilling to
/// the heap.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Ordered name/value pairs.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Primitive request access consumed by the binder and by generated code.
pub trait RequestParts {
    fn path_param(&self, name: &str) -> Option<&str>;

    /// First value of a query parameter.
    fn query(&self, name: &str) -> Option<&str>;

    /// Every value of a query parameter, in order.
    fn query_all(&self, name: &str) -> Vec<&str>;

    fn header(&self, name: &str) -> Option<&str>;

    fn header_all(&self, name: &str) -> Vec<&str>;

    fn content_type(&self) -> Option<&str> {
        self.header(CONTENT_TYPE.as_str())
    }

    fn body(&self) -> &[u8];
}

/// One uploaded multipart file part.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileHeader {
    pub filename: String,
    pub content_type: Option<String>,
    pub size: u64,
    pub data: Bytes,
}

impl FileHeader {
    pub fn new(filename: impl Into<String>, content_type: Option<String>, data: Bytes) -> Self {
        FileHeader {
            filename: filename.into(),
            content_type,
            size: data.len() as u64,
            data,
        }
    }
}

/// A fully buffered request with its matched path parameters.
#[derive(Debug, Clone, Default)]
pub struct BindRequest {
    path_params: ParamVec,
    query_params: ParamVec,
    headers: HeaderMap,
    body: Bytes,
}

impl BindRequest {
    /// Splits an `http::Request` into the parts the binder reads.
    pub fn from_http<B: Into<Bytes>>(req: http::Request<B>) -> Self {
        let (parts, body) = req.into_parts();
        let query_params = parse_query_params(parts.uri.query().unwrap_or_default());
        debug!(
            uri = %parts.uri,
            query_count = query_params.len(),
            header_count = parts.headers.len(),
            "Request parts captured"
        );
        BindRequest {
            path_params: ParamVec::new(),
            query_params,
            headers: parts.headers,
            body: body.into(),
        }
    }

    /// Adds a path parameter matched by the host router.
    pub fn with_path_param(mut self, name: &str, value: impl Into<String>) -> Self {
        self.path_params.push((Arc::from(name), value.into()));
        self
    }

    pub fn path_params(&self) -> &ParamVec {
        &self.path_params
    }

    pub fn query_params(&self) -> &ParamVec {
        &self.query_params
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

impl RequestParts for BindRequest {
    fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    fn query(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    fn query_all(&self, name: &str) -> Vec<&str> {
        self.query_params
            .iter()
            .filter(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    fn header_all(&self, name: &str) -> Vec<&str> {
        self.headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect()
    }

    fn body(&self) -> &[u8] {
        &self.body
    }
}

/// Decode a raw query string into ordered pairs.
pub fn parse_query_params(query: &str) -> ParamVec {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (Arc::from(k.as_ref()), v.into_owned()))
        .collect()
}
