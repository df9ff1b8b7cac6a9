//! # Type Metadata
//!
//! Rust has no runtime reflection, so every bindable struct carries a static
//! description of itself emitted by `#[derive(Bind)]`. The runtime binder, the
//! JSON body validator, the code generator and the schema generator all read
//! the same [`TypeInfo`], which keeps the four consumers in agreement about
//! field order, tags and types.
//!
//! ## Pieces
//!
//! - [`TypeInfo`] / [`FieldInfo`] / [`Tags`] - declaration-order field list with
//!   the raw attribute strings exactly as written on the struct
//! - [`Shape`] - a type-level description of a field (scalar, option, list,
//!   file, map, nested struct)
//! - [`Reflect`] - object-safe, index-based access to a struct's fields
//! - [`Field`] - object-safe operations on a single field value (assign from
//!   strings or files, kind-aware emptiness, descend into nested structs)
//!
//! ```rust,ignore
//! use reqbind::Bind;
//!
//! #[derive(Debug, Default, Bind)]
//! pub struct GetUser {
//!     #[bind(in = "path", name = "id")]
//!     pub id: u64,
//!     #[bind(in = "query", name = "fields,omitempty", default = "name")]
//!     pub fields: String,
//! }
//! ```

mod impls;

use std::fmt;

use crate::config::BindConfig;
use crate::error::BindError;
use crate::request::{FileHeader, RequestParts};

/// Scalar categories understood by the value converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    String,
    Int,
    Uint,
    Float,
    Bool,
    DateTime,
}

impl ScalarKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ScalarKind::String => "string",
            ScalarKind::Int => "int",
            ScalarKind::Uint => "uint",
            ScalarKind::Float => "float",
            ScalarKind::Bool => "bool",
            ScalarKind::DateTime => "time",
        }
    }

    /// Path of the variant as written in generated source.
    pub fn variant_path(self) -> &'static str {
        match self {
            ScalarKind::String => "ScalarKind::String",
            ScalarKind::Int => "ScalarKind::Int",
            ScalarKind::Uint => "ScalarKind::Uint",
            ScalarKind::Float => "ScalarKind::Float",
            ScalarKind::Bool => "ScalarKind::Bool",
            ScalarKind::DateTime => "ScalarKind::DateTime",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type-level description of a field.
///
/// Nested shapes are stored as function pointers so that descriptions of
/// generic containers (`Option<Vec<i32>>`) can be produced without
/// allocation and remain `Copy`. `Box<T>` is transparent and reports the
/// shape of `T`.
#[derive(Clone, Copy)]
pub enum Shape {
    Scalar(ScalarKind),
    /// `Option<T>`: absent values stay `None`, present values allocate.
    Optional(fn() -> Shape),
    /// `Vec<T>`: repeated values in encounter order.
    List(fn() -> Shape),
    /// String-keyed map.
    Map(fn() -> Shape),
    /// Uploaded multipart file.
    File,
    /// Arbitrary JSON (`serde_json::Value`).
    Any,
    Struct(fn() -> &'static TypeInfo),
}

impl Shape {
    /// Strips every `Option` layer.
    pub fn deref(self) -> Shape {
        let mut shape = self;
        while let Shape::Optional(inner) = shape {
            shape = inner();
        }
        shape
    }

    pub fn is_optional(self) -> bool {
        matches!(self, Shape::Optional(_))
    }

    pub fn scalar_kind(self) -> Option<ScalarKind> {
        match self.deref() {
            Shape::Scalar(kind) => Some(kind),
            _ => None,
        }
    }

    /// Element shape of a (possibly optional) list.
    pub fn element(self) -> Option<Shape> {
        match self.deref() {
            Shape::List(inner) => Some(inner()),
            _ => None,
        }
    }

    /// Metadata of a (possibly optional) nested struct.
    pub fn struct_info(self) -> Option<&'static TypeInfo> {
        match self.deref() {
            Shape::Struct(info) => Some(info()),
            _ => None,
        }
    }

    pub fn is_file(self) -> bool {
        matches!(self.deref(), Shape::File)
    }

    /// The scalar kind a string value is converted to, looking through lists.
    pub fn leaf_kind(self) -> Option<ScalarKind> {
        match self.element() {
            Some(element) => element.scalar_kind(),
            None => self.scalar_kind(),
        }
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Scalar(kind) => write!(f, "{kind}"),
            Shape::Optional(inner) => write!(f, "Option<{:?}>", inner()),
            Shape::List(inner) => write!(f, "Vec<{:?}>", inner()),
            Shape::Map(inner) => write!(f, "Map<{:?}>", inner()),
            Shape::File => f.write_str("file"),
            Shape::Any => f.write_str("any"),
            Shape::Struct(info) => f.write_str(info().name),
        }
    }
}

/// Raw attribute values from `#[bind(...)]`, unparsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tags {
    /// `in`: `path`, `query`, `header` or `body`
    pub location: Option<&'static str>,
    /// `name`: `"external,omitempty"`
    pub name: Option<&'static str>,
    pub default: Option<&'static str>,
    /// `mime`: `multipart` for form bodies
    pub mime: Option<&'static str>,
    pub desc: Option<&'static str>,
    /// `json`: `"key,omitempty"` for JSON payload fields
    pub json: Option<&'static str>,
}

/// One declared field of a bindable struct.
#[derive(Debug, Clone, Copy)]
pub struct FieldInfo {
    pub ident: &'static str,
    pub tags: Tags,
    /// Embedded struct whose fields are flattened into the parent.
    pub flatten: bool,
    pub shape: fn() -> Shape,
}

impl FieldInfo {
    /// Parsed `name` tag: external name (lower-cased ident by default) and
    /// whether `omitempty` marks the field optional.
    pub fn param_name(&self) -> (String, bool) {
        split_name_tag(self.tags.name, self.ident)
    }

    /// Parsed `json` tag: key, `omitempty` flag and the extra options
    /// (`string`, `number`, `boolean`). `None` when the field has no tag.
    pub fn json_name(&self) -> Option<JsonTag> {
        let tag = self.tags.json?;
        let mut parts = tag.split(',');
        let key = parts.next().unwrap_or_default();
        let mut json = JsonTag {
            key: if key.is_empty() { self.ident.to_string() } else { key.to_string() },
            omitempty: false,
            option: None,
        };
        for part in parts {
            match part.trim() {
                "omitempty" => json.omitempty = true,
                "" => {}
                other => json.option = Some(other.to_string()),
            }
        }
        Some(json)
    }

    pub fn is_multipart(&self) -> bool {
        self.tags.mime == Some("multipart")
    }
}

/// A parsed `json` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonTag {
    pub key: String,
    pub omitempty: bool,
    pub option: Option<String>,
}

impl JsonTag {
    pub fn is_skipped(&self) -> bool {
        self.key == "-"
    }
}

fn split_name_tag(tag: Option<&str>, ident: &str) -> (String, bool) {
    let tag = tag.unwrap_or_default();
    let mut parts = tag.split(',');
    let name = parts.next().unwrap_or_default().trim();
    let optional = parts.next().map(str::trim) == Some("omitempty");
    let name = if name.is_empty() { ident.to_lowercase() } else { name.to_string() };
    (name, optional)
}

/// Static description of a bindable struct.
#[derive(Debug)]
pub struct TypeInfo {
    /// `module_path!()` at the declaration site
    pub module_path: &'static str,
    pub name: &'static str,
    pub fields: &'static [FieldInfo],
    /// Binding is delegated to a generated [`crate::BindParameters`] impl.
    pub generated: bool,
}

impl TypeInfo {
    /// Globally unique identity: module path plus type name.
    pub fn qualified_name(&self) -> String {
        format!("{}::{}", self.module_path, self.name)
    }

    pub fn field(&self, ident: &str) -> Option<(usize, &'static FieldInfo)> {
        self.fields.iter().enumerate().find(|(_, f)| f.ident == ident)
    }
}

/// Index-based access to the fields of a struct described by [`TypeInfo`].
///
/// Implemented by `#[derive(Bind)]`; indices follow `TypeInfo::fields`.
pub trait Reflect {
    fn type_info() -> &'static TypeInfo
    where
        Self: Sized;

    fn info(&self) -> &'static TypeInfo;

    fn field(&self, index: usize) -> Option<&dyn Field>;

    fn field_mut(&mut self, index: usize) -> Option<&mut dyn Field>;

    /// Decodes a JSON request body into the body-tagged field at `index`.
    ///
    /// Returns `None` when the field is not a JSON body field.
    fn decode_json(&mut self, _index: usize, _body: &[u8]) -> Option<Result<(), BindError>> {
        None
    }

    /// Hand-written or generated binding that replaces the reflective path.
    fn bind_override(
        &mut self,
        _req: &dyn RequestParts,
        _config: &BindConfig,
    ) -> Option<Result<(), BindError>> {
        None
    }
}

/// Operations on one field value, independent of its concrete type.
///
/// Conversions are type driven: `set_param` on an `Option<u16>` parses a
/// `u16` and wraps it. Types that cannot be produced from a string keep the
/// default implementations, which report an unsupported-type error.
pub trait Field {
    fn shape() -> Shape
    where
        Self: Sized;

    /// Kind-aware zero test: `0`, `""`, `false`, the zero instant, empty
    /// collections, `None`, and structs whose fields are all empty.
    fn is_empty_value(&self) -> bool;

    fn set_param(&mut self, _raw: &str, name: &str) -> Result<(), BindError> {
        Err(BindError::unsupported(name, std::any::type_name::<Self>()))
    }

    fn set_params(&mut self, _raws: &[&str], name: &str) -> Result<(), BindError> {
        Err(BindError::unsupported(name, std::any::type_name::<Self>()))
    }

    fn set_files(&mut self, _files: Vec<FileHeader>, name: &str) -> Result<(), BindError> {
        Err(BindError::unsupported(name, std::any::type_name::<Self>()))
    }

    /// The nested struct, if this value is (or holds) one.
    fn as_reflect(&self) -> Option<&dyn Reflect> {
        None
    }

    fn as_reflect_mut(&mut self) -> Option<&mut dyn Reflect> {
        None
    }

    /// Like [`Field::as_reflect_mut`], allocating an absent optional struct.
    fn ensure_reflect(&mut self) -> Option<&mut dyn Reflect> {
        None
    }
}

/// A struct the binder can populate from a request.
pub trait Bind: Reflect + Field + Default + Send + 'static {}

impl<T: Reflect + Field + Default + Send + 'static> Bind for T {}

/// Binding implementation emitted by the code generator.
pub trait BindParameters {
    fn bind_parameters(&mut self, req: &dyn RequestParts, config: &BindConfig) -> Result<(), BindError>;
}
