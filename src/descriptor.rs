//! # Type Descriptor Cache
//!
//! Turns the static [`TypeInfo`] of a bindable struct into the ordered list
//! of [`FieldDescriptor`]s the binder and the code generator walk, and the
//! list of [`JsonField`]s the JSON body validator walks.
//!
//! ## Building Descriptors
//!
//! - A field with an `in` attribute is a leaf. Its external name and
//!   optionality come from the `name` attribute (`"id,omitempty"`); the name
//!   defaults to the lower-cased field ident.
//! - A `flatten` field without `in` is an embedded struct: its descriptors are
//!   spliced in at the field's position, with the navigation step recorded so
//!   an absent `Option<Box<T>>` gets allocated on the way down.
//! - Fields with neither are not bindable and are skipped.
//! - A default literal is only read for optional fields and must parse as the
//!   field's type. A literal that does not is a [`ConfigError`], surfaced on
//!   first use instead of at request time.
//!
//! ## Cache
//!
//! Entries are keyed by module path plus type name, built on first use and
//! never evicted: the set of request types is fixed when the binary is
//! built. Concurrent first-time builds of the same type are tolerated; the
//! results are identical and the first stored entry is kept.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::Lazy;
use tracing::debug;

use crate::binding::{FileSpec, Location, ParamSpec};
use crate::convert;
use crate::error::ConfigError;
use crate::reflect::{FieldInfo, ScalarKind, Shape, TypeInfo};

/// One navigation step from a struct into one of its fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// Index into `TypeInfo::fields`
    pub index: usize,
    pub ident: &'static str,
    /// The field is an `Option` that is allocated when absent
    pub optional: bool,
}

/// How a leaf value is produced from request text or parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Scalar(ScalarKind),
    /// Repeated values, collected in encounter order
    List(ScalarKind),
    File,
    Files,
    /// JSON request body
    Json,
    /// Multipart request body struct
    Form,
    /// Cannot be produced from text; binding reports an error
    Unsupported,
}

impl ElementKind {
    fn classify(shape: Shape) -> Self {
        match shape.deref() {
            Shape::Scalar(kind) => ElementKind::Scalar(kind),
            Shape::File => ElementKind::File,
            Shape::List(element) => match element().deref() {
                Shape::Scalar(kind) => ElementKind::List(kind),
                Shape::File => ElementKind::Files,
                _ => ElementKind::Unsupported,
            },
            _ => ElementKind::Unsupported,
        }
    }

    pub fn scalar_kind(self) -> Option<ScalarKind> {
        match self {
            ElementKind::Scalar(kind) | ElementKind::List(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn is_repeated(self) -> bool {
        matches!(self, ElementKind::List(_) | ElementKind::Files)
    }
}

/// A field of a multipart body struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub index: usize,
    pub ident: &'static str,
    pub name: String,
    pub required: bool,
    pub default: Option<&'static str>,
    pub element: ElementKind,
    pub desc: Option<&'static str>,
}

impl FormField {
    pub fn param_spec(&self) -> ParamSpec<'_> {
        ParamSpec {
            name: &self.name,
            location: Location::Form,
            required: self.required,
            default: self.default,
            kind: self.element.scalar_kind().unwrap_or(ScalarKind::String),
        }
    }

    pub fn file_spec(&self) -> FileSpec<'_> {
        FileSpec {
            name: &self.name,
            required: self.required,
            multiple: self.element == ElementKind::Files,
        }
    }
}

/// Binding metadata of one leaf field.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// Embedded steps followed by the leaf step; never empty
    pub path: Vec<Step>,
    pub location: Location,
    pub name: String,
    pub required: bool,
    pub default: Option<&'static str>,
    pub element: ElementKind,
    pub shape: Shape,
    pub desc: Option<&'static str>,
    /// Fields of a multipart body struct
    pub form_fields: Vec<FormField>,
    /// Metadata of the multipart body struct
    pub form_type: Option<&'static TypeInfo>,
}

impl FieldDescriptor {
    pub fn leaf(&self) -> &Step {
        // path is built with at least the leaf step
        &self.path[self.path.len() - 1]
    }

    pub fn embedded(&self) -> &[Step] {
        &self.path[..self.path.len() - 1]
    }

    pub fn param_spec(&self) -> ParamSpec<'_> {
        ParamSpec {
            name: &self.name,
            location: self.location,
            required: self.required,
            default: self.default,
            kind: self.element.scalar_kind().unwrap_or(ScalarKind::String),
        }
    }

    pub fn is_multipart(&self) -> bool {
        self.element == ElementKind::Form
    }
}

/// A field of a JSON payload struct as seen by the body validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonField {
    pub index: usize,
    pub key: String,
    pub required: bool,
    pub default: Option<&'static str>,
    /// Nested struct (possibly optional) to recurse into
    pub nested: bool,
}

/// Process-lifetime cache keyed by qualified type name.
struct TypeCache<V: ?Sized> {
    entries: RwLock<HashMap<String, Arc<V>>>,
}

impl<V: ?Sized> TypeCache<V> {
    fn new() -> Self {
        TypeCache {
            entries: RwLock::new(HashMap::new()),
        }
    }

    fn get_or_build<F>(&self, info: &'static TypeInfo, build: F) -> Result<Arc<V>, ConfigError>
    where
        F: FnOnce() -> Result<Arc<V>, ConfigError>,
    {
        let key = info.qualified_name();
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(hit) = entries.get(&key) {
                return Ok(Arc::clone(hit));
            }
        }
        let built = build()?;
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(entries.entry(key).or_insert(built)))
    }

    fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

static DESCRIPTORS: Lazy<TypeCache<[FieldDescriptor]>> = Lazy::new(TypeCache::new);
static JSON_FIELDS: Lazy<TypeCache<[JsonField]>> = Lazy::new(TypeCache::new);

/// Ordered binding descriptors of a type, memoized.
pub fn describe(info: &'static TypeInfo) -> Result<Arc<[FieldDescriptor]>, ConfigError> {
    DESCRIPTORS.get_or_build(info, || {
        let mut out = Vec::new();
        let mut visiting = vec![info.qualified_name()];
        collect(info, &[], &mut out, &mut visiting)?;
        debug!(
            type_name = %info.qualified_name(),
            descriptors = out.len(),
            "Field descriptors built"
        );
        Ok(out.into())
    })
}

/// Validator view of a JSON payload type, memoized.
pub fn json_fields(info: &'static TypeInfo) -> Result<Arc<[JsonField]>, ConfigError> {
    JSON_FIELDS.get_or_build(info, || {
        let mut out = Vec::with_capacity(info.fields.len());
        for (index, field) in info.fields.iter().enumerate() {
            let shape = (field.shape)();
            let (key, required) = match field.json_name() {
                Some(tag) if tag.is_skipped() => continue,
                Some(tag) => (tag.key, !tag.omitempty),
                None => (field.ident.to_string(), false),
            };
            let default = if required { None } else { field.tags.default };
            if let Some(default) = default {
                check_default(&key, default, shape.scalar_kind())?;
            }
            out.push(JsonField {
                index,
                key,
                required,
                default,
                nested: shape.struct_info().is_some(),
            });
        }
        Ok(out.into())
    })
}

/// Number of types with cached binding descriptors.
pub fn cached_types() -> usize {
    DESCRIPTORS.len()
}

fn collect(
    info: &'static TypeInfo,
    prefix: &[Step],
    out: &mut Vec<FieldDescriptor>,
    visiting: &mut Vec<String>,
) -> Result<(), ConfigError> {
    for (index, field) in info.fields.iter().enumerate() {
        let shape = (field.shape)();
        let mut path = prefix.to_vec();
        path.push(Step {
            index,
            ident: field.ident,
            optional: shape.is_optional(),
        });

        if let Some(location) = field.tags.location.and_then(Location::from_tag) {
            out.push(leaf(field, shape, location, path)?);
            continue;
        }
        if !field.flatten {
            continue;
        }
        let Some(embedded) = shape.struct_info() else {
            continue;
        };
        let name = embedded.qualified_name();
        if visiting.contains(&name) {
            return Err(ConfigError::RecursiveEmbedding { type_name: name });
        }
        visiting.push(name);
        collect(embedded, &path, out, visiting)?;
        visiting.pop();
    }
    Ok(())
}

fn leaf(
    field: &FieldInfo,
    shape: Shape,
    location: Location,
    path: Vec<Step>,
) -> Result<FieldDescriptor, ConfigError> {
    let (name, optional) = field.param_name();
    let required = !optional;
    let default = if optional { field.tags.default } else { None };

    let mut descriptor = FieldDescriptor {
        path,
        location,
        name,
        required,
        default,
        element: ElementKind::classify(shape),
        shape,
        desc: field.tags.desc,
        form_fields: Vec::new(),
        form_type: None,
    };

    if location == Location::Body {
        descriptor.default = None;
        if field.is_multipart() {
            descriptor.element = ElementKind::Form;
            if let Some(form) = shape.struct_info() {
                descriptor.form_fields = form_fields(form)?;
                descriptor.form_type = Some(form);
            }
        } else {
            descriptor.element = ElementKind::Json;
        }
        return Ok(descriptor);
    }

    if let Some(default) = descriptor.default {
        check_default(&descriptor.name, default, descriptor.element.scalar_kind())?;
    }
    Ok(descriptor)
}

fn form_fields(info: &'static TypeInfo) -> Result<Vec<FormField>, ConfigError> {
    let mut fields = Vec::with_capacity(info.fields.len());
    for (index, field) in info.fields.iter().enumerate() {
        let (name, optional) = field.param_name();
        let element = ElementKind::classify((field.shape)());
        let default = if optional { field.tags.default } else { None };
        if let Some(default) = default {
            check_default(&name, default, element.scalar_kind())?;
        }
        fields.push(FormField {
            index,
            ident: field.ident,
            name,
            required: !optional,
            default,
            element,
            desc: field.tags.desc,
        });
    }
    Ok(fields)
}

fn check_default(name: &str, default: &str, kind: Option<ScalarKind>) -> Result<(), ConfigError> {
    match kind {
        Some(kind) if convert::is_valid_literal(default, kind) => Ok(()),
        _ => Err(ConfigError::InvalidDefault {
            name: name.to_string(),
            value: default.to_string(),
        }),
    }
}
