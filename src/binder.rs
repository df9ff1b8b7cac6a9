//! # Runtime Binder
//!
//! Populates a fresh instance of a request type by interpreting its field
//! descriptors:
//!
//! - **path / query / header** - read the raw value(s), apply the binding
//!   policy, convert into the field's type.
//! - **body, JSON** - decode the first JSON value of the body into the
//!   field, then run the JSON body validator when
//!   [`BindConfig::validate_json_body`] is on.
//! - **body, multipart** - parse the form under the configured limit and bind
//!   every field of the body struct from the file parts (file fields) or the
//!   value parts (everything else).
//!
//! Descriptors are visited in declaration order, with embedded structs
//! flattened in place; absent `Option` embeddings are allocated on the way
//! down. The first error aborts binding.
//!
//! A type marked `#[bind(generated)]` delegates to its generated
//! [`crate::BindParameters`] implementation and no descriptor work happens.
//!
//! ```rust,ignore
//! let req = BindRequest::from_http(http_request).with_path_param("id", "77");
//! let params: GetUser = reqbind::bind(&req, &config)?;
//! ```

use tracing::debug;

use crate::binding::{self, Location};
use crate::config::BindConfig;
use crate::descriptor::{self, ElementKind, FieldDescriptor, Step};
use crate::error::BindError;
use crate::reflect::{Bind, Field, Reflect};
use crate::request::RequestParts;

/// Binds a new `T` from `req`.
pub fn bind<T: Bind>(req: &dyn RequestParts, config: &BindConfig) -> Result<T, BindError> {
    let mut target = T::default();
    bind_into(&mut target, req, config)?;
    Ok(target)
}

/// Binds into an existing value, honoring a generated or hand-written
/// override.
pub fn bind_into(target: &mut dyn Reflect, req: &dyn RequestParts, config: &BindConfig) -> Result<(), BindError> {
    if let Some(result) = target.bind_override(req, config) {
        debug!(type_name = target.info().name, "Binding delegated to override");
        return result;
    }
    bind_reflective(target, req, config)
}

/// The descriptor-driven path, ignoring any override.
pub fn bind_reflective(
    target: &mut dyn Reflect,
    req: &dyn RequestParts,
    config: &BindConfig,
) -> Result<(), BindError> {
    let info = target.info();
    let descriptors = descriptor::describe(info)?;
    debug!(
        type_name = info.name,
        descriptors = descriptors.len(),
        "Binding request"
    );
    for descriptor in descriptors.iter() {
        bind_field(target, descriptor, req, config)?;
    }
    Ok(())
}

fn bind_field(
    target: &mut dyn Reflect,
    descriptor: &FieldDescriptor,
    req: &dyn RequestParts,
    config: &BindConfig,
) -> Result<(), BindError> {
    let parent = navigate(target, descriptor.embedded(), &descriptor.name)?;
    let index = descriptor.leaf().index;
    match descriptor.location {
        Location::Body if descriptor.is_multipart() => bind_multipart(parent, index, descriptor, req, config),
        Location::Body => bind_json(parent, index, descriptor, req, config),
        _ => {
            let slot = field_mut(parent, index, &descriptor.name)?;
            bind_param(slot, descriptor, req)
        }
    }
}

/// Walks embedded steps, allocating absent optional structs.
fn navigate<'a>(mut current: &'a mut dyn Reflect, steps: &[Step], name: &str) -> Result<&'a mut dyn Reflect, BindError> {
    for step in steps {
        current = current
            .field_mut(step.index)
            .and_then(|field| field.ensure_reflect())
            .ok_or_else(|| BindError::unsupported(name, step.ident))?;
    }
    Ok(current)
}

fn field_mut<'a>(parent: &'a mut dyn Reflect, index: usize, name: &str) -> Result<&'a mut dyn Field, BindError> {
    let type_name = parent.info().name;
    parent
        .field_mut(index)
        .ok_or_else(|| BindError::unsupported(name, type_name))
}

fn bind_param(slot: &mut dyn Field, descriptor: &FieldDescriptor, req: &dyn RequestParts) -> Result<(), BindError> {
    let spec = descriptor.param_spec();
    if descriptor.element.is_repeated() {
        let raws = binding::raw_values(req, descriptor.location, &descriptor.name);
        if let Some(values) = binding::resolve_list(raws, &spec)? {
            binding::assign_all(slot, &values, &descriptor.name)?;
        }
        return Ok(());
    }
    let raw = binding::raw_value(req, descriptor.location, &descriptor.name);
    if let Some(value) = binding::resolve(raw, &spec)? {
        binding::assign(slot, value, &descriptor.name)?;
    }
    Ok(())
}

fn bind_json(
    parent: &mut dyn Reflect,
    index: usize,
    descriptor: &FieldDescriptor,
    req: &dyn RequestParts,
    config: &BindConfig,
) -> Result<(), BindError> {
    parent
        .decode_json(index, req.body())
        .unwrap_or_else(|| Err(BindError::unsupported(&descriptor.name, "body")))?;
    if config.validate_json_body() {
        let slot = field_mut(parent, index, &descriptor.name)?;
        binding::validate_json(slot)?;
    }
    Ok(())
}

fn bind_multipart(
    parent: &mut dyn Reflect,
    index: usize,
    descriptor: &FieldDescriptor,
    req: &dyn RequestParts,
    config: &BindConfig,
) -> Result<(), BindError> {
    let form = binding::parse_multipart(req, config)?;
    let body = field_mut(parent, index, &descriptor.name)?
        .ensure_reflect()
        .ok_or_else(|| BindError::unsupported(&descriptor.name, "multipart body"))?;

    for field in &descriptor.form_fields {
        let slot = field_mut(body, field.index, &field.name)?;
        match field.element {
            ElementKind::File | ElementKind::Files => {
                if let Some(files) = binding::resolve_files(form.files(&field.name), &field.file_spec())? {
                    binding::assign_files(slot, files, &field.name)?;
                }
            }
            ElementKind::List(_) => {
                let spec = field.param_spec();
                if let Some(values) = binding::resolve_list(form.values(&field.name), &spec)? {
                    binding::assign_all(slot, &values, &field.name)?;
                }
            }
            _ => {
                let spec = field.param_spec();
                if let Some(value) = binding::resolve(form.value(&field.name), &spec)? {
                    binding::assign(slot, value, &field.name)?;
                }
            }
        }
    }
    Ok(())
}
