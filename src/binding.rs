//! # Binding Policy
//!
//! The rules every binding backend applies, in one place:
//!
//! 1. An empty raw value is absent.
//! 2. For an **optional** field, a raw value that denotes the kind's zero
//!    value (`0`, `false`, `0.0`, the zero instant) is also absent, so a
//!    declared default supersedes it. Required fields keep explicit zeros.
//! 3. Absent + required is a `missing required parameter` error naming the
//!    parameter and its location.
//! 4. Absent + optional yields the default literal, if one is declared.
//! 5. The effective text is converted by the target field's type.
//!
//! The runtime binder calls these functions after reading descriptors. The
//! code generator emits calls to the same functions with descriptor values
//! written out as literals, so both backends share wording and behavior.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::config::BindConfig;
use crate::convert;
use crate::error::BindError;
use crate::multipart::{self, MultipartForm};
use crate::reflect::{Field, ScalarKind};
use crate::request::{FileHeader, RequestParts};
use crate::validate;

/// Where a parameter is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    Path,
    Query,
    Header,
    Body,
    /// A value part of a multipart body
    Form,
}

impl Location {
    /// Parses the `in` attribute value.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "path" => Some(Location::Path),
            "query" => Some(Location::Query),
            "header" => Some(Location::Header),
            "body" => Some(Location::Body),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Location::Path => "path",
            Location::Query => "query",
            Location::Header => "header",
            Location::Body => "body",
            Location::Form => "form",
        }
    }

    /// Path of the variant as written in generated source.
    pub fn variant_path(self) -> &'static str {
        match self {
            Location::Path => "Location::Path",
            Location::Query => "Location::Query",
            Location::Header => "Location::Header",
            Location::Body => "Location::Body",
            Location::Form => "Location::Form",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Policy inputs for one path, query, header or form value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec<'a> {
    pub name: &'a str,
    pub location: Location,
    pub required: bool,
    pub default: Option<&'a str>,
    pub kind: ScalarKind,
}

/// Policy inputs for a multipart file part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileSpec<'a> {
    pub name: &'a str,
    pub required: bool,
    /// `Vec<FileHeader>` collects every part with the name
    pub multiple: bool,
}

/// Applies the absent/zero/required/default rules to one raw value.
///
/// `Ok(None)` means "leave the field untouched".
pub fn resolve<'a>(raw: Option<&'a str>, spec: &ParamSpec<'a>) -> Result<Option<&'a str>, BindError> {
    let raw = raw.filter(|raw| !raw.is_empty());
    let raw = if spec.required {
        raw
    } else {
        raw.filter(|raw| !convert::is_zero_literal(raw, spec.kind))
    };
    match raw {
        Some(raw) => Ok(Some(raw)),
        None if spec.required => Err(missing(spec)),
        None => Ok(spec.default),
    }
}

/// [`resolve`] for repeated values. Empty occurrences are dropped; a
/// default yields a single element.
pub fn resolve_list<'a>(
    raws: Vec<&'a str>,
    spec: &ParamSpec<'a>,
) -> Result<Option<Vec<&'a str>>, BindError> {
    let raws: Vec<&str> = raws.into_iter().filter(|raw| !raw.is_empty()).collect();
    if !raws.is_empty() {
        return Ok(Some(raws));
    }
    if spec.required {
        return Err(missing(spec));
    }
    Ok(spec.default.map(|default| vec![default]))
}

/// Required check for multipart file parts.
pub fn resolve_files(files: &[FileHeader], spec: &FileSpec<'_>) -> Result<Option<Vec<FileHeader>>, BindError> {
    if files.is_empty() {
        if spec.required {
            return Err(BindError::MissingFile {
                name: spec.name.to_string(),
                multiple: spec.multiple,
            });
        }
        return Ok(None);
    }
    if spec.multiple {
        Ok(Some(files.to_vec()))
    } else {
        Ok(Some(files.iter().take(1).cloned().collect()))
    }
}

fn missing(spec: &ParamSpec<'_>) -> BindError {
    BindError::MissingParameter {
        name: spec.name.to_string(),
        location: spec.location,
    }
}

/// Converts `raw` into the slot's type.
pub fn assign<T: Field + ?Sized>(slot: &mut T, raw: &str, name: &str) -> Result<(), BindError> {
    debug!(parameter = name, "Assigning parameter value");
    slot.set_param(raw, name)
}

pub fn assign_all<T: Field + ?Sized>(slot: &mut T, raws: &[&str], name: &str) -> Result<(), BindError> {
    debug!(parameter = name, count = raws.len(), "Assigning repeated parameter values");
    slot.set_params(raws, name)
}

pub fn assign_files<T: Field + ?Sized>(
    slot: &mut T,
    files: Vec<FileHeader>,
    name: &str,
) -> Result<(), BindError> {
    debug!(parameter = name, count = files.len(), "Assigning uploaded files");
    slot.set_files(files, name)
}

/// Reads one raw value from `location`.
pub fn raw_value<'r>(req: &'r dyn RequestParts, location: Location, name: &str) -> Option<&'r str> {
    match location {
        Location::Path => req.path_param(name),
        Location::Query => req.query(name),
        Location::Header => req.header(name),
        Location::Body | Location::Form => None,
    }
}

/// Reads every raw value of a repeated parameter from `location`.
pub fn raw_values<'r>(req: &'r dyn RequestParts, location: Location, name: &str) -> Vec<&'r str> {
    match location {
        Location::Path => req.path_param(name).into_iter().collect(),
        Location::Query => req.query_all(name),
        Location::Header => req.header_all(name),
        Location::Body | Location::Form => Vec::new(),
    }
}

/// Decodes the first JSON value of `body` into `slot`. Trailing bytes after
/// the value are not inspected.
pub fn decode_json<T: DeserializeOwned>(slot: &mut T, body: &[u8]) -> Result<(), BindError> {
    let mut de = serde_json::Deserializer::from_slice(body);
    *slot = T::deserialize(&mut de).map_err(|e| BindError::InvalidBody { cause: e.to_string() })?;
    Ok(())
}

/// Runs the JSON body validator over a decoded body field.
pub fn validate_json<T: Field + ?Sized>(slot: &mut T) -> Result<(), BindError> {
    match slot.as_reflect_mut() {
        Some(value) => validate::validate(value),
        None => Ok(()),
    }
}

/// Parses a multipart body under the configured limit.
pub fn parse_multipart(req: &dyn RequestParts, config: &BindConfig) -> Result<MultipartForm, BindError> {
    multipart::parse(req, config.multipart_limit())
}
