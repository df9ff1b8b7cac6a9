//! # JSON Body Validator
//!
//! A pass over an already decoded JSON payload that enforces what plain
//! deserialization cannot see: a required key that decoded to its zero value
//! (`""`, `0`, `false`, an empty list) is reported, and an empty optional key
//! with a declared default is backfilled.
//!
//! Field requirements come from the `json` attribute:
//!
//! ```rust,ignore
//! #[derive(Debug, Default, Deserialize, Bind)]
//! pub struct ReqCreateUser {
//!     #[bind(json = "name", desc = "User name")]
//!     pub name: String,
//!     #[bind(json = "role,omitempty", default = "member")]
//!     #[serde(default)]
//!     pub role: String,
//! }
//! ```
//!
//! Nested structs are validated recursively. An absent optional nested struct
//! (`Option<T>` holding `None`) is skipped when its key is optional and
//! reported when it is required. Fields without a `json` attribute are not
//! part of the checked contract.
//!
//! A bare `DateTime` decodes a missing key to the Unix epoch, which is a
//! real instant and therefore never empty. Declare time fields as
//! `Option<DateTime<_>>` when absence must be reported or defaulted.
//!
//! The pass is off by default; see [`crate::BindConfig::set_validate_json_body`].

use tracing::debug;

use crate::descriptor;
use crate::error::BindError;
use crate::reflect::Reflect;

/// Validates and backfills a decoded payload in place.
pub fn validate(value: &mut dyn Reflect) -> Result<(), BindError> {
    let info = value.info();
    let fields = descriptor::json_fields(info)?;
    debug!(type_name = info.name, fields = fields.len(), "Validating JSON body");

    for field in fields.iter() {
        let Some(slot) = value.field_mut(field.index) else {
            continue;
        };

        if field.nested {
            match slot.as_reflect_mut() {
                Some(nested) => validate(nested)?,
                None if field.required => {
                    return Err(BindError::MissingField { name: field.key.clone() });
                }
                None => {}
            }
            continue;
        }

        if !slot.is_empty_value() {
            continue;
        }
        if field.required {
            return Err(BindError::MissingField { name: field.key.clone() });
        }
        if let Some(default) = field.default {
            slot.set_param(default, &field.key)?;
        }
    }
    Ok(())
}
