//! Shape to JSON Schema translation with a shared component table.
//!
//! Every struct becomes a named component the first time it is seen and a
//! `$ref` everywhere, including inside itself, so self-referential and
//! mutually referential types terminate.

use std::collections::{BTreeMap, HashSet};

use serde_json::{json, Map, Value};

use crate::reflect::{ScalarKind, Shape, TypeInfo};

const REF_PREFIX: &str = "#/components/schemas/";

#[derive(Debug, Default)]
pub(super) struct Components {
    schemas: BTreeMap<String, Value>,
    in_progress: HashSet<String>,
}

impl Components {
    pub(super) fn into_schemas(self) -> BTreeMap<String, Value> {
        self.schemas
    }

    pub(super) fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Schema of a field, request body or response of the given shape.
    ///
    /// `multipart` switches struct properties from `json` keys to form
    /// `name`s.
    pub(super) fn schema_for(&mut self, shape: Shape, multipart: bool) -> Value {
        match shape {
            Shape::Optional(inner) => self.schema_for(inner(), multipart),
            Shape::Scalar(kind) => scalar_schema(kind),
            Shape::File => json!({"type": "string", "format": "binary"}),
            Shape::Any => json!({"type": "object"}),
            Shape::List(element) => json!({
                "type": "array",
                "items": self.schema_for(element(), multipart),
            }),
            Shape::Map(value) => json!({
                "type": "object",
                "additionalProperties": self.schema_for(value(), multipart),
            }),
            Shape::Struct(info) => self.reference(info(), multipart),
        }
    }

    fn reference(&mut self, info: &'static TypeInfo, multipart: bool) -> Value {
        let name = component_name(info);
        if !self.in_progress.contains(&name) && !self.schemas.contains_key(&name) {
            self.in_progress.insert(name.clone());
            let schema = self.object_schema(info, multipart);
            self.schemas.insert(name.clone(), schema);
            self.in_progress.remove(&name);
        }
        json!({ "$ref": format!("{REF_PREFIX}{name}") })
    }

    fn object_schema(&mut self, info: &'static TypeInfo, multipart: bool) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        self.properties(info, multipart, &mut properties, &mut required);

        let mut schema = json!({"type": "object", "properties": properties});
        if !required.is_empty() {
            schema["required"] = json!(required);
        }
        schema
    }

    fn properties(
        &mut self,
        info: &'static TypeInfo,
        multipart: bool,
        properties: &mut Map<String, Value>,
        required: &mut Vec<String>,
    ) {
        for field in info.fields {
            let shape = (field.shape)();
            if field.flatten {
                if let Some(embedded) = shape.struct_info() {
                    self.properties(embedded, multipart, properties, required);
                }
                continue;
            }

            let (key, is_required, option) = if multipart {
                let (name, optional) = field.param_name();
                (name, !optional, None)
            } else {
                match field.json_name() {
                    Some(tag) if tag.is_skipped() => continue,
                    Some(tag) => (tag.key, !tag.omitempty, tag.option),
                    None => (field.ident.to_string(), false, None),
                }
            };

            let mut schema = match option.as_deref() {
                Some("string") => json!({"type": "string"}),
                Some("number") => json!({"type": "number", "format": "double"}),
                Some("boolean") => json!({"type": "boolean"}),
                _ => self.schema_for(shape, multipart),
            };
            if let Some(desc) = field.tags.desc {
                schema["description"] = json!(desc);
            }
            properties.insert(key.clone(), schema);
            if is_required {
                required.push(key);
            }
        }
    }
}

pub(super) fn scalar_schema(kind: ScalarKind) -> Value {
    match kind {
        ScalarKind::String => json!({"type": "string"}),
        ScalarKind::Int | ScalarKind::Uint => json!({"type": "integer"}),
        ScalarKind::Float => json!({"type": "number", "format": "double"}),
        ScalarKind::Bool => json!({"type": "boolean"}),
        ScalarKind::DateTime => json!({"type": "string", "format": "date-time"}),
    }
}

/// PascalCase of module path plus type name: `my_app::apis::User` becomes
/// `MyAppApisUser`.
pub(super) fn component_name(info: &TypeInfo) -> String {
    let qualified = format!("{}::{}", info.module_path, info.name);
    qualified
        .split(|c: char| matches!(c, ':' | '.' | '/' | '-' | '_'))
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}
