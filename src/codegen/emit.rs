//! Renders one `impl BindParameters` block from a type's descriptors.
//!
//! Every value the runtime binder reads from a descriptor is written out as
//! a literal, and every decision is delegated to the same `binding`
//! functions, so the two backends stay in step.

use crate::binding::{FileSpec, Location, ParamSpec};
use crate::descriptor::{self, ElementKind, FieldDescriptor, FormField, Step};
use crate::error::ConfigError;
use crate::reflect::TypeInfo;

const INDENT: &str = "    ";

const KEYWORDS: &[&str] = &[
    "as", "async", "await", "box", "const", "dyn", "enum", "fn", "for", "impl", "in", "let", "loop", "match", "mod",
    "move", "mut", "pub", "ref", "static", "struct", "trait", "type", "unsafe", "use", "where", "while", "yield",
];

#[derive(Default)]
struct Source {
    buf: String,
}

impl Source {
    fn line(&mut self, depth: usize, text: impl AsRef<str>) {
        for _ in 0..depth {
            self.buf.push_str(INDENT);
        }
        self.buf.push_str(text.as_ref());
        self.buf.push('\n');
    }
}

/// The generated implementation for `info`, referring to the type as
/// `super::Name`.
pub(super) fn render_impl(info: &'static TypeInfo) -> Result<String, ConfigError> {
    let descriptors = descriptor::describe(info)?;

    let mut body = Source::default();
    for descriptor in descriptors.iter() {
        match descriptor.location {
            Location::Body if descriptor.is_multipart() => multipart(&mut body, descriptor),
            Location::Body => json(&mut body, descriptor),
            _ => param(&mut body, descriptor),
        }
    }

    let req = if descriptors.is_empty() { "_req" } else { "req" };
    let config = if descriptors.iter().any(|d| d.location == Location::Body) {
        "config"
    } else {
        "_config"
    };

    let mut out = Source::default();
    out.line(0, format!("impl BindParameters for super::{} {{", ident(info.name)));
    out.line(1, "fn bind_parameters(");
    out.line(2, "&mut self,");
    out.line(2, format!("{req}: &dyn RequestParts,"));
    out.line(2, format!("{config}: &BindConfig,"));
    out.line(1, ") -> Result<(), BindError> {");
    out.buf.push_str(&body.buf);
    out.line(2, "Ok(())");
    out.line(1, "}");
    out.line(0, "}");
    Ok(out.buf)
}

fn param(out: &mut Source, descriptor: &FieldDescriptor) {
    let spec = descriptor.param_spec();
    let name = literal(&descriptor.name);
    out.line(2, format!("let slot = &mut {};", place(&descriptor.path)));
    param_spec(out, &spec);

    if descriptor.element.is_repeated() {
        let raws = match descriptor.location {
            Location::Path => format!("req.path_param({name}).into_iter().collect()"),
            Location::Header => format!("req.header_all({name})"),
            _ => format!("req.query_all({name})"),
        };
        out.line(2, format!("if let Some(values) = binding::resolve_list({raws}, &spec)? {{"));
        out.line(3, format!("binding::assign_all(slot, &values, {name})?;"));
    } else {
        let raw = match descriptor.location {
            Location::Path => format!("req.path_param({name})"),
            Location::Header => format!("req.header({name})"),
            _ => format!("req.query({name})"),
        };
        out.line(2, format!("if let Some(raw) = binding::resolve({raw}, &spec)? {{"));
        out.line(3, format!("binding::assign(slot, raw, {name})?;"));
    }
    out.line(2, "}");
}

fn json(out: &mut Source, descriptor: &FieldDescriptor) {
    out.line(2, format!("let slot = &mut {};", place(&descriptor.path)));
    out.line(2, "binding::decode_json(slot, req.body())?;");
    out.line(2, "if config.validate_json_body() {");
    out.line(3, "binding::validate_json(slot)?;");
    out.line(2, "}");
}

fn multipart(out: &mut Source, descriptor: &FieldDescriptor) {
    out.line(2, "let form = binding::parse_multipart(req, config)?;");
    if descriptor.form_type.is_none() {
        out.line(
            2,
            format!(
                "Err::<(), _>(BindError::unsupported({}, \"multipart body\"))?;",
                literal(&descriptor.name)
            ),
        );
        return;
    }

    let target = place(&descriptor.path);
    if descriptor.leaf().optional {
        out.line(2, format!("let body = {target}.get_or_insert_with(Default::default);"));
    } else {
        out.line(2, format!("let body = &mut {target};"));
    }
    for field in &descriptor.form_fields {
        form_field(out, field);
    }
}

fn form_field(out: &mut Source, field: &FormField) {
    let name = literal(&field.name);
    out.line(2, format!("let slot = &mut body.{};", ident(field.ident)));
    match field.element {
        ElementKind::File | ElementKind::Files => {
            file_spec(out, &field.file_spec());
            out.line(2, format!("if let Some(files) = binding::resolve_files(form.files({name}), &spec)? {{"));
            out.line(3, format!("binding::assign_files(slot, files, {name})?;"));
        }
        ElementKind::List(_) => {
            param_spec(out, &field.param_spec());
            out.line(2, format!("if let Some(values) = binding::resolve_list(form.values({name}), &spec)? {{"));
            out.line(3, format!("binding::assign_all(slot, &values, {name})?;"));
        }
        _ => {
            param_spec(out, &field.param_spec());
            out.line(2, format!("if let Some(raw) = binding::resolve(form.value({name}), &spec)? {{"));
            out.line(3, format!("binding::assign(slot, raw, {name})?;"));
        }
    }
    out.line(2, "}");
}

fn param_spec(out: &mut Source, spec: &ParamSpec<'_>) {
    out.line(2, "let spec = ParamSpec {");
    out.line(3, format!("name: {},", literal(spec.name)));
    out.line(3, format!("location: {},", spec.location.variant_path()));
    out.line(3, format!("required: {},", spec.required));
    match spec.default {
        Some(default) => out.line(3, format!("default: Some({}),", literal(default))),
        None => out.line(3, "default: None,"),
    }
    out.line(3, format!("kind: {},", spec.kind.variant_path()));
    out.line(2, "};");
}

fn file_spec(out: &mut Source, spec: &FileSpec<'_>) {
    out.line(2, "let spec = FileSpec {");
    out.line(3, format!("name: {},", literal(spec.name)));
    out.line(3, format!("required: {},", spec.required));
    out.line(3, format!("multiple: {},", spec.multiple));
    out.line(2, "};");
}

/// Field access expression for `path`, allocating absent optional
/// embeddings on the way down.
fn place(path: &[Step]) -> String {
    let mut expr = String::from("self");
    let last = path.len().saturating_sub(1);
    for (i, step) in path.iter().enumerate() {
        expr.push('.');
        expr.push_str(&ident(step.ident));
        if step.optional && i < last {
            expr.push_str(".get_or_insert_with(Default::default)");
        }
    }
    expr
}

fn ident(name: &str) -> String {
    if KEYWORDS.contains(&name) {
        format!("r#{name}")
    } else {
        name.to_string()
    }
}

fn literal(value: &str) -> String {
    format!("{value:?}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_allocates_optional_embeddings() {
        let path = [
            Step { index: 0, ident: "paging", optional: true },
            Step { index: 1, ident: "inner", optional: false },
            Step { index: 2, ident: "size", optional: true },
        ];
        assert_eq!(place(&path), "self.paging.get_or_insert_with(Default::default).inner.size");
    }

    #[test]
    fn test_keyword_fields_are_raw() {
        assert_eq!(ident("type"), "r#type");
        assert_eq!(ident("kind"), "kind");
    }

    #[test]
    fn test_literal_escapes() {
        assert_eq!(literal("a\"b"), "\"a\\\"b\"");
    }
}
