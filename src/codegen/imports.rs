//! Import inference for generated files.
//!
//! The emitter writes short names (`binding::resolve`, `Location::Query`,
//! `BindError`); this pass scans the rendered code for them and produces the
//! matching `use` lines, so generated files never carry unused imports.

use std::collections::{BTreeMap, BTreeSet};

/// Sentinel text, module, imported item.
const SENTINELS: &[(&str, &str, &str)] = &[
    ("binding::", "reqbind::binding", "self"),
    ("Location::", "reqbind::binding", "Location"),
    ("ParamSpec", "reqbind::binding", "ParamSpec"),
    ("FileSpec", "reqbind::binding", "FileSpec"),
    ("ScalarKind::", "reqbind::reflect", "ScalarKind"),
    ("BindConfig", "reqbind", "BindConfig"),
    ("BindError", "reqbind", "BindError"),
    ("BindParameters", "reqbind", "BindParameters"),
    ("RequestParts", "reqbind", "RequestParts"),
];

/// Sorted `use` lines covering every sentinel found in `code`.
pub(super) fn infer(code: &str) -> Vec<String> {
    let mut modules: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for &(sentinel, module, item) in SENTINELS {
        if code.contains(sentinel) {
            modules.entry(module).or_default().insert(item);
        }
    }
    modules
        .into_iter()
        .map(|(module, items)| render_use(module, items))
        .collect()
}

fn render_use(module: &str, items: BTreeSet<&str>) -> String {
    // `self` sorts first, as rustfmt orders it
    let mut ordered: Vec<&str> = Vec::with_capacity(items.len());
    if items.contains("self") {
        ordered.push("self");
    }
    ordered.extend(items.iter().copied().filter(|item| *item != "self"));

    match ordered.as_slice() {
        ["self"] => format!("use {module};"),
        [item] => format!("use {module}::{item};"),
        _ => format!("use {module}::{{{}}};", ordered.join(", ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infers_only_used_names() {
        let code = "impl BindParameters for super::A {\n fn bind_parameters(&mut self, _req: &dyn RequestParts, _config: &BindConfig) -> Result<(), BindError> { Ok(()) }\n}";
        assert_eq!(infer(code), vec!["use reqbind::{BindConfig, BindError, BindParameters, RequestParts};"]);
    }

    #[test]
    fn test_groups_binding_items() {
        let code = "let spec = ParamSpec { location: Location::Query, kind: ScalarKind::Int }; binding::resolve(x, &spec)?;";
        let imports = infer(code);
        assert_eq!(
            imports,
            vec![
                "use reqbind::binding::{self, Location, ParamSpec};".to_string(),
                "use reqbind::reflect::ScalarKind;".to_string(),
            ]
        );
    }
}
