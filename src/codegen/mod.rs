//! # Binding Code Generator
//!
//! Walks the route declaration tree and writes, for every module that
//! declares request types, one file of `BindParameters` implementations.
//! Generated code binds exactly like the runtime binder but without
//! descriptor lookups.
//!
//! ## Output Layout
//!
//! Types are grouped by the module they are declared in. The file for module
//! `my_service::apis::user` is written to
//! `<root>/apis/user/zz_reqbind_generated.rs` (the crate segment is dropped),
//! which is where Rust looks for a child module of `apis::user`:
//!
//! ```rust,ignore
//! // src/apis/user.rs
//! mod zz_reqbind_generated;
//! ```
//!
//! The implementations refer to the types as `super::Name`, so private
//! fields are reachable. Embedded and body structs declared in other modules
//! must expose their fields to the declaring module.
//!
//! ## Type Selection
//!
//! Middlewares, then APIs, then child groups, depth first. A type is emitted
//! once, in encounter order; routes that opt out with `codegen() == false`
//! are skipped.
//!
//! ## Regeneration
//!
//! Output is a pure function of the declarations: running twice produces
//! identical files, and unchanged files are not rewritten.

mod emit;
mod imports;
mod templates;

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use tracing::{debug, info, warn};

use crate::config::CodegenConfig;
use crate::reflect::TypeInfo;
use crate::router::RouterGroup;
use templates::BindingsFile;

/// A rendered bindings file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub module_path: String,
    pub path: PathBuf,
    pub contents: String,
    /// Names of the types implemented, in emission order
    pub types: Vec<String>,
}

/// Result of writing generated files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub written: usize,
    pub unchanged: usize,
}

/// Distinct request types reachable from `groups`, in encounter order.
pub fn collect_types(groups: &[RouterGroup]) -> Vec<&'static TypeInfo> {
    if groups.is_empty() {
        warn!("No router groups registered, nothing to generate");
    }
    let mut seen = HashSet::new();
    let mut types = Vec::new();
    for group in groups {
        visit(group, &mut seen, &mut types);
    }
    types
}

fn visit(group: &RouterGroup, seen: &mut HashSet<String>, types: &mut Vec<&'static TypeInfo>) {
    if group.apis().is_empty() {
        warn!(group = group.path(), "Router group has no APIs");
    }
    for route in group.middlewares().iter().chain(group.apis()) {
        if !route.codegen() {
            debug!(type_name = route.type_info().name, "Skipping route excluded from codegen");
            continue;
        }
        let info = route.type_info();
        if seen.insert(info.qualified_name()) {
            types.push(info);
        }
    }
    for child in group.children() {
        visit(child, seen, types);
    }
}

/// Renders one bindings file per module, without touching the filesystem.
pub fn render(groups: &[RouterGroup], config: &CodegenConfig) -> anyhow::Result<Vec<GeneratedFile>> {
    let mut modules: BTreeMap<&'static str, Vec<&'static TypeInfo>> = BTreeMap::new();
    for info in collect_types(groups) {
        modules.entry(info.module_path).or_default().push(info);
    }

    let mut files = Vec::with_capacity(modules.len());
    for (module_path, types) in modules {
        let contents = render_module(module_path, &types)?;
        files.push(GeneratedFile {
            module_path: module_path.to_string(),
            path: module_file(&config.root, module_path, &config.file_name),
            contents,
            types: types.iter().map(|info| info.name.to_string()).collect(),
        });
    }
    Ok(files)
}

/// Source of the bindings file for the types of one module.
pub fn render_module(module_path: &str, types: &[&'static TypeInfo]) -> anyhow::Result<String> {
    let mut impls = Vec::with_capacity(types.len());
    for &info in types {
        let block = emit::render_impl(info)
            .with_context(|| format!("generating bindings for {}", info.qualified_name()))?;
        impls.push(block);
    }
    let imports = imports::infer(&impls.concat());
    debug!(module = module_path, types = types.len(), "Rendering bindings");
    let file = BindingsFile { imports, impls };
    Ok(file.render_source()?)
}

/// `<root>/<module segments without the crate>/<file_name>`.
pub fn module_file(root: &Path, module_path: &str, file_name: &str) -> PathBuf {
    let mut path = root.to_path_buf();
    for segment in module_path.split("::").skip(1) {
        path.push(segment);
    }
    path.push(file_name);
    path
}

/// Writes `files`, leaving files whose content is already current alone.
pub fn write(files: &[GeneratedFile]) -> anyhow::Result<WriteSummary> {
    let mut summary = WriteSummary::default();
    for file in files {
        if fs::read_to_string(&file.path).is_ok_and(|existing| existing == file.contents) {
            debug!(path = %file.path.display(), "Bindings unchanged");
            summary.unchanged += 1;
            continue;
        }
        if let Some(parent) = file.path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        fs::write(&file.path, &file.contents).with_context(|| format!("writing {}", file.path.display()))?;
        info!(
            path = %file.path.display(),
            module = %file.module_path,
            types = file.types.len(),
            "Generated bindings"
        );
        summary.written += 1;
    }
    Ok(summary)
}

/// Renders and writes bindings for every module reachable from `groups`.
pub fn generate(groups: &[RouterGroup], config: &CodegenConfig) -> anyhow::Result<WriteSummary> {
    let files = render(groups, config)?;
    write(&files)
}
