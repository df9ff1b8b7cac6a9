use std::fs;

use http::Method;
use reqbind::codegen::{self, GeneratedFile, WriteSummary};
use reqbind::config::{CodegenConfig, GENERATED_FILE_NAME};
use reqbind::{Api, Bind, Context, FileHeader, Liveness, Middleware, Operation, RouterGroup};
use serde::Deserialize;

#[derive(Debug, Default, Bind)]
struct Auth {
    #[bind(in = "header", name = "Authorization")]
    token: String,
}

impl Operation for Auth {
    type Output = ();

    fn output(&self, _ctx: &Context<'_>) -> anyhow::Result<()> {
        Ok(())
    }
}

impl Middleware for Auth {}

#[derive(Debug, Default, Bind)]
struct GetItem {
    #[bind(in = "path", name = "id")]
    id: u64,
    #[bind(in = "query", name = "page,omitempty", default = "1")]
    page: u32,
}

impl Operation for GetItem {
    type Output = u64;

    fn output(&self, _ctx: &Context<'_>) -> anyhow::Result<u64> {
        Ok(self.id)
    }
}

impl Api for GetItem {
    fn method(&self) -> Method {
        Method::GET
    }

    fn path(&self) -> String {
        "/items/:id".to_string()
    }
}

#[derive(Debug, Default, Bind)]
struct Form {
    #[bind(name = "file")]
    file: FileHeader,
    #[bind(name = "type,omitempty")]
    r#type: String,
}

#[derive(Debug, Default, Bind)]
struct Upload {
    #[bind(in = "body", mime = "multipart")]
    body: Option<Form>,
    #[bind(in = "header", name = "X-Tag,omitempty")]
    tags: Vec<String>,
}

impl Operation for Upload {
    type Output = ();

    fn output(&self, _ctx: &Context<'_>) -> anyhow::Result<()> {
        Ok(())
    }
}

impl Api for Upload {
    fn method(&self) -> Method {
        Method::POST
    }

    fn path(&self) -> String {
        "/upload".to_string()
    }
}

#[derive(Debug, Default, Deserialize, Bind)]
struct Payload {
    #[bind(json = "name")]
    name: String,
}

#[derive(Debug, Default, Bind)]
struct CreateItem {
    #[bind(in = "body")]
    body: Payload,
}

impl Operation for CreateItem {
    type Output = ();

    fn output(&self, _ctx: &Context<'_>) -> anyhow::Result<()> {
        Ok(())
    }
}

impl Api for CreateItem {
    fn method(&self) -> Method {
        Method::POST
    }

    fn path(&self) -> String {
        "/".to_string()
    }
}

#[derive(Debug, Default, Bind)]
struct Hidden {
    #[bind(in = "query", name = "q")]
    q: String,
}

impl Operation for Hidden {
    type Output = ();

    fn output(&self, _ctx: &Context<'_>) -> anyhow::Result<()> {
        Ok(())
    }
}

impl Api for Hidden {
    fn method(&self) -> Method {
        Method::GET
    }

    fn path(&self) -> String {
        "/hidden".to_string()
    }

    fn codegen(&self) -> bool {
        false
    }
}

#[derive(Debug, Default, Bind)]
struct BadDefault {
    #[bind(in = "query", name = "size,omitempty", default = "ten")]
    size: u32,
}

impl Operation for BadDefault {
    type Output = ();

    fn output(&self, _ctx: &Context<'_>) -> anyhow::Result<()> {
        Ok(())
    }
}

impl Api for BadDefault {
    fn method(&self) -> Method {
        Method::GET
    }

    fn path(&self) -> String {
        "/bad".to_string()
    }
}

fn groups() -> Vec<RouterGroup> {
    let mut child = RouterGroup::new("/child");
    child.register_api(CreateItem::default()).register_api(GetItem::default());

    let mut root = RouterGroup::new("/").with_middleware(Auth::default());
    root.register_api(Liveness::new("/liveness"))
        .register_api(GetItem::default())
        .register_api(Upload::default())
        .register_api(GetItem::default())
        .register_api(Hidden::default());
    root.register_group(child);
    vec![root]
}

fn config(root: &std::path::Path) -> CodegenConfig {
    CodegenConfig {
        root: root.to_path_buf(),
        file_name: GENERATED_FILE_NAME.to_string(),
    }
}

fn render() -> GeneratedFile {
    let files = codegen::render(&groups(), &config(std::path::Path::new("src"))).unwrap();
    assert_eq!(files.len(), 1);
    files.into_iter().next().unwrap()
}

#[test]
fn test_types_are_deduplicated_in_encounter_order() {
    let file = render();
    assert_eq!(file.module_path, "codegen_tests");
    assert_eq!(file.types, vec!["Auth", "GetItem", "Upload", "CreateItem"]);
    assert_eq!(file.contents.matches("impl BindParameters for super::GetItem").count(), 1);
    assert!(!file.contents.contains("Hidden"));
    assert!(!file.contents.contains("Liveness"));
}

#[test]
fn test_output_path_follows_module_path() {
    let file = render();
    // the integration test crate is its own root module
    assert_eq!(file.path, std::path::PathBuf::from("src").join(GENERATED_FILE_NAME));
}

#[test]
fn test_header_and_imports() {
    let contents = render().contents;
    assert!(contents.starts_with("// Code generated by reqbind; DO NOT EDIT.\n"));
    assert!(contents.contains("use reqbind::{BindConfig, BindError, BindParameters, RequestParts};\n"));
    assert!(contents.contains("use reqbind::binding::{self, FileSpec, Location, ParamSpec};\n"));
    assert!(contents.contains("use reqbind::reflect::ScalarKind;\n"));
    assert!(contents.ends_with("}\n"));
    assert!(!contents.ends_with("\n\n"));
}

#[test]
fn test_scalar_parameters() {
    let contents = render().contents;
    let expected = r#"impl BindParameters for super::GetItem {
    fn bind_parameters(
        &mut self,
        req: &dyn RequestParts,
        _config: &BindConfig,
    ) -> Result<(), BindError> {
        let slot = &mut self.id;
        let spec = ParamSpec {
            name: "id",
            location: Location::Path,
            required: true,
            default: None,
            kind: ScalarKind::Uint,
        };
        if let Some(raw) = binding::resolve(req.path_param("id"), &spec)? {
            binding::assign(slot, raw, "id")?;
        }
        let slot = &mut self.page;
        let spec = ParamSpec {
            name: "page",
            location: Location::Query,
            required: false,
            default: Some("1"),
            kind: ScalarKind::Uint,
        };
        if let Some(raw) = binding::resolve(req.query("page"), &spec)? {
            binding::assign(slot, raw, "page")?;
        }
        Ok(())
    }
}
"#;
    assert!(contents.contains(expected), "{contents}");
}

#[test]
fn test_multipart_and_repeated_header() {
    let contents = render().contents;
    assert!(contents.contains("let form = binding::parse_multipart(req, config)?;"));
    assert!(contents.contains("let body = self.body.get_or_insert_with(Default::default);"));
    assert!(contents.contains("if let Some(files) = binding::resolve_files(form.files(\"file\"), &spec)? {"));
    assert!(contents.contains("let slot = &mut body.r#type;"));
    assert!(contents.contains("if let Some(raw) = binding::resolve(form.value(\"type\"), &spec)? {"));
    assert!(contents.contains("if let Some(values) = binding::resolve_list(req.header_all(\"X-Tag\"), &spec)? {"));
}

#[test]
fn test_json_body() {
    let contents = render().contents;
    assert!(contents.contains("binding::decode_json(slot, req.body())?;"));
    assert!(contents.contains("if config.validate_json_body() {"));
    assert!(contents.contains("binding::validate_json(slot)?;"));
}

#[test]
fn test_invalid_default_aborts_generation() {
    let mut group = RouterGroup::new("/");
    group.register_api(BadDefault::default());
    let err = codegen::render(&[group], &config(std::path::Path::new("src"))).unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("BadDefault"), "{message}");
    assert!(message.contains("default value 'ten'"), "{message}");
}

#[test]
fn test_empty_declarations_are_not_fatal() {
    assert!(codegen::render(&[], &config(std::path::Path::new("src"))).unwrap().is_empty());

    let mut outer = RouterGroup::new("/outer");
    let mut inner = RouterGroup::new("/inner");
    inner.register_api(GetItem::default());
    outer.register_group(inner);
    let files = codegen::render(&[outer], &config(std::path::Path::new("src"))).unwrap();
    assert_eq!(files[0].types, vec!["GetItem"]);
}

#[test]
fn test_generation_is_idempotent() {
    let first = codegen::render(&groups(), &config(std::path::Path::new("src"))).unwrap();
    let second = codegen::render(&groups(), &config(std::path::Path::new("src"))).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_write_skips_unchanged_files() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());

    let summary = codegen::generate(&groups(), &config).unwrap();
    assert_eq!(summary, WriteSummary { written: 1, unchanged: 0 });
    let path = dir.path().join(GENERATED_FILE_NAME);
    let written = fs::read_to_string(&path).unwrap();
    assert!(written.contains("impl BindParameters for super::Upload"));

    let summary = codegen::generate(&groups(), &config).unwrap();
    assert_eq!(summary, WriteSummary { written: 0, unchanged: 1 });

    fs::write(&path, "stale").unwrap();
    let summary = codegen::generate(&groups(), &config).unwrap();
    assert_eq!(summary.written, 1);
    assert_eq!(fs::read_to_string(&path).unwrap(), written);
}
