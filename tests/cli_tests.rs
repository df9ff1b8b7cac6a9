use std::fs;

use clap::Parser;
use http::Method;
use reqbind::cli::{run_cli, Cli, Outcome};
use reqbind::config::ToolConfig;
use reqbind::{Api, Bind, Context, Operation, RouterGroup};
use serde_json::Value;

#[derive(Debug, Default, Bind)]
struct Ping {
    #[bind(in = "query", name = "echo,omitempty", default = "pong")]
    echo: String,
}

impl Operation for Ping {
    type Output = String;

    fn output(&self, _ctx: &Context<'_>) -> anyhow::Result<String> {
        Ok(self.echo.clone())
    }
}

impl Api for Ping {
    fn method(&self) -> Method {
        Method::GET
    }

    fn path(&self) -> String {
        "/ping".to_string()
    }
}

fn groups() -> Vec<RouterGroup> {
    let mut group = RouterGroup::new("/");
    group.register_api(Ping::default());
    vec![group]
}

#[test]
fn test_config_file_is_optional() {
    let dir = tempfile::tempdir().unwrap();
    let config = ToolConfig::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, ToolConfig::default());
}

#[test]
fn test_config_file_sections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reqbind.toml");
    fs::write(&path, "[codegen]\nroot = \"gen\"\n\n[openapi]\ntitle = \"Ping\"\n").unwrap();
    let config = ToolConfig::load(&path).unwrap();
    assert_eq!(config.codegen.root, std::path::PathBuf::from("gen"));
    assert_eq!(config.codegen.file_name, "zz_reqbind_generated.rs");
    assert_eq!(config.openapi.title, "Ping");
    assert_eq!(config.openapi.version, "1.0.0");
}

#[test]
fn test_gen_writes_bindings() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("src");
    let config = dir.path().join("reqbind.toml");
    let cli = Cli::try_parse_from([
        "svc",
        "gen",
        "--root",
        root.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
    ])
    .unwrap();

    assert_eq!(run_cli(cli, &groups()).unwrap(), Outcome::Exit);
    let contents = fs::read_to_string(root.join("zz_reqbind_generated.rs")).unwrap();
    assert!(contents.contains("impl BindParameters for super::Ping"));
    assert!(contents.contains("default: Some(\"pong\"),"));
}

#[test]
fn test_gen_dry_run_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("src");
    let config = dir.path().join("reqbind.toml");
    let cli = Cli::try_parse_from([
        "svc",
        "gen",
        "--dry-run",
        "--root",
        root.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
    ])
    .unwrap();

    assert_eq!(run_cli(cli, &groups()).unwrap(), Outcome::Exit);
    assert!(!root.exists());
}

#[test]
fn test_openapi_uses_config_and_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("reqbind.toml");
    fs::write(&config, "[openapi]\ntitle = \"Ping Service\"\nversion = \"0.1.0\"\n").unwrap();
    let output = dir.path().join("api.json");
    let cli = Cli::try_parse_from([
        "svc",
        "openapi",
        "--output",
        output.to_str().unwrap(),
        "--version",
        "0.2.0",
        "--config",
        config.to_str().unwrap(),
    ])
    .unwrap();

    assert_eq!(run_cli(cli, &groups()).unwrap(), Outcome::Exit);
    let doc: Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(doc["info"]["title"], "Ping Service");
    assert_eq!(doc["info"]["version"], "0.2.0");
    assert_eq!(doc["paths"]["/ping"]["get"]["parameters"][0]["schema"]["default"], "pong");
}

#[test]
fn test_malformed_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("reqbind.toml");
    fs::write(&config, "[codegen\n").unwrap();
    let cli = Cli::try_parse_from(["svc", "gen", "--config", config.to_str().unwrap()]).unwrap();
    assert!(run_cli(cli, &groups()).is_err());
}
