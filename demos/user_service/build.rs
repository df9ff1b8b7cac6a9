//! Writes the binding code for every API of the service into `OUT_DIR`.
//!
//! The `apis` module is compiled into the build script as well, so the
//! generator reads the same declarations the service serves. Types only
//! delegate to the generated code when `reqbind_generated` is set, which
//! keeps this first compilation independent of its own output.

use std::path::PathBuf;

use reqbind::config::{CodegenConfig, GENERATED_FILE_NAME};

#[allow(dead_code)]
#[path = "src/apis/mod.rs"]
mod apis;

fn main() -> anyhow::Result<()> {
    println!("cargo:rerun-if-changed=src/apis");
    let out_dir = PathBuf::from(std::env::var("OUT_DIR")?);
    let config = CodegenConfig {
        root: out_dir,
        file_name: GENERATED_FILE_NAME.to_string(),
    };
    reqbind::codegen::generate(&apis::router(), &config)?;
    println!("cargo:rustc-cfg=reqbind_generated");
    Ok(())
}
