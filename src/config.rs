//! # Configuration
//!
//! Two configuration components:
//!
//! - [`BindConfig`] - request-path switches shared by every bind operation.
//!   Values are atomics so an operator (an admin endpoint, a signal handler)
//!   can flip them at any time; in-flight requests may observe either the old
//!   or the new value.
//! - [`ToolConfig`] - settings of the offline generators, loaded from an
//!   optional `reqbind.toml`.
//!
//! ## Environment Variables
//!
//! ### `REQBIND_VALIDATE_JSON_BODY`
//!
//! Runs the JSON body validator (required fields, default backfill) after
//! every JSON body decode. Accepts `1`, `true`, `yes`, `on`.
//!
//! Default: off. The validator walks the decoded value, which costs time on
//! every JSON request.
//!
//! ### `REQBIND_MULTIPART_LIMIT`
//!
//! Upper bound in bytes for a multipart request body. Accepts decimal
//! (`33554432`) or hexadecimal (`0x2000000`).
//!
//! Default: `0x40000000` (1 GiB)
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use reqbind::BindConfig;
//!
//! let config = Arc::new(BindConfig::from_env());
//! config.set_validate_json_body(true);
//! assert!(config.validate_json_body());
//! ```
//!
//! ## Example `reqbind.toml`
//!
//! ```toml
//! [codegen]
//! root = "src"
//! file_name = "zz_reqbind_generated.rs"
//!
//! [openapi]
//! output = "openapi.json"
//! title = "User Service"
//! version = "1.2.0"
//! ```

use std::env;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use serde::Deserialize;

/// Default multipart body ceiling (1 GiB).
pub const DEFAULT_MULTIPART_LIMIT: u64 = 1 << 30;

/// Name of the file written next to each module by the code generator.
pub const GENERATED_FILE_NAME: &str = "zz_reqbind_generated.rs";

/// Name of the schema document written by the schema generator.
pub const OPENAPI_FILE_NAME: &str = "openapi.json";

/// Shared binding switches. Pass as `&BindConfig` (usually behind an `Arc`).
#[derive(Debug)]
pub struct BindConfig {
    validate_json_body: AtomicBool,
    multipart_limit: AtomicU64,
}

impl Default for BindConfig {
    fn default() -> Self {
        BindConfig {
            validate_json_body: AtomicBool::new(false),
            multipart_limit: AtomicU64::new(DEFAULT_MULTIPART_LIMIT),
        }
    }
}

impl BindConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let validate = match env::var("REQBIND_VALIDATE_JSON_BODY") {
            Ok(val) => parse_flag(&val),
            Err(_) => false,
        };
        let limit = match env::var("REQBIND_MULTIPART_LIMIT") {
            Ok(val) => parse_size(&val).unwrap_or(DEFAULT_MULTIPART_LIMIT),
            Err(_) => DEFAULT_MULTIPART_LIMIT,
        };
        BindConfig {
            validate_json_body: AtomicBool::new(validate),
            multipart_limit: AtomicU64::new(limit),
        }
    }

    pub fn validate_json_body(&self) -> bool {
        self.validate_json_body.load(Ordering::Relaxed)
    }

    pub fn set_validate_json_body(&self, enabled: bool) {
        self.validate_json_body.store(enabled, Ordering::Relaxed);
    }

    pub fn multipart_limit(&self) -> u64 {
        self.multipart_limit.load(Ordering::Relaxed)
    }

    pub fn set_multipart_limit(&self, bytes: u64) {
        self.multipart_limit.store(bytes, Ordering::Relaxed);
    }
}

fn parse_flag(val: &str) -> bool {
    matches!(
        val.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_size(val: &str) -> Option<u64> {
    let val = val.trim();
    if let Some(hex) = val.strip_prefix("0x") {
        u64::from_str_radix(hex, 16).ok()
    } else {
        val.parse().ok()
    }
}

/// Generator settings from `reqbind.toml`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ToolConfig {
    pub codegen: CodegenConfig,
    pub openapi: OpenApiConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct CodegenConfig {
    /// Source root the module paths are resolved against
    pub root: PathBuf,
    pub file_name: String,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        CodegenConfig {
            root: PathBuf::from("src"),
            file_name: GENERATED_FILE_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct OpenApiConfig {
    /// `.json`, or `.yaml`/`.yml` for YAML output
    pub output: PathBuf,
    pub title: String,
    pub version: String,
}

impl Default for OpenApiConfig {
    fn default() -> Self {
        OpenApiConfig {
            output: PathBuf::from(OPENAPI_FILE_NAME),
            title: "RESTful API".to_string(),
            version: "1.0.0".to_string(),
        }
    }
}

impl ToolConfig {
    /// Reads `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(ToolConfig::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}
