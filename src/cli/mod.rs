//! # CLI Module
//!
//! Generator entry points for service binaries.
//!
//! ## Commands
//!
//! ### `gen`
//!
//! Write binding code for every request type registered in the route tree:
//!
//! ```bash
//! my-service gen --root src
//! ```
//!
//! Options:
//! - `--root <DIR>` - Source root the module paths are resolved against
//! - `--dry-run` - List the files without writing them
//!
//! ### `openapi`
//!
//! Write the OpenAPI document:
//!
//! ```bash
//! my-service openapi --output openapi.yaml
//! ```
//!
//! Both commands read defaults from `reqbind.toml` (`--config` or
//! `REQBIND_CONFIG` to override):
//!
//! ```toml
//! [codegen]
//! root = "src"
//!
//! [openapi]
//! output = "openapi.json"
//! title = "User Service"
//! version = "1.2.0"
//! ```
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! use clap::Parser;
//! use reqbind::cli::{run_cli, Cli, Outcome};
//!
//! let groups = apis::router();
//! if run_cli(Cli::parse(), &groups)? == Outcome::Exit {
//!     return Ok(());
//! }
//! // serve...
//! ```

mod commands;


pub use commands::{run_cli, Cli, Commands, Outcome};
