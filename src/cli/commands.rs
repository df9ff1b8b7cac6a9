use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;

use crate::codegen;
use crate::config::ToolConfig;
use crate::openapi;
use crate::router::RouterGroup;

/// Command-line interface of a reqbind service binary
///
/// Without a subcommand the service starts normally; `gen` and `openapi`
/// run a generator over the registered routes and exit.
#[derive(Debug, Parser)]
#[command(name = "reqbind")]
#[command(about = "Request binding code and OpenAPI document generation", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to the generator configuration file
    #[arg(long, global = true, env = "REQBIND_CONFIG", default_value = "reqbind.toml")]
    pub config: PathBuf,
}

/// Available generator commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate binding code for every registered request type
    Gen {
        /// Source root module paths are resolved against (default: src)
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// List the files that would be written without writing them
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// Generate the OpenAPI document
    Openapi {
        /// Output file; `.yaml`/`.yml` selects YAML (default: openapi.json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Document version reported in `info.version`
        #[arg(long)]
        version: Option<String>,
    },
}

/// What the caller should do after [`run_cli`] returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// No subcommand: start serving
    Serve,
    /// A generator ran; exit the process
    Exit,
}

/// Runs the selected generator over `groups`.
pub fn run_cli(cli: Cli, groups: &[RouterGroup]) -> anyhow::Result<Outcome> {
    let Some(command) = cli.command else {
        return Ok(Outcome::Serve);
    };
    let mut config = ToolConfig::load(&cli.config)?;

    match command {
        Commands::Gen { root, dry_run } => {
            if let Some(root) = root {
                config.codegen.root = root;
            }
            if dry_run {
                for file in codegen::render(groups, &config.codegen)? {
                    println!("{} ({})", file.path.display(), file.types.join(", "));
                }
            } else {
                let summary = codegen::generate(groups, &config.codegen)?;
                info!(
                    written = summary.written,
                    unchanged = summary.unchanged,
                    "Binding code generation finished"
                );
            }
        }
        Commands::Openapi { output, version } => {
            if let Some(output) = output {
                config.openapi.output = output;
            }
            if let Some(version) = version {
                config.openapi.version = version;
            }
            openapi::generate_to_file(groups, &config.openapi)?;
        }
    }
    Ok(Outcome::Exit)
}
