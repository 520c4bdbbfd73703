use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

use crate::application::dto::{AnalysisTarget, OutputFormat};

/// Analyze the transitive dependency graph of Maven artifacts
#[derive(Parser, Debug)]
#[command(name = "artifact-graph")]
#[command(version)]
#[command(
    about = "Analyze the transitive dependency graph of Maven artifacts",
    long_about = "Analyze the transitive dependency graph of Maven artifacts: \
installed size, minimum JVM release and license exposure of a package \
together with everything it pulls in."
)]
pub struct Args {
    /// Path to a configuration file (defaults to ./artifact-graph.config.yml if present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Graph snapshot file loaded at start and saved on exit
    #[arg(long, global = true, value_name = "FILE")]
    pub store: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze a package and report on its dependency tree
    Analyze {
        /// group:artifact:version[:classifier], or group:artifact for the latest release
        #[arg(value_name = "COORDINATE")]
        target: AnalysisTarget,

        /// Dependency levels to include in the report (all levels if omitted)
        #[arg(short, long)]
        depth: Option<usize>,

        /// Output format: json or markdown
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,

        /// Output file path (if not specified, outputs to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the published versions of an artifact, oldest first
    Versions {
        group_id: String,
        artifact_id: String,
    },

    /// Search the registry by free text or group:artifact
    Search { query: String },

    /// Retry unresolved packages until interrupted with Ctrl-C
    Sweep {
        /// Run a single batch and exit
        #[arg(long)]
        once: bool,
    },
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
