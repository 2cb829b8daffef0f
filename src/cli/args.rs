//! CLI argument definitions using clap derive

use crate::orchestration::BuildTool;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Javelin - cached builds for Java applications
///
/// Fingerprints a source tree, rebuilds it only when sources or the
/// toolchain changed, and replaces the tree with the built artifact.
#[derive(Parser, Debug)]
#[command(name = "javelin")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "JAVELIN_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the application, reusing the cached artifact when unchanged
    Build(BuildArgs),

    /// Print the cache record for a source tree
    Fingerprint(FingerprintArgs),

    /// Inspect or clear the build cache
    Cache(CacheArgs),

    /// Show configuration
    Config(ConfigArgs),
}

/// Arguments for the build command
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Application root (replaced with the built artifact's contents)
    #[arg(short, long, default_value = ".")]
    pub source: PathBuf,

    /// Build tool (detected from build files if omitted)
    #[arg(short, long)]
    pub tool: Option<ToolArg>,

    /// Build tool executable (default: wrapper script, then tool on PATH)
    #[arg(long)]
    pub executable: Option<PathBuf>,

    /// Build arguments, whitespace separated
    #[arg(long, env = "BP_BUILD_ARGUMENTS", allow_hyphen_values = true)]
    pub arguments: Option<String>,

    /// Glob locating the built artifact
    #[arg(long, env = "BP_BUILT_ARTIFACT")]
    pub built_artifact: Option<String>,

    /// Module subdirectory containing the built artifact
    #[arg(long, env = "BP_BUILT_MODULE")]
    pub built_module: Option<String>,

    /// Build cache directory
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Kill the build after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Toolchain version (skips the version probe)
    #[arg(long)]
    pub toolchain_version: Option<String>,
}

/// Arguments for the fingerprint command
#[derive(Parser, Debug)]
pub struct FingerprintArgs {
    /// Application root
    #[arg(short, long, default_value = ".")]
    pub source: PathBuf,

    /// Output format
    #[arg(short, long, default_value = "toml")]
    pub format: RecordFormat,

    /// Toolchain version (skips the version probe)
    #[arg(long)]
    pub toolchain_version: Option<String>,
}

/// Arguments for the cache command
#[derive(Parser, Debug)]
pub struct CacheArgs {
    /// Subcommand for cache
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Show the cached build
    Show {
        /// Build cache directory
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },

    /// Remove the cached build
    Clear {
        /// Build cache directory
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}

/// Build tool selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ToolArg {
    Gradle,
    Maven,
}

impl From<ToolArg> for BuildTool {
    fn from(tool: ToolArg) -> Self {
        match tool {
            ToolArg::Gradle => BuildTool::Gradle,
            ToolArg::Maven => BuildTool::Maven,
        }
    }
}

/// Output format for cache records
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RecordFormat {
    Toml,
    Json,
}
