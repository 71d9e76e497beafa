//! CLI command definitions for bkpdir
//!
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod fields;

use crate::config::{ConfigPaths, ResolveMode};
use crate::format::OutputFormat;
use crate::paths;
use clap::{Parser, Subcommand};
use fields::FieldsArgs;
use std::path::{Path, PathBuf};

/// Directory archiving and file backup tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Use only this configuration file instead of the search path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Merge config files whole instead of following inheritance
    #[arg(long, global = true)]
    pub legacy: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show every resolved value and where it came from
    Config {
        /// Output format: text (default), json, or markdown
        #[arg(short, long, default_value = "text", value_name = "FORMAT")]
        format: OutputFormat,
    },

    /// Show one field by dotted path, e.g. `verification.checksum_algorithm`
    Get {
        #[arg(value_name = "PATH")]
        path: String,

        /// Output format: text (default), json, or markdown
        #[arg(short, long, default_value = "text", value_name = "FORMAT")]
        format: OutputFormat,
    },

    /// List configuration fields
    Fields(FieldsArgs),

    /// Show the config files applied, in order
    Chain {
        /// Output format: text (default), json, or markdown
        #[arg(short, long, default_value = "text", value_name = "FORMAT")]
        format: OutputFormat,
    },
}

impl Cli {
    pub fn mode(&self) -> ResolveMode {
        if self.legacy {
            ResolveMode::Legacy
        } else {
            ResolveMode::Inheritance
        }
    }

    /// Search path for this invocation, relative to `cwd`.
    pub fn config_paths(&self, cwd: &Path) -> ConfigPaths {
        match &self.config {
            Some(file) => {
                let file: PathBuf = paths::absolutize(&paths::expand_tilde(file), cwd);
                ConfigPaths::with_files(vec![file])
            }
            None => ConfigPaths::discover(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_global_flags() {
        let cli = Cli::parse_from(["bkpdir", "--legacy", "-c", "custom.yml", "config"]);
        assert_eq!(cli.mode(), ResolveMode::Legacy);
        assert_eq!(cli.log, "2");
        let paths = cli.config_paths(Path::new("/work"));
        assert_eq!(paths.search, vec![PathBuf::from("/work/custom.yml")]);
    }

    #[test]
    fn test_parse_get() {
        let cli = Cli::parse_from(["bkpdir", "get", "max_backups", "--format", "json"]);
        match cli.command {
            Command::Get { ref path, format } => {
                assert_eq!(path, "max_backups");
                assert_eq!(format, OutputFormat::Json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert_eq!(cli.mode(), ResolveMode::Inheritance);
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["bkpdir", "chain", "--format", "xml"]).is_err());
    }
}
