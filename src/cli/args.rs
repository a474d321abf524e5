//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Glacier - load-once, deep-frozen manifest cache
///
/// Loads JSON/TOML manifests and evaluates script manifests in an isolated
/// context, caching each path once and freezing what it caches.
#[derive(Parser, Debug)]
#[command(name = "glacier")]
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
    #[arg(short, long, global = true, env = "GLACIER_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse JSON or TOML manifests
    Load(ManifestArgs),

    /// Evaluate script manifests in an isolated context
    Eval(ManifestArgs),

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Arguments for the load and eval commands
#[derive(Parser, Debug)]
pub struct ManifestArgs {
    /// Manifest paths, used exactly as given (repeat a path to hit the cache)
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Read and materialize every path without caching or freezing
    #[arg(long)]
    pub no_cache: bool,

    /// Output format
    #[arg(short, long, default_value = "pretty")]
    pub format: OutputFormat,

    /// Print cache statistics after loading
    #[arg(long)]
    pub stats: bool,
}

/// Output format for manifest values
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Indented JSON
    Pretty,
    /// Compact JSON, one manifest per line
    Json,
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

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., cache.enabled)
        key: String,
        /// Value to set
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_load() {
        let cli = Cli::parse_from(["glacier", "load", "a.json", "b.toml"]);
        match cli.command {
            Commands::Load(args) => {
                assert_eq!(args.paths, vec![PathBuf::from("a.json"), PathBuf::from("b.toml")]);
                assert!(!args.no_cache);
                assert!(matches!(args.format, OutputFormat::Pretty));
            }
            _ => panic!("expected Load command"),
        }
    }

    #[test]
    fn cli_parses_eval_flags() {
        let cli = Cli::parse_from([
            "glacier",
            "eval",
            "--no-cache",
            "--format",
            "json",
            "--stats",
            "m.js",
        ]);
        match cli.command {
            Commands::Eval(args) => {
                assert!(args.no_cache);
                assert!(args.stats);
                assert!(matches!(args.format, OutputFormat::Json));
            }
            _ => panic!("expected Eval command"),
        }
    }

    #[test]
    fn cli_requires_paths() {
        assert!(Cli::try_parse_from(["glacier", "load"]).is_err());
    }

    #[test]
    fn cli_parses_config_set() {
        let cli = Cli::parse_from(["glacier", "config", "set", "cache.enabled", "false"]);
        match cli.command {
            Commands::Config(ConfigArgs {
                action: Some(ConfigAction::Set { key, value }),
            }) => {
                assert_eq!(key, "cache.enabled");
                assert_eq!(value, "false");
            }
            _ => panic!("expected Config Set command"),
        }
    }

    #[test]
    fn cli_verbose_levels() {
        let cli = Cli::parse_from(["glacier", "config"]);
        assert_eq!(cli.verbose, 0);

        let cli = Cli::parse_from(["glacier", "-v", "config"]);
        assert_eq!(cli.verbose, 1);

        let cli = Cli::parse_from(["glacier", "-vv", "config"]);
        assert_eq!(cli.verbose, 2);
    }
}
