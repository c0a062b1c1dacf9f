//! CLI command definitions and argument parsing.

use clap::{ArgAction, Parser, Subcommand};
use procure_domain::DocumentVariant;
use std::path::PathBuf;

/// Procure CLI - Extract e-procurement notices into typed records.
#[derive(Debug, Parser)]
#[command(name = "procure")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "PROCURE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (identities only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract one notice and print its records
    Extract(ExtractArgs),

    /// Extract many notices and store them in SQLite
    Load(LoadArgs),

    /// Show or create the configuration file
    Config(ConfigArgs),
}

/// Arguments for the extract command.
#[derive(Debug, Parser)]
pub struct ExtractArgs {
    /// Stored notice page
    pub file: PathBuf,

    /// Document variant
    #[arg(long, value_enum, default_value = "auto")]
    pub variant: VariantArg,
}

/// Arguments for the load command.
#[derive(Debug, Parser)]
pub struct LoadArgs {
    /// Notice file to load (repeatable)
    #[arg(long = "file")]
    pub files: Vec<PathBuf>,

    /// Directory scanned recursively for notices
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// SQLite database (defaults to the configured path)
    #[arg(long, env = "PROCURE_DB")]
    pub db: Option<PathBuf>,

    /// Maximum documents extracted at once
    #[arg(long)]
    pub concurrency: Option<usize>,
}

/// Arguments for configuration management.
#[derive(Debug, Parser)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Variant argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum VariantArg {
    /// Detect from identity markers
    Auto,
    /// Award notice
    Award,
    /// Tender declaration
    Declaration,
}

impl VariantArg {
    /// The forced variant, `None` for auto-detection
    pub fn variant(self) -> Option<DocumentVariant> {
        match self {
            VariantArg::Auto => None,
            VariantArg::Award => Some(DocumentVariant::Award),
            VariantArg::Declaration => Some(DocumentVariant::Declaration),
        }
    }
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_command() {
        let cli = Cli::parse_from(["procure", "extract", "notice.html"]);
        match cli.command {
            Command::Extract(args) => {
                assert_eq!(args.file, PathBuf::from("notice.html"));
                assert_eq!(args.variant, VariantArg::Auto);
            }
            _ => panic!("Expected Extract command"),
        }
    }

    #[test]
    fn test_extract_forced_variant() {
        let cli = Cli::parse_from(["procure", "extract", "n.txt", "--variant", "declaration"]);
        match cli.command {
            Command::Extract(args) => {
                assert_eq!(args.variant.variant(), Some(DocumentVariant::Declaration));
            }
            _ => panic!("Expected Extract command"),
        }
    }

    #[test]
    fn test_load_command() {
        let cli = Cli::parse_from([
            "procure", "load", "--file", "a.txt", "--file", "b.txt", "-d", "bid_detail", "--db",
            "out.db",
        ]);
        match cli.command {
            Command::Load(args) => {
                assert_eq!(args.files.len(), 2);
                assert_eq!(args.dir, Some(PathBuf::from("bid_detail")));
                assert_eq!(args.db, Some(PathBuf::from("out.db")));
                assert_eq!(args.concurrency, None);
            }
            _ => panic!("Expected Load command"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["procure", "config", "show", "--format", "json", "-vv"]);
        assert!(matches!(cli.format, Some(CliFormat::Json)));
        assert_eq!(cli.verbose, 2);
        assert!(matches!(
            cli.command,
            Command::Config(ConfigArgs { action: ConfigAction::Show })
        ));
    }

    #[test]
    fn test_config_init_force() {
        let cli = Cli::parse_from(["procure", "--no-color", "config", "init", "--force"]);
        assert!(cli.no_color);
        assert!(matches!(
            cli.command,
            Command::Config(ConfigArgs { action: ConfigAction::Init { force: true } })
        ));
    }

    #[test]
    fn test_missing_subcommand_rejected() {
        assert!(Cli::try_parse_from(["procure"]).is_err());
    }

    #[test]
    fn test_unknown_variant_rejected() {
        assert!(Cli::try_parse_from(["procure", "extract", "n.txt", "--variant", "tender"]).is_err());
    }
}
