//! Config command implementation.

use crate::cli::{ConfigAction, ConfigArgs};
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use std::path::Path;

/// Execute a configuration action.
pub async fn execute_config(
    args: ConfigArgs,
    config: &Config,
    path: Option<&Path>,
    formatter: &Formatter,
) -> Result<()> {
    match args.action {
        ConfigAction::Show => {
            let resolved = Config::resolve_path(path)?;
            if !resolved.exists() {
                eprintln!(
                    "{}",
                    formatter.info(&format!("{} not found, showing defaults", resolved.display()))
                );
            }
            print!("{}", config.to_toml()?);
        }
        ConfigAction::Init { force } => {
            let resolved = Config::resolve_path(path)?;
            if resolved.exists() && !force {
                return Err(CliError::InvalidInput(format!(
                    "{} already exists (use --force to overwrite)",
                    resolved.display()
                )));
            }
            let written = Config::default().save(Some(resolved.as_path()))?;
            println!("{}", formatter.success(&format!("Wrote {}", written.display())));
        }
    }

    Ok(())
}
