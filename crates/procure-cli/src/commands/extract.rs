//! Extract command implementation.

use crate::cli::ExtractArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use procure_extractor::Extractor;
use tracing::debug;

/// Execute the extract command.
pub async fn execute_extract(args: ExtractArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let bytes = tokio::fs::read(&args.file).await?;
    let html = String::from_utf8_lossy(&bytes);
    debug!("Read {} bytes from {}", bytes.len(), args.file.display());

    let extractor = Extractor::new(config.extractor.clone())?;
    let bundle = match args.variant.variant() {
        Some(variant) => extractor.extract_as(&html, variant)?,
        None => extractor.extract(&html)?,
    };

    println!("{}", formatter.format_bundle(&bundle)?);
    Ok(())
}
