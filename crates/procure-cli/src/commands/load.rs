//! Load command implementation.

use crate::cli::LoadArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use procure_domain::traits::BundleStore;
use procure_domain::IdentityKey;
use procure_extractor::{BatchExtractor, BatchMetrics, BatchReport, Extractor};
use procure_store::SqliteStore;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

/// What a load run extracted and stored.
#[derive(Debug)]
pub struct LoadOutcome {
    /// Database the bundles were written to
    pub database: PathBuf,
    /// Rows upserted across all tables
    pub rows_written: usize,
    /// Documents stored, with their identity
    pub stored: Vec<(PathBuf, IdentityKey)>,
    /// Documents skipped during extraction or storage, with the reason
    pub failures: Vec<(PathBuf, String)>,
    /// Extraction metrics
    pub metrics: BatchMetrics,
}

/// Execute the load command.
pub async fn execute_load(args: LoadArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let outcome = run_load(args, config).await?;
    println!("{}", formatter.format_load(&outcome)?);
    Ok(())
}

/// Extract every requested document and upsert the bundles.
///
/// Documents that fail to extract or store are reported in the outcome;
/// only setup problems (no input, unreadable directory, database open)
/// fail the whole run.
pub async fn run_load(args: LoadArgs, config: &Config) -> Result<LoadOutcome> {
    let mut extractor_config = config.extractor.clone();
    if let Some(concurrency) = args.concurrency {
        extractor_config.concurrency = concurrency;
    }
    let batch = BatchExtractor::new(Extractor::new(extractor_config)?);

    let mut paths = args.files;
    if let Some(dir) = &args.dir {
        paths.extend(batch.collect_paths(dir).await?);
    }
    if paths.is_empty() {
        return Err(CliError::InvalidInput(
            "no documents to load (use --file or --dir)".to_string(),
        ));
    }
    paths.sort();
    paths.dedup();

    let BatchReport {
        bundles,
        failures,
        metrics,
    } = batch.extract_paths(paths).await;

    let database = args.db.unwrap_or_else(|| config.store.database_path.clone());
    if let Some(parent) = database.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut store = SqliteStore::new(&database)?;

    let mut outcome = LoadOutcome {
        database,
        rows_written: 0,
        stored: Vec::with_capacity(bundles.len()),
        failures: failures
            .into_iter()
            .map(|f| (f.path, f.error.to_string()))
            .collect(),
        metrics,
    };

    for (path, bundle) in bundles {
        match store.upsert_bundle(&bundle) {
            Ok(summary) => {
                outcome.rows_written += summary.rows_written;
                outcome.stored.push((path, bundle.identity));
            }
            Err(e) => {
                warn!("Failed to store {} ({}): {}", path.display(), bundle.identity, e);
                outcome.failures.push((path, e.to_string()));
            }
        }
    }
    outcome.failures.sort_by(|a, b| a.0.cmp(&b.0));

    info!(
        "Loaded {} of {} documents into {}",
        outcome.stored.len(),
        outcome.metrics.documents_seen,
        outcome.database.display()
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    const AWARD: &str =
        include_str!("../../../procure-extractor/tests/fixtures/award_notice.html");
    const DECLARATION: &str =
        include_str!("../../../procure-extractor/tests/fixtures/declaration_notice.html");

    fn load_args(dir: &Path, db: &Path) -> LoadArgs {
        LoadArgs {
            files: Vec::new(),
            dir: Some(dir.to_path_buf()),
            db: Some(db.to_path_buf()),
            concurrency: Some(2),
        }
    }

    #[tokio::test]
    async fn test_load_directory() {
        let dir = tempfile::tempdir().unwrap();
        let notices = dir.path().join("bid_detail");
        fs::create_dir_all(notices.join("2016")).unwrap();
        fs::write(notices.join("51759078_IEB048.txt"), AWARD).unwrap();
        fs::write(notices.join("2016").join("NTIxMzcxMzM.html"), DECLARATION).unwrap();
        fs::write(notices.join("readme.md"), "not a notice").unwrap();
        let db = dir.path().join("out").join("procure.db");

        let outcome = run_load(load_args(&notices, &db), &Config::default()).await.unwrap();

        assert_eq!(outcome.stored.len(), 2);
        assert!(outcome.failures.is_empty());
        assert_eq!(outcome.rows_written, 16);
        assert_eq!(outcome.metrics.documents_succeeded, 2);

        let store = SqliteStore::new(&db).unwrap();
        assert_eq!(store.count_rows("tender_award_item").unwrap(), 3);
        assert_eq!(store.count_rows("attend_info").unwrap(), 1);
    }

    #[tokio::test]
    async fn test_load_reports_bad_documents() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.txt");
        let bad = dir.path().join("bad.txt");
        fs::write(&good, AWARD).unwrap();
        fs::write(&bad, "<html><body>Not found</body></html>").unwrap();

        let args = LoadArgs {
            files: vec![bad.clone(), good.clone(), good.clone()],
            dir: None,
            db: Some(dir.path().join("procure.db")),
            concurrency: None,
        };
        let outcome = run_load(args, &Config::default()).await.unwrap();

        assert_eq!(outcome.stored.len(), 1);
        assert_eq!(outcome.stored[0].0, good);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].0, bad);
        assert_eq!(outcome.metrics.documents_seen, 2);
    }

    #[tokio::test]
    async fn test_load_without_input_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let args = LoadArgs {
            files: Vec::new(),
            dir: None,
            db: Some(dir.path().join("procure.db")),
            concurrency: None,
        };
        assert!(matches!(
            run_load(args, &Config::default()).await,
            Err(CliError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_zero_concurrency_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = load_args(dir.path(), &dir.path().join("procure.db"));
        args.concurrency = Some(0);
        assert!(matches!(
            run_load(args, &Config::default()).await,
            Err(CliError::Extractor(_))
        ));
    }
}
