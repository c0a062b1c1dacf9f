//! Batch driver: extract many stored documents concurrently
//!
//! Reading happens on the async runtime; parsing and walking run on the
//! blocking pool because the parsed tree is not `Send`. A semaphore caps
//! the number of documents in flight.

use crate::error::ExtractorError;
use crate::extractor::Extractor;
use crate::metrics::BatchMetrics;
use procure_domain::ExtractionBundle;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// A document that could not be extracted
#[derive(Debug)]
pub struct DocumentFailure {
    /// Stored document path
    pub path: PathBuf,
    /// Why it was skipped
    pub error: ExtractorError,
}

/// Outcome of a batch run, sorted by path
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Extracted bundles
    pub bundles: Vec<(PathBuf, ExtractionBundle)>,
    /// Skipped documents
    pub failures: Vec<DocumentFailure>,
    /// Run metrics
    pub metrics: BatchMetrics,
}

impl BatchReport {
    /// Record a failure for every path whose task ended without reporting
    fn record_unfinished(&mut self, pending: BTreeMap<PathBuf, usize>) {
        for (path, count) in pending {
            for _ in 0..count {
                warn!("Skipping {}: extraction task did not complete", path.display());
                self.metrics.record_failure();
                self.failures.push(DocumentFailure {
                    path: path.clone(),
                    error: ExtractorError::Task("extraction task did not complete".to_string()),
                });
            }
        }
    }
}

/// Runs an [`Extractor`] over many files
#[derive(Debug, Clone)]
pub struct BatchExtractor {
    extractor: Arc<Extractor>,
}

impl BatchExtractor {
    /// Create a batch driver around an extractor
    pub fn new(extractor: Extractor) -> Self {
        Self {
            extractor: Arc::new(extractor),
        }
    }

    /// The wrapped extractor
    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    /// Every file under `dir` whose extension is configured, sorted
    pub async fn collect_paths(&self, dir: &Path) -> Result<Vec<PathBuf>, ExtractorError> {
        let config = self.extractor.config();
        let mut pending = vec![dir.to_path_buf()];
        let mut paths = Vec::new();

        while let Some(current) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&current)
                .await
                .map_err(|e| ExtractorError::Io(format!("{}: {}", current.display(), e)))?;

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| ExtractorError::Io(format!("{}: {}", current.display(), e)))?
            {
                let path = entry.path();
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| ExtractorError::Io(format!("{}: {}", path.display(), e)))?;

                if file_type.is_dir() {
                    pending.push(path);
                } else if config.accepts_path(&path) {
                    paths.push(path);
                } else {
                    debug!("Skipping {}", path.display());
                }
            }
        }

        paths.sort();
        Ok(paths)
    }

    /// Extract every matching file under a directory
    pub async fn extract_dir(&self, dir: &Path) -> Result<BatchReport, ExtractorError> {
        let paths = self.collect_paths(dir).await?;
        info!("Found {} documents under {}", paths.len(), dir.display());
        Ok(self.extract_paths(paths).await)
    }

    /// Extract a list of files
    ///
    /// Per-document failures are logged and recorded in the report; they
    /// never stop the batch.
    pub async fn extract_paths(&self, paths: Vec<PathBuf>) -> BatchReport {
        let started = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.extractor.config().concurrency));
        let mut tasks = JoinSet::new();
        let mut pending: BTreeMap<PathBuf, usize> = BTreeMap::new();

        for path in paths {
            *pending.entry(path.clone()).or_insert(0) += 1;
            let semaphore = Arc::clone(&semaphore);
            let extractor = Arc::clone(&self.extractor);
            tasks.spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => extract_file(extractor, &path).await,
                    Err(e) => Err(ExtractorError::Task(e.to_string())),
                };
                (path, result)
            });
        }

        let mut report = BatchReport::default();
        while let Some(joined) = tasks.join_next().await {
            let (path, result) = match joined {
                Ok(done) => done,
                Err(e) => {
                    warn!("Extraction task failed: {}", e);
                    continue;
                }
            };
            settle(&mut pending, &path);
            match result {
                Ok(bundle) => {
                    report.metrics.record_success(&bundle);
                    report.bundles.push((path, bundle));
                }
                Err(error) => {
                    warn!("Skipping {}: {}", path.display(), error);
                    report.metrics.record_failure();
                    report.failures.push(DocumentFailure { path, error });
                }
            }
        }

        report.record_unfinished(pending);

        report.bundles.sort_by(|a, b| a.0.cmp(&b.0));
        report.failures.sort_by(|a, b| a.path.cmp(&b.path));
        report.metrics.elapsed = started.elapsed();

        info!(
            "Batch complete: {} extracted, {} skipped",
            report.metrics.documents_succeeded, report.metrics.documents_failed
        );
        report
    }
}

fn settle(pending: &mut BTreeMap<PathBuf, usize>, path: &Path) {
    if let Some(count) = pending.get_mut(path) {
        *count -= 1;
        if *count == 0 {
            pending.remove(path);
        }
    }
}

async fn extract_file(
    extractor: Arc<Extractor>,
    path: &Path,
) -> Result<ExtractionBundle, ExtractorError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ExtractorError::Io(format!("{}: {}", path.display(), e)))?;
    let html = String::from_utf8_lossy(&bytes).into_owned();

    tokio::task::spawn_blocking(move || extractor.extract(&html))
        .await
        .map_err(|e| ExtractorError::Task(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unfinished_tasks_recorded_per_path() {
        let mut pending = BTreeMap::new();
        pending.insert(PathBuf::from("a.txt"), 2);
        pending.insert(PathBuf::from("b.txt"), 1);
        settle(&mut pending, Path::new("a.txt"));
        settle(&mut pending, Path::new("b.txt"));

        let mut report = BatchReport::default();
        report.record_unfinished(pending);

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].path, PathBuf::from("a.txt"));
        assert!(matches!(report.failures[0].error, ExtractorError::Task(_)));
        assert_eq!(report.metrics.documents_failed, 1);
        assert_eq!(report.metrics.documents_seen, 1);
    }
}
