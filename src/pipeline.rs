//! Orchestration: dedup gate, classification, extraction, append, mark.
//!
//! Files are processed strictly sequentially within a run, which keeps the
//! dedup gate race-free without a lock. The central correctness invariant is
//! write-then-mark: a file id enters the processed set only after the sheet
//! append was confirmed, so a failed append is retried on the next run and a
//! file is never silently lost.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::classifier::{classify, ClassifyMode};
use crate::error::{FetchError, RunError, WriteError};
use crate::extractor::extract;
use crate::grid::CellGrid;
use crate::rows::{build_rows, SheetRow, ZeroIdentifierPolicy};
use crate::store::ProcessedStore;

/// A file discovered in the watched folder. Read-only downstream.
#[derive(Debug, Clone)]
pub struct CandidateFile {
    /// Identifier assigned by the storage backend.
    pub id: String,
    pub name: String,
    pub mime_type: Option<String>,
    pub created_time: Option<DateTime<Utc>>,
}

/// Lists candidate files in the watched folder. Ordering is not meaningful.
#[async_trait]
pub trait FileLister: Send + Sync {
    async fn list_files(&self) -> Result<Vec<CandidateFile>, FetchError>;
}

/// Downloads a file body and parses it into a cell grid.
///
/// Transport failures abort the run; a body that downloads but cannot be
/// parsed is a per-file content error.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch_grid(&self, file: &CandidateFile) -> Result<Box<dyn CellGrid>, FetchError>;
}

/// Appends rows to the destination worksheet, all-or-nothing per call.
#[async_trait]
pub trait SheetWriter: Send + Sync {
    async fn append_rows(&self, rows: &[SheetRow]) -> Result<(), WriteError>;
}

#[async_trait]
impl<T: FileLister + ?Sized> FileLister for Arc<T> {
    async fn list_files(&self) -> Result<Vec<CandidateFile>, FetchError> {
        (**self).list_files().await
    }
}

#[async_trait]
impl<T: ContentFetcher + ?Sized> ContentFetcher for Arc<T> {
    async fn fetch_grid(&self, file: &CandidateFile) -> Result<Box<dyn CellGrid>, FetchError> {
        (**self).fetch_grid(file).await
    }
}

#[async_trait]
impl<T: SheetWriter + ?Sized> SheetWriter for Arc<T> {
    async fn append_rows(&self, rows: &[SheetRow]) -> Result<(), WriteError> {
        (**self).append_rows(rows).await
    }
}

/// Behavior knobs for a run.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineOptions {
    pub classify_mode: ClassifyMode,
    pub zero_identifier_policy: ZeroIdentifierPolicy,
}

/// End-of-run counts, logged and returned to the trigger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Files whose rows were appended and that were marked processed.
    pub processed: usize,
    /// Files skipped by the dedup gate.
    pub already_processed: usize,
    /// Files no variant claimed (or ambiguous ones, in strict mode).
    pub unmatched: usize,
    /// Files that classified and parsed but carried nothing to write under
    /// the skip policy. Left unmarked so a later upload pass can fill them.
    pub empty: usize,
    /// Files whose body could not be read. Left unmarked for retry.
    pub failed: usize,
}

enum FileOutcome {
    Processed,
    Unmatched,
    Empty,
    Failed,
}

pub struct Pipeline<L, F, W, S> {
    lister: L,
    fetcher: F,
    writer: W,
    store: S,
    options: PipelineOptions,
}

impl<L, F, W, S> Pipeline<L, F, W, S>
where
    L: FileLister,
    F: ContentFetcher,
    W: SheetWriter,
    S: ProcessedStore,
{
    pub fn new(lister: L, fetcher: F, writer: W, store: S, options: PipelineOptions) -> Self {
        Self {
            lister,
            fetcher,
            writer,
            store,
            options,
        }
    }

    /// One pass over the watched folder: dedup gate, then classify, fetch,
    /// extract, append, mark, per file.
    pub async fn run_once(&self) -> Result<RunSummary, RunError> {
        let files = self
            .lister
            .list_files()
            .await
            .map_err(|e| RunError::List(e.to_string()))?;
        tracing::info!("{} candidate file(s) in watched folder", files.len());

        let mut summary = RunSummary::default();
        for file in &files {
            if self.store.contains(&file.id).await? {
                tracing::debug!("{} ({}) already processed, skipping", file.name, file.id);
                summary.already_processed += 1;
                continue;
            }
            self.tally(self.process_file(file).await?, &mut summary);
        }

        self.log_summary(&summary);
        Ok(summary)
    }

    /// Reprocess every file in the folder, ignoring the dedup gate.
    /// `min_prefix` restricts the pass to files whose name starts with a
    /// two-digit number at least that large.
    pub async fn run_all(&self, min_prefix: Option<u8>) -> Result<RunSummary, RunError> {
        let files = self
            .lister
            .list_files()
            .await
            .map_err(|e| RunError::List(e.to_string()))?;

        let selected: Vec<&CandidateFile> = files
            .iter()
            .filter(|f| match min_prefix {
                Some(min) => prefix_at_least(&f.name, min),
                None => true,
            })
            .collect();
        tracing::info!(
            "reprocessing {} of {} file(s) in watched folder",
            selected.len(),
            files.len()
        );

        let mut summary = RunSummary::default();
        for file in selected {
            self.tally(self.process_file(file).await?, &mut summary);
        }

        self.log_summary(&summary);
        Ok(summary)
    }

    async fn process_file(&self, file: &CandidateFile) -> Result<FileOutcome, RunError> {
        let variant = match classify(&file.name, self.options.classify_mode) {
            Ok(variant) => variant,
            Err(e) => {
                tracing::info!("skipping {}: {}", file.name, e);
                return Ok(FileOutcome::Unmatched);
            }
        };

        let grid = match self.fetcher.fetch_grid(file).await {
            Ok(grid) => grid,
            Err(FetchError::Content(e)) => {
                tracing::warn!("unreadable content in {}: {}", file.name, e);
                return Ok(FileOutcome::Failed);
            }
            Err(FetchError::Transport(e)) => return Err(RunError::Fetch(e)),
        };

        let record = extract(grid.as_ref(), variant, &file.id, &file.name);
        tracing::info!(
            "{} [{}]: tracking='{}', {} ASIN(s)",
            file.name,
            variant.keyword(),
            record.tracking_number,
            record.asins.len()
        );

        let sheet_rows = build_rows(&record, self.options.zero_identifier_policy);
        if sheet_rows.is_empty() {
            // Nothing written, so nothing is marked (write-then-mark holds).
            tracing::info!("{} produced no rows", file.name);
            return Ok(FileOutcome::Empty);
        }

        self.writer.append_rows(&sheet_rows).await?;
        self.store.mark_processed(&file.id).await?;

        Ok(FileOutcome::Processed)
    }

    fn tally(&self, outcome: FileOutcome, summary: &mut RunSummary) {
        match outcome {
            FileOutcome::Processed => summary.processed += 1,
            FileOutcome::Unmatched => summary.unmatched += 1,
            FileOutcome::Empty => summary.empty += 1,
            FileOutcome::Failed => summary.failed += 1,
        }
    }

    fn log_summary(&self, summary: &RunSummary) {
        tracing::info!(
            "run complete: {} processed, {} already processed, {} unmatched, {} empty, {} failed",
            summary.processed,
            summary.already_processed,
            summary.unmatched,
            summary.empty,
            summary.failed
        );
    }
}

/// True when the filename starts with a two-digit number >= `min`.
fn prefix_at_least(name: &str, min: u8) -> bool {
    name.get(0..2)
        .and_then(|prefix| prefix.parse::<u8>().ok())
        .map(|n| n >= min)
        .unwrap_or(false)
}
