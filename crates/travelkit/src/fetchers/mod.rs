//! Fetcher system for per-item downloads
//!
//! Design: each fetcher turns one item (a city key or a country name) into
//! one file on disk. [`run_batch`] drives a fetcher over a list of items and
//! records what happened to each, so a single bad item never stops the rest.

mod city;
mod info;

pub use city::{CityPageFetcher, CITY_PAGE_REFERER, CITY_PAGE_USER_AGENT};
pub use info::InfoFetcher;

use crate::error::TravelError;
use crate::report::{BatchReport, ItemOutcome, ItemReport};
use async_trait::async_trait;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::Mutex;

/// Trait for item fetchers
///
/// `Ok` carries the item's outcome, including deliberate skips. `Err` marks
/// the item failed; [`run_batch`] logs it and moves on.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Unique identifier for this fetcher (for logging/debugging)
    fn name(&self) -> &'static str;

    /// Fetch and persist a single item
    async fn fetch(&self, item: &str) -> Result<ItemOutcome, TravelError>;
}

/// Options for a batch run
#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    /// Maximum number of items in flight at once
    pub concurrency: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self { concurrency: 1 }
    }
}

/// Run `fetcher` over `items`
///
/// Items are processed with at most `options.concurrency` in flight.
/// The report lists items in input order regardless of completion order.
pub async fn run_batch(
    fetcher: &dyn Fetcher,
    category: impl Into<String>,
    items: &[String],
    options: BatchOptions,
) -> BatchReport {
    let category = category.into();
    tracing::info!(
        fetcher = fetcher.name(),
        category = %category,
        items = items.len(),
        "Starting batch"
    );

    let reports: Vec<ItemReport> = futures::stream::iter(items)
        .map(|item| async move {
            let outcome = match fetcher.fetch(item).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    tracing::warn!(fetcher = fetcher.name(), item = %item, error = %err, "Item failed");
                    ItemOutcome::Failed {
                        error: err.to_string(),
                    }
                }
            };
            ItemReport {
                item: item.clone(),
                outcome,
            }
        })
        .buffered(options.concurrency.max(1))
        .collect()
        .await;

    let report = BatchReport::new(category, reports);
    tracing::info!(
        category = %report.category,
        saved = report.saved(),
        skipped = report.skipped(),
        failed = report.failed(),
        "Batch finished"
    );
    report
}

/// Global request spacing shared by all in-flight items of a fetcher
///
/// Each call to [`Pacer::wait`] holds the gate for the full delay, so
/// request starts are at least `delay` apart even with concurrency.
#[derive(Debug)]
pub struct Pacer {
    delay: Duration,
    gate: Mutex<()>,
}

impl Pacer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            gate: Mutex::new(()),
        }
    }

    pub async fn wait(&self) {
        if self.delay.is_zero() {
            return;
        }
        let _guard = self.gate.lock().await;
        tokio::time::sleep(self.delay).await;
    }
}

/// Write `data` to `dir/file_name`, creating `dir` and replacing any old file
pub(crate) async fn write_file(
    dir: &Path,
    file_name: &str,
    data: &[u8],
) -> Result<PathBuf, TravelError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| TravelError::io(dir, e))?;
    let path = dir.join(file_name);
    tokio::fs::write(&path, data)
        .await
        .map_err(|e| TravelError::io(&path, e))?;
    Ok(path)
}
