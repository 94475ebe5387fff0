//! Category digests
//!
//! Merges the `<ISO2>.json` files of one category directory into a single
//! `output.json` object keyed by ISO code, the same shape the city digest
//! uses for cities.

use crate::error::TravelError;
use crate::report::{BatchReport, ItemOutcome, ItemReport};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// File name of the merged digest inside a category directory
pub const DIGEST_FILE: &str = "output.json";

/// Extract the ISO code from a per-country file name (`JP.json` -> `JP`)
fn iso_code_of(path: &Path) -> Option<String> {
    if path.extension()? != "json" {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    if stem.len() == 2 && stem.chars().all(|c| c.is_ascii_uppercase()) {
        Some(stem.to_string())
    } else {
        None
    }
}

/// Merge every `<ISO2>.json` in `dir` into `dir/output.json`
///
/// A file that is not valid JSON is reported as failed and left out of the
/// digest. An unreadable directory or an unwritable digest is an error.
pub async fn collect_directory(
    dir: &Path,
    category: impl Into<String>,
) -> Result<(BatchReport, PathBuf), TravelError> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| TravelError::io(dir, e))?;

    let mut files: Vec<(String, PathBuf)> = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| TravelError::io(dir, e))?
    {
        let path = entry.path();
        if let Some(code) = iso_code_of(&path) {
            files.push((code, path));
        }
    }
    files.sort();

    let mut digest = Map::new();
    let mut reports = Vec::with_capacity(files.len());
    for (code, path) in files {
        let outcome = match tokio::fs::read(&path).await {
            Ok(data) => match serde_json::from_slice::<Value>(&data) {
                Ok(value) => {
                    digest.insert(code.clone(), value);
                    ItemOutcome::Collected {
                        bytes: data.len() as u64,
                    }
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping malformed file");
                    ItemOutcome::Failed {
                        error: format!("Failed to parse {}: {}", path.display(), e),
                    }
                }
            },
            Err(e) => ItemOutcome::Failed {
                error: TravelError::io(&path, e).to_string(),
            },
        };
        reports.push(ItemReport {
            item: code,
            outcome,
        });
    }

    let output = dir.join(DIGEST_FILE);
    let json = serde_json::to_vec_pretty(&Value::Object(digest)).map_err(|source| {
        TravelError::Parse {
            path: output.clone(),
            source,
        }
    })?;
    tokio::fs::write(&output, json)
        .await
        .map_err(|e| TravelError::io(&output, e))?;

    let report = BatchReport::new(category, reports);
    tracing::info!(
        path = %output.display(),
        merged = report.saved(),
        failed = report.failed(),
        "Wrote category digest"
    );
    Ok((report, output))
}
