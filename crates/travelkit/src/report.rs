//! Per-item batch outcomes
//!
//! Batches never abort on a single bad item. Instead every item ends up in
//! the [`BatchReport`] with what happened to it, so callers can tell which
//! countries or cities need another run without reading logs.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What happened to one item of a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemOutcome {
    /// Response body written to disk
    Saved {
        /// File that now holds the body
        path: PathBuf,
        /// Number of bytes written
        bytes: u64,
    },
    /// Source file merged into a category digest
    Collected {
        /// Size of the merged source file
        bytes: u64,
    },
    /// Item intentionally not fetched (e.g. no ISO code for the country)
    Skipped { reason: String },
    /// Item failed; the batch carried on
    Failed { error: String },
}

impl ItemOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, ItemOutcome::Failed { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, ItemOutcome::Skipped { .. })
    }
}

/// Outcome for a named item (city key, country name or file)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ItemReport {
    pub item: String,
    #[serde(flatten)]
    pub outcome: ItemOutcome,
}

/// Result of one batch run, in input order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BatchReport {
    /// Batch name ("cities", "embassy", "visa", ...)
    pub category: String,
    pub items: Vec<ItemReport>,
}

impl BatchReport {
    pub fn new(category: impl Into<String>, items: Vec<ItemReport>) -> Self {
        Self {
            category: category.into(),
            items,
        }
    }

    /// Number of items that produced or merged a file
    pub fn saved(&self) -> usize {
        self.items
            .iter()
            .filter(|r| {
                matches!(
                    r.outcome,
                    ItemOutcome::Saved { .. } | ItemOutcome::Collected { .. }
                )
            })
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.items.iter().filter(|r| r.outcome.is_skipped()).count()
    }

    pub fn failed(&self) -> usize {
        self.items.iter().filter(|r| r.outcome.is_failed()).count()
    }

    /// True when nothing failed (skips are not failures)
    pub fn is_clean(&self) -> bool {
        self.failed() == 0
    }

    /// Look up the outcome for an item
    pub fn outcome(&self, item: &str) -> Option<&ItemOutcome> {
        self.items
            .iter()
            .find(|r| r.item == item)
            .map(|r| &r.outcome)
    }
}
