//! Per-country government info fetcher
//!
//! Resolves a country display name to its ISO alpha-2 code, queries one
//! [`Endpoint`] for it and stores the response body verbatim as
//! `<output_dir>/<ISO2>.json`.

use crate::client::{get_bytes, redact};
use crate::config::Config;
use crate::country;
use crate::endpoint::Endpoint;
use crate::error::TravelError;
use crate::fetchers::{write_file, Fetcher, Pacer};
use crate::report::ItemOutcome;
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use std::path::{Path, PathBuf};

/// Fetches one information category for country names
pub struct InfoFetcher {
    client: reqwest::Client,
    endpoint: Endpoint,
    base_url: String,
    service_key: String,
    output_dir: PathBuf,
    pacer: Pacer,
}

impl InfoFetcher {
    /// Create a fetcher writing into the category's configured directory
    pub fn new(client: reqwest::Client, config: &Config, endpoint: Endpoint) -> Self {
        Self {
            client,
            endpoint,
            base_url: config.gov_base_url.clone(),
            service_key: config.service_key.clone(),
            output_dir: config.output_dir(endpoint),
            pacer: Pacer::new(config.info_pacing),
        }
    }

    /// Write into `dir` instead of the configured category directory
    pub fn with_output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.output_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

#[async_trait]
impl Fetcher for InfoFetcher {
    fn name(&self) -> &'static str {
        self.endpoint.name()
    }

    async fn fetch(&self, country: &str) -> Result<ItemOutcome, TravelError> {
        let Some(code) = country::alpha2(country) else {
            tracing::warn!(country = %country, "No ISO code found for country");
            return Ok(ItemOutcome::Skipped {
                reason: format!("No ISO code found for country: {}", country),
            });
        };

        let url = self.endpoint.url(&self.base_url, &self.service_key, code)?;
        self.pacer.wait().await;
        tracing::debug!(country = %country, code = code, url = %redact(&url), "Fetching info");

        let body = get_bytes(&self.client, url, HeaderMap::new()).await?;
        let path = write_file(&self.output_dir, &format!("{}.json", code), &body).await?;

        tracing::info!(
            endpoint = self.endpoint.name(),
            country = %country,
            code = code,
            path = %path.display(),
            "Saved info"
        );
        Ok(ItemOutcome::Saved {
            path,
            bytes: body.len() as u64,
        })
    }
}
