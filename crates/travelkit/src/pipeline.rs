//! Pipeline entry points
//!
//! Wires the city digest and the country extractor into the fetchers. Each entry point either
//! returns a [`BatchReport`] or, when the batch cannot start at all
//! (missing city digest, unwritable output directory), an error.

use crate::client::build_client;
use crate::collect::collect_directory;
use crate::config::Config;
use crate::digest::build_digest;
use crate::endpoint::Endpoint;
use crate::error::TravelError;
use crate::extract::extract_country_names;
use crate::fetchers::{run_batch, BatchOptions, CityPageFetcher, InfoFetcher};
use crate::report::BatchReport;
use std::path::Path;

/// Category name used in reports for city page batches
pub const CITIES_CATEGORY: &str = "cities";

/// Category name used in reports for city digest runs
pub const DIGEST_CATEGORY: &str = "digest";

/// Configured pipeline with a shared HTTP client
pub struct Pipeline {
    config: Config,
    client: reqwest::Client,
}

impl Pipeline {
    /// Validate `config` and build the HTTP client
    pub fn new(config: Config) -> Result<Self, TravelError> {
        config.validate()?;
        let client = build_client(&config)?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            concurrency: self.config.concurrency,
        }
    }

    /// Country names from the city digest
    pub fn load_countries(&self) -> Result<Vec<String>, TravelError> {
        extract_country_names(self.config.city_digest_path())
    }

    /// Download the page of every configured city
    ///
    /// The city data directory is created up front; if that fails no
    /// request is made.
    pub async fn fetch_city_pages(&self) -> Result<BatchReport, TravelError> {
        let dir = self.config.nomad_output_dir();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| TravelError::io(&dir, e))?;

        let fetcher = CityPageFetcher::new(self.client.clone(), &self.config);
        Ok(run_batch(&fetcher, CITIES_CATEGORY, &self.config.cities, self.batch_options()).await)
    }

    /// Parse the saved city pages into the city digest
    ///
    /// Reads `<city>_page.html` from the city data directory and writes the
    /// `output.json` that [`Pipeline::load_countries`] reads.
    pub async fn build_city_digest(&self) -> Result<BatchReport, TravelError> {
        let (report, _) = build_digest(&self.config.nomad_output_dir(), DIGEST_CATEGORY).await?;
        Ok(report)
    }

    /// Fetch one category for every country in the city digest
    pub async fn fetch_info(&self, endpoint: Endpoint) -> Result<BatchReport, TravelError> {
        let countries = self.load_countries()?;
        if countries.is_empty() {
            tracing::warn!(endpoint = endpoint.name(), "City digest names no countries");
        }
        Ok(self.fetch_info_for(&countries, endpoint).await)
    }

    /// Fetch one category for an explicit country list
    pub async fn fetch_info_for(&self, countries: &[String], endpoint: Endpoint) -> BatchReport {
        let fetcher = InfoFetcher::new(self.client.clone(), &self.config, endpoint);
        run_batch(&fetcher, endpoint.name(), countries, self.batch_options()).await
    }

    /// Fetch one category for an explicit country list into `output_dir`
    pub async fn fetch_info_into(
        &self,
        countries: &[String],
        endpoint: Endpoint,
        output_dir: impl AsRef<Path>,
    ) -> BatchReport {
        let fetcher =
            InfoFetcher::new(self.client.clone(), &self.config, endpoint).with_output_dir(output_dir);
        run_batch(&fetcher, endpoint.name(), countries, self.batch_options()).await
    }

    pub async fn fetch_embassy_info(&self) -> Result<BatchReport, TravelError> {
        self.fetch_info(Endpoint::Embassy).await
    }

    pub async fn fetch_visa_info(&self) -> Result<BatchReport, TravelError> {
        self.fetch_info(Endpoint::Visa).await
    }

    pub async fn fetch_emergency_contacts(&self) -> Result<BatchReport, TravelError> {
        self.fetch_info(Endpoint::EmergencyContact).await
    }

    /// Merge a category's per-country files into its `output.json`
    pub async fn collect_info(&self, endpoint: Endpoint) -> Result<BatchReport, TravelError> {
        let (report, _) = collect_directory(&self.config.output_dir(endpoint), endpoint.name()).await?;
        Ok(report)
    }
}
