//! Runtime configuration
//!
//! Configuration is read once at startup and passed by value to the
//! pipeline. Sources, highest priority first:
//! 1. Builder calls (the CLI maps its flags onto these)
//! 2. Environment variables (`SERVICE_KEY`, `TRAVELKIT_*`)
//! 3. Default values

use crate::endpoint::Endpoint;
use crate::error::TravelError;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Base URL of the overseas-travel open-data services
pub const DEFAULT_GOV_BASE_URL: &str = "http://apis.data.go.kr/1262000";

/// Base URL of the city data site
pub const DEFAULT_NOMAD_BASE_URL: &str = "https://nomads.com";

/// Root directory for everything written to disk
pub const DEFAULT_OUTPUT_ROOT: &str = "output";

/// Cities fetched when none are configured
pub const DEFAULT_CITIES: &[&str] = &["seoul", "tokyo"];

/// Delay before each city page request
pub const DEFAULT_PACING: Duration = Duration::from_secs(1);

/// Per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Directory (relative to the output root) holding city pages and the digest
pub const NOMAD_DIR_NAME: &str = "city_data_json";

/// File name of the city digest read by the country extractor
pub const CITY_DIGEST_FILE: &str = "output.json";

/// Immutable process configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// data.go.kr service key, inserted verbatim into request URLs
    pub service_key: String,
    pub gov_base_url: String,
    pub nomad_base_url: String,
    pub output_root: PathBuf,
    pub cities: Vec<String>,
    /// Delay enforced before every city page request
    pub pacing: Duration,
    /// Delay enforced before every per-country request
    pub info_pacing: Duration,
    pub request_timeout: Duration,
    /// Maximum number of in-flight requests per batch
    pub concurrency: usize,
}

impl Config {
    /// Start a builder with the given service key and default values
    pub fn builder(service_key: impl Into<String>) -> ConfigBuilder {
        ConfigBuilder::new(service_key)
    }

    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, TravelError> {
        Self::from_lookup(|name| std::env::var(name).ok())?.build()
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// Returns the builder so callers can layer overrides on top.
    pub fn from_lookup<F>(lookup: F) -> Result<ConfigBuilder, TravelError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let service_key = lookup("SERVICE_KEY")
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or(TravelError::MissingServiceKey)?;

        let mut builder = ConfigBuilder::new(service_key);

        if let Some(url) = lookup("TRAVELKIT_GOV_BASE_URL") {
            builder = builder.gov_base_url(url);
        }
        if let Some(url) = lookup("TRAVELKIT_NOMAD_BASE_URL") {
            builder = builder.nomad_base_url(url);
        }
        if let Some(dir) = lookup("TRAVELKIT_OUTPUT_DIR") {
            builder = builder.output_root(dir);
        }
        if let Some(cities) = lookup("TRAVELKIT_CITIES") {
            builder = builder.cities(parse_list(&cities));
        }
        if let Some(ms) = lookup("TRAVELKIT_PACING_MS") {
            builder = builder.pacing(Duration::from_millis(parse_number("TRAVELKIT_PACING_MS", &ms)?));
        }
        if let Some(ms) = lookup("TRAVELKIT_INFO_PACING_MS") {
            builder = builder.info_pacing(Duration::from_millis(parse_number(
                "TRAVELKIT_INFO_PACING_MS",
                &ms,
            )?));
        }
        if let Some(secs) = lookup("TRAVELKIT_TIMEOUT_SECS") {
            builder = builder.request_timeout(Duration::from_secs(parse_number(
                "TRAVELKIT_TIMEOUT_SECS",
                &secs,
            )?));
        }
        if let Some(n) = lookup("TRAVELKIT_CONCURRENCY") {
            builder = builder.concurrency(parse_number("TRAVELKIT_CONCURRENCY", &n)? as usize);
        }

        Ok(builder)
    }

    /// Directory holding city pages and the city digest
    pub fn nomad_output_dir(&self) -> PathBuf {
        self.output_root.join(NOMAD_DIR_NAME)
    }

    /// Path of the city digest the country list is derived from
    pub fn city_digest_path(&self) -> PathBuf {
        self.nomad_output_dir().join(CITY_DIGEST_FILE)
    }

    /// Directory receiving `<ISO2>.json` files for a category
    pub fn output_dir(&self, endpoint: Endpoint) -> PathBuf {
        self.output_root.join(endpoint.output_dir_name())
    }

    /// Check invariants that the builder cannot express in types
    pub fn validate(&self) -> Result<(), TravelError> {
        if self.service_key.trim().is_empty() {
            return Err(TravelError::MissingServiceKey);
        }
        if self.concurrency == 0 {
            return Err(TravelError::InvalidConfig(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(TravelError::InvalidConfig(
                "request timeout must be greater than zero".to_string(),
            ));
        }
        for (name, url) in [
            ("gov base URL", &self.gov_base_url),
            ("nomad base URL", &self.nomad_base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(TravelError::InvalidConfig(format!(
                    "{} must start with http:// or https://",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// Builder for [`Config`]
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a builder with default values
    pub fn new(service_key: impl Into<String>) -> Self {
        Self {
            config: Config {
                service_key: service_key.into(),
                gov_base_url: DEFAULT_GOV_BASE_URL.to_string(),
                nomad_base_url: DEFAULT_NOMAD_BASE_URL.to_string(),
                output_root: PathBuf::from(DEFAULT_OUTPUT_ROOT),
                cities: DEFAULT_CITIES.iter().map(|c| c.to_string()).collect(),
                pacing: DEFAULT_PACING,
                info_pacing: Duration::ZERO,
                request_timeout: DEFAULT_REQUEST_TIMEOUT,
                concurrency: 1,
            },
        }
    }

    /// Set the government open-data base URL
    pub fn gov_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.gov_base_url = url.into();
        self
    }

    /// Set the city data site base URL
    pub fn nomad_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.nomad_base_url = url.into();
        self
    }

    /// Set the output root directory
    pub fn output_root(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.output_root = dir.as_ref().to_path_buf();
        self
    }

    /// Replace the city list
    pub fn cities<I, S>(mut self, cities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.cities = cities.into_iter().map(Into::into).collect();
        self
    }

    /// Set the delay before each city page request
    pub fn pacing(mut self, pacing: Duration) -> Self {
        self.config.pacing = pacing;
        self
    }

    /// Set the delay before each per-country request
    pub fn info_pacing(mut self, pacing: Duration) -> Self {
        self.config.info_pacing = pacing;
        self
    }

    /// Set the per-request timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Set the number of concurrent requests per batch
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency;
        self
    }

    /// Validate and build the configuration
    pub fn build(self) -> Result<Config, TravelError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(|item| item.to_string())
        .collect()
}

fn parse_number(name: &str, value: &str) -> Result<u64, TravelError> {
    value
        .trim()
        .parse()
        .map_err(|_| TravelError::InvalidConfig(format!("{} must be a number, got '{}'", name, value)))
}
