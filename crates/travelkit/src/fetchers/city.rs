//! City page fetcher
//!
//! Downloads the raw city modal HTML from the city data site. The site
//! rejects requests that do not look like they come from its own pages, so
//! every request carries a browser User-Agent and a Referer.

use crate::client::get_bytes;
use crate::config::Config;
use crate::error::TravelError;
use crate::fetchers::{write_file, Fetcher, Pacer};
use crate::report::ItemOutcome;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, REFERER, USER_AGENT};
use std::path::{Path, PathBuf};
use url::Url;

/// Referer sent with every city page request
pub const CITY_PAGE_REFERER: &str = "https://nomads.com/";

/// Browser User-Agent sent with every city page request
pub const CITY_PAGE_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36";

/// Data snapshot requested from the city modal endpoint
const CITY_MODAL_SNAPSHOT: &str = "2024-11-15";

/// Fetches `<city>_page.html` for city keys
pub struct CityPageFetcher {
    client: reqwest::Client,
    base_url: String,
    output_dir: PathBuf,
    pacer: Pacer,
}

impl CityPageFetcher {
    /// Create a fetcher writing into the configured city data directory
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            base_url: config.nomad_base_url.clone(),
            output_dir: config.nomad_output_dir(),
            pacer: Pacer::new(config.pacing),
        }
    }

    /// Directory the pages are written to
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn page_url(&self, city: &str) -> Result<Url, TravelError> {
        let raw = format!(
            "{}/modal/city/{}?{}",
            self.base_url.trim_end_matches('/'),
            city,
            CITY_MODAL_SNAPSHOT
        );
        Url::parse(&raw).map_err(|e| TravelError::InvalidUrl(format!("{}: {}", city, e)))
    }

    fn headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(REFERER, HeaderValue::from_static(CITY_PAGE_REFERER));
        headers.insert(USER_AGENT, HeaderValue::from_static(CITY_PAGE_USER_AGENT));
        headers
    }
}

/// City keys become URL path segments and file names
fn is_valid_city_key(city: &str) -> bool {
    !city.is_empty()
        && city
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[async_trait]
impl Fetcher for CityPageFetcher {
    fn name(&self) -> &'static str {
        "city_page"
    }

    async fn fetch(&self, city: &str) -> Result<ItemOutcome, TravelError> {
        if !is_valid_city_key(city) {
            return Err(TravelError::InvalidConfig(format!(
                "invalid city key '{}'",
                city
            )));
        }

        let url = self.page_url(city)?;
        self.pacer.wait().await;
        tracing::debug!(city = %city, url = %url, "Fetching city page");

        let body = get_bytes(&self.client, url, Self::headers()).await?;
        let path = write_file(&self.output_dir, &format!("{}_page.html", city), &body).await?;

        tracing::info!(city = %city, path = %path.display(), bytes = body.len(), "Saved city page");
        Ok(ItemOutcome::Saved {
            path,
            bytes: body.len() as u64,
        })
    }
}
