//! TravelKit - travel data collector
//!
//! Fetches city pages from the city data site, derives the set of countries
//! named in the city digest, and downloads per-country embassy, visa and
//! emergency-contact information from the overseas-travel open-data API.
//! Every response is stored verbatim on disk.
//!
//! ## Pipeline
//!
//! ```text
//! cities ──► <output>/city_data_json/<city>_page.html
//!     ──► city digest <output>/city_data_json/output.json
//! city digest ──► country names ──► ISO alpha-2
//!     ──► <output>/{embassy_info_json,visa_info_json,emergency_contact_json}/<ISO2>.json
//! ```
//!
//! The entry points live on [`Pipeline`]. Batches record a per-item
//! [`ItemOutcome`] instead of stopping at the first failure.

pub mod client;
pub mod collect;
mod config;
pub mod country;
pub mod digest;
mod endpoint;
mod error;
pub mod extract;
pub mod fetchers;
mod pipeline;
mod report;

pub use collect::collect_directory;
pub use config::{
    Config, ConfigBuilder, CITY_DIGEST_FILE, DEFAULT_CITIES, DEFAULT_GOV_BASE_URL,
    DEFAULT_NOMAD_BASE_URL, DEFAULT_OUTPUT_ROOT, NOMAD_DIR_NAME,
};
pub use digest::{build_digest, parse_city_page, CityPage};
pub use endpoint::Endpoint;
pub use error::TravelError;
pub use extract::extract_country_names;
pub use fetchers::{run_batch, BatchOptions, CityPageFetcher, Fetcher, InfoFetcher};
pub use pipeline::{Pipeline, CITIES_CATEGORY, DIGEST_CATEGORY};
pub use report::{BatchReport, ItemOutcome, ItemReport};

/// Default User-Agent string for API requests
pub const DEFAULT_USER_AGENT: &str = "TravelKit/0.1";
