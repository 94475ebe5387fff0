//! Country extraction from the city digest
//!
//! The digest maps a city key to whatever the city page parser produced.
//! Only `details.country.value` is read; every other field is ignored.

use crate::error::TravelError;
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
struct CityRecord {
    #[serde(default)]
    details: Option<Details>,
}

#[derive(Debug, Default, Deserialize)]
struct Details {
    #[serde(default)]
    country: Option<LabeledValue>,
}

#[derive(Debug, Default, Deserialize)]
struct LabeledValue {
    #[serde(default)]
    value: Option<String>,
}

impl CityRecord {
    fn country(&self) -> Option<&str> {
        self.details
            .as_ref()?
            .country
            .as_ref()?
            .value
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// Read the city digest at `path` and return the distinct country names
///
/// Names are trimmed before deduplication, so `" Japan "` and `"Japan"`
/// count as one country. Records without a country, or with a blank one,
/// contribute nothing. The result is sorted, but callers should treat it
/// as a set.
pub fn extract_country_names(path: impl AsRef<Path>) -> Result<Vec<String>, TravelError> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|e| TravelError::io(path, e))?;
    let countries = country_names_from_slice(&data).map_err(|source| TravelError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), count = countries.len(), "Extracted countries");
    Ok(countries)
}

/// Parse a city digest held in memory
pub fn country_names_from_slice(data: &[u8]) -> Result<Vec<String>, serde_json::Error> {
    let cities: HashMap<String, CityRecord> = serde_json::from_slice(data)?;
    let set: BTreeSet<String> = cities
        .values()
        .filter_map(CityRecord::country)
        .map(str::to_string)
        .collect();
    Ok(set.into_iter().collect())
}
