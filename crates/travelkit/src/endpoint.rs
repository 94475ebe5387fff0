//! Government open-data endpoints
//!
//! The overseas-travel services published under `apis.data.go.kr/1262000`
//! all share one query shape: a service key, an ISO alpha-2 country
//! condition and the response format. Each [`Endpoint`] carries its service
//! path and the directory its responses are stored in.

use crate::error::TravelError;
use std::str::FromStr;
use url::Url;

/// Per-country information category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Korean embassies and consulates
    Embassy,
    /// Entrance visa requirements
    Visa,
    /// Local emergency contacts
    EmergencyContact,
}

impl Endpoint {
    /// All categories, in the order the CLI lists them
    pub const ALL: [Endpoint; 3] = [Endpoint::Embassy, Endpoint::Visa, Endpoint::EmergencyContact];

    /// Short identifier used in logs, reports and the CLI
    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::Embassy => "embassy",
            Endpoint::Visa => "visa",
            Endpoint::EmergencyContact => "emergency-contact",
        }
    }

    /// Service path below the government base URL
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Embassy => "/EmbassyService2/getEmbassyList2",
            Endpoint::Visa => "/EntranceVisaService2/getEntranceVisaList2",
            Endpoint::EmergencyContact => "/LocalContactService2/getLocalContactList2",
        }
    }

    /// Directory (relative to the output root) that receives `<ISO2>.json` files
    pub fn output_dir_name(&self) -> &'static str {
        match self {
            Endpoint::Embassy => "embassy_info_json",
            Endpoint::Visa => "visa_info_json",
            Endpoint::EmergencyContact => "emergency_contact_json",
        }
    }

    /// Build the request URL for one country
    ///
    /// The service key is inserted verbatim: data.go.kr hands out keys that
    /// are already percent-encoded, and encoding them again breaks
    /// authentication.
    pub fn url(&self, base_url: &str, service_key: &str, iso_code: &str) -> Result<Url, TravelError> {
        let raw = format!(
            "{}{}?serviceKey={}&cond[country_iso_alp2::EQ]={}&returnType=JSON",
            base_url.trim_end_matches('/'),
            self.path(),
            service_key,
            iso_code
        );
        Url::parse(&raw).map_err(|e| TravelError::InvalidUrl(format!("{}: {}", self.name(), e)))
    }
}

impl FromStr for Endpoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "embassy" => Ok(Endpoint::Embassy),
            "visa" => Ok(Endpoint::Visa),
            "emergency-contact" | "emergency" => Ok(Endpoint::EmergencyContact),
            _ => Err(format!(
                "Invalid category '{}': must be embassy, visa or emergency-contact",
                s
            )),
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
