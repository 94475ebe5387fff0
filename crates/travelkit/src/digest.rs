//! City digest
//!
//! Turns the saved `<city>_page.html` files into the city digest
//! (`output.json`), an object keyed by city. Each entry holds the score
//! rows, the `table.details` rows as `details.<key>.value`, the pros and
//! cons lists and the review texts of one page. The country extractor reads
//! `details.country.value` from this file.

use crate::config::CITY_DIGEST_FILE;
use crate::error::TravelError;
use crate::report::{BatchReport, ItemOutcome, ItemReport};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use url::Url;

/// Suffix of saved city pages (`seoul_page.html`)
pub const CITY_PAGE_SUFFIX: &str = "_page.html";

/// Everything read from one city page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityPage {
    /// `data-key` -> `data-value` of the score rows
    pub scores: BTreeMap<String, String>,
    /// Detail rows keyed by their snake_case label
    pub details: BTreeMap<String, DetailValue>,
    pub pros_cons: ProsCons,
    pub reviews: Vec<String>,
}

/// One detail row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailValue {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProsCons {
    pub pros: Vec<String>,
    pub cons: Vec<String>,
}

/// Compiled selectors for the city page layout
struct Selectors {
    score_rows: Selector,
    details_tables: Selector,
    rows: Selector,
    key: Selector,
    value: Selector,
    filling: Selector,
    img: Selector,
    link: Selector,
    logo: Selector,
    pros_cons: Selector,
    div: Selector,
    paragraph: Selector,
    reviews: Selector,
    review: Selector,
    review_text: Selector,
}

impl Selectors {
    fn new() -> Result<Self, TravelError> {
        let parse = |css: &str| {
            Selector::parse(css).map_err(|e| {
                TravelError::InvalidConfig(format!("Invalid CSS selector '{}': {:?}", css, e))
            })
        };
        Ok(Self {
            score_rows: parse("tr[data-key][data-value]")?,
            details_tables: parse("table.details")?,
            rows: parse("tr")?,
            key: parse(".key")?,
            value: parse(".value")?,
            filling: parse(".filling")?,
            img: parse("img")?,
            link: parse("a")?,
            logo: parse("img.brand-logo")?,
            pros_cons: parse(".tab-pros-cons")?,
            div: parse("div")?,
            paragraph: parse("p")?,
            reviews: parse(".tab-reviews .reviews")?,
            review: parse(r#".review[itemprop="review"]"#)?,
            review_text: parse(r#".review-text[itemprop="reviewBody"]"#)?,
        })
    }
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Detail label to key: leading symbols and brackets dropped, snake_case
///
/// `"🌍 Country"` -> `country`, `"Internet speed (avg)"` -> `internet_speed_avg`
fn clean_key(label: &str) -> String {
    let label = label.trim_start_matches(|c: char| !c.is_ascii_alphanumeric() && c != '_' && !c.is_whitespace());
    let label: String = label.chars().filter(|c| *c != '(' && *c != ')').collect();
    label
        .split(|c: char| !c.is_ascii_alphanumeric() && c != '_')
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// Absolute link with its `ref` tracking parameter removed
fn clean_link(href: &str) -> Option<String> {
    let mut url = Url::parse(href).ok()?;
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(name, _)| name != "ref")
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();
    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }
    Some(url.to_string())
}

impl Selectors {
    fn detail(&self, row: ElementRef<'_>) -> Option<(String, DetailValue)> {
        let key = clean_key(&text_of(row.select(&self.key).next()?));
        if key.is_empty() {
            return None;
        }

        let mut detail = DetailValue::default();
        if let Some(value) = row.select(&self.value).next() {
            detail.value = match value.select(&self.filling).next() {
                Some(filling) => text_of(filling),
                None => text_of(value),
            };
            detail.image_url = value
                .select(&self.img)
                .next()
                .and_then(|img| img.value().attr("src"))
                .map(str::to_string);
            detail.url = value
                .select(&self.link)
                .next()
                .and_then(|a| a.value().attr("href"))
                .and_then(clean_link);
            detail.logo_url = value
                .select(&self.logo)
                .next()
                .and_then(|img| img.value().attr("src"))
                .map(str::to_string);
        }
        Some((key, detail))
    }

    fn page(&self, html: &str) -> CityPage {
        let document = Html::parse_document(html);
        let mut page = CityPage::default();

        for row in document.select(&self.score_rows) {
            if let (Some(key), Some(value)) = (row.value().attr("data-key"), row.value().attr("data-value")) {
                page.scores.insert(key.to_string(), value.to_string());
            }
        }

        for table in document.select(&self.details_tables) {
            let rows = table
                .select(&self.rows)
                .filter(|row| row.value().attr("data-key").is_none() && row.value().attr("data-value").is_none());
            page.details.extend(rows.filter_map(|row| self.detail(row)));
        }

        if let Some(section) = document.select(&self.pros_cons).next() {
            let divs: Vec<_> = section.select(&self.div).collect();
            if let [pros, cons, ..] = divs.as_slice() {
                page.pros_cons.pros = pros
                    .select(&self.paragraph)
                    .map(|p| text_of(p).trim_start_matches("✅").trim().to_string())
                    .collect();
                page.pros_cons.cons = cons
                    .select(&self.paragraph)
                    .map(|p| text_of(p).trim_start_matches("❌").trim().to_string())
                    .collect();
            }
        }

        if let Some(section) = document.select(&self.reviews).next() {
            page.reviews = section
                .select(&self.review)
                .filter_map(|review| review.select(&self.review_text).next())
                .map(text_of)
                .filter(|text| !text.is_empty())
                .collect();
        }

        page
    }
}

/// Parse one city page
pub fn parse_city_page(html: &str) -> Result<CityPage, TravelError> {
    Ok(Selectors::new()?.page(html))
}

/// City key of a saved page (`seoul_page.html` -> `seoul`)
fn city_of(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let city = name.strip_suffix(CITY_PAGE_SUFFIX)?;
    (!city.is_empty()).then(|| city.to_string())
}

/// Parse every `<city>_page.html` in `dir` into `dir/output.json`
///
/// An unreadable page is reported as failed and left out of the digest.
/// An unreadable directory or an unwritable digest is an error.
pub async fn build_digest(
    dir: &Path,
    category: impl Into<String>,
) -> Result<(BatchReport, PathBuf), TravelError> {
    let selectors = Selectors::new()?;
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| TravelError::io(dir, e))?;

    let mut pages: Vec<(String, PathBuf)> = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| TravelError::io(dir, e))?
    {
        let path = entry.path();
        if let Some(city) = city_of(&path) {
            pages.push((city, path));
        }
    }
    pages.sort();

    let mut digest = BTreeMap::new();
    let mut reports = Vec::with_capacity(pages.len());
    for (city, path) in pages {
        let outcome = match tokio::fs::read(&path).await {
            Ok(data) => {
                let page = selectors.page(&String::from_utf8_lossy(&data));
                if !page.details.contains_key("country") {
                    tracing::warn!(city = %city, "City page names no country");
                }
                digest.insert(city.clone(), page);
                ItemOutcome::Collected {
                    bytes: data.len() as u64,
                }
            }
            Err(e) => ItemOutcome::Failed {
                error: TravelError::io(&path, e).to_string(),
            },
        };
        reports.push(ItemReport {
            item: city,
            outcome,
        });
    }

    let output = dir.join(CITY_DIGEST_FILE);
    let json = serde_json::to_vec_pretty(&digest).map_err(|source| TravelError::Parse {
        path: output.clone(),
        source,
    })?;
    tokio::fs::write(&output, json)
        .await
        .map_err(|e| TravelError::io(&output, e))?;

    let report = BatchReport::new(category, reports);
    tracing::info!(
        path = %output.display(),
        cities = report.saved(),
        failed = report.failed(),
        "Wrote city digest"
    );
    Ok((report, output))
}
