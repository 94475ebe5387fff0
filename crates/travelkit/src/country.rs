//! Country display name to ISO 3166-1 alpha-2 lookup
//!
//! Names are resolved against the ISO 3166-1 registry from `rust_iso3166`.
//! The registry carries formal short names ("Korea, Republic of",
//! "Bolivia (Plurinational State of)"), so the index also holds the
//! unambiguous short forms of those names, plus a small alias list for the
//! spellings travel sites use ("South Korea", "Vietnam", "USA").
//!
//! Matching ignores case, surrounding whitespace, periods, a leading "the"
//! and accepts "St" for "Saint" and "&" for "and".

use std::collections::HashMap;
use std::sync::OnceLock;

/// Travel-site spellings the registry names do not cover
const ALIASES: &[(&str, &str)] = &[
    ("South Korea", "KR"),
    ("Republic of Korea", "KR"),
    ("North Korea", "KP"),
    ("Vietnam", "VN"),
    ("Russia", "RU"),
    ("Iran", "IR"),
    ("Syria", "SY"),
    ("Laos", "LA"),
    ("Bolivia", "BO"),
    ("Venezuela", "VE"),
    ("Tanzania", "TZ"),
    ("Moldova", "MD"),
    ("Taiwan", "TW"),
    ("Brunei", "BN"),
    ("Micronesia", "FM"),
    ("Palestine", "PS"),
    ("USA", "US"),
    ("US", "US"),
    ("United States", "US"),
    ("United States of America", "US"),
    ("UK", "GB"),
    ("United Kingdom", "GB"),
    ("Great Britain", "GB"),
    ("England", "GB"),
    ("Scotland", "GB"),
    ("Wales", "GB"),
    ("Northern Ireland", "GB"),
    ("Netherlands", "NL"),
    ("Holland", "NL"),
    ("Bahamas", "BS"),
    ("Czech Republic", "CZ"),
    ("Czechia", "CZ"),
    ("Macedonia", "MK"),
    ("North Macedonia", "MK"),
    ("Turkey", "TR"),
    ("Turkiye", "TR"),
    ("Ivory Coast", "CI"),
    ("Cape Verde", "CV"),
    ("Swaziland", "SZ"),
    ("Eswatini", "SZ"),
    ("Burma", "MM"),
    ("East Timor", "TL"),
    ("Vatican", "VA"),
    ("Vatican City", "VA"),
    ("DR Congo", "CD"),
    ("Democratic Republic of the Congo", "CD"),
    ("Republic of the Congo", "CG"),
    ("Hong Kong", "HK"),
    ("Hong Kong SAR", "HK"),
    ("Macau", "MO"),
    ("Macau SAR", "MO"),
    ("Turks and Caicos", "TC"),
    ("Kosovo", "XK"),
];

/// Lower-case, collapse whitespace, drop periods and a leading "the"
fn normalize(name: &str) -> String {
    let cleaned = name.replace('.', "").replace('&', " and ").to_lowercase();
    let mut words: Vec<&str> = cleaned.split_whitespace().collect();
    if words.first() == Some(&"the") {
        words.remove(0);
    }
    if words.first() == Some(&"st") {
        words[0] = "saint";
    }
    words.join(" ")
}

/// "Korea, Republic of" -> "Republic of Korea"
fn invert(name: &str) -> Option<String> {
    let (head, tail) = name.split_once(',')?;
    Some(format!("{} {}", tail.trim(), head.trim()))
}

/// Shorter forms of a registry name: without its parenthetical, without
/// its comma qualifier, and with the qualifier moved to the front
fn short_forms(name: &str) -> Vec<String> {
    let mut forms = Vec::new();
    if let Some((head, _)) = name.split_once('(') {
        forms.push(normalize(head));
    }
    if let Some((head, _)) = name.split_once(',') {
        forms.push(normalize(head));
    }
    if let Some(inverted) = invert(name) {
        forms.push(normalize(&inverted));
    }
    forms
}

/// Index registry `(name, alpha-2)` pairs, their short forms and the aliases
fn build_index<I>(registry: I) -> HashMap<String, &'static str>
where
    I: IntoIterator<Item = (&'static str, &'static str)>,
{
    let mut index = HashMap::new();
    // None marks a short form shared by two countries ("Korea", "Congo")
    let mut shortened: HashMap<String, Option<&'static str>> = HashMap::new();

    for (name, code) in registry {
        index.insert(normalize(name), code);
        for form in short_forms(name) {
            shortened
                .entry(form)
                .and_modify(|seen| {
                    if *seen != Some(code) {
                        *seen = None;
                    }
                })
                .or_insert(Some(code));
        }
    }
    for (form, code) in shortened {
        if let Some(code) = code {
            index.entry(form).or_insert(code);
        }
    }
    for (alias, code) in ALIASES {
        index.insert(normalize(alias), *code);
    }
    index
}

fn index() -> &'static HashMap<String, &'static str> {
    static INDEX: OnceLock<HashMap<String, &'static str>> = OnceLock::new();
    INDEX.get_or_init(|| build_index(rust_iso3166::ALL.iter().map(|c| (c.name, c.alpha2))))
}

/// Resolve a country display name to its upper-case ISO alpha-2 code
///
/// Returns `None` when the name is empty or unknown. A name written in
/// registry order ("Korea, South") is also tried with its qualifier first.
pub fn alpha2(name: &str) -> Option<&'static str> {
    let key = normalize(name);
    if key.is_empty() {
        return None;
    }
    let index = index();
    index
        .get(&key)
        .or_else(|| index.get(&normalize(&invert(name)?)))
        .copied()
}
