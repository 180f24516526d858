//! Query normalization.
//!
//! Turns a raw `(city, state, country)` triple into the form the resolver
//! works with: trimmed of stray punctuation, lowercased, the country
//! resolved to an ISO code, and the city expanded with alternates for
//! common suffix and parenthetical spellings.

use std::sync::LazyLock;

use geoscrub_gazetteer::Gazetteer;
use geoscrub_gazetteer::name_index::query_form;
use regex::Regex;
use serde::Serialize;

use crate::country;

/// A trailing parenthetical (`Buchen (Odenwald)`).
static PARENTHETICAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+\(([^)]+)\)$").expect("valid regex"));

/// `Mc Donald` -> `McDonald`.
static MC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|\s)Mc\s+(\p{L})").expect("valid regex"));

/// A standalone `O` word before a name (`O Fallon`, `O 'Fallon`).
static O_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|\s)O\s*(?:\s|')\s*(\p{L})").expect("valid regex"));

/// Suffixes that are often present in one source and absent in another.
static SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+(City|Township|Twp|Village)$").expect("valid regex"));

/// A normalized query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizedQuery {
    /// Normalized city, empty if none.
    pub city: String,
    /// Normalized state, empty if none.
    pub state: String,
    /// ISO alpha-2 country code, if one was given and resolved.
    pub country: Option<String>,
    /// Alternative city spellings to try, in order.
    pub alternates: Vec<String>,
}

/// Strips leading and trailing characters that are neither letters nor
/// parentheses. Returns an empty string if nothing is left.
#[must_use]
pub fn clean_nonalpha(input: &str) -> &str {
    input.trim_matches(|c: char| !(c.is_alphabetic() || c == '(' || c == ')'))
}

/// The lookup form of a name: lowercased and trimmed, periods and commas
/// removed.
#[must_use]
pub fn scrub(input: &str) -> String {
    query_form(input)
}

/// Normalizes a raw query.
///
/// An unresolvable country is logged and dropped rather than reported.
#[must_use]
pub fn normalize_query(
    gazetteer: &Gazetteer,
    city: Option<&str>,
    state: Option<&str>,
    country: Option<&str>,
) -> NormalizedQuery {
    let city = clean_nonalpha(city.unwrap_or_default());
    let mut state = clean_nonalpha(state.unwrap_or_default());
    let raw_country = clean_nonalpha(country.unwrap_or_default());

    let mut country = if raw_country.is_empty() {
        None
    } else {
        match country::country_to_iso(gazetteer, raw_country) {
            Ok(iso) => Some(iso),
            Err(e) => {
                log::warn!("invalid country {raw_country:?}: {e}");
                None
            }
        }
    };

    if state == "PR" && country.as_deref() == Some("US") {
        log::debug!("interpreting PR, US as Puerto Rico");
        state = "";
        country = Some("PR".to_string());
    }

    if city.is_empty() {
        return NormalizedQuery {
            city: String::new(),
            state: scrub(state),
            country,
            alternates: Vec::new(),
        };
    }

    let (city, alternates) = city_variants(city);

    NormalizedQuery {
        city: scrub(&city),
        state: scrub(state),
        country,
        alternates,
    }
}

/// Repairs split prefixes in a cleaned city name and derives alternate
/// spellings from parentheticals and suffixes.
///
/// Returns the repaired city (not yet scrubbed) and the scrubbed,
/// deduplicated alternates.
#[must_use]
pub fn city_variants(city: &str) -> (String, Vec<String>) {
    let mut alternates = Vec::new();

    if let Some(captures) = PARENTHETICAL_RE.captures(city) {
        let inner = captures.get(1).map_or("", |m| clean_nonalpha(m.as_str()));
        if !inner.is_empty() {
            alternates.push(inner.to_string());
        }
    }

    let city = MC_RE.replace_all(city, "${1}Mc${2}");
    let city = O_RE.replace_all(&city, "${1}O'${2}").into_owned();

    if let Some(suffix) = SUFFIX_RE.captures(&city) {
        let whole = suffix.get(0).map_or(0..0, |m| m.range());
        let stem = &city[..whole.start];
        alternates.push(stem.to_string());

        let word = suffix.get(1).map_or("", |m| m.as_str()).to_lowercase();
        if word == "township" || word == "twp" {
            alternates.push(format!("{stem} City"));
        } else {
            alternates.push(format!("{stem} Township"));
        }
    }

    let mut unique = Vec::new();
    for alt in alternates.iter().map(|a| scrub(a)) {
        if !alt.is_empty() && !unique.contains(&alt) {
            unique.push(alt);
        }
    }

    (city, unique)
}
