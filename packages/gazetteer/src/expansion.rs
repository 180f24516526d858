//! Name expansion: extra alternate names derived from existing ones.
//!
//! The gazetteer asks a [`NameExpansion`] implementation for additional
//! names per entity while building the index. Country-specific rules live
//! outside this crate; [`EnglishVariants`] covers the spelling variants
//! every English-speaking country shares.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use geoscrub_gazetteer_models::{AlternateName, CountryInfo, Entity, EntityKind, LanguageTag};
use regex::Regex;

/// A name produced by a [`NameExpansion`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DerivedName {
    /// The derived name.
    pub text: String,
    /// Language the name belongs to.
    pub language: LanguageTag,
}

impl DerivedName {
    /// An English derived name.
    #[must_use]
    pub fn en(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: LanguageTag::Language("en".to_string()),
        }
    }
}

/// What an expander may look at besides the entity itself.
pub struct ExpansionContext<'a> {
    /// Metadata of the entity's country.
    pub country: Option<&'a CountryInfo>,
    /// Alternate names already kept for the entity.
    pub alternate_names: &'a [&'a AlternateName],
    /// Lowercased `(country, admin1, name)` of every city in the gazetteer.
    pub city_names: &'a BTreeSet<(String, String, String)>,
}

/// Supplies additional alternate names for an entity.
pub trait NameExpansion: Send + Sync {
    /// Derives extra names for `entity`. Duplicates of names the entity
    /// already has are discarded by the caller.
    fn expand(&self, entity: &Entity, context: &ExpansionContext<'_>) -> Vec<DerivedName>;
}

/// An expander that never adds names.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExpansion;

impl NameExpansion for NoExpansion {
    fn expand(&self, _entity: &Entity, _context: &ExpansionContext<'_>) -> Vec<DerivedName> {
        Vec::new()
    }
}

/// Countries where "X on Y" towns are commonly called just "X".
const BARENAME_COUNTRIES: &[&str] = &["US", "GB", "IE", "AU", "NZ", "ZA"];

/// Bare names too generic to stand on their own.
const BARENAME_BLACKLIST: &[&str] = &[
    "lake", "lakes", "village", "pines", "reserve", "the park", "city", "come",
];

static SAINT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bsaint\b").expect("valid regex"));

static MOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bmount\b").expect("valid regex"));

/// `X O' Y` (Land O' Lakes).
static XOY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+o['’]\s+").expect("valid regex"));

/// `O' X` with a stray space (O' Fallon).
static O_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^o['’]\s+").expect("valid regex"));

/// `X on Y`, `X-by-the-Y`.
static ON_BY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(.*\S)[\s-](on|by)[\s-](the[\s-])?").expect("valid regex")
});

/// English spelling variants for places in English-speaking countries.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishVariants;

impl NameExpansion for EnglishVariants {
    fn expand(&self, entity: &Entity, context: &ExpansionContext<'_>) -> Vec<DerivedName> {
        if !context.country.is_some_and(|c| c.speaks("en")) {
            return Vec::new();
        }

        let mut sources: Vec<String> = vec![entity.name.to_lowercase(), entity.ascii_name.to_lowercase()];
        sources.extend(
            context
                .alternate_names
                .iter()
                .filter(|alt| {
                    matches!(&alt.language, LanguageTag::Language(l) if l == "en")
                        || alt.language == LanguageTag::Unknown
                })
                .map(|alt| alt.text.to_lowercase()),
        );
        let mut seen = BTreeSet::new();
        sources.retain(|s| !s.is_empty() && seen.insert(s.clone()));

        let mut derived = vec![
            entity.name.to_lowercase().replace('-', " "),
            entity.ascii_name.to_lowercase().replace('-', " "),
        ];

        if SAINT_RE.is_match(&entity.name) {
            derived.extend(sources.iter().map(|s| SAINT_RE.replace_all(s, "st").into_owned()));
        }

        if MOUNT_RE.is_match(&entity.name) {
            derived.extend(sources.iter().map(|s| MOUNT_RE.replace_all(s, "mt").into_owned()));
        }

        if XOY_RE.is_match(&entity.name) {
            for joiner in [" o' ", " o’ ", " of ", " o "] {
                derived.extend(
                    sources
                        .iter()
                        .map(|s| XOY_RE.replace_all(s, joiner).into_owned()),
                );
            }
        }

        if O_PREFIX_RE.is_match(&entity.name) {
            for prefix in ["o'", "o’"] {
                derived.extend(
                    sources
                        .iter()
                        .map(|s| O_PREFIX_RE.replace(s, prefix).into_owned()),
                );
            }
        }

        if entity.kind == EntityKind::City
            && BARENAME_COUNTRIES.contains(&entity.country_code.as_str())
        {
            if let Some(bare) = barename(&entity.name) {
                let key = (
                    entity.country_code.clone(),
                    entity.admin_codes.admin1.clone().unwrap_or_default(),
                    bare.to_lowercase(),
                );
                if context.city_names.contains(&key) {
                    log::debug!("not deriving {bare:?} from {:?}: city exists", entity.name);
                } else {
                    derived.push(bare.to_lowercase());
                }
            }
        }

        let mut unique = BTreeSet::new();
        derived
            .into_iter()
            .filter(|d| !d.trim().is_empty() && unique.insert(d.clone()))
            .map(DerivedName::en)
            .collect()
    }
}

/// The bare name of an "X on Y" place (`Sunrise-on-Sea` -> `Sunrise`).
#[must_use]
pub fn barename(name: &str) -> Option<&str> {
    let captures = ON_BY_RE.captures(name)?;
    let bare = captures.get(1)?.as_str();
    if BARENAME_BLACKLIST.contains(&bare.to_lowercase().as_str()) || name.ends_with("Park") {
        return None;
    }
    Some(bare)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoscrub_gazetteer_models::AdminCodes;

    fn place(name: &str, country: &str) -> Entity {
        Entity {
            id: 1,
            name: name.to_string(),
            ascii_name: name.to_string(),
            kind: EntityKind::City,
            feature_code: "PPL".to_string(),
            country_code: country.to_string(),
            admin_codes: AdminCodes {
                admin1: Some("01".to_string()),
                ..AdminCodes::default()
            },
            population: 0,
            latitude: 0.0,
            longitude: 0.0,
            timezone: None,
            postal_code: None,
        }
    }

    fn country(iso: &str, languages: &[&str]) -> CountryInfo {
        CountryInfo {
            iso: iso.to_string(),
            iso3: String::new(),
            iso_numeric: String::new(),
            name: iso.to_string(),
            capital: String::new(),
            continent: String::new(),
            population: 0,
            tld: String::new(),
            currency_code: String::new(),
            languages: languages.iter().map(ToString::to_string).collect(),
            geoname_id: None,
        }
    }

    fn derive(name: &str, info: &CountryInfo, cities: &BTreeSet<(String, String, String)>) -> Vec<String> {
        let entity = place(name, &info.iso);
        let context = ExpansionContext {
            country: Some(info),
            alternate_names: &[],
            city_names: cities,
        };
        EnglishVariants
            .expand(&entity, &context)
            .into_iter()
            .map(|d| d.text)
            .collect()
    }

    #[test]
    fn barenames() {
        assert_eq!(barename("Sydney"), None);
        assert_eq!(barename("Sydney on Vaal"), Some("Sydney"));
        assert_eq!(barename("Sunrise-on-Sea"), Some("Sunrise"));
        assert_eq!(barename("Saint Michael’s on Sea"), Some("Saint Michael’s"));
        assert_eq!(barename("Kenton on Sea"), Some("Kenton"));
        assert_eq!(barename("Lake by the Sea"), None);
        assert_eq!(barename("Stratford on Avon Park"), None);
    }

    #[test]
    fn saint_and_mount_variants() {
        let us = country("US", &["en-US", "es-US"]);
        let none = BTreeSet::new();

        assert!(derive("Saint Louis", &us, &none).contains(&"st louis".to_string()));
        assert!(derive("Mount Vernon", &us, &none).contains(&"mt vernon".to_string()));
    }

    #[test]
    fn hyphen_and_o_variants() {
        let us = country("US", &["en-US"]);
        let none = BTreeSet::new();

        assert!(derive("Wilkes-Barre", &us, &none).contains(&"wilkes barre".to_string()));
        let lakes = derive("Land O' Lakes", &us, &none);
        assert!(lakes.contains(&"land of lakes".to_string()));
        assert!(lakes.contains(&"land o lakes".to_string()));
        assert!(derive("O' Fallon", &us, &none).contains(&"o'fallon".to_string()));
    }

    #[test]
    fn skips_non_english_countries() {
        let ru = country("RU", &["ru"]);
        assert!(derive("Saint Petersburg", &ru, &BTreeSet::new()).is_empty());
    }

    #[test]
    fn barename_not_derived_when_city_exists() {
        let za = country("ZA", &["zu", "xh", "af", "en"]);
        let mut cities = BTreeSet::new();
        assert!(derive("Kenton on Sea", &za, &cities).contains(&"kenton".to_string()));

        cities.insert(("ZA".to_string(), "01".to_string(), "kenton".to_string()));
        assert!(!derive("Kenton on Sea", &za, &cities).contains(&"kenton".to_string()));
    }
}
