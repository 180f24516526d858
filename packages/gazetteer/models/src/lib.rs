#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared types for the geoscrub gazetteer.
//!
//! This crate contains only data types, configuration structs, and simple
//! conversions. It has no heavyweight dependencies (no index, no I/O).

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Ids at or above this value belong to postal areas synthesized from
/// postal-code rows. `GeoNames` ids stay well below it.
pub const POSTAL_ID_BASE: u64 = 1 << 40;

/// Ids at or above this value belong to alternate names produced by a
/// name expansion service rather than read from import data.
pub const DERIVED_ALT_ID_BASE: u64 = 1 << 40;

/// The kind of a gazetteer entity.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    /// A sovereign country or dependent territory.
    Country,
    /// First-order administrative division (state, province, prefecture).
    Admin1,
    /// Second-order administrative division (county, district).
    Admin2,
    /// Third-order administrative division.
    Admin3,
    /// Fourth-order administrative division.
    Admin4,
    /// Administrative division without a fixed level (`ADMD`).
    AdminDistrict,
    /// A populated place.
    City,
    /// A place name taken from postal-code data.
    PostalArea,
}

impl EntityKind {
    /// The administrative levels an entity of this kind may be matched on
    /// when a query names a "state".
    pub const STATE_LEVELS: [Self; 2] = [Self::Admin1, Self::Admin2];

    /// Maps a `GeoNames` feature class and code to a kind.
    ///
    /// Returns `None` for features the gazetteer does not keep, including
    /// historical divisions (`ADM1H`, `PPLH`, ...).
    #[must_use]
    pub fn from_feature(class: &str, code: &str) -> Option<Self> {
        if code.ends_with('H') || matches!(code, "PPLQ" | "PPLW") {
            return None;
        }
        match class {
            "A" => match code {
                "ADM1" => Some(Self::Admin1),
                "ADM2" => Some(Self::Admin2),
                "ADM3" => Some(Self::Admin3),
                "ADM4" => Some(Self::Admin4),
                "ADMD" => Some(Self::AdminDistrict),
                "TERR" => Some(Self::Country),
                c if c.starts_with("PCL") => Some(Self::Country),
                _ => None,
            },
            "P" => Some(Self::City),
            _ => None,
        }
    }

    /// Numeric administrative level (1..=4), if this kind has one.
    #[must_use]
    pub const fn admin_level(self) -> Option<u8> {
        match self {
            Self::Admin1 => Some(1),
            Self::Admin2 => Some(2),
            Self::Admin3 => Some(3),
            Self::Admin4 => Some(4),
            _ => None,
        }
    }

    /// Returns `true` for the administrative-division kinds.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(
            self,
            Self::Admin1 | Self::Admin2 | Self::Admin3 | Self::Admin4 | Self::AdminDistrict
        )
    }
}

/// Administrative codes of an entity, one per level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminCodes {
    /// First-order division code (e.g. `NY`, `02`).
    pub admin1: Option<String>,
    /// Second-order division code.
    pub admin2: Option<String>,
    /// Third-order division code.
    pub admin3: Option<String>,
    /// Fourth-order division code.
    pub admin4: Option<String>,
}

impl AdminCodes {
    /// Returns the code at `level` (1..=4).
    #[must_use]
    pub fn get(&self, level: u8) -> Option<&str> {
        match level {
            1 => self.admin1.as_deref(),
            2 => self.admin2.as_deref(),
            3 => self.admin3.as_deref(),
            4 => self.admin4.as_deref(),
            _ => None,
        }
    }
}

/// A named geographic entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Stable identifier, unique across all entities.
    pub id: u64,
    /// Canonical name.
    pub name: String,
    /// ASCII rendition of the canonical name.
    pub ascii_name: String,
    /// What kind of place this is.
    pub kind: EntityKind,
    /// The source feature code (`PPLC`, `ADM1`, ...). Empty for postal areas.
    pub feature_code: String,
    /// ISO 3166-1 alpha-2 country code.
    pub country_code: String,
    /// Administrative path codes.
    pub admin_codes: AdminCodes,
    /// Population, zero when unknown.
    pub population: u64,
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// IANA timezone, when known.
    pub timezone: Option<String>,
    /// Postal code, for postal areas only.
    pub postal_code: Option<String>,
}

impl Entity {
    /// Administrative path of this entity as `(level, code)` pairs.
    ///
    /// A division's path stops at its own level. Countries have an empty
    /// path. Every other kind carries all the codes it has.
    #[must_use]
    pub fn admin_path(&self) -> Vec<(u8, &str)> {
        let depth = match self.kind {
            EntityKind::Country => 0,
            kind => kind.admin_level().unwrap_or(4),
        };
        (1..=depth)
            .filter_map(|level| {
                self.admin_codes
                    .get(level)
                    .filter(|code| !code.is_empty())
                    .map(|code| (level, code))
            })
            .collect()
    }

    /// Returns `true` if `self` strictly contains `other`: same country and
    /// `self`'s administrative path is a prefix of `other`'s.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        if self.id == other.id || self.country_code != other.country_code {
            return false;
        }
        let outer_level = match self.kind {
            EntityKind::Country => 0,
            kind => match kind.admin_level() {
                Some(level) => level,
                None => return false,
            },
        };
        if other.kind == EntityKind::Country
            || other.kind.admin_level().is_some_and(|level| level <= outer_level)
        {
            return false;
        }
        let outer = self.admin_path();
        let inner = other.admin_path();
        if outer_level > 0 && outer.is_empty() {
            return false;
        }
        outer.len() <= inner.len() && outer.iter().zip(&inner).all(|(a, b)| a == b)
    }
}

/// The language tag of an alternate name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LanguageTag {
    /// An ISO 639 language code (`en`, `ja`, `zh-CN`).
    Language(String),
    /// No language given.
    Unknown,
    /// An abbreviation (`abbr`).
    Abbreviation,
    /// A link-type entry (URLs, wikidata ids). Never indexed.
    Link,
    /// Some other non-linguistic code (`post`, `iata`, `icao`, ...).
    Code(String),
}

impl LanguageTag {
    /// Parses the `isolanguage` column of an alternate names row.
    #[must_use]
    pub fn from_column(value: &str) -> Self {
        match value.trim() {
            "" => Self::Unknown,
            "abbr" => Self::Abbreviation,
            "link" | "wkdt" => Self::Link,
            code @ ("post" | "iata" | "icao" | "faac" | "unlc" | "tcid" | "fr_1793") => {
                Self::Code(code.to_string())
            }
            lang => Self::Language(lang.to_string()),
        }
    }

    /// The tag rendered the way it appears in import data.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Language(lang) | Self::Code(lang) => lang,
            Self::Unknown => "",
            Self::Abbreviation => "abbr",
            Self::Link => "link",
        }
    }

    /// Returns `true` if this tag names a human language.
    #[must_use]
    pub const fn is_language(&self) -> bool {
        matches!(self, Self::Language(_))
    }
}

/// An alternate name of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternateName {
    /// Alternate name id, unique across all alternate names.
    pub id: u64,
    /// The entity this name belongs to.
    pub entity_id: u64,
    /// The name itself.
    pub text: String,
    /// Language or pseudo-language tag.
    pub language: LanguageTag,
    /// Official/preferred name in its language.
    pub is_preferred: bool,
    /// Short name (`California` vs `State of California`).
    pub is_short: bool,
    /// Colloquial or slang name.
    pub is_colloquial: bool,
    /// Historic name no longer in use.
    pub is_historic: bool,
    /// Produced by a name expansion service rather than read from import data.
    pub is_derived: bool,
}

impl AlternateName {
    /// Returns `true` if this name is an abbreviation.
    #[must_use]
    pub const fn is_abbreviation(&self) -> bool {
        matches!(self.language, LanguageTag::Abbreviation)
    }
}

/// One entry in a name index posting list.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NameRef {
    /// Kind of the referenced entity.
    pub kind: EntityKind,
    /// Country of the referenced entity.
    pub country_code: String,
    /// Referenced entity id.
    pub entity_id: u64,
    /// The alternate name that produced this key, `None` for canonical and
    /// ASCII names.
    pub alt_name_id: Option<u64>,
}

/// Country metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryInfo {
    /// ISO 3166-1 alpha-2 code.
    pub iso: String,
    /// ISO 3166-1 alpha-3 code.
    pub iso3: String,
    /// ISO 3166-1 numeric code.
    pub iso_numeric: String,
    /// English country name.
    pub name: String,
    /// Capital city name.
    pub capital: String,
    /// Continent code.
    pub continent: String,
    /// Population.
    pub population: u64,
    /// Top-level domain.
    pub tld: String,
    /// Currency code.
    pub currency_code: String,
    /// Languages spoken, as listed in import data (`en-US`, `fr`).
    pub languages: Vec<String>,
    /// Id of the country entity.
    pub geoname_id: Option<u64>,
}

impl CountryInfo {
    /// Language codes with region suffixes removed (`en-US` -> `en`).
    #[must_use]
    pub fn spoken_languages(&self) -> Vec<&str> {
        let mut langs: Vec<&str> = self
            .languages
            .iter()
            .map(|l| l.split('-').next().unwrap_or(l.as_str()))
            .filter(|l| !l.is_empty())
            .collect();
        langs.dedup();
        langs
    }

    /// Returns `true` if `language` is spoken in this country.
    #[must_use]
    pub fn speaks(&self, language: &str) -> bool {
        self.languages
            .iter()
            .any(|l| l == language || l.split('-').next() == Some(language))
    }
}

/// How a field of the query relates to the matched entity.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum FieldStatus {
    /// The supplied value was used as-is.
    #[serde(rename = "O")]
    #[strum(serialize = "O")]
    Ok,
    /// A value was supplied but the result contradicts or replaces it.
    #[serde(rename = "M")]
    #[strum(serialize = "M")]
    Modified,
    /// No usable value was supplied; the result's value was inferred.
    #[serde(rename = "D")]
    #[strum(serialize = "D")]
    Derived,
}

impl FieldStatus {
    /// Single-character status code.
    #[must_use]
    pub const fn code(self) -> char {
        match self {
            Self::Ok => 'O',
            Self::Modified => 'M',
            Self::Derived => 'D',
        }
    }
}

/// Outcome of a resolution: a match, an explicit refusal because the input
/// is ambiguous, or nothing found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Resolution<T> {
    /// A single best match.
    Matched(T),
    /// More than one candidate qualified and no tie-breaker applied.
    Ambiguous {
        /// How many candidates were found.
        candidates: usize,
    },
    /// Nothing matched.
    NotFound,
}

impl<T> Resolution<T> {
    /// Returns the match, if any.
    #[must_use]
    pub const fn matched(&self) -> Option<&T> {
        match self {
            Self::Matched(value) => Some(value),
            _ => None,
        }
    }

    /// Consumes the resolution and returns the match, if any.
    #[must_use]
    pub fn into_matched(self) -> Option<T> {
        match self {
            Self::Matched(value) => Some(value),
            _ => None,
        }
    }

    /// Returns `true` if nothing matched.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// Returns `true` if resolution was refused as ambiguous.
    #[must_use]
    pub const fn is_ambiguous(&self) -> bool {
        matches!(self, Self::Ambiguous { .. })
    }
}

/// Result of resolving a city/state/country triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrubResult {
    /// The matched city.
    pub entity: Entity,
    /// Canonical name of the city's first-order division.
    pub admin1_name: Option<String>,
    /// Canonical name of the city's second-order division.
    pub admin2_name: Option<String>,
    /// Confidence in `(0, 1]`.
    pub score: f64,
    /// How the supplied state relates to the result.
    pub state_status: FieldStatus,
    /// How the supplied country relates to the result.
    pub country_status: FieldStatus,
    /// Number of candidates at the tier that produced this result.
    pub candidate_count: usize,
}

/// Result of resolving a state/country pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateScrubResult {
    /// The matched administrative division.
    pub entity: Entity,
    /// Confidence in `(0, 1]`.
    pub score: f64,
    /// How the supplied country relates to the result.
    pub country_status: FieldStatus,
}

/// Configuration for building or opening a gazetteer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GazetteerConfig {
    /// Path of the gazetteer snapshot. Defaults to a file under the data
    /// directory when unset.
    #[serde(default)]
    pub snapshot_path: Option<String>,

    /// Index only alternate names in languages spoken in the entity's
    /// country (plus English and non-linguistic tags).
    #[serde(default = "default_restrict_languages")]
    pub restrict_languages: bool,

    /// Cities closer than this many kilometers are treated as one place
    /// when deduplicating candidates.
    #[serde(default = "default_cluster_threshold_km")]
    pub cluster_threshold_km: f64,

    /// Language used when normalizing names without an explicit language.
    #[serde(default = "default_language")]
    pub default_language: String,
}

const fn default_restrict_languages() -> bool {
    true
}

const fn default_cluster_threshold_km() -> f64 {
    10.0
}

fn default_language() -> String {
    "en".to_string()
}

impl Default for GazetteerConfig {
    fn default() -> Self {
        Self {
            snapshot_path: None,
            restrict_languages: default_restrict_languages(),
            cluster_threshold_km: default_cluster_threshold_km(),
            default_language: default_language(),
        }
    }
}

/// Statistics about a built gazetteer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Total number of entities.
    pub entities: u64,
    /// Number of countries with metadata.
    pub countries: u64,
    /// Number of postal areas.
    pub postal_areas: u64,
    /// Number of alternate names read from import data and kept.
    pub alternate_names: u64,
    /// Number of alternate names produced by name expansion.
    pub derived_names: u64,
    /// Number of distinct keys in the name index.
    pub index_keys: u64,
    /// Number of malformed or unsupported rows skipped.
    pub skipped_rows: u64,
    /// Time taken to build in seconds.
    pub build_time_secs: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(id: u64, kind: EntityKind, codes: [&str; 2]) -> Entity {
        Entity {
            id,
            name: format!("e{id}"),
            ascii_name: format!("e{id}"),
            kind,
            feature_code: String::new(),
            country_code: "US".to_string(),
            admin_codes: AdminCodes {
                admin1: Some(codes[0].to_string()).filter(|c| !c.is_empty()),
                admin2: Some(codes[1].to_string()).filter(|c| !c.is_empty()),
                admin3: None,
                admin4: None,
            },
            population: 0,
            latitude: 0.0,
            longitude: 0.0,
            timezone: None,
            postal_code: None,
        }
    }

    #[test]
    fn maps_feature_codes() {
        assert_eq!(EntityKind::from_feature("A", "ADM1"), Some(EntityKind::Admin1));
        assert_eq!(EntityKind::from_feature("A", "ADMD"), Some(EntityKind::AdminDistrict));
        assert_eq!(EntityKind::from_feature("A", "PCLI"), Some(EntityKind::Country));
        assert_eq!(EntityKind::from_feature("P", "PPLC"), Some(EntityKind::City));
        assert_eq!(EntityKind::from_feature("A", "ADM1H"), None);
        assert_eq!(EntityKind::from_feature("P", "PPLH"), None);
        assert_eq!(EntityKind::from_feature("H", "LK"), None);
    }

    #[test]
    fn division_contains_city_by_path_prefix() {
        let state = entity(1, EntityKind::Admin1, ["IL", "063"]);
        let county = entity(2, EntityKind::Admin2, ["IL", "063"]);
        let city = entity(3, EntityKind::City, ["IL", "063"]);
        let other = entity(4, EntityKind::City, ["IN", "063"]);

        assert!(state.contains(&county));
        assert!(state.contains(&city));
        assert!(county.contains(&city));
        assert!(!county.contains(&state));
        assert!(!state.contains(&other));
        assert!(!city.contains(&city));
    }

    #[test]
    fn admin_path_does_not_confuse_prefixed_codes() {
        let state = entity(1, EntityKind::Admin1, ["1", ""]);
        let city = entity(2, EntityKind::City, ["12", ""]);
        assert!(!state.contains(&city));
    }

    #[test]
    fn parses_language_tags() {
        assert_eq!(LanguageTag::from_column(""), LanguageTag::Unknown);
        assert_eq!(LanguageTag::from_column("abbr"), LanguageTag::Abbreviation);
        assert_eq!(LanguageTag::from_column("link"), LanguageTag::Link);
        assert_eq!(
            LanguageTag::from_column("post"),
            LanguageTag::Code("post".to_string())
        );
        assert_eq!(
            LanguageTag::from_column("ja"),
            LanguageTag::Language("ja".to_string())
        );
    }

    #[test]
    fn field_status_codes() {
        assert_eq!(FieldStatus::Ok.to_string(), "O");
        assert_eq!(FieldStatus::Modified.code(), 'M');
        assert_eq!("D".parse::<FieldStatus>().ok(), Some(FieldStatus::Derived));
    }

    #[test]
    fn country_speaks_strips_region() {
        let info = CountryInfo {
            iso: "CA".to_string(),
            iso3: "CAN".to_string(),
            iso_numeric: "124".to_string(),
            name: "Canada".to_string(),
            capital: "Ottawa".to_string(),
            continent: "NA".to_string(),
            population: 0,
            tld: ".ca".to_string(),
            currency_code: "CAD".to_string(),
            languages: vec!["en-CA".to_string(), "fr-CA".to_string(), "iu".to_string()],
            geoname_id: Some(6_251_999),
        };
        assert!(info.speaks("fr"));
        assert!(info.speaks("iu"));
        assert!(!info.speaks("de"));
        assert_eq!(info.spoken_languages(), vec!["en", "fr", "iu"]);
    }

    #[test]
    fn config_defaults_from_empty_toml_equivalent() {
        let config = GazetteerConfig::default();
        assert!(config.restrict_languages);
        assert!((config.cluster_threshold_km - 10.0).abs() < f64::EPSILON);
        assert_eq!(config.default_language, "en");
    }
}
