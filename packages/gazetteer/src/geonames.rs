//! `GeoNames` dump readers.
//!
//! Parses the tab-separated `GeoNames` exports (`allCountries.txt`,
//! `alternateNamesV2.txt`, `countryInfo.txt` and the postal-code dump),
//! either as plain files or inside the `.zip` archives `GeoNames`
//! distributes. Malformed rows are logged and skipped; a bad row never
//! aborts a read.

use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use geoscrub_gazetteer_models::{
    AdminCodes, AlternateName, CountryInfo, Entity, EntityKind, LanguageTag, POSTAL_ID_BASE,
};

/// A single row of a `GeoNames` dump that can be parsed from a record.
pub trait GeonamesRow: Sized {
    /// Human-readable name of the dump, for log lines.
    const DUMP: &'static str;

    /// Whether `#`-prefixed lines are comments in this dump.
    const HAS_COMMENTS: bool = false;

    /// Parses one record.
    ///
    /// # Errors
    ///
    /// Returns a [`RowError`] if the record is malformed.
    fn from_record(record: &StringRecord) -> Result<Self, RowError>;
}

/// A row of `allCountries.txt` (or a per-country extract).
#[derive(Debug, Clone, PartialEq)]
pub struct GeonameRow {
    /// `GeoNames` id.
    pub id: u64,
    /// Canonical name.
    pub name: String,
    /// ASCII name.
    pub ascii_name: String,
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
    /// Feature class (`A`, `P`, ...).
    pub feature_class: String,
    /// Feature code (`ADM1`, `PPLC`, ...).
    pub feature_code: String,
    /// ISO country code.
    pub country_code: String,
    /// Administrative codes.
    pub admin_codes: AdminCodes,
    /// Population.
    pub population: u64,
    /// IANA timezone.
    pub timezone: Option<String>,
}

impl GeonameRow {
    /// Converts the row into an entity.
    ///
    /// Returns `None` for feature classes and codes the gazetteer does not
    /// keep.
    #[must_use]
    pub fn to_entity(&self) -> Option<Entity> {
        let kind = EntityKind::from_feature(&self.feature_class, &self.feature_code)?;
        Some(Entity {
            id: self.id,
            name: self.name.clone(),
            ascii_name: self.ascii_name.clone(),
            kind,
            feature_code: self.feature_code.clone(),
            country_code: self.country_code.clone(),
            admin_codes: self.admin_codes.clone(),
            population: self.population,
            latitude: self.latitude,
            longitude: self.longitude,
            timezone: self.timezone.clone(),
            postal_code: None,
        })
    }
}

impl GeonamesRow for GeonameRow {
    const DUMP: &'static str = "geonames";

    fn from_record(record: &StringRecord) -> Result<Self, RowError> {
        expect_columns(record, 19)?;
        Ok(Self {
            id: parse_u64(record, 0, "geonameid")?,
            name: required(record, 1, "name")?,
            ascii_name: field(record, 2).to_string(),
            latitude: parse_f64(record, 4, "latitude")?,
            longitude: parse_f64(record, 5, "longitude")?,
            feature_class: field(record, 6).to_string(),
            feature_code: field(record, 7).to_string(),
            country_code: field(record, 8).to_string(),
            admin_codes: AdminCodes {
                admin1: optional(record, 10),
                admin2: optional(record, 11),
                admin3: optional(record, 12),
                admin4: optional(record, 13),
            },
            population: parse_u64_or_zero(record, 14, "population")?,
            timezone: optional(record, 17),
        })
    }
}

/// A row of `alternateNamesV2.txt` (10 columns) or the older
/// `alternateNames.txt` (8 columns).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlternateNameRow {
    /// Alternate name id.
    pub id: u64,
    /// The named entity.
    pub geoname_id: u64,
    /// Language tag.
    pub language: LanguageTag,
    /// The name.
    pub text: String,
    /// `isPreferredName`.
    pub is_preferred: bool,
    /// `isShortName`.
    pub is_short: bool,
    /// `isColloquial`.
    pub is_colloquial: bool,
    /// `isHistoric`.
    pub is_historic: bool,
}

impl AlternateNameRow {
    /// Converts the row into an alternate name.
    #[must_use]
    pub fn to_alternate_name(&self) -> AlternateName {
        AlternateName {
            id: self.id,
            entity_id: self.geoname_id,
            text: self.text.clone(),
            language: self.language.clone(),
            is_preferred: self.is_preferred,
            is_short: self.is_short,
            is_colloquial: self.is_colloquial,
            is_historic: self.is_historic,
            is_derived: false,
        }
    }
}

impl GeonamesRow for AlternateNameRow {
    const DUMP: &'static str = "alternate names";

    fn from_record(record: &StringRecord) -> Result<Self, RowError> {
        if record.len() != 8 && record.len() != 10 {
            return Err(RowError::ColumnCount {
                expected: 10,
                found: record.len(),
            });
        }
        Ok(Self {
            id: parse_u64(record, 0, "alternateNameId")?,
            geoname_id: parse_u64(record, 1, "geonameid")?,
            language: LanguageTag::from_column(field(record, 2)),
            text: required(record, 3, "alternate name")?,
            is_preferred: flag(record, 4),
            is_short: flag(record, 5),
            is_colloquial: flag(record, 6),
            is_historic: flag(record, 7),
        })
    }
}

impl GeonamesRow for CountryInfo {
    const DUMP: &'static str = "country info";
    const HAS_COMMENTS: bool = true;

    fn from_record(record: &StringRecord) -> Result<Self, RowError> {
        if record.len() < 17 {
            return Err(RowError::ColumnCount {
                expected: 19,
                found: record.len(),
            });
        }
        Ok(Self {
            iso: required(record, 0, "ISO")?,
            iso3: field(record, 1).to_string(),
            iso_numeric: field(record, 2).to_string(),
            name: required(record, 4, "Country")?,
            capital: field(record, 5).to_string(),
            population: parse_u64_or_zero(record, 7, "Population")?,
            continent: field(record, 8).to_string(),
            tld: field(record, 9).to_string(),
            currency_code: field(record, 10).to_string(),
            languages: field(record, 15)
                .split(',')
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(ToString::to_string)
                .collect(),
            geoname_id: optional(record, 16).and_then(|id| id.parse().ok()),
        })
    }
}

/// A row of the `GeoNames` postal-code dump.
#[derive(Debug, Clone, PartialEq)]
pub struct PostalCodeRow {
    /// ISO country code.
    pub country_code: String,
    /// The postal code.
    pub postal_code: String,
    /// Place name.
    pub place_name: String,
    /// First-order division code.
    pub admin1_code: Option<String>,
    /// Second-order division code.
    pub admin2_code: Option<String>,
    /// Third-order division code.
    pub admin3_code: Option<String>,
    /// Latitude, when present.
    pub latitude: Option<f64>,
    /// Longitude, when present.
    pub longitude: Option<f64>,
}

impl PostalCodeRow {
    /// Converts the row into a postal-area entity with the given row number.
    #[must_use]
    pub fn to_entity(&self, row_number: u64) -> Entity {
        Entity {
            id: POSTAL_ID_BASE + row_number,
            name: self.place_name.clone(),
            ascii_name: self.place_name.clone(),
            kind: EntityKind::PostalArea,
            feature_code: String::new(),
            country_code: self.country_code.clone(),
            admin_codes: AdminCodes {
                admin1: self.admin1_code.clone(),
                admin2: self.admin2_code.clone(),
                admin3: self.admin3_code.clone(),
                admin4: None,
            },
            population: 0,
            latitude: self.latitude.unwrap_or_default(),
            longitude: self.longitude.unwrap_or_default(),
            timezone: None,
            postal_code: Some(self.postal_code.clone()),
        }
    }
}

impl GeonamesRow for PostalCodeRow {
    const DUMP: &'static str = "postal codes";

    fn from_record(record: &StringRecord) -> Result<Self, RowError> {
        if record.len() < 11 {
            return Err(RowError::ColumnCount {
                expected: 12,
                found: record.len(),
            });
        }
        Ok(Self {
            country_code: required(record, 0, "country code")?,
            postal_code: required(record, 1, "postal code")?,
            place_name: required(record, 2, "place name")?,
            admin1_code: optional(record, 4),
            admin2_code: optional(record, 6),
            admin3_code: optional(record, 8),
            latitude: optional(record, 9).and_then(|v| v.parse().ok()),
            longitude: optional(record, 10).and_then(|v| v.parse().ok()),
        })
    }
}

/// Counts from reading one dump.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadStats {
    /// Rows parsed and handed to the callback.
    pub rows: u64,
    /// Malformed rows skipped.
    pub skipped: u64,
}

/// Reads every row of a dump at `path`, calling `on_row` for each row
/// that parses.
///
/// `.zip` archives are read in place: every `.txt` entry other than
/// `readme.txt` is parsed.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or is not a readable
/// archive. Malformed rows are skipped, not reported as errors.
pub fn read_rows<T: GeonamesRow>(
    path: &Path,
    mut on_row: impl FnMut(T),
) -> Result<ReadStats, GeonamesError> {
    if !path.exists() {
        return Err(GeonamesError::FileNotFound(path.display().to_string()));
    }

    log::info!("Reading {} from {}", T::DUMP, path.display());

    let is_zip = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("zip"));

    let file = std::fs::File::open(path).map_err(|e| GeonamesError::Io {
        path: path.display().to_string(),
        source: e,
    })?;

    if !is_zip {
        return read_from(file, &path.display().to_string(), &mut on_row);
    }

    let mut archive = zip::ZipArchive::new(file).map_err(|e| GeonamesError::Io {
        path: path.display().to_string(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
    })?;

    let mut stats = ReadStats::default();
    for i in 0..archive.len() {
        let entry = match archive.by_index(i) {
            Ok(e) => e,
            Err(e) => {
                log::warn!("  skipping corrupt zip entry {i}: {e}");
                continue;
            }
        };

        let entry_name = entry.name().to_string();
        let lower = entry_name.to_ascii_lowercase();
        if !lower.ends_with(".txt") || lower.ends_with("readme.txt") {
            continue;
        }

        let entry_stats = read_from(entry, &entry_name, &mut on_row)?;
        stats.rows += entry_stats.rows;
        stats.skipped += entry_stats.skipped;
    }

    Ok(stats)
}

/// Parses rows from any reader.
///
/// # Errors
///
/// Returns an error only if the underlying reader fails.
pub fn read_from<T: GeonamesRow>(
    reader: impl Read,
    source_name: &str,
    on_row: &mut impl FnMut(T),
) -> Result<ReadStats, GeonamesError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .has_headers(false)
        .flexible(true)
        .comment(T::HAS_COMMENTS.then_some(b'#'))
        .from_reader(reader);

    let mut stats = ReadStats::default();
    let mut record = StringRecord::new();
    loop {
        match csv_reader.read_record(&mut record) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) if e.is_io_error() => {
                return Err(GeonamesError::Csv {
                    path: source_name.to_string(),
                    source: e,
                });
            }
            Err(e) => {
                log::warn!("  {source_name}: skipping unreadable row: {e}");
                stats.skipped += 1;
                continue;
            }
        }

        match T::from_record(&record) {
            Ok(row) => {
                on_row(row);
                stats.rows += 1;
                if stats.rows.is_multiple_of(1_000_000) {
                    log::info!("  read {} {} rows...", stats.rows, T::DUMP);
                }
            }
            Err(e) => {
                let line = record.position().map_or(0, csv::Position::line);
                log::warn!("  {source_name}:{line}: skipping malformed row: {e}");
                stats.skipped += 1;
            }
        }
    }

    log::info!(
        "  {}: {} rows, {} skipped",
        T::DUMP,
        stats.rows,
        stats.skipped
    );

    Ok(stats)
}

fn field(record: &StringRecord, index: usize) -> &str {
    record.get(index).map_or("", str::trim)
}

fn optional(record: &StringRecord, index: usize) -> Option<String> {
    let value = field(record, index);
    (!value.is_empty()).then(|| value.to_string())
}

fn required(record: &StringRecord, index: usize, name: &'static str) -> Result<String, RowError> {
    optional(record, index).ok_or(RowError::MissingField(name))
}

fn flag(record: &StringRecord, index: usize) -> bool {
    field(record, index) == "1"
}

fn expect_columns(record: &StringRecord, expected: usize) -> Result<(), RowError> {
    if record.len() == expected {
        Ok(())
    } else {
        Err(RowError::ColumnCount {
            expected,
            found: record.len(),
        })
    }
}

fn parse_u64(record: &StringRecord, index: usize, name: &'static str) -> Result<u64, RowError> {
    let value = field(record, index);
    if value.is_empty() {
        return Err(RowError::MissingField(name));
    }
    value.parse().map_err(|_| RowError::InvalidNumber {
        field: name,
        value: value.to_string(),
    })
}

fn parse_u64_or_zero(
    record: &StringRecord,
    index: usize,
    name: &'static str,
) -> Result<u64, RowError> {
    if field(record, index).is_empty() {
        return Ok(0);
    }
    parse_u64(record, index, name)
}

fn parse_f64(record: &StringRecord, index: usize, name: &'static str) -> Result<f64, RowError> {
    let value = field(record, index);
    let parsed: f64 = value.parse().map_err(|_| RowError::InvalidNumber {
        field: name,
        value: value.to_string(),
    })?;
    if parsed.is_finite() {
        Ok(parsed)
    } else {
        Err(RowError::InvalidNumber {
            field: name,
            value: value.to_string(),
        })
    }
}

/// Why a single row was rejected.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RowError {
    /// Wrong number of columns.
    #[error("expected {expected} columns, found {found}")]
    ColumnCount {
        /// Expected column count.
        expected: usize,
        /// Actual column count.
        found: usize,
    },

    /// A required field is empty.
    #[error("missing {0}")]
    MissingField(&'static str),

    /// A numeric field does not parse.
    #[error("invalid {field}: {value:?}")]
    InvalidNumber {
        /// Field name.
        field: &'static str,
        /// Offending value.
        value: String,
    },
}

/// Errors from reading `GeoNames` dumps.
#[derive(Debug, thiserror::Error)]
pub enum GeonamesError {
    /// CSV reader error.
    #[error("CSV error in {path}: {source}")]
    Csv {
        /// Path or archive entry being read.
        path: String,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// I/O error opening a dump.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The dump does not exist.
    #[error("File not found: {0}")]
    FileNotFound(String),
}
