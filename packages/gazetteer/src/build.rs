//! Gazetteer construction.
//!
//! Collects entities, alternate names and country metadata (from dumps or
//! directly), applies the language restriction, asks a [`NameExpansion`]
//! for derived names and writes the name index.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use geoscrub_gazetteer_models::{
    AlternateName, CountryInfo, DERIVED_ALT_ID_BASE, Entity, EntityKind, GazetteerConfig,
    IndexStats, LanguageTag, NameRef,
};

use crate::expansion::{ExpansionContext, NameExpansion};
use crate::geonames::{self, AlternateNameRow, GeonameRow, PostalCodeRow};
use crate::name_index::{NameIndex, index_key};
use crate::progress::BuildProgress;
use crate::store::EntityStore;
use crate::{Gazetteer, GazetteerError};

/// Dump files to build from. Only `geonames` is required.
#[derive(Debug, Clone, Default)]
pub struct BuildSources {
    /// `allCountries.txt`-style dumps (plain or `.zip`).
    pub geonames: Vec<PathBuf>,
    /// `alternateNamesV2.txt`.
    pub alternate_names: Option<PathBuf>,
    /// `countryInfo.txt`.
    pub country_info: Option<PathBuf>,
    /// Postal-code dump.
    pub postal_codes: Option<PathBuf>,
}

/// Accumulates gazetteer content and builds the index.
pub struct GazetteerBuilder {
    store: EntityStore,
    alternate_names: Vec<AlternateName>,
    restrict_languages: bool,
    skipped_rows: u64,
    postal_rows: u64,
}

impl GazetteerBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new(config: &GazetteerConfig) -> Self {
        Self {
            store: EntityStore::default(),
            alternate_names: Vec::new(),
            restrict_languages: config.restrict_languages,
            skipped_rows: 0,
            postal_rows: 0,
        }
    }

    /// Adds country metadata.
    pub fn add_country(&mut self, country: CountryInfo) -> &mut Self {
        self.store.insert_country(country);
        self
    }

    /// Adds an entity.
    pub fn add_entity(&mut self, entity: Entity) -> &mut Self {
        self.store.insert_entity(entity);
        self
    }

    /// Adds an alternate name. It is kept only if its entity exists when
    /// the gazetteer is built.
    pub fn add_alternate_name(&mut self, alt: AlternateName) -> &mut Self {
        self.alternate_names.push(alt);
        self
    }

    /// Reads every configured dump.
    ///
    /// # Errors
    ///
    /// Returns an error if a dump cannot be opened. Malformed rows are
    /// skipped and counted.
    pub fn read_sources(
        &mut self,
        sources: &BuildSources,
        progress: &dyn BuildProgress,
    ) -> Result<(), GazetteerError> {
        if let Some(path) = &sources.country_info {
            progress.phase("reading country info", None);
            let stats = geonames::read_rows::<CountryInfo>(path, |country| {
                self.store.insert_country(country);
            })?;
            self.skipped_rows += stats.skipped;
        }

        for (i, path) in sources.geonames.iter().enumerate() {
            log::info!(
                "Reading geonames [{}/{}]: {}",
                i + 1,
                sources.geonames.len(),
                path.display()
            );
            progress.phase("reading geonames", None);
            let mut unsupported = 0u64;
            let stats = geonames::read_rows::<GeonameRow>(path, |row| {
                match row.to_entity() {
                    Some(entity) => self.store.insert_entity(entity),
                    None => unsupported += 1,
                }
                progress.inc(1);
            })?;
            log::debug!("  {unsupported} rows with unsupported feature codes");
            self.skipped_rows += stats.skipped;
        }

        if let Some(path) = &sources.alternate_names {
            progress.phase("reading alternate names", None);
            let stats = geonames::read_rows::<AlternateNameRow>(path, |row| {
                self.alternate_names.push(row.to_alternate_name());
                progress.inc(1);
            })?;
            self.skipped_rows += stats.skipped;
        }

        if let Some(path) = &sources.postal_codes {
            progress.phase("reading postal codes", None);
            let mut row_number = self.postal_rows;
            let stats = geonames::read_rows::<PostalCodeRow>(path, |row| {
                self.store.insert_entity(row.to_entity(row_number));
                row_number += 1;
                progress.inc(1);
            })?;
            self.postal_rows = row_number;
            self.skipped_rows += stats.skipped;
        }

        Ok(())
    }

    /// Whether an alternate name should be indexed.
    fn keeps(&self, alt: &AlternateName) -> bool {
        if alt.is_historic || alt.language == LanguageTag::Link {
            return false;
        }
        let LanguageTag::Language(language) = &alt.language else {
            return true;
        };
        if !self.restrict_languages || language == "en" {
            return true;
        }
        self.store
            .get(alt.entity_id)
            .and_then(|entity| self.store.country(&entity.country_code))
            .is_some_and(|country| country.speaks(language))
    }

    /// Builds the gazetteer.
    #[must_use]
    pub fn build(
        mut self,
        expansion: &dyn NameExpansion,
        progress: &dyn BuildProgress,
    ) -> (Gazetteer, IndexStats) {
        let start = Instant::now();

        progress.phase("filtering alternate names", Some(self.alternate_names.len() as u64));
        let alternate_names = std::mem::take(&mut self.alternate_names);
        let mut kept = 0u64;
        for alt in alternate_names {
            if self.keeps(&alt) && self.store.insert_alternate_name(alt) {
                kept += 1;
            }
            progress.inc(1);
        }
        log::info!("Kept {kept} alternate names");

        let derived = self.derive_names(expansion, progress);
        let derived_count = derived.len() as u64;
        for alt in derived {
            self.store.insert_alternate_name(alt);
        }
        log::info!("Derived {derived_count} alternate names");

        let index = build_name_index(&self.store, progress);

        let postal_areas = self
            .store
            .entities()
            .filter(|e| e.kind == EntityKind::PostalArea)
            .count() as u64;

        let stats = IndexStats {
            entities: self.store.len() as u64,
            countries: self.store.countries().count() as u64,
            postal_areas,
            alternate_names: kept,
            derived_names: derived_count,
            index_keys: index.len() as u64,
            skipped_rows: self.skipped_rows,
            build_time_secs: start.elapsed().as_secs_f64(),
        };

        log::info!(
            "Gazetteer built: {} entities, {} index keys, {:.1}s",
            stats.entities,
            stats.index_keys,
            stats.build_time_secs
        );
        progress.finish(format!(
            "{} entities, {} names",
            stats.entities, stats.index_keys
        ));

        (Gazetteer::new(self.store, index), stats)
    }

    fn derive_names(
        &self,
        expansion: &dyn NameExpansion,
        progress: &dyn BuildProgress,
    ) -> Vec<AlternateName> {
        progress.phase("deriving names", Some(self.store.len() as u64));

        let city_names: BTreeSet<(String, String, String)> = self
            .store
            .entities()
            .filter(|e| e.kind == EntityKind::City)
            .flat_map(|e| {
                let admin1 = e.admin_codes.admin1.clone().unwrap_or_default();
                [
                    (e.country_code.clone(), admin1.clone(), e.name.to_lowercase()),
                    (e.country_code.clone(), admin1, e.ascii_name.to_lowercase()),
                ]
            })
            .collect();

        let mut next_id = DERIVED_ALT_ID_BASE;
        let mut derived = Vec::new();

        for entity in self.store.entities() {
            progress.inc(1);
            if entity.kind == EntityKind::PostalArea {
                continue;
            }

            let alternate_names = self.store.alternate_names(entity.id);
            let context = ExpansionContext {
                country: self.store.country(&entity.country_code),
                alternate_names: &alternate_names,
                city_names: &city_names,
            };

            let mut existing: BTreeSet<String> = alternate_names
                .iter()
                .map(|alt| index_key(&alt.text))
                .collect();
            existing.insert(index_key(&entity.name));
            existing.insert(index_key(&entity.ascii_name));

            for name in expansion.expand(entity, &context) {
                if !existing.insert(index_key(&name.text)) {
                    continue;
                }
                log::trace!("{} {:?} -> {:?}", entity.id, entity.name, name.text);
                derived.push(AlternateName {
                    id: next_id,
                    entity_id: entity.id,
                    text: name.text,
                    language: name.language,
                    is_preferred: false,
                    is_short: false,
                    is_colloquial: false,
                    is_historic: false,
                    is_derived: true,
                });
                next_id += 1;
            }
        }

        derived
    }
}

/// Writes one index entry per entity name and kept alternate name.
fn build_name_index(store: &EntityStore, progress: &dyn BuildProgress) -> NameIndex {
    progress.phase("indexing names", Some(store.len() as u64));

    let mut index = NameIndex::new();
    let mut indexed = 0u64;
    for entity in store.entities() {
        let canonical = NameRef {
            kind: entity.kind,
            country_code: entity.country_code.clone(),
            entity_id: entity.id,
            alt_name_id: None,
        };
        index.insert(&entity.name, &canonical);
        index.insert(&entity.ascii_name, &canonical);

        for alt in store.alternate_names(entity.id) {
            index.insert(
                &alt.text,
                &NameRef {
                    alt_name_id: Some(alt.id),
                    ..canonical.clone()
                },
            );
        }

        indexed += 1;
        if indexed.is_multiple_of(1_000_000) {
            log::info!("  indexed {indexed} entities...");
        }
        progress.inc(1);
    }

    index.finalize();
    index
}

/// Builds a gazetteer from dump files.
///
/// # Errors
///
/// Returns an error if a dump cannot be opened.
pub fn build_from_sources(
    sources: &BuildSources,
    config: &GazetteerConfig,
    expansion: &dyn NameExpansion,
    progress: &dyn BuildProgress,
) -> Result<(Gazetteer, IndexStats), GazetteerError> {
    if sources.geonames.is_empty() {
        return Err(GazetteerError::Other(
            "at least one geonames dump is required".to_string(),
        ));
    }
    for path in &sources.geonames {
        require_file(path)?;
    }

    let mut builder = GazetteerBuilder::new(config);
    builder.read_sources(sources, progress)?;
    Ok(builder.build(expansion, progress))
}

fn require_file(path: &Path) -> Result<(), GazetteerError> {
    if path.exists() {
        Ok(())
    } else {
        Err(GazetteerError::Geonames(
            geonames::GeonamesError::FileNotFound(path.display().to_string()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expansion::{EnglishVariants, NoExpansion};
    use crate::progress::NullProgress;
    use geoscrub_gazetteer_models::AdminCodes;

    fn city(id: u64, name: &str, country: &str) -> Entity {
        Entity {
            id,
            name: name.to_string(),
            ascii_name: name.to_string(),
            kind: EntityKind::City,
            feature_code: "PPL".to_string(),
            country_code: country.to_string(),
            admin_codes: AdminCodes::default(),
            population: 1000,
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

    fn alt(id: u64, entity_id: u64, text: &str, lang: &str) -> AlternateName {
        AlternateName {
            id,
            entity_id,
            text: text.to_string(),
            language: LanguageTag::from_column(lang),
            is_preferred: false,
            is_short: false,
            is_colloquial: false,
            is_historic: false,
            is_derived: false,
        }
    }

    #[test]
    fn every_kept_name_is_indexed() {
        let mut builder = GazetteerBuilder::new(&GazetteerConfig::default());
        builder
            .add_country(country("JP", &["ja"]))
            .add_entity(city(1, "Sapporo", "JP"))
            .add_alternate_name(alt(10, 1, "札幌", "ja"))
            .add_alternate_name(alt(11, 1, "SPK", "abbr"));
        let (gazetteer, stats) = builder.build(&NoExpansion, &NullProgress);

        assert_eq!(stats.alternate_names, 2);
        for name in ["sapporo", "札幌", "spk"] {
            assert!(
                gazetteer.index().lookup(name).iter().any(|r| r.entity_id == 1),
                "{name} should resolve to Sapporo"
            );
        }
    }

    #[test]
    fn restricts_languages_to_country() {
        let mut builder = GazetteerBuilder::new(&GazetteerConfig::default());
        builder
            .add_country(country("JP", &["ja"]))
            .add_entity(city(1, "Sapporo", "JP"))
            .add_alternate_name(alt(10, 1, "Sapporo-shi", "en"))
            .add_alternate_name(alt(11, 1, "Саппоро", "ru"));
        let (gazetteer, _) = builder.build(&NoExpansion, &NullProgress);

        assert!(!gazetteer.index().lookup("sapporo-shi").is_empty());
        assert!(gazetteer.index().lookup("саппоро").is_empty());
    }

    #[test]
    fn unrestricted_languages_index_everything() {
        let config = GazetteerConfig {
            restrict_languages: false,
            ..GazetteerConfig::default()
        };
        let mut builder = GazetteerBuilder::new(&config);
        builder
            .add_country(country("JP", &["ja"]))
            .add_entity(city(1, "Sapporo", "JP"))
            .add_alternate_name(alt(11, 1, "Саппоро", "ru"));
        let (gazetteer, _) = builder.build(&NoExpansion, &NullProgress);

        assert!(!gazetteer.index().lookup("саппоро").is_empty());
    }

    #[test]
    fn drops_links_and_historic_names() {
        let mut historic = alt(11, 1, "Edo", "en");
        historic.is_historic = true;

        let mut builder = GazetteerBuilder::new(&GazetteerConfig::default());
        builder
            .add_country(country("JP", &["ja"]))
            .add_entity(city(1, "Tokyo", "JP"))
            .add_alternate_name(alt(10, 1, "https://en.wikipedia.org/wiki/Tokyo", "link"))
            .add_alternate_name(historic);
        let (gazetteer, stats) = builder.build(&NoExpansion, &NullProgress);

        assert_eq!(stats.alternate_names, 0);
        assert!(gazetteer.index().lookup("edo").is_empty());
    }

    #[test]
    fn derived_names_are_indexed() {
        let mut builder = GazetteerBuilder::new(&GazetteerConfig::default());
        builder
            .add_country(country("US", &["en-US"]))
            .add_entity(city(1, "Saint Paul", "US"));
        let (gazetteer, stats) = builder.build(&EnglishVariants, &NullProgress);

        assert_eq!(stats.derived_names, 1);
        let refs = gazetteer.index().lookup("st paul");
        assert_eq!(refs.len(), 1);
        let alt_id = refs[0].alt_name_id.unwrap();
        assert!(alt_id >= DERIVED_ALT_ID_BASE);
        assert!(gazetteer.store().alternate_name(alt_id).unwrap().is_derived);
    }

    #[test]
    fn rebuild_is_deterministic() {
        let make = || {
            let mut builder = GazetteerBuilder::new(&GazetteerConfig::default());
            builder
                .add_country(country("US", &["en-US"]))
                .add_entity(city(2, "Mount Vernon", "US"))
                .add_entity(city(1, "Saint Louis", "US"))
                .add_alternate_name(alt(10, 1, "St. Louis", "en"));
            builder.build(&EnglishVariants, &NullProgress).0
        };
        assert_eq!(make().index(), make().index());
    }

    #[test]
    fn requires_a_geonames_dump() {
        let result = build_from_sources(
            &BuildSources::default(),
            &GazetteerConfig::default(),
            &NoExpansion,
            &NullProgress,
        );
        assert!(matches!(result, Err(GazetteerError::Other(_))));
    }
}
