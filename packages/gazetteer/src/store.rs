//! In-memory entity store.
//!
//! Holds every entity, its alternate names and per-country metadata, plus
//! the lookup tables derived from them (divisions by administrative path,
//! entities by country). The derived tables are rebuilt on load rather
//! than persisted.

use std::collections::BTreeMap;

use geoscrub_gazetteer_models::{AlternateName, CountryInfo, Entity, EntityKind, LanguageTag};
use serde::{Deserialize, Serialize};

/// `(country, [(level, code)])` key of an administrative division.
type DivisionKey = (String, Vec<(u8, String)>);

/// The persisted contents of an [`EntityStore`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreParts {
    /// Every entity.
    pub entities: Vec<Entity>,
    /// Every kept alternate name.
    pub alternate_names: Vec<AlternateName>,
    /// Country metadata.
    pub countries: Vec<CountryInfo>,
}

/// Entities, their alternate names and country metadata.
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    entities: BTreeMap<u64, Entity>,
    alternate_names: BTreeMap<u64, AlternateName>,
    names_by_entity: BTreeMap<u64, Vec<u64>>,
    countries: BTreeMap<String, CountryInfo>,
    divisions: BTreeMap<DivisionKey, u64>,
    by_country: BTreeMap<String, Vec<u64>>,
}

fn division_key(entity: &Entity) -> DivisionKey {
    (
        entity.country_code.clone(),
        entity
            .admin_path()
            .into_iter()
            .map(|(level, code)| (level, code.to_string()))
            .collect(),
    )
}

impl EntityStore {
    /// Rebuilds a store from its persisted parts.
    #[must_use]
    pub fn from_parts(parts: StoreParts) -> Self {
        let mut store = Self::default();
        for country in parts.countries {
            store.insert_country(country);
        }
        for entity in parts.entities {
            store.insert_entity(entity);
        }
        for alt in parts.alternate_names {
            store.insert_alternate_name(alt);
        }
        store
    }

    /// Splits the store into its persisted parts.
    #[must_use]
    pub fn to_parts(&self) -> StoreParts {
        StoreParts {
            entities: self.entities.values().cloned().collect(),
            alternate_names: self.alternate_names.values().cloned().collect(),
            countries: self.countries.values().cloned().collect(),
        }
    }

    /// Adds an entity, replacing any previous entity with the same id.
    pub fn insert_entity(&mut self, entity: Entity) {
        if entity.kind.admin_level().is_some() {
            self.divisions.insert(division_key(&entity), entity.id);
        }
        let ids = self
            .by_country
            .entry(entity.country_code.clone())
            .or_default();
        if !ids.contains(&entity.id) {
            ids.push(entity.id);
        }
        self.entities.insert(entity.id, entity);
    }

    /// Adds an alternate name. Names of unknown entities are dropped.
    ///
    /// Returns `true` if the name was kept.
    pub fn insert_alternate_name(&mut self, alt: AlternateName) -> bool {
        if !self.entities.contains_key(&alt.entity_id) {
            return false;
        }
        let ids = self.names_by_entity.entry(alt.entity_id).or_default();
        if !ids.contains(&alt.id) {
            ids.push(alt.id);
        }
        self.alternate_names.insert(alt.id, alt);
        true
    }

    /// Adds country metadata keyed by ISO code.
    pub fn insert_country(&mut self, country: CountryInfo) {
        self.countries
            .insert(country.iso.to_ascii_uppercase(), country);
    }

    /// Looks up an entity by id.
    #[must_use]
    pub fn get(&self, id: u64) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` if the store holds no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Iterates over all entities in id order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Iterates over all entities of one country.
    pub fn in_country<'a>(&'a self, country_code: &str) -> impl Iterator<Item = &'a Entity> + use<'a> {
        self.by_country
            .get(country_code)
            .into_iter()
            .flatten()
            .filter_map(|id| self.entities.get(id))
    }

    /// Looks up an alternate name by id.
    #[must_use]
    pub fn alternate_name(&self, id: u64) -> Option<&AlternateName> {
        self.alternate_names.get(&id)
    }

    /// All alternate names of an entity.
    #[must_use]
    pub fn alternate_names(&self, entity_id: u64) -> Vec<&AlternateName> {
        self.names_by_entity
            .get(&entity_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.alternate_names.get(id))
            .collect()
    }

    /// Number of alternate names.
    #[must_use]
    pub fn alternate_name_count(&self) -> usize {
        self.alternate_names.len()
    }

    /// Country metadata by ISO alpha-2 code (case-insensitive).
    #[must_use]
    pub fn country(&self, iso: &str) -> Option<&CountryInfo> {
        self.countries.get(&iso.trim().to_ascii_uppercase())
    }

    /// Country metadata by ISO alpha-3 code (case-insensitive).
    #[must_use]
    pub fn country_by_iso3(&self, iso3: &str) -> Option<&CountryInfo> {
        let iso3 = iso3.trim();
        self.countries
            .values()
            .find(|c| c.iso3.eq_ignore_ascii_case(iso3))
    }

    /// Country metadata whose country entity has `geoname_id`.
    #[must_use]
    pub fn country_by_geoname_id(&self, geoname_id: u64) -> Option<&CountryInfo> {
        self.countries
            .values()
            .find(|c| c.geoname_id == Some(geoname_id))
    }

    /// Iterates over all country metadata in ISO order.
    pub fn countries(&self) -> impl Iterator<Item = &CountryInfo> {
        self.countries.values()
    }

    /// The division at `level` (1..=4) above `entity`, if the store has it.
    #[must_use]
    pub fn parent(&self, entity: &Entity, level: u8) -> Option<&Entity> {
        if entity.kind.admin_level().is_some_and(|own| own <= level) {
            return None;
        }
        let path: Vec<(u8, String)> = entity
            .admin_path()
            .into_iter()
            .take_while(|(l, _)| *l <= level)
            .map(|(l, code)| (l, code.to_string()))
            .collect();
        if path.last().is_none_or(|(l, _)| *l != level) {
            return None;
        }
        self.divisions
            .get(&(entity.country_code.clone(), path))
            .and_then(|id| self.entities.get(id))
    }

    /// Entities directly or indirectly contained in `entity`, optionally
    /// restricted to one kind, in descending population order.
    #[must_use]
    pub fn children(&self, entity: &Entity, kind: Option<EntityKind>) -> Vec<&Entity> {
        let mut children: Vec<&Entity> = self
            .in_country(&entity.country_code)
            .filter(|child| kind.is_none_or(|k| child.kind == k))
            .filter(|child| entity.contains(child))
            .collect();
        children.sort_by(|a, b| b.population.cmp(&a.population));
        children
    }

    /// The name of `entity` in `language`.
    ///
    /// Prefers a name flagged preferred in that language, then the longest
    /// name in that language that is neither historic nor colloquial, then
    /// the canonical name.
    #[must_use]
    pub fn localized_name<'a>(&'a self, entity: &'a Entity, language: &str) -> &'a str {
        let tag = LanguageTag::Language(language.to_string());
        let names: Vec<&AlternateName> = self
            .alternate_names(entity.id)
            .into_iter()
            .filter(|alt| alt.language == tag && !alt.is_derived)
            .collect();

        if let Some(preferred) = names.iter().find(|alt| alt.is_preferred) {
            return &preferred.text;
        }

        names
            .iter()
            .filter(|alt| !alt.is_historic && !alt.is_colloquial)
            .max_by_key(|alt| alt.text.chars().count())
            .map_or(entity.name.as_str(), |alt| alt.text.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoscrub_gazetteer_models::AdminCodes;

    fn entity(id: u64, name: &str, kind: EntityKind, admin1: &str, population: u64) -> Entity {
        Entity {
            id,
            name: name.to_string(),
            ascii_name: name.to_string(),
            kind,
            feature_code: String::new(),
            country_code: "US".to_string(),
            admin_codes: AdminCodes {
                admin1: Some(admin1.to_string()),
                ..AdminCodes::default()
            },
            population,
            latitude: 0.0,
            longitude: 0.0,
            timezone: None,
            postal_code: None,
        }
    }

    fn alt(id: u64, entity_id: u64, text: &str, lang: &str, preferred: bool) -> AlternateName {
        AlternateName {
            id,
            entity_id,
            text: text.to_string(),
            language: LanguageTag::from_column(lang),
            is_preferred: preferred,
            is_short: false,
            is_colloquial: false,
            is_historic: false,
            is_derived: false,
        }
    }

    fn store() -> EntityStore {
        let mut store = EntityStore::default();
        store.insert_entity(entity(1, "Illinois", EntityKind::Admin1, "IL", 12_000_000));
        store.insert_entity(entity(2, "Chicago", EntityKind::City, "IL", 2_700_000));
        store.insert_entity(entity(3, "Springfield", EntityKind::City, "IL", 116_000));
        store.insert_entity(entity(4, "Miami", EntityKind::City, "FL", 440_000));
        store
    }

    #[test]
    fn finds_parent_division_by_path() {
        let store = store();
        let chicago = store.get(2).unwrap();
        assert_eq!(store.parent(chicago, 1).map(|e| e.id), Some(1));
        assert!(store.parent(store.get(4).unwrap(), 1).is_none());
        assert!(store.parent(chicago, 2).is_none());
    }

    #[test]
    fn children_are_ordered_by_population() {
        let store = store();
        let illinois = store.get(1).unwrap();
        let ids: Vec<u64> = store
            .children(illinois, Some(EntityKind::City))
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn drops_names_of_unknown_entities() {
        let mut store = store();
        assert!(!store.insert_alternate_name(alt(10, 99, "Nowhere", "en", false)));
        assert!(store.insert_alternate_name(alt(11, 2, "Chi-Town", "en", false)));
        assert_eq!(store.alternate_name_count(), 1);
    }

    #[test]
    fn localized_name_prefers_flagged_name() {
        let mut store = store();
        store.insert_alternate_name(alt(10, 2, "Chicago", "fr", false));
        store.insert_alternate_name(alt(11, 2, "Chicagou", "fr", true));
        store.insert_alternate_name(alt(12, 2, "シカゴ", "ja", false));
        let chicago = store.get(2).unwrap().clone();

        assert_eq!(store.localized_name(&chicago, "fr"), "Chicagou");
        assert_eq!(store.localized_name(&chicago, "ja"), "シカゴ");
        assert_eq!(store.localized_name(&chicago, "de"), "Chicago");
    }

    #[test]
    fn parts_round_trip_rebuilds_lookups() {
        let mut original = store();
        original.insert_alternate_name(alt(10, 2, "Chi-Town", "en", false));

        let rebuilt = EntityStore::from_parts(original.to_parts());
        assert_eq!(rebuilt.len(), 4);
        assert_eq!(rebuilt.alternate_names(2).len(), 1);
        assert_eq!(rebuilt.in_country("US").count(), 4);
        assert_eq!(
            rebuilt.parent(rebuilt.get(3).unwrap(), 1).map(|e| e.id),
            Some(1)
        );
    }
}
