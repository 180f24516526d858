//! Candidate resolution: cities matching a `(city, state, country)` query.
//!
//! All inputs here are already normalized: names in query form, the
//! country as an ISO alpha-2 code.

use geoscrub_gazetteer::Gazetteer;
use geoscrub_gazetteer_models::{Entity, EntityKind};

use crate::dedup::dedup;

/// Cities named `city`, optionally within one country.
#[must_use]
pub fn cities_named<'a>(gazetteer: &'a Gazetteer, city: &str, country: Option<&str>) -> Vec<&'a Entity> {
    if city.is_empty() {
        return Vec::new();
    }
    gazetteer.entities_named(city, Some(EntityKind::City), country)
}

/// First- and second-order divisions named `state`, optionally within one
/// country.
#[must_use]
pub fn states_named<'a>(gazetteer: &'a Gazetteer, state: &str, country: Option<&str>) -> Vec<&'a Entity> {
    if state.is_empty() {
        return Vec::new();
    }
    gazetteer
        .entities_named(state, None, country)
        .into_iter()
        .filter(|e| EntityKind::STATE_LEVELS.contains(&e.kind))
        .collect()
}

/// The cities that lie within at least one of `states`, in their original
/// order.
fn within<'a>(cities: Vec<&'a Entity>, states: &[&Entity]) -> Vec<&'a Entity> {
    cities
        .into_iter()
        .filter(|city| states.iter().any(|state| state.contains(city)))
        .collect()
}

/// Cities matching exactly the given query shape, with no fallback.
///
/// * state given: cities named `city` inside a division named `state`
/// * no state: cities named `city`
///
/// Either shape is restricted to `country` when one is given.
#[must_use]
pub fn find_exact<'a>(
    gazetteer: &'a Gazetteer,
    city: &str,
    state: Option<&str>,
    country: Option<&str>,
) -> Vec<&'a Entity> {
    let cities = cities_named(gazetteer, city, country);
    match state.filter(|s| !s.is_empty()) {
        Some(state) if !cities.is_empty() => {
            within(cities, &states_named(gazetteer, state, country))
        }
        Some(_) => Vec::new(),
        None => cities,
    }
}

/// Cities matching a query, relaxing it step by step until something
/// matches:
///
/// 1. `city` inside `state` inside `country`
/// 2. `city` anywhere in `country`
/// 3. `state` as a city in `country` (city and state swapped)
/// 4. `city` inside `state` in any country
/// 5. `city` anywhere
#[must_use]
pub fn find_cascading<'a>(
    gazetteer: &'a Gazetteer,
    city: &str,
    state: Option<&str>,
    country: Option<&str>,
) -> Vec<&'a Entity> {
    let state = state.filter(|s| !s.is_empty());
    let found = find_full(gazetteer, city, state, country);
    if found.is_empty() {
        find_relaxed(gazetteer, city, state, country)
    } else {
        found
    }
}

/// Step 1 of [`find_cascading`]: only tried when state and country are
/// both given.
fn find_full<'a>(
    gazetteer: &'a Gazetteer,
    city: &str,
    state: Option<&str>,
    country: Option<&str>,
) -> Vec<&'a Entity> {
    match (state, country) {
        (Some(state), Some(country)) => find_exact(gazetteer, city, Some(state), Some(country)),
        _ => Vec::new(),
    }
}

/// Steps 2 to 5 of [`find_cascading`].
fn find_relaxed<'a>(
    gazetteer: &'a Gazetteer,
    city: &str,
    state: Option<&str>,
    country: Option<&str>,
) -> Vec<&'a Entity> {
    if let Some(country) = country {
        let found = find_exact(gazetteer, city, None, Some(country));
        if !found.is_empty() {
            return found;
        }
    }

    if let (Some(state), Some(country)) = (state, country) {
        let found = cities_named(gazetteer, state, Some(country));
        if !found.is_empty() {
            log::debug!("found {state:?} as a city in {country}");
            return found;
        }
    }

    if let Some(state) = state {
        let found = find_exact(gazetteer, city, Some(state), None);
        if !found.is_empty() {
            return found;
        }
    }

    cities_named(gazetteer, city, None)
}

/// [`find_cascading`], deduplicated when `dedup_km` is given.
#[must_use]
pub fn find<'a>(
    gazetteer: &'a Gazetteer,
    city: &str,
    state: Option<&str>,
    country: Option<&str>,
    dedup_km: Option<f64>,
) -> Vec<&'a Entity> {
    let found = find_cascading(gazetteer, city, state, country);
    match dedup_km {
        Some(threshold) => dedup(&found, threshold),
        None => found,
    }
}

/// Like [`find_cascading`], but when `city` is not found inside `state`
/// inside `country`, each alternate spelling is tried in that same shape
/// before the query is relaxed. No deduplication.
#[must_use]
pub fn list<'a>(
    gazetteer: &'a Gazetteer,
    city: &str,
    alternates: &[String],
    state: Option<&str>,
    country: Option<&str>,
) -> Vec<&'a Entity> {
    let state = state.filter(|s| !s.is_empty());
    std::iter::once(city)
        .chain(alternates.iter().map(String::as_str))
        .map(|name| find_full(gazetteer, name, state, country))
        .find(|found| !found.is_empty())
        .unwrap_or_else(|| find_relaxed(gazetteer, city, state, country))
}

/// First-, second- and third-order divisions named `state`, optionally
/// within one country, most populous first.
#[must_use]
pub fn find_states<'a>(gazetteer: &'a Gazetteer, state: &str, country: Option<&str>) -> Vec<&'a Entity> {
    if state.is_empty() {
        return Vec::new();
    }
    gazetteer
        .entities_named(state, None, country)
        .into_iter()
        .filter(|e| {
            matches!(
                e.kind,
                EntityKind::Admin1 | EntityKind::Admin2 | EntityKind::Admin3
            )
        })
        .collect()
}
