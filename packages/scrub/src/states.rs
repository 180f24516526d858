//! Administrative-division resolution for `(state, country)` pairs.

use geoscrub_gazetteer::Gazetteer;
use geoscrub_gazetteer_models::{Entity, FieldStatus, Resolution, StateScrubResult};

use crate::lookup::STATE_KINDS;

/// Resolves a normalized state name, optionally within a country.
///
/// Each kind in [`STATE_KINDS`] is tried in turn, first within the
/// country (score 0.9) and then anywhere (score 0.8, country derived).
/// Candidates accumulate across kinds. As soon as more than one candidate
/// is in hand when a unique match is required, the pair is reported as
/// ambiguous rather than guessed.
#[must_use]
pub fn sc_scrub(
    gazetteer: &Gazetteer,
    state: &str,
    country: Option<&str>,
) -> Resolution<StateScrubResult> {
    if state.is_empty() {
        return Resolution::NotFound;
    }

    let mut found: Vec<&Entity> = Vec::new();
    for kind in STATE_KINDS {
        if let Some(country) = country {
            found.extend(gazetteer.entities_named(state, Some(kind), Some(country)));
        }
        log::debug!("sc_scrub {state:?} {kind} in {country:?}: {}", found.len());
        match found.as_slice() {
            [entity] => return matched(entity, 0.9, FieldStatus::Ok),
            [] => {}
            _ => break,
        }

        found.extend(gazetteer.entities_named(state, Some(kind), None));
        log::debug!("sc_scrub {state:?} {kind} anywhere: {}", found.len());
        if let [entity] = found.as_slice() {
            return matched(entity, 0.8, FieldStatus::Derived);
        }
    }

    if found.is_empty() {
        Resolution::NotFound
    } else {
        log::info!("{} divisions named {state:?}, refusing to guess", found.len());
        Resolution::Ambiguous {
            candidates: found.len(),
        }
    }
}

fn matched(entity: &Entity, score: f64, country_status: FieldStatus) -> Resolution<StateScrubResult> {
    Resolution::Matched(StateScrubResult {
        entity: entity.clone(),
        score,
        country_status,
    })
}
