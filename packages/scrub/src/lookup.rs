//! Name predicates and normalization within a country.

use geoscrub_gazetteer::Gazetteer;
use geoscrub_gazetteer_models::{Entity, EntityKind};

use crate::ScrubError;
use crate::country::country_to_iso;
use crate::normalize::{clean_nonalpha, scrub};

/// Kinds a "state" in a query may refer to.
pub const STATE_KINDS: [EntityKind; 3] = [
    EntityKind::Admin1,
    EntityKind::Admin2,
    EntityKind::AdminDistrict,
];

/// Returns `true` if a division of one of [`STATE_KINDS`] named `state`
/// exists in the country with ISO code `iso`. `state` must already be in
/// query form.
#[must_use]
pub fn has_state(gazetteer: &Gazetteer, state: &str, iso: &str) -> bool {
    gazetteer
        .lookup(state)
        .iter()
        .any(|r| r.country_code == iso && STATE_KINDS.contains(&r.kind))
}

/// Returns `true` if `state` names an administrative division of
/// `country`.
///
/// # Errors
///
/// * [`ScrubError::InvalidArgument`] if either argument is empty or the
///   country does not resolve
pub fn is_state(gazetteer: &Gazetteer, state: &str, country: &str) -> Result<bool, ScrubError> {
    let state = scrub(clean_nonalpha(state));
    let country = clean_nonalpha(country);
    if state.is_empty() || country.is_empty() {
        return Err(ScrubError::InvalidArgument(
            "state and country may not be empty".to_string(),
        ));
    }
    let iso = country_to_iso(gazetteer, country)
        .map_err(|e| ScrubError::InvalidArgument(format!("no such country {country:?}: {e}")))?;
    Ok(has_state(gazetteer, &state, &iso))
}

fn named<'a>(
    gazetteer: &'a Gazetteer,
    kind: EntityKind,
    country: &str,
    name: &str,
) -> Result<Vec<&'a Entity>, ScrubError> {
    let iso = country_to_iso(gazetteer, country)?;
    let key = scrub(clean_nonalpha(name));
    if key.is_empty() {
        return Ok(Vec::new());
    }
    Ok(gazetteer.entities_named(&key, Some(kind), Some(&iso)))
}

/// Returns `true` if `name` is a city in `country`.
///
/// # Errors
///
/// Returns an error if the country does not resolve.
pub fn is_city(gazetteer: &Gazetteer, country: &str, name: &str) -> Result<bool, ScrubError> {
    Ok(!named(gazetteer, EntityKind::City, country, name)?.is_empty())
}

/// Returns `true` if `name` is a first-order division of `country`.
///
/// # Errors
///
/// Returns an error if the country does not resolve.
pub fn is_admin1(gazetteer: &Gazetteer, country: &str, name: &str) -> Result<bool, ScrubError> {
    Ok(!named(gazetteer, EntityKind::Admin1, country, name)?.is_empty())
}

/// Returns `true` if `name` is a second-order division of `country`.
///
/// # Errors
///
/// Returns an error if the country does not resolve.
pub fn is_admin2(gazetteer: &Gazetteer, country: &str, name: &str) -> Result<bool, ScrubError> {
    Ok(!named(gazetteer, EntityKind::Admin2, country, name)?.is_empty())
}

/// Returns `true` if `name` is an administrative district of `country`.
///
/// # Errors
///
/// Returns an error if the country does not resolve.
pub fn is_admind(gazetteer: &Gazetteer, country: &str, name: &str) -> Result<bool, ScrubError> {
    Ok(!named(gazetteer, EntityKind::AdminDistrict, country, name)?.is_empty())
}

/// Returns `true` if `name` is a place name in the postal-code data of
/// `country`.
///
/// # Errors
///
/// Returns an error if the country does not resolve.
pub fn is_ppc(gazetteer: &Gazetteer, country: &str, name: &str) -> Result<bool, ScrubError> {
    Ok(!named(gazetteer, EntityKind::PostalArea, country, name)?.is_empty())
}

/// The name of the most populous `kind` entity called `name` in
/// `country`, in `language`.
///
/// # Errors
///
/// * [`ScrubError::NotFound`] if no such entity exists
/// * any error from resolving the country
pub fn norm(
    gazetteer: &Gazetteer,
    kind: EntityKind,
    country: &str,
    name: &str,
    language: &str,
) -> Result<String, ScrubError> {
    let entities = named(gazetteer, kind, country, name)?;
    let entity = entities
        .first()
        .ok_or_else(|| ScrubError::NotFound(format!("no {kind} named {name:?} in {country}")))?;
    Ok(gazetteer
        .store()
        .localized_name(entity, language)
        .to_string())
}

/// Entities abbreviated `abbr`, optionally within one country.
///
/// # Errors
///
/// Returns an error if a country is given and does not resolve.
pub fn expand<'a>(
    gazetteer: &'a Gazetteer,
    abbr: &str,
    country: Option<&str>,
) -> Result<Vec<&'a Entity>, ScrubError> {
    let iso = country
        .filter(|c| !c.trim().is_empty())
        .map(|c| country_to_iso(gazetteer, c))
        .transpose()?;
    Ok(gazetteer.expand(&scrub(clean_nonalpha(abbr)), iso.as_deref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn is_state_checks_the_country() {
        let gazetteer = fixtures::world();
        assert!(is_state(&gazetteer, "new south wales", "australia").unwrap());
        assert!(is_state(&gazetteer, "NSW", "AU").unwrap());
        assert!(is_state(&gazetteer, "福岡県", "日本").unwrap());
        assert!(!is_state(&gazetteer, "NSW", "NZ").unwrap());
        assert!(is_state(&gazetteer, "Pinellas County", "US").unwrap());
    }

    #[test]
    fn is_state_rejects_bad_arguments() {
        let gazetteer = fixtures::world();
        assert!(matches!(
            is_state(&gazetteer, "", "AU"),
            Err(ScrubError::InvalidArgument(_))
        ));
        assert!(matches!(
            is_state(&gazetteer, "NSW", ""),
            Err(ScrubError::InvalidArgument(_))
        ));
        assert!(matches!(
            is_state(&gazetteer, "NSW", "Atlantis"),
            Err(ScrubError::InvalidArgument(_))
        ));
    }

    #[test]
    fn kind_predicates() {
        let gazetteer = fixtures::world();
        assert!(is_city(&gazetteer, "AU", "Sydney").unwrap());
        assert!(!is_city(&gazetteer, "NZ", "Sydney").unwrap());
        assert!(is_city(&gazetteer, "JP", "札幌").unwrap());
        assert!(is_admin1(&gazetteer, "US", "fl").unwrap());
        assert!(!is_admin1(&gazetteer, "US", "Pinellas County").unwrap());
        assert!(is_admin2(&gazetteer, "US", "Pinellas County").unwrap());
        assert!(is_admind(&gazetteer, "GB", "West Midlands").unwrap());
        assert!(is_ppc(&gazetteer, "US", "Springfield").unwrap());
        assert!(!is_ppc(&gazetteer, "AU", "Springfield").unwrap());
        assert!(is_city(&gazetteer, "Atlantis", "Sydney").is_err());
    }

    #[test]
    fn norm_returns_localized_names() {
        let gazetteer = fixtures::world();
        assert_eq!(
            norm(&gazetteer, EntityKind::City, "JP", "sapporo", "ja").unwrap(),
            "札幌"
        );
        assert_eq!(
            norm(&gazetteer, EntityKind::City, "JP", "札幌", "en").unwrap(),
            "Sapporo"
        );
        assert_eq!(
            norm(&gazetteer, EntityKind::Admin1, "AU", "nsw", "en").unwrap(),
            "New South Wales"
        );
        assert!(matches!(
            norm(&gazetteer, EntityKind::City, "AU", "Atlantis", "en"),
            Err(ScrubError::NotFound(_))
        ));
    }

    #[test]
    fn expand_abbreviations() {
        let gazetteer = fixtures::world();
        let names: Vec<&str> = expand(&gazetteer, "nsw", Some("AU"))
            .unwrap()
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(names, vec!["New South Wales"]);

        let wa: Vec<&str> = expand(&gazetteer, "WA", None)
            .unwrap()
            .iter()
            .map(|e| e.country_code.as_str())
            .collect();
        assert_eq!(wa, vec!["US", "AU"]);

        assert!(expand(&gazetteer, "new south wales", None).unwrap().is_empty());
    }
}
