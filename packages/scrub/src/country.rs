//! Country resolution.
//!
//! Countries are named in many ways: ISO alpha-2 and alpha-3 codes,
//! English and local names, abbreviations. Every form resolves to the
//! country's metadata record.

use std::collections::BTreeSet;

use geoscrub_gazetteer::Gazetteer;
use geoscrub_gazetteer::name_index::query_form;
use geoscrub_gazetteer_models::{CountryInfo, EntityKind};

use crate::ScrubError;

/// Codes that are commonly used for a country but are not its ISO code.
const COUNTRY_ALIASES: &[(&str, &str)] = &[("UK", "GB")];

/// Resolves a country name, alias or ISO code to its metadata.
///
/// # Errors
///
/// * [`ScrubError::InvalidArgument`] if `name` is empty
/// * [`ScrubError::NotFound`] if nothing matches
/// * [`ScrubError::AmbiguousCountry`] if the name belongs to more than one
///   country
pub fn country_info<'a>(gazetteer: &'a Gazetteer, name: &str) -> Result<&'a CountryInfo, ScrubError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ScrubError::InvalidArgument(
            "country name may not be empty".to_string(),
        ));
    }

    let name = COUNTRY_ALIASES
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(name))
        .map_or(name, |(_, iso)| *iso);

    let store = gazetteer.store();
    let mut candidates: BTreeSet<&str> = BTreeSet::new();

    if name.len() == 2
        && let Some(info) = store.country(name)
    {
        candidates.insert(&info.iso);
    }
    if name.len() == 3
        && let Some(info) = store.country_by_iso3(name)
    {
        candidates.insert(&info.iso);
    }

    for name_ref in gazetteer
        .lookup(&query_form(name))
        .iter()
        .filter(|r| r.kind == EntityKind::Country)
    {
        let info = store
            .country_by_geoname_id(name_ref.entity_id)
            .or_else(|| store.country(&name_ref.country_code));
        if let Some(info) = info {
            candidates.insert(&info.iso);
        }
    }

    match candidates.len() {
        0 => Err(ScrubError::NotFound(format!("no such country: {name:?}"))),
        1 => candidates
            .first()
            .and_then(|iso| store.country(iso))
            .ok_or_else(|| ScrubError::NotFound(format!("no such country: {name:?}"))),
        _ => {
            let isos: Vec<&str> = candidates.into_iter().collect();
            Err(ScrubError::AmbiguousCountry(format!(
                "{name:?} may refer to any of {}",
                isos.join(", ")
            )))
        }
    }
}

/// Resolves a country to its ISO alpha-2 code.
///
/// # Errors
///
/// See [`country_info`].
pub fn country_to_iso(gazetteer: &Gazetteer, name: &str) -> Result<String, ScrubError> {
    country_info(gazetteer, name).map(|info| info.iso.clone())
}

/// Returns `true` if `name` resolves to exactly one country.
#[must_use]
pub fn is_country(gazetteer: &Gazetteer, name: &str) -> bool {
    country_info(gazetteer, name).is_ok()
}

/// The name of a country in `language`, falling back to its English name.
///
/// # Errors
///
/// See [`country_info`].
pub fn norm_country(
    gazetteer: &Gazetteer,
    name: &str,
    language: &str,
) -> Result<String, ScrubError> {
    let info = country_info(gazetteer, name)?;
    let store = gazetteer.store();

    let localized = info
        .geoname_id
        .and_then(|id| store.get(id))
        .map(|entity| store.localized_name(entity, language).to_string());

    Ok(localized.unwrap_or_else(|| info.name.clone()))
}

/// Expands a country code or abbreviation to the country's English name.
///
/// # Errors
///
/// See [`country_info`].
pub fn expand_country(gazetteer: &Gazetteer, abbr: &str) -> Result<String, ScrubError> {
    country_info(gazetteer, abbr).map(|info| info.name.clone())
}
