//! The scoring cascade behind [`crate::Resolver::scrub`].
//!
//! A query is tried against an ordered list of tiers, each relaxing the
//! query a little further. The first tier whose candidates satisfy its
//! score policy wins; its score and the per-field statuses record how far
//! the query had to be relaxed.
//!
//! | Tier | Query | One candidate | Several |
//! |---|---|---|---|
//! | 1 | city, state, country | 0.9 O/O | 0.8 O/O |
//! | 2 | alternate city, state, country | 0.85 O/O | next alternate |
//! | 3 | city, country | 0.8 M or D/O | 0.4 M/O, or 0.5 D/O without state |
//! | 4 | state as city, country | 0.7 D/O | continue |
//! | 5 | city, state | 0.8 O/M or D | 0.4 O/M, or 0.5 O/D without country |
//! | 6 | city | 0.6 | 0.3 |
//!
//! In tier 6 a field is M if it was supplied and D otherwise.

use geoscrub_gazetteer::Gazetteer;
use geoscrub_gazetteer_models::{Entity, FieldStatus, Resolution, ScrubResult};

use crate::dedup::dedup;
use crate::lookup::has_state;
use crate::normalize::NormalizedQuery;
use crate::resolver::{cities_named, find_exact};

use FieldStatus::{Derived, Modified};

/// Score and statuses assigned by a tier.
type Verdict = (f64, FieldStatus, FieldStatus);

/// One tier of the cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// City within the state within the country.
    CityStateCountry,
    /// An alternate city spelling within the state within the country.
    AlternateCity,
    /// City within the country, ignoring the state.
    CityCountry,
    /// The state taken as a city within the country.
    StateAsCity,
    /// City within the state, ignoring the country.
    CityState,
    /// City anywhere.
    City,
}

/// The tiers in the order they are tried.
pub const CASCADE: [Tier; 6] = [
    Tier::CityStateCountry,
    Tier::AlternateCity,
    Tier::CityCountry,
    Tier::StateAsCity,
    Tier::CityState,
    Tier::City,
];

/// A normalized query plus the bookkeeping the tiers need.
pub struct CascadeQuery<'q> {
    city: &'q str,
    alternates: &'q [String],
    state: Option<&'q str>,
    country: Option<&'q str>,
    had_state: bool,
    had_country: bool,
    dedup_km: f64,
}

impl<'q> CascadeQuery<'q> {
    /// Prepares a query for the cascade.
    ///
    /// `had_state` and `had_country` say whether the caller supplied those
    /// fields at all, before normalization. A state that does not exist in
    /// the query's country is dropped here.
    #[must_use]
    pub fn new(
        gazetteer: &Gazetteer,
        query: &'q NormalizedQuery,
        had_state: bool,
        had_country: bool,
        dedup_km: f64,
    ) -> Self {
        let mut state = Some(query.state.as_str()).filter(|s| !s.is_empty());
        let country = query.country.as_deref();

        if let (Some(s), Some(c)) = (state, country)
            && !has_state(gazetteer, s, c)
        {
            log::info!("unable to find state {s:?} in country {c:?}, ignoring");
            state = None;
        }

        Self {
            city: &query.city,
            alternates: &query.alternates,
            state,
            country,
            had_state,
            had_country,
            dedup_km,
        }
    }
}

impl Tier {
    /// Tier number, starting at 1.
    #[must_use]
    pub fn number(self) -> usize {
        CASCADE.iter().position(|t| *t == self).map_or(0, |i| i + 1)
    }

    fn applies(self, q: &CascadeQuery<'_>) -> bool {
        let city = !q.city.is_empty();
        match self {
            Self::CityStateCountry => city && q.state.is_some() && q.country.is_some(),
            Self::AlternateCity => {
                !q.alternates.is_empty() && q.state.is_some() && q.country.is_some()
            }
            Self::CityCountry => city && q.country.is_some(),
            Self::StateAsCity => q.state.is_some() && q.country.is_some(),
            Self::CityState => city && q.state.is_some(),
            Self::City => city,
        }
    }

    fn candidates<'a>(self, gazetteer: &'a Gazetteer, q: &CascadeQuery<'_>) -> Vec<&'a Entity> {
        let found = match self {
            Self::CityStateCountry => find_exact(gazetteer, q.city, q.state, q.country),
            Self::AlternateCity => {
                for alt in q.alternates {
                    let found =
                        dedup(&find_exact(gazetteer, alt, q.state, q.country), q.dedup_km);
                    log::debug!("alternate {alt:?}: {} candidates", found.len());
                    if found.len() == 1 {
                        return found;
                    }
                }
                return Vec::new();
            }
            Self::CityCountry => find_exact(gazetteer, q.city, None, q.country),
            Self::StateAsCity => cities_named(gazetteer, q.state.unwrap_or_default(), q.country),
            Self::CityState => find_exact(gazetteer, q.city, q.state, None),
            Self::City => cities_named(gazetteer, q.city, None),
        };
        dedup(&found, q.dedup_km)
    }

    fn verdict(self, q: &CascadeQuery<'_>, count: usize) -> Option<Verdict> {
        let unique = count == 1;
        let supplied = |had: bool| if had { Modified } else { Derived };

        match self {
            Self::CityStateCountry => Some((
                if unique { 0.9 } else { 0.8 },
                FieldStatus::Ok,
                FieldStatus::Ok,
            )),
            Self::AlternateCity => unique.then_some((0.85, FieldStatus::Ok, FieldStatus::Ok)),
            Self::CityCountry => Some(if unique {
                (0.8, supplied(q.had_state), FieldStatus::Ok)
            } else if q.state.is_some() {
                (0.4, Modified, FieldStatus::Ok)
            } else {
                (0.5, Derived, FieldStatus::Ok)
            }),
            Self::StateAsCity => unique.then_some((0.7, Derived, FieldStatus::Ok)),
            Self::CityState => Some(if unique {
                (0.8, FieldStatus::Ok, supplied(q.country.is_some() || q.had_country))
            } else if q.country.is_some() {
                (0.4, FieldStatus::Ok, Modified)
            } else {
                (0.5, FieldStatus::Ok, Derived)
            }),
            Self::City => Some((
                if unique { 0.6 } else { 0.3 },
                supplied(q.had_state),
                supplied(q.had_country),
            )),
        }
    }
}

/// Runs the cascade.
///
/// Returns [`Resolution::NotFound`] if no tier produced a result. The
/// cascade always settles on the first candidate of a tier, so it never
/// reports [`Resolution::Ambiguous`].
#[must_use]
pub fn run(gazetteer: &Gazetteer, query: &CascadeQuery<'_>) -> Resolution<ScrubResult> {
    for tier in CASCADE {
        if !tier.applies(query) {
            continue;
        }

        let found = tier.candidates(gazetteer, query);
        log::debug!("tier {} ({tier:?}): {} candidates", tier.number(), found.len());

        let Some(first) = found.first() else {
            continue;
        };
        let Some((score, state_status, country_status)) = tier.verdict(query, found.len()) else {
            continue;
        };

        if found.len() > 1 {
            log::info!(
                "multiple matches ({}) for {:?} at tier {}, taking the most populous",
                found.len(),
                query.city,
                tier.number()
            );
        }

        let store = gazetteer.store();
        return Resolution::Matched(ScrubResult {
            entity: (*first).clone(),
            admin1_name: store.parent(first, 1).map(|e| e.name.clone()),
            admin2_name: store.parent(first, 2).map(|e| e.name.clone()),
            score,
            state_status,
            country_status,
            candidate_count: found.len(),
        });
    }

    Resolution::NotFound
}
