#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Resolution of free-text `(city, state, country)` references against a
//! [`Gazetteer`].
//!
//! A [`Resolver`] wraps an opened gazetteer and answers:
//!
//! - **scrub**: the single best city for a possibly incomplete or wrong
//!   query, with a confidence score and a status per field saying whether
//!   the supplied value was kept, corrected or inferred
//! - **`sc_scrub`**: the administrative division for a `(state, country)`
//!   pair, refusing to guess between equally good candidates
//! - **find / list**: every city matching a query, relaxing it until
//!   something matches
//! - country resolution and name predicates (`is_state`, `is_city`, ...)
//!
//! # Usage
//!
//! ```rust,no_run
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//!
//! use geoscrub_gazetteer::Gazetteer;
//! use geoscrub_scrub::Resolver;
//!
//! let gazetteer = Gazetteer::open("data/gazetteer.msgpack.zst")?;
//! let resolver = Resolver::new(Arc::new(gazetteer));
//!
//! if let Some(result) = resolver.scrub_sync(Some("Sydney"), Some("NSW"), Some("AU")).matched() {
//!     println!("{} ({}) {}", result.entity.name, result.entity.country_code, result.score);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cascade;
pub mod country;
pub mod dedup;
pub mod lookup;
pub mod normalize;
pub mod resolver;
pub mod states;
pub mod verify;

#[cfg(test)]
mod fixtures;

use std::sync::Arc;

use geoscrub_gazetteer::{Gazetteer, GazetteerError, SharedGazetteer};
use geoscrub_gazetteer_models::{
    CountryInfo, Entity, EntityKind, GazetteerConfig, Resolution, ScrubResult, StateScrubResult,
};

pub use cascade::{CASCADE, CascadeQuery, Tier};
pub use normalize::{NormalizedQuery, clean_nonalpha, normalize_query, scrub};

/// Errors from resolution operations.
///
/// Failing to find a good match is not an error; see [`Resolution`].
#[derive(Debug, thiserror::Error)]
pub enum ScrubError {
    /// A required argument was empty or unusable.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A name that had to resolve did not.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A country name matched more than one country.
    #[error("Ambiguous country: {0}")]
    AmbiguousCountry(String),

    /// Gazetteer error.
    #[error("Gazetteer error: {0}")]
    Gazetteer(#[from] GazetteerError),

    /// Async task join error.
    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Tuning for a [`Resolver`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResolverOptions {
    /// Collapse near-duplicate cities in [`Resolver::find`] results.
    pub dedup: bool,
    /// Cities closer than this are one place when deduplicating.
    pub cluster_threshold_km: f64,
    /// Language for [`Resolver::norm`] and friends when none is given.
    pub default_language: String,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self::from(&GazetteerConfig::default())
    }
}

impl From<&GazetteerConfig> for ResolverOptions {
    fn from(config: &GazetteerConfig) -> Self {
        Self {
            dedup: true,
            cluster_threshold_km: config.cluster_threshold_km,
            default_language: config.default_language.clone(),
        }
    }
}

/// Resolves place references against one gazetteer.
///
/// Cheap to clone; clones share the gazetteer.
#[derive(Debug, Clone)]
pub struct Resolver {
    gazetteer: Arc<Gazetteer>,
    options: ResolverOptions,
}

/// Any non-empty value counts as supplied, even if it cleans to nothing.
fn supplied(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.is_empty())
}

impl Resolver {
    /// Creates a resolver with default options.
    #[must_use]
    pub fn new(gazetteer: Arc<Gazetteer>) -> Self {
        Self::with_options(gazetteer, ResolverOptions::default())
    }

    /// Creates a resolver with explicit options.
    #[must_use]
    pub const fn with_options(gazetteer: Arc<Gazetteer>, options: ResolverOptions) -> Self {
        Self { gazetteer, options }
    }

    /// Creates a resolver over the current version of a shared gazetteer.
    /// Later swaps of `shared` do not affect this resolver.
    #[must_use]
    pub fn from_shared(shared: &SharedGazetteer, options: ResolverOptions) -> Self {
        Self::with_options(shared.current(), options)
    }

    /// The underlying gazetteer.
    #[must_use]
    pub fn gazetteer(&self) -> &Gazetteer {
        &self.gazetteer
    }

    /// The resolver options.
    #[must_use]
    pub const fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Normalizes a raw query without resolving it.
    #[must_use]
    pub fn normalize(
        &self,
        city: Option<&str>,
        state: Option<&str>,
        country: Option<&str>,
    ) -> NormalizedQuery {
        normalize_query(&self.gazetteer, city, state, country)
    }

    /// Finds the best city for `(city, state, country)`.
    ///
    /// Any field may be missing or wrong. An unresolvable country is
    /// ignored, as is a state that does not exist in the country.
    #[must_use]
    pub fn scrub_sync(
        &self,
        city: Option<&str>,
        state: Option<&str>,
        country: Option<&str>,
    ) -> Resolution<ScrubResult> {
        log::debug!("scrub: city: {city:?} state: {state:?} country: {country:?}");
        let query = self.normalize(city, state, country);
        log::debug!("scrub: normalized {query:?}");

        let prepared = CascadeQuery::new(
            &self.gazetteer,
            &query,
            supplied(state),
            supplied(country),
            self.options.cluster_threshold_km,
        );
        cascade::run(&self.gazetteer, &prepared)
    }

    /// Async wrapper around [`Self::scrub_sync`], dispatched to a
    /// blocking thread pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the blocking task panics.
    pub async fn scrub(
        &self,
        city: Option<String>,
        state: Option<String>,
        country: Option<String>,
    ) -> Result<Resolution<ScrubResult>, ScrubError> {
        let resolver = self.clone();
        Ok(tokio::task::spawn_blocking(move || {
            resolver.scrub_sync(city.as_deref(), state.as_deref(), country.as_deref())
        })
        .await?)
    }

    /// Finds the administrative division for `(state, country)`.
    #[must_use]
    pub fn sc_scrub(&self, state: &str, country: Option<&str>) -> Resolution<StateScrubResult> {
        let query = self.normalize(None, Some(state), country);
        states::sc_scrub(&self.gazetteer, &query.state, query.country.as_deref())
    }

    /// Normalizes a query for the listing operations, which insist on a
    /// city or state and on a resolvable country.
    fn listing_query(
        &self,
        city: Option<&str>,
        state: Option<&str>,
        country: Option<&str>,
    ) -> Result<NormalizedQuery, ScrubError> {
        let country = country.map(clean_nonalpha).filter(|c| !c.is_empty());
        if let Some(country) = country {
            country::country_to_iso(&self.gazetteer, country)?;
        }
        let query = self.normalize(city, state, country);
        if query.city.is_empty() && query.state.is_empty() {
            return Err(ScrubError::InvalidArgument(
                "city and state may not both be empty".to_string(),
            ));
        }
        Ok(query)
    }

    /// Every city matching `(city, state, country)`, relaxing the query
    /// until something matches; near-duplicates are collapsed unless
    /// disabled in the options.
    ///
    /// # Errors
    ///
    /// * [`ScrubError::InvalidArgument`] if city and state are both empty
    /// * any error from resolving the country
    pub fn find(
        &self,
        city: Option<&str>,
        state: Option<&str>,
        country: Option<&str>,
    ) -> Result<Vec<&Entity>, ScrubError> {
        self.find_with_dedup(city, state, country, self.options.dedup)
    }

    /// [`Self::find`] with explicit deduplication.
    ///
    /// # Errors
    ///
    /// See [`Self::find`].
    pub fn find_with_dedup(
        &self,
        city: Option<&str>,
        state: Option<&str>,
        country: Option<&str>,
        dedup: bool,
    ) -> Result<Vec<&Entity>, ScrubError> {
        let query = self.listing_query(city, state, country)?;
        Ok(resolver::find(
            &self.gazetteer,
            &query.city,
            Some(&query.state),
            query.country.as_deref(),
            dedup.then_some(self.options.cluster_threshold_km),
        ))
    }

    /// Like [`Self::find`] but also tries alternate spellings of the city
    /// and never deduplicates.
    ///
    /// # Errors
    ///
    /// See [`Self::find`].
    pub fn list(
        &self,
        city: Option<&str>,
        state: Option<&str>,
        country: Option<&str>,
    ) -> Result<Vec<&Entity>, ScrubError> {
        let query = self.listing_query(city, state, country)?;
        Ok(resolver::list(
            &self.gazetteer,
            &query.city,
            &query.alternates,
            Some(&query.state),
            query.country.as_deref(),
        ))
    }

    /// Returns `true` if any city matches `(city, state, country)`.
    ///
    /// # Errors
    ///
    /// See [`Self::find`].
    pub fn exists(
        &self,
        city: Option<&str>,
        state: Option<&str>,
        country: Option<&str>,
    ) -> Result<bool, ScrubError> {
        Ok(!self.find(city, state, country)?.is_empty())
    }

    /// First- to third-order divisions named `state`, most populous first.
    ///
    /// # Errors
    ///
    /// * [`ScrubError::InvalidArgument`] if `state` is empty
    /// * any error from resolving the country
    pub fn find_states(&self, state: &str, country: Option<&str>) -> Result<Vec<&Entity>, ScrubError> {
        let query = self.listing_query(None, Some(state), country)?;
        Ok(resolver::find_states(
            &self.gazetteer,
            &query.state,
            query.country.as_deref(),
        ))
    }

    /// Country metadata for a name, alias or ISO code.
    ///
    /// # Errors
    ///
    /// See [`country::country_info`].
    pub fn country_info(&self, name: &str) -> Result<&CountryInfo, ScrubError> {
        country::country_info(&self.gazetteer, name)
    }

    /// ISO alpha-2 code for a country name, alias or code.
    ///
    /// # Errors
    ///
    /// See [`country::country_info`].
    pub fn country_to_iso(&self, name: &str) -> Result<String, ScrubError> {
        country::country_to_iso(&self.gazetteer, name)
    }

    /// Returns `true` if `name` resolves to exactly one country.
    #[must_use]
    pub fn is_country(&self, name: &str) -> bool {
        country::is_country(&self.gazetteer, name)
    }

    /// A country's name in `language` (default language if `None`).
    ///
    /// # Errors
    ///
    /// See [`country::country_info`].
    pub fn norm_country(&self, name: &str, language: Option<&str>) -> Result<String, ScrubError> {
        country::norm_country(&self.gazetteer, name, self.language(language))
    }

    /// A country's English name from a code or abbreviation.
    ///
    /// # Errors
    ///
    /// See [`country::country_info`].
    pub fn expand_country(&self, abbr: &str) -> Result<String, ScrubError> {
        country::expand_country(&self.gazetteer, abbr)
    }

    /// Returns `true` if `state` names a division of `country`.
    ///
    /// # Errors
    ///
    /// See [`lookup::is_state`].
    pub fn is_state(&self, state: &str, country: &str) -> Result<bool, ScrubError> {
        lookup::is_state(&self.gazetteer, state, country)
    }

    /// Returns `true` if `name` is an entity of `kind` in `country`.
    /// Cities, divisions and postal areas are supported.
    ///
    /// # Errors
    ///
    /// Returns an error if the country does not resolve or `kind` is not
    /// supported.
    pub fn is_kind(&self, kind: EntityKind, country: &str, name: &str) -> Result<bool, ScrubError> {
        let g = &self.gazetteer;
        match kind {
            EntityKind::City => lookup::is_city(g, country, name),
            EntityKind::Admin1 => lookup::is_admin1(g, country, name),
            EntityKind::Admin2 => lookup::is_admin2(g, country, name),
            EntityKind::AdminDistrict => lookup::is_admind(g, country, name),
            EntityKind::PostalArea => lookup::is_ppc(g, country, name),
            other => Err(ScrubError::InvalidArgument(format!(
                "{other} is not a supported kind"
            ))),
        }
    }

    /// The name of the `kind` entity called `name` in `country`, in
    /// `language` (default language if `None`).
    ///
    /// # Errors
    ///
    /// See [`lookup::norm`].
    pub fn norm(
        &self,
        kind: EntityKind,
        country: &str,
        name: &str,
        language: Option<&str>,
    ) -> Result<String, ScrubError> {
        lookup::norm(&self.gazetteer, kind, country, name, self.language(language))
    }

    /// Entities abbreviated `abbr`, optionally within one country.
    ///
    /// # Errors
    ///
    /// Returns an error if a country is given and does not resolve.
    pub fn expand(&self, abbr: &str, country: Option<&str>) -> Result<Vec<&Entity>, ScrubError> {
        lookup::expand(&self.gazetteer, abbr, country)
    }

    /// The division at `level` (1..=4) containing `entity`.
    #[must_use]
    pub fn parent(&self, entity: &Entity, level: u8) -> Option<&Entity> {
        self.gazetteer.store().parent(entity, level)
    }

    /// Entities within `entity`, optionally of one kind, most populous
    /// first.
    #[must_use]
    pub fn children(&self, entity: &Entity, kind: Option<EntityKind>) -> Vec<&Entity> {
        self.gazetteer.store().children(entity, kind)
    }

    /// Returns `true` if `large` contains `small`.
    #[must_use]
    pub fn contains(&self, large: &Entity, small: &Entity) -> bool {
        large.contains(small)
    }

    /// Great-circle distance between two entities in kilometers.
    #[must_use]
    pub fn distance_km(&self, a: &Entity, b: &Entity) -> f64 {
        dedup::distance_km(a, b)
    }

    /// The name of `entity` in `language` (default language if `None`).
    #[must_use]
    pub fn localized_name<'a>(&'a self, entity: &'a Entity, language: Option<&'a str>) -> &'a str {
        self.gazetteer
            .store()
            .localized_name(entity, self.language(language))
    }

    fn language<'a>(&'a self, language: Option<&'a str>) -> &'a str {
        language.unwrap_or(&self.options.default_language)
    }
}
