#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Gazetteer entity store and multilingual name index.
//!
//! Built once from `GeoNames` dumps and then read-only.
//!
//! # Architecture
//!
//! - **Build time**: country metadata, geonames rows, alternate names and
//!   postal codes are read into an [`EntityStore`]. Alternate names are
//!   filtered by language, a [`NameExpansion`] adds derived names, and
//!   every name is written to the [`NameIndex`] in lowercased form.
//! - **Query time**: callers look names up in the index and resolve the
//!   references through the store.
//! - **Persistence**: the store and index are written as a single
//!   zstd-compressed `MessagePack` snapshot.
//!
//! # Usage
//!
//! ```rust,no_run
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use geoscrub_gazetteer::Gazetteer;
//!
//! let gazetteer = Gazetteer::open("data/gazetteer.msgpack.zst")?;
//! for entity in gazetteer.entities_named("sydney", None, Some("AU")) {
//!     println!("{} ({})", entity.name, entity.population);
//! }
//! # Ok(())
//! # }
//! ```

pub mod build;
pub mod config;
pub mod expansion;
pub mod geonames;
pub mod name_index;
pub mod paths;
pub mod progress;
pub mod snapshot;
pub mod store;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use geoscrub_gazetteer_models::{Entity, EntityKind, GazetteerConfig, IndexStats, NameRef};

pub use build::{BuildSources, GazetteerBuilder};
pub use expansion::{DerivedName, EnglishVariants, ExpansionContext, NameExpansion, NoExpansion};
pub use name_index::NameIndex;
pub use progress::{BuildProgress, NullProgress};
pub use store::EntityStore;

/// Errors from gazetteer operations.
#[derive(Debug, thiserror::Error)]
pub enum GazetteerError {
    /// `GeoNames` dump error.
    #[error("GeoNames error: {0}")]
    Geonames(#[from] geonames::GeonamesError),

    /// Snapshot error.
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] snapshot::SnapshotError),

    /// Config file could not be parsed.
    #[error("Invalid config {path}: {source}")]
    Config {
        /// Path of the config file.
        path: String,
        /// Underlying TOML error.
        source: toml::de::Error,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Async task join error.
    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Generic error.
    #[error("{0}")]
    Other(String),
}

/// An opened gazetteer: the entity store plus its name index.
#[derive(Debug, Clone)]
pub struct Gazetteer {
    store: EntityStore,
    index: NameIndex,
    built_at: DateTime<Utc>,
}

impl Gazetteer {
    /// Wraps a store and its index, stamped with the current time.
    #[must_use]
    pub fn new(store: EntityStore, index: NameIndex) -> Self {
        Self::with_built_at(store, index, Utc::now())
    }

    /// Wraps a store and its index with an explicit build time.
    #[must_use]
    pub const fn with_built_at(
        store: EntityStore,
        index: NameIndex,
        built_at: DateTime<Utc>,
    ) -> Self {
        Self {
            store,
            index,
            built_at,
        }
    }

    /// Opens a snapshot previously written by [`Self::save`].
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot is missing, unreadable, or was
    /// written by an incompatible version.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, GazetteerError> {
        Ok(snapshot::load(path.as_ref())?)
    }

    /// Writes this gazetteer as a snapshot. Returns the size in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<u64, GazetteerError> {
        Ok(snapshot::save(self, path.as_ref())?)
    }

    /// The entity store.
    #[must_use]
    pub const fn store(&self) -> &EntityStore {
        &self.store
    }

    /// The name index.
    #[must_use]
    pub const fn index(&self) -> &NameIndex {
        &self.index
    }

    /// When this gazetteer was built.
    #[must_use]
    pub const fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    /// Index references under `name`.
    #[must_use]
    pub fn lookup(&self, name: &str) -> &[NameRef] {
        self.index.lookup(name)
    }

    /// Entities carrying `name`, optionally restricted to one kind and
    /// country, each listed once, most populous first.
    #[must_use]
    pub fn entities_named(
        &self,
        name: &str,
        kind: Option<EntityKind>,
        country_code: Option<&str>,
    ) -> Vec<&Entity> {
        self.resolve_refs(self.index.lookup(name).iter().filter(|r| {
            kind.is_none_or(|k| r.kind == k) && country_code.is_none_or(|cc| r.country_code == cc)
        }))
    }

    /// Entities with an abbreviation or short name equal to `abbr`,
    /// optionally restricted to one country, most populous first.
    #[must_use]
    pub fn expand(&self, abbr: &str, country_code: Option<&str>) -> Vec<&Entity> {
        self.resolve_refs(self.index.lookup(abbr).iter().filter(|r| {
            country_code.is_none_or(|cc| r.country_code == cc)
                && r
                    .alt_name_id
                    .and_then(|id| self.store.alternate_name(id))
                    .is_some_and(|alt| alt.is_abbreviation() || alt.is_short)
        }))
    }

    fn resolve_refs<'a>(&'a self, refs: impl Iterator<Item = &'a NameRef>) -> Vec<&'a Entity> {
        let mut seen = BTreeSet::new();
        let mut entities: Vec<&Entity> = refs
            .filter(|r| seen.insert(r.entity_id))
            .filter_map(|r| self.store.get(r.entity_id))
            .collect();
        entities.sort_by(|a, b| b.population.cmp(&a.population).then(a.id.cmp(&b.id)));
        entities
    }
}

/// A gazetteer handle that can be swapped for a rebuilt one while readers
/// keep using the version they started with.
#[derive(Debug, Clone)]
pub struct SharedGazetteer {
    inner: Arc<RwLock<Arc<Gazetteer>>>,
}

impl SharedGazetteer {
    /// Wraps a gazetteer.
    #[must_use]
    pub fn new(gazetteer: Gazetteer) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(gazetteer))),
        }
    }

    /// The current gazetteer.
    #[must_use]
    pub fn current(&self) -> Arc<Gazetteer> {
        let guard = self
            .inner
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Replaces the current gazetteer, returning the previous one.
    pub fn replace(&self, gazetteer: Gazetteer) -> Arc<Gazetteer> {
        let mut guard = self
            .inner
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        std::mem::replace(&mut *guard, Arc::new(gazetteer))
    }

    /// Reopens the snapshot at `path` and swaps it in.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be opened; the current
    /// gazetteer stays in place.
    pub async fn reload(&self, path: &Path) -> Result<(), GazetteerError> {
        let path = path.to_path_buf();
        let gazetteer = tokio::task::spawn_blocking(move || Gazetteer::open(path)).await??;
        self.replace(gazetteer);
        Ok(())
    }
}

/// Builds a gazetteer from dump files and writes it as a snapshot.
///
/// This is an async wrapper around [`build::build_from_sources`],
/// dispatched to a blocking thread pool.
///
/// # Errors
///
/// Returns an error if a dump cannot be read or the snapshot cannot be
/// written.
pub async fn build_snapshot(
    snapshot_path: &Path,
    sources: BuildSources,
    config: GazetteerConfig,
    expansion: Arc<dyn NameExpansion>,
    progress: Arc<dyn BuildProgress>,
) -> Result<IndexStats, GazetteerError> {
    let snapshot_path: PathBuf = snapshot_path.to_path_buf();

    tokio::task::spawn_blocking(move || {
        let (gazetteer, stats) = build::build_from_sources(
            &sources,
            &config,
            expansion.as_ref(),
            progress.as_ref(),
        )?;
        gazetteer.save(&snapshot_path)?;
        Ok(stats)
    })
    .await?
}
