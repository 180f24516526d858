//! Gazetteer snapshot persistence.
//!
//! A snapshot is a `MessagePack` header followed by the store and the name
//! index, the whole stream `zstd`-compressed. Snapshots are written to a
//! temporary file first and renamed into place, so an interrupted write
//! never leaves a truncated snapshot behind.

use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Gazetteer;
use crate::name_index::NameIndex;
use crate::store::{EntityStore, StoreParts};

/// Bumped whenever the snapshot layout changes.
pub const FORMAT_VERSION: u32 = 1;

/// zstd compression level.
const ZSTD_LEVEL: i32 = 3;

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotHeader {
    format_version: u32,
    built_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct SnapshotBodyRef<'a> {
    store: &'a StoreParts,
    index: &'a NameIndex,
}

#[derive(Deserialize)]
struct SnapshotBody {
    store: StoreParts,
    index: NameIndex,
}

/// Writes `gazetteer` to `path`.
///
/// Returns the snapshot size in bytes.
///
/// # Errors
///
/// Returns an error if the file cannot be written or encoding fails.
pub fn save(gazetteer: &Gazetteer, path: &Path) -> Result<u64, SnapshotError> {
    log::info!("Writing gazetteer snapshot to {}", path.display());

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| SnapshotError::Io {
            path: parent.display().to_string(),
            source: e,
        })?;
    }

    let tmp_path = path.with_extension("tmp");
    let io_err = |e| SnapshotError::Io {
        path: tmp_path.display().to_string(),
        source: e,
    };

    let file = std::fs::File::create(&tmp_path).map_err(io_err)?;
    let mut encoder = zstd::Encoder::new(BufWriter::new(file), ZSTD_LEVEL).map_err(io_err)?;

    let header = SnapshotHeader {
        format_version: FORMAT_VERSION,
        built_at: gazetteer.built_at(),
    };
    let parts = gazetteer.store().to_parts();
    rmp_serde::encode::write(&mut encoder, &header)?;
    rmp_serde::encode::write(
        &mut encoder,
        &SnapshotBodyRef {
            store: &parts,
            index: gazetteer.index(),
        },
    )?;

    let mut writer = encoder.finish().map_err(io_err)?;
    writer.flush().map_err(io_err)?;
    drop(writer);

    std::fs::rename(&tmp_path, path).map_err(|e| SnapshotError::Io {
        path: path.display().to_string(),
        source: e,
    })?;

    let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);

    #[allow(clippy::cast_precision_loss)]
    let mb = size as f64 / 1_048_576.0;
    log::info!("  snapshot size: {mb:.1} MB");

    Ok(size)
}

/// Reads a gazetteer from `path`.
///
/// # Errors
///
/// Returns an error if the file does not exist, was written by an
/// incompatible version, or cannot be decoded.
pub fn load(path: &Path) -> Result<Gazetteer, SnapshotError> {
    if !path.exists() {
        return Err(SnapshotError::NotFound(path.display().to_string()));
    }

    log::info!("Opening gazetteer snapshot at {}", path.display());

    let file = std::fs::File::open(path).map_err(|e| SnapshotError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let mut decoder = zstd::Decoder::new(BufReader::new(file)).map_err(|e| SnapshotError::Io {
        path: path.display().to_string(),
        source: e,
    })?;

    let header: SnapshotHeader = rmp_serde::decode::from_read(&mut decoder)?;
    if header.format_version != FORMAT_VERSION {
        return Err(SnapshotError::Incompatible {
            found: header.format_version,
            expected: FORMAT_VERSION,
        });
    }

    let body: SnapshotBody = rmp_serde::decode::from_read(&mut decoder)?;
    let store = EntityStore::from_parts(body.store);

    log::info!(
        "  {} entities, {} index keys, built {}",
        store.len(),
        body.index.len(),
        header.built_at
    );

    Ok(Gazetteer::with_built_at(store, body.index, header.built_at))
}

/// Errors from snapshot operations.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Encoding failed.
    #[error("Snapshot encode error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    /// Decoding failed.
    #[error("Snapshot decode error: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    /// The snapshot file does not exist.
    #[error("Snapshot not found: {0}")]
    NotFound(String),

    /// The snapshot was written with a different layout.
    #[error("Snapshot format {found} is not supported (expected {expected}); rebuild the gazetteer")]
    Incompatible {
        /// Version found in the file.
        found: u32,
        /// Version this build reads.
        expected: u32,
    },
}
