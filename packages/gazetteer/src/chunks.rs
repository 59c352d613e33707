//! Chunked CSV checkpoints for long geocoding runs.
//!
//! A full catalog run takes many hours under the rate limit, so results
//! are flushed to `geocoded_locations_q{N}.csv` files every
//! [`CHUNK_SIZE`] mentions. A restarted run scans the checkpoint
//! directory and resumes past the last complete chunk; a partial chunk
//! in memory at interruption is re-geocoded.

use std::fs;
use std::path::{Path, PathBuf};

use crate::GazetteerError;
use crate::resolver::GeocodedCandidate;

/// Mentions per checkpoint file.
pub const CHUNK_SIZE: usize = 150;

const CHUNK_PREFIX: &str = "geocoded_locations_q";

/// Path of the checkpoint file for a 1-based chunk index.
#[must_use]
pub fn chunk_path(dir: &Path, index: usize) -> PathBuf {
    dir.join(format!("{CHUNK_PREFIX}{index}.csv"))
}

/// Writes one chunk of resolved mentions.
///
/// # Errors
///
/// Returns an error if the file cannot be created or a row cannot be
/// encoded.
pub fn write_chunk(
    dir: &Path,
    index: usize,
    rows: &[GeocodedCandidate],
) -> Result<(), GazetteerError> {
    let path = chunk_path(dir, index);
    let mut writer = csv::Writer::from_path(&path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    log::info!("Checkpointed {} mentions to {}", rows.len(), path.display());
    Ok(())
}

/// How many mentions a previous run already resolved.
///
/// Scans the checkpoint directory for chunk files and returns the
/// highest chunk index times [`CHUNK_SIZE`]. The caller skips that many
/// mentions before geocoding resumes.
///
/// # Errors
///
/// Returns an error if the directory cannot be read.
pub fn resume_offset(dir: &Path) -> Result<usize, GazetteerError> {
    Ok(highest_chunk_index(dir)?.map_or(0, |n| n * CHUNK_SIZE))
}

/// Reads every checkpoint chunk back, in chunk order.
///
/// # Errors
///
/// Returns an error on I/O or CSV decoding failure.
pub fn read_all(dir: &Path) -> Result<Vec<GeocodedCandidate>, GazetteerError> {
    let Some(highest) = highest_chunk_index(dir)? else {
        return Ok(Vec::new());
    };

    let mut rows = Vec::new();
    for index in 1..=highest {
        let path = chunk_path(dir, index);
        if !path.exists() {
            log::warn!("Checkpoint gap: {} is missing", path.display());
            continue;
        }
        let mut reader = csv::Reader::from_path(&path)?;
        for row in reader.deserialize() {
            rows.push(row?);
        }
    }
    Ok(rows)
}

fn highest_chunk_index(dir: &Path) -> Result<Option<usize>, GazetteerError> {
    let mut highest = None;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(index) = name
            .to_str()
            .and_then(|n| n.strip_prefix(CHUNK_PREFIX))
            .and_then(|n| n.strip_suffix(".csv"))
            .and_then(|n| n.parse::<usize>().ok())
        else {
            continue;
        };
        highest = Some(highest.map_or(index, |h: usize| h.max(index)));
    }
    Ok(highest)
}
