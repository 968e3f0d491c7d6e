use anyhow::{Context, Result};
use cinerank_model::{Checkpoints, CleanedRecord, RawRecord};

pub mod normalize;

pub use normalize::{normalize, parse_year, CleanReport};

/// Clean the raw checkpoint and write the cleaned checkpoint.
pub fn clean(checkpoints: &Checkpoints) -> Result<Vec<CleanedRecord>> {
    let raw = checkpoints
        .read_raw()
        .context("Failed to read raw checkpoint")?;
    clean_records(&raw, checkpoints)
}

/// Clean an in-memory raw table and write the cleaned checkpoint.
pub fn clean_records(raw: &[RawRecord], checkpoints: &Checkpoints) -> Result<Vec<CleanedRecord>> {
    let (cleaned, report) = normalize(raw);
    tracing::info!(
        input = report.input,
        kept = report.kept,
        dropped = report.dropped(),
        missing_rank = report.missing_rank,
        missing_year = report.missing_year,
        missing_rating = report.missing_rating,
        missing_votes = report.missing_votes,
        "Cleaned records"
    );

    checkpoints
        .write_cleaned(&cleaned)
        .context("Failed to write cleaned checkpoint")?;
    Ok(cleaned)
}
