pub mod extract;
pub mod fetch;
pub mod normalize;

use chrono::{DateTime, Utc};
use cinerank_model::{CheckpointError, Checkpoints, RawRecord};
use std::path::PathBuf;
use thiserror::Error;

pub use extract::{ExtractionReport, RecordOutcome, SkipReason};
pub use fetch::{FetchConfig, FetchError};

/// Where the raw table of a run came from.
#[derive(Debug, Clone)]
pub enum Source {
    /// Freshly fetched and extracted from the listing page.
    Live {
        url: String,
        fetched_at: DateTime<Utc>,
    },
    /// Loaded from the raw checkpoint of an earlier run after the fetch failed.
    Checkpoint { path: PathBuf, cause: String },
}

/// The raw table handed to the Normalizer.
#[derive(Debug, Clone)]
pub struct Acquired {
    pub records: Vec<RawRecord>,
    pub source: Source,
    /// Container tally; only present for a live fetch.
    pub report: Option<ExtractionReport>,
}

#[derive(Debug, Error)]
pub enum AcquireError {
    #[error("scraping {url} failed and no cached table exists at {}", path.display())]
    NoFallback {
        url: String,
        path: PathBuf,
        #[source]
        cause: FetchError,
    },

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
}

/// Fetch and extract the listing, or fall back to the raw checkpoint.
///
/// On a successful fetch the extracted table overwrites the raw checkpoint.
/// When the fetch fails the existing raw checkpoint is loaded unchanged; if
/// there is none the run cannot continue and [`AcquireError::NoFallback`]
/// is returned.
pub async fn acquire(
    config: &FetchConfig,
    checkpoints: &Checkpoints,
) -> Result<Acquired, AcquireError> {
    tracing::info!(url = %config.url, "Fetching listing page");

    let cause = match fetch::fetch_listing(config).await {
        Ok(html) => {
            let fetched_at = Utc::now();
            tracing::info!(bytes = html.len(), "Received HTML");

            let extraction = extract::extract_listing(&html);
            let report = extraction.report;
            tracing::info!(
                containers = report.containers,
                extracted = report.extracted,
                skipped = report.skipped(),
                "Extracted records"
            );

            checkpoints.write_raw(&extraction.records)?;
            return Ok(Acquired {
                records: extraction.records,
                source: Source::Live {
                    url: config.url.clone(),
                    fetched_at,
                },
                report: Some(report),
            });
        }
        Err(cause) => cause,
    };

    tracing::warn!(error = %cause, "Fetch failed, loading raw checkpoint instead");
    match checkpoints.read_raw() {
        Ok(records) => Ok(Acquired {
            records,
            source: Source::Checkpoint {
                path: checkpoints.raw.clone(),
                cause: cause.to_string(),
            },
            report: None,
        }),
        Err(CheckpointError::Missing(path)) => Err(AcquireError::NoFallback {
            url: config.url.clone(),
            path,
            cause,
        }),
        Err(e) => Err(e.into()),
    }
}
