use anyhow::{Context, Result};
use cinerank_acquire::{Acquired, FetchConfig, Source};
use cinerank_model::{Checkpoints, CleanedRecord};
use cinerank_report::{describe, render_all, Description, RenderConfig, ReportOutcome};
use std::path::{Path, PathBuf};

/// Where a run reads and writes, and how it fetches and draws.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub output_dir: PathBuf,
    pub fetch: FetchConfig,
    pub render: RenderConfig,
}

impl PipelineConfig {
    pub fn new(output_dir: impl AsRef<Path>, fetch: FetchConfig) -> Self {
        let output_dir = output_dir.as_ref().to_path_buf();
        PipelineConfig {
            render: RenderConfig::in_dir(&output_dir),
            output_dir,
            fetch,
        }
    }

    pub fn checkpoints(&self) -> Checkpoints {
        Checkpoints::in_dir(&self.output_dir)
    }
}

/// What the Reporter produced for one cleaned table.
#[derive(Debug)]
pub struct Report {
    pub total: usize,
    /// `None` when the cleaned table is empty.
    pub description: Option<Description>,
    pub charts: ReportOutcome,
}

/// Result of a full run.
#[derive(Debug)]
pub struct RunSummary {
    pub source: Source,
    pub raw_rows: usize,
    pub cleaned: Vec<CleanedRecord>,
    pub report: Report,
}

/// Fetch and extract the listing into the raw checkpoint, falling back to
/// the existing raw checkpoint when the fetch fails.
pub async fn fetch(config: &PipelineConfig) -> Result<Acquired> {
    let checkpoints = config.checkpoints();
    let acquired = cinerank_acquire::acquire(&config.fetch, &checkpoints)
        .await
        .context("Failed to acquire the raw table")?;

    match &acquired.source {
        Source::Live { url, fetched_at } => tracing::info!(
            url = %url,
            fetched_at = %fetched_at.to_rfc3339(),
            rows = acquired.records.len(),
            "Raw table from live listing"
        ),
        Source::Checkpoint { path, cause } => tracing::warn!(
            path = %path.display(),
            cause = %cause,
            rows = acquired.records.len(),
            "Raw table from earlier checkpoint"
        ),
    }
    Ok(acquired)
}

/// Raw checkpoint to cleaned checkpoint.
pub fn clean(config: &PipelineConfig) -> Result<Vec<CleanedRecord>> {
    cinerank_clean::clean(&config.checkpoints())
}

/// Describe and chart a cleaned table.
pub fn report(config: &PipelineConfig, cleaned: &[CleanedRecord]) -> Report {
    let description = describe(cleaned);
    if description.is_none() {
        tracing::warn!("Cleaned table is empty, nothing to describe");
    }

    let charts = render_all(cleaned, &config.render);
    tracing::info!(
        written = charts.written.len(),
        failed = charts.failed.len(),
        "Charts rendered"
    );

    Report {
        total: cleaned.len(),
        description,
        charts,
    }
}

/// Read the cleaned checkpoint, then describe and chart it.
pub fn report_from_checkpoint(config: &PipelineConfig) -> Result<Report> {
    let cleaned = config
        .checkpoints()
        .read_cleaned()
        .context("Failed to read cleaned checkpoint")?;
    Ok(report(config, &cleaned))
}

/// Fetch, clean, and report in one pass.
///
/// Fails only when acquisition fails with no fallback or a checkpoint
/// cannot be written; chart failures are recorded in the returned report.
pub async fn run(config: &PipelineConfig) -> Result<RunSummary> {
    let acquired = fetch(config).await?;
    let cleaned = cinerank_clean::clean_records(&acquired.records, &config.checkpoints())?;
    let report = report(config, &cleaned);

    Ok(RunSummary {
        source: acquired.source,
        raw_rows: acquired.records.len(),
        cleaned,
        report,
    })
}
