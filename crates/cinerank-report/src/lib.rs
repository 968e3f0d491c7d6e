use cinerank_model::CleanedRecord;
use std::path::PathBuf;

pub mod charts;
pub mod config;
pub mod stats;

pub use charts::{Chart, ChartError};
pub use config::{Figure, RenderConfig};
pub use stats::{decade_means, describe, Description, Summary};

/// Outcome of rendering every chart: the files written and the charts that
/// could not be drawn.
#[derive(Debug, Default)]
pub struct ReportOutcome {
    pub written: Vec<(Chart, PathBuf)>,
    pub failed: Vec<(Chart, ChartError)>,
}

impl ReportOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Render all three charts. A chart that fails is logged and recorded; the
/// remaining charts are still attempted.
pub fn render_all(records: &[CleanedRecord], config: &RenderConfig) -> ReportOutcome {
    let mut outcome = ReportOutcome::default();

    for chart in Chart::ALL {
        match charts::render(chart, records, config) {
            Ok(path) => {
                tracing::info!(chart = %chart, path = %path.display(), "Chart saved");
                outcome.written.push((chart, path));
            }
            Err(e) => {
                tracing::warn!(chart = %chart, error = %e, "Chart not rendered");
                outcome.failed.push((chart, e));
            }
        }
    }

    outcome
}
