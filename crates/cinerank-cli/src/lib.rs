pub mod pipeline;

pub use pipeline::{PipelineConfig, Report, RunSummary};
