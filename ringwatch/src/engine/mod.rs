pub mod analyzer;
pub mod explain;
pub mod pipeline;
pub mod rings;
pub mod scoring;

pub use analyzer::{Analysis, Analyzer};
pub use pipeline::{run_pipeline, PipelineOutput};
