// ringwatch/src/lib.rs
//
// ringwatch: batch fraud-ring detection over a directed transaction graph.
//
//   transactions ─► state (graph, metrics, layering)
//                ─► workers (cycle / smurf / shell, concurrent)
//                ─► filters (merchant / payroll)
//                ─► engine (rings, scoring, explanations)
//                ─► output (canonical report, consumer report, graph view)

pub mod config;
pub mod engine;
pub mod error;
pub mod eval;
pub mod events;
pub mod filters;
pub mod output;
pub mod source;
pub mod state;
pub mod workers;

pub use config::DetectionConfig;
pub use engine::{run_pipeline, Analysis, Analyzer, PipelineOutput};
pub use error::{PipelineError, Result};
pub use events::Transaction;
