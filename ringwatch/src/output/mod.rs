pub mod adapter;
pub mod format;
pub mod graph_data;
pub mod writer;

pub use adapter::{adapt, ConsumerReport};
pub use format::{format_output, CanonicalReport, CanonicalRing, Summary};
pub use graph_data::{build_graph_data, GraphData};
pub use writer::{ReportWriter, RunRecord};

/// Round half away from zero to `places` decimals.
pub fn round_to(x: f64, places: i32) -> f64 {
    let f = 10f64.powi(places);
    (x * f).round() / f
}
