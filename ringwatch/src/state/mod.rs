pub mod cache;
pub mod graph;
pub mod metrics;

use tracing::info;

use crate::events::Transaction;
use graph::TransactionGraph;
use metrics::GraphMetrics;

/// Immutable per-batch state shared read-only by every detector.
#[derive(Debug, Default)]
pub struct GraphSnapshot {
    pub graph: TransactionGraph,
    pub metrics: GraphMetrics,
}

impl GraphSnapshot {
    pub fn build(transactions: &[Transaction]) -> Self {
        let graph = TransactionGraph::build(transactions);
        let metrics = GraphMetrics::compute(&graph);
        info!(
            accounts = graph.node_count(),
            edges = graph.edge_count(),
            "Layered colouring complete. k = {}",
            metrics.layering.max_layer()
        );
        Self { graph, metrics }
    }
}
