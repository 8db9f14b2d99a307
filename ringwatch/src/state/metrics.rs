// ringwatch/src/state/metrics.rs
//
// Per-account statistics plus a BFS layering used to prune detector search.
//
// Layering is an approximation, not a graph colouring: every unvisited node
// (first-seen order) roots a BFS that assigns hop distance; an edge that
// reaches an already-visited neighbour on the same layer as the current node
// pushes that neighbour one layer deeper.

use std::collections::VecDeque;

use petgraph::graph::NodeIndex;
use serde::Serialize;

use super::graph::TransactionGraph;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct NodeMetrics {
    pub fan_in: usize,
    pub fan_out: usize,
    pub degree: usize,
    pub total_in: f64,
    pub total_out: f64,
    /// Mean of outbound amounts.
    pub avg_out: f64,
    /// Population variance of outbound amounts.
    pub variance: f64,
    pub std_dev: f64,
    /// Inbound + outbound transfer count.
    pub tx_count: usize,
}

impl NodeMetrics {
    /// Coefficient of variation of outbound amounts; 0 when there is no mean.
    pub fn amount_cv(&self) -> f64 {
        if self.avg_out > 0.0 { self.std_dev / self.avg_out } else { 0.0 }
    }

    /// Outbound over inbound value; 0 when nothing came in.
    pub fn flow_ratio(&self) -> f64 {
        if self.total_in > 0.0 { self.total_out / self.total_in } else { 0.0 }
    }

    fn compute(graph: &TransactionGraph, node: NodeIndex) -> Self {
        let fan_in = graph.fan_in(node);
        let fan_out = graph.fan_out(node);

        let mut total_out = 0.0;
        let mut total_in = 0.0;
        let mut tx_count = 0;
        let mut amounts = Vec::new();

        for (_, bucket) in graph.out_edges(node) {
            for tx in bucket {
                total_out += tx.amount;
                amounts.push(tx.amount);
                tx_count += 1;
            }
        }
        for (_, bucket) in graph.in_edges(node) {
            for tx in bucket {
                total_in += tx.amount;
                tx_count += 1;
            }
        }

        let (avg_out, variance) = if amounts.is_empty() {
            (0.0, 0.0)
        } else {
            let n = amounts.len() as f64;
            let mean = amounts.iter().sum::<f64>() / n;
            let var = amounts.iter().map(|a| (a - mean).powi(2)).sum::<f64>() / n;
            (mean, var)
        };

        Self {
            fan_in,
            fan_out,
            degree: fan_in + fan_out,
            total_in,
            total_out,
            avg_out,
            variance,
            std_dev: variance.sqrt(),
            tx_count,
        }
    }
}

// ── Layering ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layering {
    layers: Vec<usize>,
    max_layer: usize,
}

impl Layering {
    pub fn compute(graph: &TransactionGraph) -> Self {
        let n = graph.node_count();
        let mut layers = vec![0usize; n];
        let mut visited = vec![false; n];
        let mut max_layer = 0;
        let mut queue: VecDeque<(NodeIndex, usize)> = VecDeque::new();

        for root in graph.nodes() {
            if visited[root.index()] { continue; }
            visited[root.index()] = true;
            layers[root.index()] = 0;
            queue.push_back((root, 0));

            while let Some((node, level)) = queue.pop_front() {
                for next in graph.successors(node) {
                    let ni = next.index();
                    if !visited[ni] {
                        visited[ni] = true;
                        layers[ni] = level + 1;
                        max_layer = max_layer.max(level + 1);
                        queue.push_back((next, level + 1));
                    } else if layers[ni] == layers[node.index()] {
                        layers[ni] += 1;
                        max_layer = max_layer.max(layers[ni]);
                    }
                }
            }
        }

        Self { layers, max_layer }
    }

    /// Build from explicit layer values, index = node index.
    pub fn from_layers(layers: Vec<usize>) -> Self {
        let max_layer = layers.iter().copied().max().unwrap_or(0);
        Self { layers, max_layer }
    }

    pub fn layer(&self, node: NodeIndex) -> Option<usize> {
        self.layers.get(node.index()).copied()
    }

    pub fn same_layer(&self, a: NodeIndex, b: NodeIndex) -> bool {
        matches!((self.layer(a), self.layer(b)), (Some(x), Some(y)) if x == y)
    }

    /// Highest layer assigned (`k`).
    pub fn max_layer(&self) -> usize { self.max_layer }
}

// ── Combined ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct GraphMetrics {
    metrics: Vec<NodeMetrics>,
    pub layering: Layering,
}

impl GraphMetrics {
    pub fn compute(graph: &TransactionGraph) -> Self {
        let metrics = graph.nodes().map(|n| NodeMetrics::compute(graph, n)).collect();
        Self { metrics, layering: Layering::compute(graph) }
    }

    /// Statistics for `node`; all-zero when the node is unknown.
    pub fn get(&self, node: NodeIndex) -> NodeMetrics {
        self.metrics.get(node.index()).copied().unwrap_or_default()
    }

    pub fn layer(&self, node: NodeIndex) -> Option<usize> {
        self.layering.layer(node)
    }
}
