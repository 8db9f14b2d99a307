// ringwatch/src/state/graph.rs
//
// Directed transfer multigraph, built once per batch and read-only after.
//
// Design:
//   - petgraph DiGraph: node weight = account id, edge weight = EdgeBucket.
//     One edge per ordered (sender, receiver) pair; the bucket holds every
//     transfer between them in input order.
//   - Forward and reverse adjacency lists hold the same EdgeIndex, so both
//     directions read the same bucket with no duplication.
//   - Node and neighbour order is first-seen order. Layering, detectors and
//     ring ids all depend on it, so nothing here iterates a hash container.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};

use crate::events::{EdgeBucket, Transaction, TxRecord};

#[derive(Debug, Default)]
pub struct TransactionGraph {
    graph: DiGraph<String, EdgeBucket>,
    index: HashMap<String, NodeIndex>,
    outgoing: Vec<Vec<(NodeIndex, EdgeIndex)>>,
    incoming: Vec<Vec<(NodeIndex, EdgeIndex)>>,
    n_transactions: usize,
}

impl TransactionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(transactions: &[Transaction]) -> Self {
        let mut graph = Self::new();
        for tx in transactions {
            graph.ingest(tx);
        }
        graph
    }

    /// Add one transfer. Both endpoints are created on first sight.
    pub fn ingest(&mut self, tx: &Transaction) {
        let from = self.get_or_add_node(&tx.sender_id);
        let to = self.get_or_add_node(&tx.receiver_id);
        let record = TxRecord { amount: tx.amount, timestamp: tx.timestamp };

        match self.graph.find_edge(from, to) {
            Some(edge) => self.graph[edge].push(record),
            None => {
                let edge = self.graph.add_edge(from, to, vec![record]);
                self.outgoing[from.index()].push((to, edge));
                self.incoming[to.index()].push((from, edge));
            }
        }
        self.n_transactions += 1;
    }

    fn get_or_add_node(&mut self, account_id: &str) -> NodeIndex {
        if let Some(&node) = self.index.get(account_id) {
            return node;
        }
        let node = self.graph.add_node(account_id.to_string());
        self.index.insert(account_id.to_string(), node);
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        node
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    pub fn node_count(&self) -> usize { self.graph.node_count() }
    pub fn edge_count(&self) -> usize { self.graph.edge_count() }
    pub fn transaction_count(&self) -> usize { self.n_transactions }
    pub fn is_empty(&self) -> bool { self.graph.node_count() == 0 }

    /// All accounts in first-seen order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    pub fn account_id(&self, node: NodeIndex) -> &str {
        self.graph.node_weight(node).map(String::as_str).unwrap_or_default()
    }

    pub fn node(&self, account_id: &str) -> Option<NodeIndex> {
        self.index.get(account_id).copied()
    }

    pub fn successors(&self, node: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.out_slice(node).iter().map(|(n, _)| *n)
    }

    pub fn predecessors(&self, node: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.in_slice(node).iter().map(|(n, _)| *n)
    }

    /// Outbound (receiver, bucket) pairs in first-seen order.
    pub fn out_edges(&self, node: NodeIndex) -> impl Iterator<Item = (NodeIndex, &EdgeBucket)> + '_ {
        self.out_slice(node).iter().map(|(n, e)| (*n, &self.graph[*e]))
    }

    /// Inbound (sender, bucket) pairs in first-seen order.
    pub fn in_edges(&self, node: NodeIndex) -> impl Iterator<Item = (NodeIndex, &EdgeBucket)> + '_ {
        self.in_slice(node).iter().map(|(n, e)| (*n, &self.graph[*e]))
    }

    /// Distinct outbound counterparties.
    pub fn fan_out(&self, node: NodeIndex) -> usize { self.out_slice(node).len() }

    /// Distinct inbound counterparties.
    pub fn fan_in(&self, node: NodeIndex) -> usize { self.in_slice(node).len() }

    pub fn has_edge(&self, from: NodeIndex, to: NodeIndex) -> bool {
        self.graph.find_edge(from, to).is_some()
    }

    fn out_slice(&self, node: NodeIndex) -> &[(NodeIndex, EdgeIndex)] {
        self.outgoing.get(node.index()).map(Vec::as_slice).unwrap_or_default()
    }

    fn in_slice(&self, node: NodeIndex) -> &[(NodeIndex, EdgeIndex)] {
        self.incoming.get(node.index()).map(Vec::as_slice).unwrap_or_default()
    }
}
