// ringwatch/src/workers/cycles.rs
//
// Bounded elementary-circuit enumeration, Johnson style.
//
// Per root: a blocked set plus the unblock map B keep the search from
// re-exploring dead ends. Both the circuit search and the unblock
// propagation run on explicit stacks, so pathological inputs cannot exhaust
// the call stack. Neighbour order is the graph's first-seen order, which
// keeps output deterministic.
//
// Bounds:
//   - circuit length in [min_length, max_length]
//   - search depth <= dfs_depth_limit
//   - at most max_cycles distinct circuits recorded; truncated is set only
//     when a further distinct circuit is turned away
//
// With prune_same_layer an edge between two accounts on the same BFS layer
// is never followed. That can hide a genuine single-layer cycle; it is a
// recall/precision setting, not an accident.
//
// Circuits are deduplicated by their sorted member ids, so two circuits over
// the same accounts in a different order collapse to one.

use std::collections::HashSet;

use petgraph::graph::NodeIndex;
use tracing::{debug, warn};

use crate::config::CycleConfig;
use crate::events::Cycle;
use crate::state::graph::TransactionGraph;
use crate::state::metrics::Layering;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub cycles: Vec<Cycle>,
    /// Enumeration stopped at `max_cycles`; the list is not exhaustive.
    pub truncated: bool,
}

/// Sorted member ids joined with `|`.
pub fn cycle_signature(graph: &TransactionGraph, members: &[NodeIndex]) -> String {
    let mut ids: Vec<&str> = members.iter().map(|n| graph.account_id(*n)).collect();
    ids.sort_unstable();
    ids.join("|")
}

pub fn detect(graph: &TransactionGraph, layering: &Layering, cfg: &CycleConfig) -> CycleReport {
    let mut search = CircuitSearch::new(graph, layering, cfg);
    for root in graph.nodes() {
        if search.truncated { break; }
        search.run_from(root.index());
    }

    let truncated = search.truncated;
    if truncated {
        warn!(
            max_cycles = cfg.max_cycles,
            "Cycle enumeration hit its cap; results are best-effort within configured bounds"
        );
    }
    debug!("Cycle detector: {} distinct circuits", search.cycles.len());

    CycleReport { cycles: search.cycles, truncated }
}

struct Frame {
    node: usize,
    depth: usize,
    cursor: usize,
    found: bool,
}

impl Frame {
    fn new(node: usize, depth: usize) -> Self {
        Self { node, depth, cursor: 0, found: false }
    }
}

struct CircuitSearch<'a> {
    graph: &'a TransactionGraph,
    cfg: &'a CycleConfig,
    adjacency: Vec<Vec<usize>>,
    layers: Vec<Option<usize>>,
    blocked: Vec<bool>,
    b_map: Vec<Vec<usize>>,
    touched: Vec<usize>,
    path: Vec<usize>,
    signatures: HashSet<String>,
    cycles: Vec<Cycle>,
    truncated: bool,
}

impl<'a> CircuitSearch<'a> {
    fn new(graph: &'a TransactionGraph, layering: &Layering, cfg: &'a CycleConfig) -> Self {
        let n = graph.node_count();
        let adjacency = graph
            .nodes()
            .map(|v| graph.successors(v).map(|w| w.index()).collect())
            .collect();
        let layers = graph.nodes().map(|v| layering.layer(v)).collect();
        Self {
            graph,
            cfg,
            adjacency,
            layers,
            blocked: vec![false; n],
            b_map: vec![Vec::new(); n],
            touched: Vec::new(),
            path: Vec::with_capacity(cfg.max_length),
            signatures: HashSet::new(),
            cycles: Vec::new(),
            truncated: false,
        }
    }

    fn full(&self) -> bool {
        self.cycles.len() >= self.cfg.max_cycles
    }

    fn skip_edge(&self, from: usize, to: usize) -> bool {
        self.cfg.prune_same_layer
            && matches!((self.layers[from], self.layers[to]), (Some(a), Some(b)) if a == b)
    }

    fn reset(&mut self) {
        for v in self.touched.drain(..) {
            self.blocked[v] = false;
            self.b_map[v].clear();
        }
        self.path.clear();
    }

    fn block(&mut self, v: usize) {
        self.blocked[v] = true;
        self.touched.push(v);
    }

    fn unblock(&mut self, u: usize) {
        let mut pending = vec![u];
        while let Some(v) = pending.pop() {
            self.blocked[v] = false;
            for w in std::mem::take(&mut self.b_map[v]) {
                if self.blocked[w] {
                    pending.push(w);
                }
            }
        }
    }

    fn record(&mut self) {
        let len = self.path.len();
        if len < self.cfg.min_length || len > self.cfg.max_length {
            return;
        }
        let members: Vec<NodeIndex> = self.path.iter().map(|&v| NodeIndex::new(v)).collect();
        let signature = cycle_signature(self.graph, &members);
        if self.signatures.contains(&signature) {
            return;
        }
        if self.full() {
            self.truncated = true;
            return;
        }
        self.signatures.insert(signature);
        self.cycles.push(Cycle { members });
    }

    fn run_from(&mut self, root: usize) {
        self.reset();
        let mut frames = vec![Frame::new(root, 1)];
        self.path.push(root);
        self.block(root);

        while let Some(top) = frames.last_mut() {
            if self.truncated { break; }
            let v = top.node;
            let depth = top.depth;

            if let Some(&w) = self.adjacency[v].get(top.cursor) {
                top.cursor += 1;
                if self.skip_edge(v, w) {
                    continue;
                }
                if w == root {
                    top.found = true;
                    self.record();
                } else if !self.blocked[w] {
                    if self.path.len() < self.cfg.max_length && depth < self.cfg.dfs_depth_limit {
                        frames.push(Frame::new(w, depth + 1));
                        self.path.push(w);
                        self.block(w);
                    } else {
                        // Cut by a bound, not a dead end: v must stay unblockable.
                        top.found = true;
                    }
                }
                continue;
            }

            // All successors of v explored.
            let found = top.found;
            frames.pop();
            if found {
                self.unblock(v);
            } else {
                for i in 0..self.adjacency[v].len() {
                    let w = self.adjacency[v][i];
                    if !self.b_map[w].contains(&v) {
                        self.b_map[w].push(v);
                        self.touched.push(w);
                    }
                }
            }
            self.path.pop();
            if let Some(parent) = frames.last_mut() {
                parent.found |= found;
            }
        }
    }
}
