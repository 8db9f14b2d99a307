// ringwatch/src/engine/rings.rs
//
// Priority-claimed ring assembly. One sequential pass, one claim table:
//
//   1. cycles, longest first. A cycle whose every edge is already covered by
//      an accepted cycle ring, or whose member set repeats one, is skipped.
//   2. smurf hubs not yet claimed: ring = direct senders + the hub.
//   3. shell chains: ring = the whole chain, opened only when at least one
//      member is still unclaimed.
//
// Merchant and payroll accounts never open a ring and never take a claim,
// though they may stay listed inside a ring's member list. A claimed account
// is never moved to a later ring.

use std::collections::HashSet;

use petgraph::graph::NodeIndex;
use tracing::debug;

use crate::events::{PatternType, Ring};
use crate::filters::BehaviorMap;
use crate::state::graph::TransactionGraph;
use crate::workers::cycles::cycle_signature;
use crate::workers::DetectorOutputs;

#[derive(Debug, Clone, Default)]
pub struct RingAssembly {
    pub rings: Vec<Ring>,
    owner: Vec<Option<usize>>,
}

impl RingAssembly {
    /// Ring that claimed `node`, if any.
    pub fn ring_of(&self, node: NodeIndex) -> Option<&Ring> {
        self.owner
            .get(node.index())
            .copied()
            .flatten()
            .and_then(|i| self.rings.get(i))
    }

    pub fn is_claimed(&self, node: NodeIndex) -> bool {
        matches!(self.owner.get(node.index()), Some(Some(_)))
    }
}

pub struct RingAssembler<'a> {
    graph: &'a TransactionGraph,
    behavior: &'a BehaviorMap,
    rings: Vec<Ring>,
    owner: Vec<Option<usize>>,
}

impl<'a> RingAssembler<'a> {
    pub fn new(graph: &'a TransactionGraph, behavior: &'a BehaviorMap) -> Self {
        Self {
            graph,
            behavior,
            rings: Vec::new(),
            owner: vec![None; graph.node_count()],
        }
    }

    pub fn assemble(mut self, outputs: &DetectorOutputs) -> RingAssembly {
        self.cycle_rings(outputs);
        self.smurf_rings(outputs);
        self.shell_rings(outputs);

        debug!(
            rings = self.rings.len(),
            claimed = self.owner.iter().filter(|o| o.is_some()).count(),
            "Ring assembly complete"
        );
        RingAssembly { rings: self.rings, owner: self.owner }
    }

    fn unclaimed(&self, node: NodeIndex) -> bool {
        self.owner[node.index()].is_none() && !self.behavior.is_filtered(node)
    }

    fn open(&mut self, members: Vec<NodeIndex>, pattern: PatternType, claims: &[NodeIndex]) {
        let idx = self.rings.len();
        for &n in claims {
            self.owner[n.index()] = Some(idx);
        }
        self.rings.push(Ring {
            ring_id: format!("RING_{:03}", idx + 1),
            members,
            pattern,
            risk_score: 0.0,
        });
    }

    // ── 1. Cycles ─────────────────────────────────────────────────────────────

    fn cycle_rings(&mut self, outputs: &DetectorOutputs) {
        let mut ordered: Vec<_> = outputs.cycles.cycles.iter().collect();
        ordered.sort_by(|a, b| b.len().cmp(&a.len()));

        let mut covered: HashSet<(NodeIndex, NodeIndex)> = HashSet::new();
        let mut signatures: HashSet<String> = HashSet::new();

        for cycle in ordered {
            let members = &cycle.members;
            let n = members.len();
            if n == 0 { continue; }

            let edges: Vec<(NodeIndex, NodeIndex)> =
                (0..n).map(|i| (members[i], members[(i + 1) % n])).collect();
            if edges.iter().all(|e| covered.contains(e)) {
                continue;
            }
            if members.iter().all(|m| self.behavior.is_filtered(*m)) {
                continue;
            }
            if !signatures.insert(cycle_signature(self.graph, members)) {
                continue;
            }

            covered.extend(edges);
            let claims: Vec<NodeIndex> =
                members.iter().copied().filter(|m| self.unclaimed(*m)).collect();
            self.open(members.clone(), PatternType::Cycle, &claims);
        }
    }

    // ── 2. Smurf hubs ─────────────────────────────────────────────────────────

    fn smurf_rings(&mut self, outputs: &DetectorOutputs) {
        for signal in &outputs.smurfs {
            if !self.unclaimed(signal.node) { continue; }

            let mut members: Vec<NodeIndex> = self.graph.predecessors(signal.node).collect();
            members.push(signal.node);

            let claims: Vec<NodeIndex> =
                members.iter().copied().filter(|m| self.unclaimed(*m)).collect();
            self.open(members, PatternType::Smurfing, &claims);
        }
    }

    // ── 3. Shell chains ───────────────────────────────────────────────────────

    fn shell_rings(&mut self, outputs: &DetectorOutputs) {
        let mut signatures: HashSet<String> = HashSet::new();
        for chain in &outputs.shells {
            if !signatures.insert(cycle_signature(self.graph, &chain.members)) {
                continue;
            }
            let claims: Vec<NodeIndex> =
                chain.members.iter().copied().filter(|m| self.unclaimed(*m)).collect();
            if claims.is_empty() { continue; }
            self.open(chain.members.clone(), PatternType::Shell, &claims);
        }
    }
}
