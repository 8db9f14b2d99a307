// ringwatch/src/workers/shell.rs
//
// Shell-network worker: runs of low-degree pass-through accounts.
//
// An account is shell-like when its degree (distinct in + out counterparties)
// lies in [degree_min, degree_max]. From each shell-like account not yet
// owned by an accepted chain, a depth-first walk collects every reachable
// shell-like successor in visit order. Chains of at least chain_min_length
// accounts are accepted; only then do their members become owned.

use petgraph::graph::NodeIndex;
use tracing::debug;

use crate::config::ShellConfig;
use crate::events::ShellChain;
use crate::state::graph::TransactionGraph;

pub fn detect(graph: &TransactionGraph, cfg: &ShellConfig) -> Vec<ShellChain> {
    let n = graph.node_count();
    let is_shell = |v: NodeIndex| {
        let degree = graph.fan_in(v) + graph.fan_out(v);
        degree >= cfg.degree_min && degree <= cfg.degree_max
    };

    let mut owned = vec![false; n];
    let mut in_chain = vec![false; n];
    let mut chains = Vec::new();

    for start in graph.nodes() {
        if owned[start.index()] || !is_shell(start) { continue; }

        let mut members = vec![start];
        in_chain[start.index()] = true;

        // Per frame: successors not yet examined, reversed so pop() yields
        // them in first-seen order.
        let mut stack: Vec<Vec<NodeIndex>> = vec![pending(graph, start)];
        while let Some(frame) = stack.last_mut() {
            let Some(next) = frame.pop() else {
                stack.pop();
                continue;
            };
            if in_chain[next.index()] || owned[next.index()] || !is_shell(next) {
                continue;
            }
            in_chain[next.index()] = true;
            members.push(next);
            stack.push(pending(graph, next));
        }

        for m in &members {
            in_chain[m.index()] = false;
        }
        if members.len() >= cfg.chain_min_length {
            for m in &members {
                owned[m.index()] = true;
            }
            chains.push(ShellChain { members });
        }
    }

    debug!("Shell detector: {} chains", chains.len());
    chains
}

fn pending(graph: &TransactionGraph, node: NodeIndex) -> Vec<NodeIndex> {
    let mut next: Vec<NodeIndex> = graph.successors(node).collect();
    next.reverse();
    next
}
