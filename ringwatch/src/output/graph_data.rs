// ringwatch/src/output/graph_data.rs
//
// Node/link view for visualisation. Nodes are every transaction endpoint in
// first-seen order; links are the raw transfers in input order, each tagged
// with the last ring (in ring order) that lists both endpoints.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::events::Transaction;

use super::format::CanonicalRing;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub suspicious: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphLink {
    pub source: String,
    pub target: String,
    pub amount: f64,
    pub timestamp: DateTime<Utc>,
    pub ring_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
}

pub fn build_graph_data(
    transactions: &[Transaction],
    suspicious: &HashSet<&str>,
    rings: &[CanonicalRing],
) -> GraphData {
    // account -> ring indices listing it, ascending
    let mut membership: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, ring) in rings.iter().enumerate() {
        for m in &ring.member_accounts {
            let slots = membership.entry(m.as_str()).or_default();
            if slots.last() != Some(&i) {
                slots.push(i);
            }
        }
    }
    let shared_ring = |a: &str, b: &str| -> Option<String> {
        let (ra, rb) = (membership.get(a)?, membership.get(b)?);
        ra.iter()
            .rev()
            .find(|i| rb.contains(*i))
            .map(|i| rings[*i].ring_id.clone())
    };

    let mut seen: HashSet<&str> = HashSet::new();
    let mut nodes = Vec::new();
    let mut links = Vec::with_capacity(transactions.len());

    for tx in transactions {
        for id in [tx.sender_id.as_str(), tx.receiver_id.as_str()] {
            if seen.insert(id) {
                nodes.push(GraphNode { id: id.to_string(), suspicious: suspicious.contains(id) });
            }
        }
        links.push(GraphLink {
            source: tx.sender_id.clone(),
            target: tx.receiver_id.clone(),
            amount: tx.amount,
            timestamp: tx.timestamp,
            ring_id: shared_ring(&tx.sender_id, &tx.receiver_id),
        });
    }

    GraphData { nodes, links }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::PatternType;
    use chrono::TimeZone;

    fn ring(id: &str, members: &[&str]) -> CanonicalRing {
        CanonicalRing {
            ring_id: id.into(),
            member_accounts: members.iter().map(|m| m.to_string()).collect(),
            pattern_type: PatternType::Shell,
            risk_score: 10.0,
        }
    }

    #[test]
    fn nodes_once_and_links_tagged_with_last_shared_ring() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let txs = vec![
            Transaction::new("1", "A", "B", 10.0, ts),
            Transaction::new("2", "B", "C", 10.0, ts),
            Transaction::new("3", "C", "Z", 10.0, ts),
        ];
        let rings = vec![ring("RING_001", &["A", "B", "C"]), ring("RING_002", &["B", "C", "D"])];
        let suspicious: HashSet<&str> = ["A", "B"].into_iter().collect();
        let data = build_graph_data(&txs, &suspicious, &rings);

        let ids: Vec<&str> = data.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C", "Z"]);
        assert!(data.nodes[0].suspicious && !data.nodes[2].suspicious);

        assert_eq!(data.links[0].ring_id.as_deref(), Some("RING_001"));
        assert_eq!(data.links[1].ring_id.as_deref(), Some("RING_002"));
        assert_eq!(data.links[2].ring_id, None);
    }
}
