// ringwatch/src/workers/smurf.rs
//
// Smurfing worker: hubs that collect from, or disperse to, many distinct
// counterparties inside a short time window.
//
// Per account:
//   1. fan_in >= fan_in_threshold OR fan_out >= fan_out_threshold
//   2. at least one counterparty on a different layer (a hub whose whole
//      neighbourhood sits on its own layer is not a layered structure)
//   3. the densest sliding window of adjacent transfers, width
//      time_window_hours, holds >= max(fan_in_threshold, fan_out_threshold)
//
// O(E log E) overall: each bucket is read once per endpoint, then sorted.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::config::SmurfConfig;
use crate::events::SmurfSignal;
use crate::state::graph::TransactionGraph;
use crate::state::metrics::Layering;

pub fn detect(graph: &TransactionGraph, layering: &Layering, cfg: &SmurfConfig) -> Vec<SmurfSignal> {
    let window = Duration::hours(i64::from(cfg.time_window_hours));
    let density = cfg.density_threshold();
    let mut out = Vec::new();

    for node in graph.nodes() {
        let fan_in = graph.fan_in(node);
        let fan_out = graph.fan_out(node);
        if fan_in < cfg.fan_in_threshold && fan_out < cfg.fan_out_threshold {
            continue;
        }

        let bipartite = match layering.layer(node) {
            Some(layer) => {
                let crosses = graph
                    .predecessors(node)
                    .chain(graph.successors(node))
                    .any(|n| layering.layer(n) != Some(layer));
                if !crosses { continue; }
                true
            }
            None => false,
        };

        let mut stamps: Vec<DateTime<Utc>> = graph
            .in_edges(node)
            .chain(graph.out_edges(node))
            .flat_map(|(_, bucket)| bucket.iter().map(|tx| tx.timestamp))
            .collect();
        if stamps.len() < 2 { continue; }
        stamps.sort_unstable();

        let window_tx_count = densest_window(&stamps, window);
        if window_tx_count >= density {
            out.push(SmurfSignal { node, fan_in, fan_out, window_tx_count, bipartite });
        }
    }

    debug!("Smurf detector: {} hubs flagged", out.len());
    out
}

/// Largest number of sorted timestamps spanning at most `window`.
fn densest_window(sorted: &[DateTime<Utc>], window: Duration) -> usize {
    let mut best = 0;
    let mut lo = 0;
    for hi in 0..sorted.len() {
        while sorted[hi] - sorted[lo] > window {
            lo += 1;
        }
        best = best.max(hi - lo + 1);
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Transaction;
    use chrono::TimeZone;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn fan_in(senders: usize, spacing: Duration) -> TransactionGraph {
        let txs: Vec<Transaction> = (0..senders)
            .map(|i| {
                let ts = base() + spacing * i as i32;
                Transaction::new(format!("T{i}"), format!("S{i:02}"), "HUB", 500.0, ts)
            })
            .collect();
        TransactionGraph::build(&txs)
    }

    #[test]
    fn dense_fan_in_is_flagged() {
        let g = fan_in(15, Duration::minutes(3));
        let signals = detect(&g, &Layering::compute(&g), &SmurfConfig::default());
        assert_eq!(signals.len(), 1);
        let s = signals[0];
        assert_eq!(g.account_id(s.node), "HUB");
        assert_eq!((s.fan_in, s.fan_out, s.window_tx_count), (15, 0, 15));
        assert!(s.bipartite);
    }

    #[test]
    fn dense_fan_out_is_flagged() {
        let txs: Vec<Transaction> = (0..15)
            .map(|i| {
                let ts = base() + Duration::minutes(3) * i;
                Transaction::new(format!("T{i}"), "HUB", format!("R{i:02}"), 500.0, ts)
            })
            .collect();
        let g = TransactionGraph::build(&txs);
        let signals = detect(&g, &Layering::compute(&g), &SmurfConfig::default());
        assert_eq!(signals.len(), 1);
        let s = signals[0];
        assert_eq!(g.account_id(s.node), "HUB");
        assert_eq!((s.fan_in, s.fan_out, s.window_tx_count), (0, 15, 15));
        assert!(s.bipartite);
    }

    #[test]
    fn sparse_fan_in_stays_below_density() {
        // 12 senders 10h apart: at most 8 transfers fit in 72h.
        let g = fan_in(12, Duration::hours(10));
        assert!(detect(&g, &Layering::compute(&g), &SmurfConfig::default()).is_empty());
    }

    #[test]
    fn below_fan_thresholds_is_ignored() {
        let g = fan_in(9, Duration::minutes(1));
        assert!(detect(&g, &Layering::compute(&g), &SmurfConfig::default()).is_empty());
    }

    #[test]
    fn single_layer_neighbourhood_is_skipped() {
        let g = fan_in(15, Duration::minutes(3));
        let flat = Layering::from_layers(vec![0; g.node_count()]);
        assert!(detect(&g, &flat, &SmurfConfig::default()).is_empty());
    }

    #[test]
    fn densest_window_is_inclusive_of_width() {
        let stamps: Vec<_> = [0, 1, 2, 5].iter().map(|h| base() + Duration::hours(*h)).collect();
        assert_eq!(densest_window(&stamps, Duration::hours(2)), 3);
        assert_eq!(densest_window(&stamps, Duration::hours(5)), 4);
    }
}
