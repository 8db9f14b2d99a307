// ringwatch/src/engine/explain.rs
//
// Reason codes and narrative for one scored account. Reason codes are
// ordered, deduplicated, and carry the statistic that drove them:
//
//   activity_gate(total_tx=N,penalty=P)       always
//   cycle_centrality(deg=D,size=S)            any cycle_length_N tag
//   fan_in_intensity(in=N)                    smurfing / bipartite_pattern
//   layering_path(depth=L)                    shell_chain
//   velocity_spike(tx=N)                      high_velocity
//   layer_depth(level=L)                      layer >= 2
//   low_activity_cap(total_tx=N,score_cap=S)  at most one transfer

use crate::events::{ExplainMeta, PatternTag};

const LOW_ACTIVITY_TX: usize = 1;
const LOW_ACTIVITY_PENALTY: f64 = 0.2;
const DEFAULT_CYCLE_SIZE: usize = 3;

const FALLBACK_NARRATIVE: &str = "Graph analysis surfaced suspicious behavioural signals for this account.";

#[derive(Debug, Clone, PartialEq)]
pub struct Explanation {
    pub reasons: Vec<String>,
    pub narrative: String,
}

/// Penalty quoted by the activity gate; non-zero for single-transfer accounts.
pub fn activity_penalty(tx_count: usize) -> f64 {
    if tx_count <= LOW_ACTIVITY_TX { LOW_ACTIVITY_PENALTY } else { 0.0 }
}

pub fn explain(account_id: &str, score: f64, patterns: &[PatternTag], meta: &ExplainMeta) -> Explanation {
    let mut reasons: Vec<String> = Vec::new();
    let mut narrative: Vec<String> = Vec::new();
    let has = |tag: PatternTag| patterns.contains(&tag);

    reasons.push(format!(
        "activity_gate(total_tx={},penalty={})",
        meta.tx_count,
        activity_penalty(meta.tx_count)
    ));

    if patterns.iter().any(|p| p.is_cycle()) {
        let size = if meta.min_cycle_length == 0 { DEFAULT_CYCLE_SIZE } else { meta.min_cycle_length };
        reasons.push(format!("cycle_centrality(deg={},size={})", meta.cycle_count, size));
        narrative.push(format!(
            "{account_id} sits on a {size}-account loop that routes funds back to their origin."
        ));
    }

    if has(PatternTag::Smurfing) || has(PatternTag::BipartitePattern) {
        reasons.push(format!("fan_in_intensity(in={})", meta.fan_in));
        narrative.push(format!(
            "It trades with {} senders and {} receivers in a tight time window, typical of structuring.",
            meta.fan_in, meta.fan_out
        ));
    }

    if has(PatternTag::ShellChain) {
        reasons.push(format!("layering_path(depth={})", meta.level));
        narrative.push("Funds pass through it along a chain of thin intermediary accounts.".to_string());
    }

    if has(PatternTag::HighVelocity) {
        reasons.push(format!("velocity_spike(tx={})", meta.tx_count));
        narrative.push(format!("Its {} transfers point to rapid movement of money.", meta.tx_count));
    }

    if meta.level >= 2 {
        reasons.push(format!("layer_depth(level={})", meta.level));
    }

    if meta.tx_count <= LOW_ACTIVITY_TX {
        reasons.push(format!("low_activity_cap(total_tx={},score_cap={})", meta.tx_count, score));
    }

    let mut unique = Vec::with_capacity(reasons.len());
    for r in reasons {
        if !unique.contains(&r) { unique.push(r); }
    }

    let narrative = if narrative.is_empty() {
        FALLBACK_NARRATIVE.to_string()
    } else {
        narrative.join(" ")
    };

    Explanation { reasons: unique, narrative }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_member_reasons_in_order() {
        let meta = ExplainMeta { tx_count: 2, fan_in: 1, fan_out: 1, level: 2, cycle_count: 1, min_cycle_length: 3 };
        let ex = explain("C", 28.3, &[PatternTag::CycleLength(3), PatternTag::ShellChain, PatternTag::LayeredDepth], &meta);
        assert_eq!(
            ex.reasons,
            vec![
                "activity_gate(total_tx=2,penalty=0)",
                "cycle_centrality(deg=1,size=3)",
                "layering_path(depth=2)",
                "layer_depth(level=2)",
            ]
        );
        assert!(ex.narrative.starts_with("C sits on a 3-account loop"));
    }

    #[test]
    fn dispersal_hub_cites_velocity() {
        let meta = ExplainMeta { tx_count: 60, fan_in: 0, fan_out: 15, ..Default::default() };
        let ex = explain(
            "HUB",
            22.5,
            &[PatternTag::Smurfing, PatternTag::HighFanOut, PatternTag::HighVelocity],
            &meta,
        );
        assert_eq!(
            ex.reasons,
            vec![
                "activity_gate(total_tx=60,penalty=0)",
                "fan_in_intensity(in=0)",
                "velocity_spike(tx=60)",
            ]
        );
        assert!(ex.narrative.contains("0 senders and 15 receivers"));
        assert!(ex.narrative.contains("Its 60 transfers"));
    }

    #[test]
    fn single_transfer_account_gets_activity_cap() {
        let meta = ExplainMeta { tx_count: 1, ..Default::default() };
        let ex = explain("X", 12.0, &[PatternTag::ShellChain], &meta);
        assert_eq!(ex.reasons[0], "activity_gate(total_tx=1,penalty=0.2)");
        assert_eq!(ex.reasons.last().unwrap(), "low_activity_cap(total_tx=1,score_cap=12)");
    }

    #[test]
    fn no_template_falls_back_to_generic_sentence() {
        let meta = ExplainMeta { tx_count: 3, ..Default::default() };
        let ex = explain("Y", 5.0, &[PatternTag::LayeredDepth], &meta);
        assert_eq!(ex.narrative, FALLBACK_NARRATIVE);
    }
}
