// ringwatch/src/engine/pipeline.rs
//
// One full batch pass:
//
//   graph + metrics ─► cycle ┐
//                      smurf ├─► filters ─► rings ─► scoring ─► output
//                      shell ┘
//
// The three detectors run concurrently over a shared snapshot; everything
// after the join runs on the calling task, in order.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use petgraph::graph::NodeIndex;
use tracing::{info, warn};

use crate::config::DetectionConfig;
use crate::error::{PipelineError, Result};
use crate::events::{FilteredAccount, SearchBounds, SuspicionRecord, Transaction};
use crate::filters;
use crate::output::{adapt, build_graph_data, format_output, CanonicalReport, CanonicalRing, ConsumerReport, GraphData};
use crate::state::GraphSnapshot;
use crate::workers;

use super::explain::explain;
use super::rings::{RingAssembler, RingAssembly};
use super::scoring::{PatternIndex, ScoringEngine};

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Consumer-facing report.
    pub result: ConsumerReport,
    pub graph_data: GraphData,
    /// Internal report the consumer view was derived from.
    pub canonical: CanonicalReport,
    /// Every scored account with reason codes and narrative.
    pub records: Vec<SuspicionRecord>,
    pub filtered: Vec<FilteredAccount>,
    pub bounds: SearchBounds,
    pub total_transactions: usize,
}

pub async fn run_pipeline(
    transactions: &[Transaction],
    config: &DetectionConfig,
) -> Result<PipelineOutput> {
    if transactions.is_empty() {
        return Err(PipelineError::EmptyInput);
    }
    config.validate()?;

    let start = Instant::now();
    info!("Pipeline start: {} transactions", transactions.len());

    let snapshot = Arc::new(GraphSnapshot::build(transactions));
    let outputs = workers::run_all(Arc::clone(&snapshot), Arc::new(config.clone())).await?;
    info!(
        cycles = outputs.cycles.cycles.len(),
        smurfs = outputs.smurfs.len(),
        shells = outputs.shells.len(),
        "Detectors complete"
    );

    let graph = &snapshot.graph;
    let behavior = filters::classify(&snapshot, config)?;
    let filtered = filters::filtered_accounts(&snapshot, &behavior);
    if !filtered.is_empty() {
        info!("Behaviour-filtered accounts: {}", filtered.len());
    }

    let assembly = RingAssembler::new(graph, &behavior).assemble(&outputs);

    let index = PatternIndex::build(graph.node_count(), &outputs);
    let engine = ScoringEngine::new(&config.scoring, &index, &snapshot.metrics, &behavior);

    let mut scores = vec![0.0f64; graph.node_count()];
    let mut records = Vec::new();
    for &node in index.touched() {
        if behavior.is_filtered(node) { continue; }
        let scored = engine.score(node);
        if scored.score <= 0.0 { continue; }

        scores[node.index()] = scored.score;
        let account_id = graph.account_id(node);
        let meta = engine.meta(node);
        let ex = explain(account_id, scored.score, &scored.patterns, &meta);
        records.push(SuspicionRecord {
            account_id: account_id.to_string(),
            score: scored.score,
            patterns: scored.patterns,
            ring_id: assembly.ring_of(node).map(|r| r.ring_id.clone()),
            reasons: ex.reasons,
            narrative: ex.narrative,
            meta,
        });
    }

    let rings = final_rings(&snapshot, &assembly, &scores);
    let processing_time = start.elapsed().as_secs_f64();

    let suspicious: HashSet<&str> = records.iter().map(|r| r.account_id.as_str()).collect();
    let graph_data = build_graph_data(transactions, &suspicious, &rings);

    let canonical = format_output(&records, &rings, graph.node_count(), processing_time);
    let result = adapt(&canonical, &config.output);

    let bounds = SearchBounds {
        cycle_min_length: config.cycle.min_length,
        cycle_max_length: config.cycle.max_length,
        dfs_depth_limit: config.cycle.dfs_depth_limit,
        max_cycles: config.cycle.max_cycles,
        same_layer_pruning: config.cycle.prune_same_layer,
        cycles_truncated: outputs.cycles.truncated,
    };
    if bounds.cycles_truncated {
        warn!("Cycle results are best-effort within configured bounds (cap {})", bounds.max_cycles);
    }

    info!(
        accounts = graph.node_count(),
        flagged = records.len(),
        rings = rings.len(),
        "Pipeline done in {:.3}s",
        processing_time
    );

    Ok(PipelineOutput {
        result,
        graph_data,
        canonical,
        records,
        filtered,
        bounds,
        total_transactions: transactions.len(),
    })
}

/// Rings with their risk score set; empty or zero-risk rings are dropped.
fn final_rings(snapshot: &GraphSnapshot, assembly: &RingAssembly, scores: &[f64]) -> Vec<CanonicalRing> {
    let graph = &snapshot.graph;
    let score_of = |n: NodeIndex| scores.get(n.index()).copied().unwrap_or(0.0);

    assembly
        .rings
        .iter()
        .filter_map(|ring| {
            let risk = ring.members.iter().map(|m| score_of(*m)).fold(0.0, f64::max);
            let any_suspicious = ring.members.iter().any(|m| score_of(*m) > 0.0);
            if ring.members.is_empty() || risk <= 0.0 || !any_suspicious {
                return None;
            }
            Some(CanonicalRing {
                ring_id: ring.ring_id.clone(),
                member_accounts: ring.members.iter().map(|m| graph.account_id(*m).to_string()).collect(),
                pattern_type: ring.pattern,
                risk_score: risk,
            })
        })
        .collect()
}
