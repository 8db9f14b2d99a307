// ringwatch/src/eval/mod.rs
//
// Labelled-dataset evaluation harness.
//
//   1. Loads a transaction file whose fraudulent transfers carry a `label`
//   2. Runs the full pipeline once over the batch
//   3. Computes global and per-detector precision / recall / F1 / FPR
//   4. Prints a markdown report (see report.rs)
//
// Ground truth is per account: any account that is an endpoint of a
// labelled transfer is positive, every other account is negative.
//
// Run:
//   ringwatch --mode eval --path labelled.jsonl
//   ringwatch --mode eval --path labelled.jsonl --threshold 25

pub mod report;

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::Result;
use tracing::info;

use crate::config::DetectionConfig;
use crate::engine::run_pipeline;
use crate::events::{DetectorKind, PatternTag, SuspicionRecord, Transaction};
use crate::output::adapter::risk_level;

const HISTOGRAM_BINS: usize = 10;
const BIN_WIDTH: f64 = 10.0;

// ── Per-detector performance counters ─────────────────────────────────────────

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DetectorMetrics {
    pub tp: u64,
    pub fp: u64,
    pub tn: u64,
    pub fn_: u64,
}

impl DetectorMetrics {
    pub fn record(&mut self, fired: bool, positive: bool) {
        match (fired, positive) {
            (true, true) => self.tp += 1,
            (true, false) => self.fp += 1,
            (false, true) => self.fn_ += 1,
            (false, false) => self.tn += 1,
        }
    }

    pub fn precision(&self) -> f64 {
        let denom = self.tp + self.fp;
        if denom == 0 { 1.0 } else { self.tp as f64 / denom as f64 }
    }

    pub fn recall(&self) -> f64 {
        let denom = self.tp + self.fn_;
        if denom == 0 { 0.0 } else { self.tp as f64 / denom as f64 }
    }

    pub fn f1(&self) -> f64 {
        let p = self.precision();
        let r = self.recall();
        if p + r == 0.0 { 0.0 } else { 2.0 * p * r / (p + r) }
    }

    pub fn fpr(&self) -> f64 {
        let denom = self.fp + self.tn;
        if denom == 0 { 0.0 } else { self.fp as f64 / denom as f64 }
    }
}

// ── Aggregate evaluation result ───────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct EvalResult {
    pub n_accounts: usize,
    pub n_positive: usize,
    pub n_negative: usize,
    pub threshold: f64,
    pub global: DetectorMetrics,
    pub per_detector: Vec<(DetectorKind, DetectorMetrics)>,
    pub tier_counts: BTreeMap<String, u64>,
    /// (bin lower bound, count) over flagged accounts, 10-point bins.
    pub score_histogram: Vec<(f64, usize)>,
}

fn fired(kind: DetectorKind, record: &SuspicionRecord) -> bool {
    record.patterns.iter().any(|p| match kind {
        DetectorKind::Cycle => p.is_cycle(),
        DetectorKind::Smurf => *p == PatternTag::Smurfing,
        DetectorKind::Shell => *p == PatternTag::ShellChain,
    })
}

// ── Evaluator ─────────────────────────────────────────────────────────────────

pub struct Evaluator {
    threshold: f64,
    config: DetectionConfig,
}

impl Evaluator {
    pub fn new(threshold: f64, config: DetectionConfig) -> Self {
        Self { threshold, config }
    }

    pub async fn run_dataset(&self, path: &Path) -> Result<EvalResult> {
        let transactions = crate::source::load_transactions(path).await?;
        self.evaluate(&transactions).await
    }

    pub async fn evaluate(&self, transactions: &[Transaction]) -> Result<EvalResult> {
        let output = run_pipeline(transactions, &self.config).await?;

        let positives: HashSet<&str> = transactions
            .iter()
            .filter(|t| t.label.is_some())
            .flat_map(|t| [t.sender_id.as_str(), t.receiver_id.as_str()])
            .collect();
        let records: std::collections::HashMap<&str, &SuspicionRecord> =
            output.records.iter().map(|r| (r.account_id.as_str(), r)).collect();

        let kinds = [DetectorKind::Cycle, DetectorKind::Smurf, DetectorKind::Shell];
        let mut global = DetectorMetrics::default();
        let mut per_detector: Vec<(DetectorKind, DetectorMetrics)> =
            kinds.iter().map(|k| (*k, DetectorMetrics::default())).collect();
        let mut tier_counts: BTreeMap<String, u64> = BTreeMap::new();
        let mut bins = vec![0usize; HISTOGRAM_BINS];

        for node in &output.graph_data.nodes {
            let positive = positives.contains(node.id.as_str());
            let record = records.get(node.id.as_str()).copied();
            let score = record.map(|r| r.score).unwrap_or(0.0);

            global.record(record.is_some() && score >= self.threshold, positive);
            for (kind, m) in per_detector.iter_mut() {
                m.record(record.is_some_and(|r| fired(*kind, r)), positive);
            }

            if record.is_some() {
                let bin = ((score / BIN_WIDTH) as usize).min(HISTOGRAM_BINS - 1);
                bins[bin] += 1;
                *tier_counts.entry(risk_level(score, &self.config.output).to_string()).or_default() += 1;
            }
        }

        let n_accounts = output.graph_data.nodes.len();
        let n_positive = output.graph_data.nodes.iter().filter(|n| positives.contains(n.id.as_str())).count();
        info!(
            "Evaluated {} accounts ({} positive) at threshold {:.1}",
            n_accounts, n_positive, self.threshold
        );

        Ok(EvalResult {
            n_accounts,
            n_positive,
            n_negative: n_accounts - n_positive,
            threshold: self.threshold,
            global,
            per_detector,
            tier_counts,
            score_histogram: bins.iter().enumerate().map(|(i, &c)| (i as f64 * BIN_WIDTH, c)).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn metric_ratios_guard_empty_denominators() {
        let m = DetectorMetrics::default();
        assert_eq!((m.precision(), m.recall(), m.f1(), m.fpr()), (1.0, 0.0, 0.0, 0.0));

        let m = DetectorMetrics { tp: 3, fp: 1, tn: 5, fn_: 1 };
        assert_eq!(m.precision(), 0.75);
        assert_eq!(m.recall(), 0.75);
        assert_eq!(m.fpr(), 1.0 / 6.0);
    }

    #[tokio::test]
    async fn labelled_triangle_is_fully_recalled() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let txs = vec![
            Transaction::new("1", "A", "B", 1000.0, ts).with_label("loop"),
            Transaction::new("2", "B", "C", 1000.0, ts).with_label("loop"),
            Transaction::new("3", "C", "A", 1000.0, ts).with_label("loop"),
            Transaction::new("4", "X", "Y", 50.0, ts + Duration::hours(1)),
        ];
        let result = Evaluator::new(20.0, DetectionConfig::default()).evaluate(&txs).await.unwrap();

        assert_eq!((result.n_accounts, result.n_positive, result.n_negative), (5, 3, 2));
        assert_eq!(result.global.tp, 3);
        assert_eq!(result.global.recall(), 1.0);
        let cycle = result.per_detector.iter().find(|(k, _)| *k == DetectorKind::Cycle).unwrap().1;
        assert_eq!(cycle.tp, 3);
        assert_eq!(result.tier_counts.get("LOW"), Some(&3));
    }
}
