// ringwatch/tests/pipeline.rs
//
// End-to-end batches through the public entry points.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use ringwatch::events::{BehaviorClass, PatternTag, PatternType};
use ringwatch::output::adapter::{ExternalPattern, RingPattern};
use ringwatch::{run_pipeline, Analyzer, DetectionConfig, PipelineError, PipelineOutput, Transaction};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
}

fn tx(id: impl Into<String>, from: impl Into<String>, to: impl Into<String>, amount: f64, at: DateTime<Utc>) -> Transaction {
    Transaction::new(id, from, to, amount, at)
}

fn triangle() -> Vec<Transaction> {
    vec![
        tx("A1", "A", "B", 1000.0, t0()),
        tx("A2", "B", "C", 1000.0, t0() + Duration::minutes(10)),
        tx("A3", "C", "A", 1000.0, t0() + Duration::minutes(20)),
    ]
}

/// 15 distinct senders paying one collector $500 inside an hour.
fn fan_in() -> Vec<Transaction> {
    (1..=15)
        .map(|i| tx(format!("B{i}"), format!("S{i:02}"), "HUB", 500.0, t0() + Duration::minutes(i * 3)))
        .collect()
}

/// P pays 10 employees five times each, amounts within 1% of 2000.
fn salaries() -> Vec<Transaction> {
    let mut out = Vec::new();
    for round in 0..5i64 {
        for emp in 0..10i64 {
            let amount = 2000.0 + (emp as f64) * 2.0 - (round as f64);
            let at = t0() + Duration::hours(round * 6) + Duration::minutes(emp);
            out.push(tx(format!("C{round}-{emp}"), "P", format!("E{emp}"), amount, at));
        }
    }
    out
}

fn chain() -> Vec<Transaction> {
    ["A", "B", "C", "D", "E", "F"]
        .windows(2)
        .enumerate()
        .map(|(i, w)| tx(format!("E{i}"), format!("X{}", w[0]), format!("X{}", w[1]), 900.0, t0() + Duration::hours(i as i64)))
        .collect()
}

async fn run(txs: &[Transaction]) -> PipelineOutput {
    run_pipeline(txs, &DetectionConfig::default()).await.unwrap()
}

fn scores(out: &PipelineOutput) -> HashMap<&str, f64> {
    out.result
        .suspicious_accounts
        .iter()
        .map(|a| (a.account_id.as_str(), a.suspicion_score))
        .collect()
}

// ── Scenarios ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn simple_cycle_forms_one_ring() {
    let out = run(&triangle()).await;

    assert_eq!(out.result.fraud_rings.len(), 1);
    let ring = &out.result.fraud_rings[0];
    assert_eq!(ring.ring_id, "RING_001");
    assert_eq!(ring.pattern_type, RingPattern::Cycle);
    assert_eq!(ring.member_accounts, vec!["A", "B", "C"]);
    assert_eq!(ring.risk_score, 28.3);

    let s = scores(&out);
    assert_eq!(s.len(), 3);
    assert_eq!((s["A"], s["B"], s["C"]), (25.3, 25.3, 28.3));
    for acc in &out.canonical.suspicious_accounts {
        assert!(acc.detected_patterns.contains(&PatternTag::CycleLength(3)));
    }
    for acc in &out.result.suspicious_accounts {
        assert_eq!(acc.detected_patterns, vec![ExternalPattern::Cycle]);
        assert_eq!(acc.ring_id.as_deref(), Some("RING_001"));
    }
    assert!(out.graph_data.links.iter().all(|l| l.ring_id.as_deref() == Some("RING_001")));
}

#[tokio::test]
async fn dense_fan_in_flags_the_collector() {
    let out = run(&fan_in()).await;

    assert!(out.filtered.is_empty(), "collector must not be merchant-filtered");
    let hub = out.result.suspicious_accounts.iter().find(|a| a.account_id == "HUB").unwrap();
    assert_eq!(hub.suspicion_score, 16.5);
    assert_eq!(hub.detected_patterns, vec![ExternalPattern::FanIn]);

    let canonical = out.canonical.suspicious_accounts.iter().find(|a| a.account_id == "HUB").unwrap();
    assert!(canonical.detected_patterns.contains(&PatternTag::Smurfing));

    assert_eq!(out.canonical.fraud_rings.len(), 1);
    let ring = &out.canonical.fraud_rings[0];
    assert_eq!(ring.pattern_type, PatternType::Smurfing);
    assert_eq!(ring.member_accounts.len(), 16);
    assert_eq!(ring.member_accounts.last().map(String::as_str), Some("HUB"));
    assert_eq!(ring.risk_score, 16.5);
}

#[tokio::test]
async fn payroll_sender_is_filtered_and_unringed() {
    let out = run(&salaries()).await;

    assert_eq!(out.filtered.len(), 1);
    assert_eq!(out.filtered[0].account_id, "P");
    assert_eq!(out.filtered[0].class, BehaviorClass::Payroll);
    assert!(!scores(&out).contains_key("P"));
    assert!(out.result.fraud_rings.iter().all(|r| !r.member_accounts.iter().any(|m| m == "P")));
}

#[tokio::test]
async fn empty_batch_reports_empty_input() {
    let err = run_pipeline(&[], &DetectionConfig::default()).await.unwrap_err();
    assert!(matches!(err, PipelineError::EmptyInput));
}

#[tokio::test]
async fn linear_chain_forms_one_shell_ring() {
    let out = run(&chain()).await;

    assert_eq!(out.canonical.fraud_rings.len(), 1);
    let ring = &out.canonical.fraud_rings[0];
    assert_eq!(ring.pattern_type, PatternType::Shell);
    assert_eq!(ring.member_accounts, vec!["XA", "XB", "XC", "XD", "XE", "XF"]);

    assert_eq!(out.records.len(), 6);
    for record in &out.records {
        assert!(record.patterns.contains(&PatternTag::ShellChain));
        assert!(!record.patterns.iter().any(|p| p.is_cycle()));
        assert!(record.score > 0.0);
    }
    let max = out.records.iter().map(|r| r.score).fold(0.0, f64::max);
    assert_eq!(ring.risk_score, max);
}

// ── Properties over a mixed batch ─────────────────────────────────────────────

fn mixed() -> Vec<Transaction> {
    let mut all = triangle();
    all.extend(fan_in());
    all.extend(salaries());
    all.extend(chain());
    all.push(tx("M1", "MERCHANT_42", "A", 75.0, t0()));
    all
}

#[tokio::test]
async fn scores_are_bounded_and_rounded() {
    let out = run(&mixed()).await;
    for acc in &out.result.suspicious_accounts {
        assert!((0.0..=100.0).contains(&acc.suspicion_score));
        assert_eq!(acc.suspicion_score, (acc.suspicion_score * 10.0).round() / 10.0);
    }
}

#[tokio::test]
async fn ring_risk_is_max_member_score_and_never_zero() {
    let out = run(&mixed()).await;
    let s = scores(&out);
    assert!(!out.result.fraud_rings.is_empty());
    for ring in &out.result.fraud_rings {
        assert!(!ring.member_accounts.is_empty());
        assert!(ring.risk_score > 0.0);
        let max = ring
            .member_accounts
            .iter()
            .map(|m| s.get(m.as_str()).copied().unwrap_or(0.0))
            .fold(0.0, f64::max);
        assert_eq!(ring.risk_score, max, "{}", ring.ring_id);
    }
}

#[tokio::test]
async fn filtered_accounts_never_score() {
    let out = run(&mixed()).await;
    let s = scores(&out);
    let filtered: Vec<&str> = out.filtered.iter().map(|f| f.account_id.as_str()).collect();
    assert!(filtered.contains(&"P"));
    assert!(filtered.contains(&"MERCHANT_42"));
    for id in filtered {
        assert!(!s.contains_key(id), "{id} was scored");
    }
    assert_eq!(out.result.summary.total_accounts_analyzed, out.graph_data.nodes.len());
}

#[tokio::test]
async fn repeated_runs_are_identical() {
    let batch = mixed();
    let a = run(&batch).await;
    let b = run(&batch).await;

    assert_eq!(a.result.fraud_rings, b.result.fraud_rings);
    assert_eq!(a.records, b.records);
    assert_eq!(a.graph_data, b.graph_data);
}

// ── Analyzer cache ────────────────────────────────────────────────────────────

#[tokio::test]
async fn analyzer_serves_identical_batches_from_cache() {
    let analyzer = Analyzer::new(DetectionConfig::default()).unwrap();

    let first = analyzer.analyze(&triangle()).await.unwrap();
    let second = analyzer.analyze(&triangle()).await.unwrap();
    assert!(!first.cached);
    assert!(second.cached);
    assert_eq!(first.digest, second.digest);
    assert!(Arc::ptr_eq(&first.output, &second.output));

    let other = analyzer.analyze(&chain()).await.unwrap();
    assert!(!other.cached);
    assert_ne!(other.digest, first.digest);
}

#[tokio::test]
async fn reports_land_on_disk() {
    use ringwatch::output::writer::{GRAPH_FILE, RESULT_FILE, RUNS_FILE};
    use ringwatch::output::{ReportWriter, RunRecord};

    let dir = tempfile::tempdir().unwrap();
    let writer = ReportWriter::new(dir.path()).unwrap();
    let out = run(&mixed()).await;
    writer.write_reports(&out).await.unwrap();
    writer.append_run(&RunRecord::new("run1", "mixed", &out)).await.unwrap();

    for file in [RESULT_FILE, GRAPH_FILE, RUNS_FILE] {
        assert!(dir.path().join(file).exists(), "{file}");
    }
    let graph: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join(GRAPH_FILE)).unwrap()).unwrap();
    assert_eq!(graph["nodes"].as_array().unwrap().len(), out.graph_data.nodes.len());
}
