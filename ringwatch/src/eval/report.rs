// ringwatch/src/eval/report.rs
//
// Markdown and JSON output for the eval harness.

use super::EvalResult;

/// (1 + TPR - FPR) / 2 at the configured threshold.
pub fn balanced_accuracy(result: &EvalResult) -> f64 {
    (1.0 + result.global.recall() - result.global.fpr()) / 2.0
}

/// Print a markdown-formatted report to stdout.
pub fn print_markdown(result: &EvalResult) {
    println!("# ringwatch Evaluation Report");
    println!();
    println!(
        "**Accounts**: {}  **Positive**: {}  **Negative**: {}  **Threshold**: {:.1}",
        result.n_accounts, result.n_positive, result.n_negative, result.threshold
    );
    println!();
    println!("| Metric            | Value  |");
    println!("|-------------------|--------|");
    println!("| Precision         | {:.4} |", result.global.precision());
    println!("| Recall            | {:.4} |", result.global.recall());
    println!("| F1                | {:.4} |", result.global.f1());
    println!("| FPR               | {:.4} |", result.global.fpr());
    println!("| Balanced accuracy | {:.4} |", balanced_accuracy(result));
    println!();

    println!("## Per-Detector Performance\n");
    println!("| Detector | P | R | F1 | FPR |");
    println!("|----------|---|---|----|-----|");
    let mut detectors = result.per_detector.clone();
    detectors.sort_by(|a, b| b.1.f1().total_cmp(&a.1.f1()));
    for (kind, m) in detectors {
        println!("| {:8} | {:.3} | {:.3} | {:.3} | {:.4} |", kind, m.precision(), m.recall(), m.f1(), m.fpr());
    }

    println!("\n## Tiers\n");
    for (tier, count) in &result.tier_counts {
        println!("- {tier}: {count}");
    }

    println!("\n## Score Distribution\n");
    let total: usize = result.score_histogram.iter().map(|(_, c)| c).sum();
    for (lower, count) in &result.score_histogram {
        let bar = "#".repeat((*count as f64 / total.max(1) as f64 * 60.0) as usize);
        println!("{:5.1}-{:5.1} | {:5} | {}", lower, lower + 10.0, count, bar);
    }
}

/// Serialize the evaluation result to JSON for downstream consumption.
pub fn to_json(result: &EvalResult) -> String {
    let per_detector: serde_json::Map<String, serde_json::Value> = result
        .per_detector
        .iter()
        .map(|(kind, m)| {
            (
                kind.to_string(),
                serde_json::json!({
                    "precision": m.precision(),
                    "recall":    m.recall(),
                    "f1":        m.f1(),
                    "fpr":       m.fpr(),
                }),
            )
        })
        .collect();

    serde_json::json!({
        "n_accounts":        result.n_accounts,
        "n_positive":        result.n_positive,
        "n_negative":        result.n_negative,
        "threshold":         result.threshold,
        "precision":         result.global.precision(),
        "recall":            result.global.recall(),
        "f1":                result.global.f1(),
        "fpr":               result.global.fpr(),
        "balanced_accuracy": balanced_accuracy(result),
        "per_detector":      per_detector,
        "tier_counts":       result.tier_counts,
        "score_histogram":   result.score_histogram,
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::DetectorMetrics;
    use crate::events::DetectorKind;
    use std::collections::BTreeMap;

    #[test]
    fn json_carries_global_and_per_detector_metrics() {
        let result = EvalResult {
            n_accounts: 10,
            n_positive: 4,
            n_negative: 6,
            threshold: 25.0,
            global: DetectorMetrics { tp: 4, fp: 0, tn: 6, fn_: 0 },
            per_detector: vec![(DetectorKind::Cycle, DetectorMetrics { tp: 2, fp: 0, tn: 6, fn_: 2 })],
            tier_counts: BTreeMap::new(),
            score_histogram: vec![(0.0, 4)],
        };
        let v: serde_json::Value = serde_json::from_str(&to_json(&result)).unwrap();
        assert_eq!(v["recall"], 1.0);
        assert_eq!(v["balanced_accuracy"], 1.0);
        assert_eq!(v["per_detector"]["cycle"]["recall"], 0.5);
    }
}
