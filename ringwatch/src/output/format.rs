// ringwatch/src/output/format.rs
//
// Canonical report: accounts sorted by score (descending, stable), scores
// rounded to one decimal, processing time to three.

use serde::{Deserialize, Serialize};

use crate::events::{ExplainMeta, PatternTag, PatternType, SuspicionRecord};

use super::round_to;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalAccount {
    pub account_id: String,
    pub suspicion_score: f64,
    pub detected_patterns: Vec<PatternTag>,
    pub ring_id: Option<String>,
    /// Statistics the consumer adapter quotes in its reason strings.
    #[serde(skip)]
    pub signals: ExplainMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalRing {
    pub ring_id: String,
    pub member_accounts: Vec<String>,
    pub pattern_type: PatternType,
    pub risk_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_accounts_analyzed: usize,
    pub suspicious_accounts_flagged: usize,
    pub fraud_rings_detected: usize,
    pub processing_time_seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalReport {
    pub suspicious_accounts: Vec<CanonicalAccount>,
    pub fraud_rings: Vec<CanonicalRing>,
    pub summary: Summary,
}

pub fn format_output(
    records: &[SuspicionRecord],
    rings: &[CanonicalRing],
    total_accounts: usize,
    processing_time_seconds: f64,
) -> CanonicalReport {
    let mut suspicious_accounts: Vec<CanonicalAccount> = records
        .iter()
        .map(|r| CanonicalAccount {
            account_id: r.account_id.clone(),
            suspicion_score: round_to(r.score, 1),
            detected_patterns: r.patterns.clone(),
            ring_id: r.ring_id.clone(),
            signals: r.meta,
        })
        .collect();
    suspicious_accounts.sort_by(|a, b| b.suspicion_score.total_cmp(&a.suspicion_score));

    let fraud_rings: Vec<CanonicalRing> = rings
        .iter()
        .map(|r| CanonicalRing { risk_score: round_to(r.risk_score, 1), ..r.clone() })
        .collect();

    let summary = Summary {
        total_accounts_analyzed: total_accounts,
        suspicious_accounts_flagged: suspicious_accounts.len(),
        fraud_rings_detected: fraud_rings.len(),
        processing_time_seconds: round_to(processing_time_seconds, 3),
    };

    CanonicalReport { suspicious_accounts, fraud_rings, summary }
}
