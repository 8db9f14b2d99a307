// ringwatch/src/output/adapter.rs
//
// Consumer-facing view of the canonical report.
//
// Pattern vocabulary is restricted to {cycle, fan_in}: every cycle_length_N
// maps to cycle; smurfing, bipartite_pattern and high_fan_in map to fan_in;
// everything else is dropped. Rings report smurfing as fan_in. Tiers are
// recomputed from score thresholds and reason strings are rebuilt from the
// canonical signals. The canonical report is only read, never modified.

use serde::{Deserialize, Serialize};

use crate::config::OutputConfig;
use crate::engine::explain::activity_penalty;
use crate::events::{PatternTag, PatternType, RiskLevel};

use super::format::{CanonicalAccount, CanonicalReport, CanonicalRing, Summary};
use super::round_to;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExternalPattern {
    Cycle,
    FanIn,
}

impl ExternalPattern {
    pub fn from_tag(tag: PatternTag) -> Option<Self> {
        match tag {
            PatternTag::CycleLength(_) => Some(Self::Cycle),
            PatternTag::Smurfing | PatternTag::BipartitePattern | PatternTag::HighFanIn => Some(Self::FanIn),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RingPattern {
    Cycle,
    FanIn,
    Shell,
}

impl From<PatternType> for RingPattern {
    fn from(p: PatternType) -> Self {
        match p {
            PatternType::Cycle => Self::Cycle,
            PatternType::Smurfing => Self::FanIn,
            PatternType::Shell => Self::Shell,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumerAccount {
    pub account_id: String,
    pub suspicion_score: f64,
    pub risk_level: RiskLevel,
    pub reasons: Vec<String>,
    pub detected_patterns: Vec<ExternalPattern>,
    pub ring_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumerRing {
    pub ring_id: String,
    pub member_accounts: Vec<String>,
    pub pattern_type: RingPattern,
    pub risk_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumerReport {
    pub suspicious_accounts: Vec<ConsumerAccount>,
    pub fraud_rings: Vec<ConsumerRing>,
    pub summary: Summary,
}

pub fn risk_level(score: f64, cfg: &OutputConfig) -> RiskLevel {
    if score >= cfg.high_tier {
        RiskLevel::High
    } else if score >= cfg.med_tier {
        RiskLevel::Med
    } else {
        RiskLevel::Low
    }
}

pub fn adapt(report: &CanonicalReport, cfg: &OutputConfig) -> ConsumerReport {
    let mut suspicious_accounts: Vec<ConsumerAccount> =
        report.suspicious_accounts.iter().map(|a| adapt_account(a, cfg)).collect();
    suspicious_accounts.sort_by(|a, b| b.suspicion_score.total_cmp(&a.suspicion_score));

    ConsumerReport {
        suspicious_accounts,
        fraud_rings: report.fraud_rings.iter().map(adapt_ring).collect(),
        summary: report.summary,
    }
}

fn adapt_account(acc: &CanonicalAccount, cfg: &OutputConfig) -> ConsumerAccount {
    let mut patterns: Vec<ExternalPattern> = Vec::new();
    for p in acc.detected_patterns.iter().filter_map(|t| ExternalPattern::from_tag(*t)) {
        if !patterns.contains(&p) { patterns.push(p); }
    }

    let sig = &acc.signals;
    let mut reasons = vec![format!(
        "activity_gate(total_tx={},penalty={})",
        sig.tx_count,
        activity_penalty(sig.tx_count)
    )];
    if patterns.contains(&ExternalPattern::Cycle) {
        let size = if sig.min_cycle_length == 0 { 3 } else { sig.min_cycle_length };
        reasons.push(format!("cycle_centrality(deg={},size={})", sig.cycle_count, size));
    }
    if patterns.contains(&ExternalPattern::FanIn) {
        reasons.push(format!("fan_in_intensity(in={})", sig.fan_in));
    }
    reasons.push(format!(
        "low_activity_cap(total_tx={},score_cap={})",
        sig.tx_count,
        acc.suspicion_score.min(cfg.low_activity_cap)
    ));

    ConsumerAccount {
        account_id: acc.account_id.clone(),
        suspicion_score: round_to(acc.suspicion_score, 1),
        risk_level: risk_level(acc.suspicion_score, cfg),
        reasons,
        detected_patterns: patterns,
        ring_id: acc.ring_id.clone(),
    }
}

fn adapt_ring(ring: &CanonicalRing) -> ConsumerRing {
    ConsumerRing {
        ring_id: ring.ring_id.clone(),
        member_accounts: ring.member_accounts.clone(),
        pattern_type: ring.pattern_type.into(),
        risk_score: ring.risk_score,
    }
}
