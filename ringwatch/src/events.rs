// ringwatch/src/events.rs
//
// Shared domain types flowing through ringwatch: raw transfer records,
// detector outputs, rings, and per-account suspicion records.
//
// Detector and ring types reference accounts by graph NodeIndex; account
// id strings only reappear at the output boundary.

use chrono::{DateTime, NaiveDateTime, Utc};
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Deserializer, Serialize};

// ── Input ─────────────────────────────────────────────────────────────────────

/// One money transfer, pre-validated upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub amount: f64,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    /// Ground-truth campaign label, only present in evaluation datasets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Transaction {
    pub fn new(
        transaction_id: impl Into<String>,
        sender_id: impl Into<String>,
        receiver_id: impl Into<String>,
        amount: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            sender_id: sender_id.into(),
            receiver_id: receiver_id.into(),
            amount,
            timestamp,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Accepts RFC 3339 as well as the bare `YYYY-MM-DD HH:MM:SS` form (UTC).
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!("unrecognised timestamp: {raw}"))
    })
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// The per-transfer payload kept inside an edge bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TxRecord {
    pub amount: f64,
    pub timestamp: DateTime<Utc>,
}

/// All transfers for one ordered (sender, receiver) pair, in input order.
pub type EdgeBucket = Vec<TxRecord>;

// ── Detector outputs ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DetectorKind {
    Cycle, // bounded elementary circuits
    Smurf, // fan-in / fan-out with temporal density
    Shell, // degree-banded pass-through chains
}

impl std::fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cycle => f.pad("cycle"),
            Self::Smurf => f.pad("smurf"),
            Self::Shell => f.pad("shell"),
        }
    }
}

/// A closed walk over distinct accounts; the closing edge runs last → first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycle {
    pub members: Vec<NodeIndex>,
}

impl Cycle {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, node: NodeIndex) -> bool {
        self.members.contains(&node)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmurfSignal {
    pub node: NodeIndex,
    pub fan_in: usize,
    pub fan_out: usize,
    /// Densest count of adjacent transfers inside one sliding window.
    pub window_tx_count: usize,
    pub bipartite: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellChain {
    pub members: Vec<NodeIndex>,
}

impl ShellChain {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

// ── Behaviour classes ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BehaviorClass {
    #[default]
    None,
    Merchant,
    Payroll,
}

impl BehaviorClass {
    pub fn is_filtered(self) -> bool {
        self != Self::None
    }
}

impl std::fmt::Display for BehaviorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Merchant => write!(f, "merchant"),
            Self::Payroll => write!(f, "payroll"),
        }
    }
}

// ── Rings ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PatternType {
    Cycle,
    Smurfing,
    Shell,
}

impl std::fmt::Display for PatternType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cycle => f.pad("cycle"),
            Self::Smurfing => f.pad("smurfing"),
            Self::Shell => f.pad("shell"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ring {
    pub ring_id: String,
    pub members: Vec<NodeIndex>,
    pub pattern: PatternType,
    /// Max suspicion score over `members`; filled in after scoring.
    pub risk_score: f64,
}

// ── Scoring ───────────────────────────────────────────────────────────────────

/// Which scoring terms fired for an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternTag {
    CycleLength(usize),
    BipartitePattern,
    HighFanIn,
    HighFanOut,
    Smurfing,
    ShellChain,
    HighVelocity,
    LayeredDepth,
}

impl PatternTag {
    pub fn is_cycle(self) -> bool {
        matches!(self, Self::CycleLength(_))
    }
}

impl std::fmt::Display for PatternTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CycleLength(n) => write!(f, "cycle_length_{n}"),
            Self::BipartitePattern => write!(f, "bipartite_pattern"),
            Self::HighFanIn => write!(f, "high_fan_in"),
            Self::HighFanOut => write!(f, "high_fan_out"),
            Self::Smurfing => write!(f, "smurfing"),
            Self::ShellChain => write!(f, "shell_chain"),
            Self::HighVelocity => write!(f, "high_velocity"),
            Self::LayeredDepth => write!(f, "layered_depth"),
        }
    }
}

impl Serialize for PatternTag {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Statistics that drive the reason codes of one account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ExplainMeta {
    pub tx_count: usize,
    pub fan_in: usize,
    pub fan_out: usize,
    pub level: usize,
    pub cycle_count: usize,
    pub min_cycle_length: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuspicionRecord {
    pub account_id: String,
    pub score: f64,
    pub patterns: Vec<PatternTag>,
    pub ring_id: Option<String>,
    pub reasons: Vec<String>,
    pub narrative: String,
    pub meta: ExplainMeta,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskLevel {
    #[serde(rename = "LOW")]
    Low,
    #[serde(rename = "MED")]
    Med,
    #[serde(rename = "HIGH")]
    High,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => f.pad("LOW"),
            Self::Med => f.pad("MED"),
            Self::High => f.pad("HIGH"),
        }
    }
}

/// Account removed from scoring by a behaviour filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilteredAccount {
    pub account_id: String,
    pub class: BehaviorClass,
}

/// Limits the detectors ran under; results are best-effort within them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SearchBounds {
    pub cycle_min_length: usize,
    pub cycle_max_length: usize,
    pub dfs_depth_limit: usize,
    pub max_cycles: usize,
    pub same_layer_pruning: bool,
    pub cycles_truncated: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_timestamp_forms() {
        let a = parse_timestamp("2024-03-01 10:15:00").unwrap();
        let b = parse_timestamp("2024-03-01T10:15:00Z").unwrap();
        assert_eq!(a, b);
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn transaction_decodes_space_separated_timestamp() {
        let raw = r#"{"transaction_id":"T1","sender_id":"A","receiver_id":"B",
                      "amount":12.5,"timestamp":"2024-03-01 10:15:00"}"#;
        let tx: Transaction = serde_json::from_str(raw).unwrap();
        assert_eq!(tx.amount, 12.5);
        assert!(tx.label.is_none());
    }

    #[test]
    fn pattern_tags_render_external_names() {
        assert_eq!(PatternTag::CycleLength(4).to_string(), "cycle_length_4");
        assert_eq!(
            serde_json::to_string(&PatternTag::HighFanIn).unwrap(),
            "\"high_fan_in\""
        );
        assert_eq!(serde_json::to_string(&RiskLevel::Med).unwrap(), "\"MED\"");
    }
}
