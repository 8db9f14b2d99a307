// ringwatch/src/source.rs
//
// Transaction file loading. Accepts a JSON array of transactions or JSON
// Lines (one object per line). Identifiers are trimmed; records with an
// empty endpoint or a negative / non-finite amount are skipped with a
// warning rather than failing the batch.

use std::path::Path;

use serde_json::Value;
use tracing::{info, warn};

use crate::error::{PipelineError, Result};
use crate::events::Transaction;

pub async fn load_transactions(path: &Path) -> Result<Vec<Transaction>> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| PipelineError::Source {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let txs = parse_transactions(&content).map_err(|message| PipelineError::Source {
        path: path.to_path_buf(),
        message,
    })?;
    info!("Loaded {} transactions from {}", txs.len(), path.display());
    Ok(txs)
}

/// Parse file content; the error is only for a malformed top-level array.
pub fn parse_transactions(content: &str) -> std::result::Result<Vec<Transaction>, String> {
    let trimmed = content.trim_start();
    let mut out = Vec::new();

    if trimmed.starts_with('[') {
        let rows: Vec<Value> = serde_json::from_str(trimmed).map_err(|e| e.to_string())?;
        for (i, row) in rows.into_iter().enumerate() {
            match serde_json::from_value::<Transaction>(row) {
                Ok(tx) => accept(tx, i + 1, &mut out),
                Err(e) => warn!("Skipping record {}: {}", i + 1, e),
            }
        }
    } else {
        for (i, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() { continue; }
            match serde_json::from_str::<Transaction>(line) {
                Ok(tx) => accept(tx, i + 1, &mut out),
                Err(e) => warn!("Parse error on line {}: {}", i + 1, e),
            }
        }
    }
    Ok(out)
}

fn accept(mut tx: Transaction, pos: usize, out: &mut Vec<Transaction>) {
    tx.transaction_id = tx.transaction_id.trim().to_string();
    tx.sender_id = tx.sender_id.trim().to_string();
    tx.receiver_id = tx.receiver_id.trim().to_string();

    if tx.sender_id.is_empty() || tx.receiver_id.is_empty() {
        warn!("Skipping record {}: empty endpoint", pos);
        return;
    }
    if !tx.amount.is_finite() || tx.amount < 0.0 {
        warn!("Skipping record {}: invalid amount {}", pos, tx.amount);
        return;
    }
    out.push(tx);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_json_lines_and_skips_bad_rows() {
        let content = r#"
{"transaction_id":"T1","sender_id":" A ","receiver_id":"B","amount":10,"timestamp":"2024-01-01 00:00:00"}
not json
{"transaction_id":"T2","sender_id":"B","receiver_id":"C","amount":-5,"timestamp":"2024-01-01 00:00:00"}
{"transaction_id":"T3","sender_id":"","receiver_id":"C","amount":5,"timestamp":"2024-01-01 00:00:00"}
{"transaction_id":"T4","sender_id":"B","receiver_id":"C","amount":5,"timestamp":"2024-01-01T01:00:00Z","label":"ring_1"}
"#;
        let txs = parse_transactions(content).unwrap();
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].sender_id, "A");
        assert_eq!(txs[1].label.as_deref(), Some("ring_1"));
    }

    #[test]
    fn reads_json_array() {
        let content = r#"[
            {"transaction_id":"T1","sender_id":"A","receiver_id":"B","amount":10,"timestamp":"2024-01-01 00:00:00"},
            {"transaction_id":"T2","sender_id":"B","receiver_id":"A","amount":"oops","timestamp":"2024-01-01 00:00:00"}
        ]"#;
        let txs = parse_transactions(content).unwrap();
        assert_eq!(txs.len(), 1);
    }

    #[test]
    fn malformed_array_is_an_error() {
        assert!(parse_transactions("[ {").is_err());
    }

    #[tokio::test]
    async fn missing_file_reports_source_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_transactions(&dir.path().join("absent.jsonl")).await.unwrap_err();
        assert!(matches!(err, PipelineError::Source { .. }));
    }
}
