// ringwatch/src/output/writer.rs
//
// Writes one batch's reports into an output directory:
//   result.json          consumer report
//   graph.json           node/link view
//   explanations.jsonl   one SuspicionRecord per line
// and appends one RunRecord per batch to analysis_runs.jsonl, the running
// history of analyses.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::engine::pipeline::PipelineOutput;

pub const RESULT_FILE: &str = "result.json";
pub const GRAPH_FILE: &str = "graph.json";
pub const EXPLANATIONS_FILE: &str = "explanations.jsonl";
pub const RUNS_FILE: &str = "analysis_runs.jsonl";

/// Summary line kept for every analysed batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: String,
    pub source: String,
    pub total_transactions: usize,
    pub total_accounts: usize,
    pub suspicious_accounts: usize,
    pub fraud_rings: usize,
    pub processing_time_seconds: f64,
    pub cycles_truncated: bool,
    pub created_at: DateTime<Utc>,
}

impl RunRecord {
    pub fn new(run_id: impl Into<String>, source: impl Into<String>, output: &PipelineOutput) -> Self {
        let summary = &output.result.summary;
        Self {
            run_id: run_id.into(),
            source: source.into(),
            total_transactions: output.total_transactions,
            total_accounts: summary.total_accounts_analyzed,
            suspicious_accounts: summary.suspicious_accounts_flagged,
            fraud_rings: summary.fraud_rings_detected,
            processing_time_seconds: summary.processing_time_seconds,
            cycles_truncated: output.bounds.cycles_truncated,
            created_at: Utc::now(),
        }
    }
}

pub struct ReportWriter {
    out: PathBuf,
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let out: PathBuf = output_dir.into();
        std::fs::create_dir_all(&out)
            .with_context(|| format!("creating output directory {}", out.display()))?;
        Ok(Self { out })
    }

    pub fn dir(&self) -> &Path {
        &self.out
    }

    pub async fn write_reports(&self, output: &PipelineOutput) -> Result<()> {
        self.replace(RESULT_FILE, &serde_json::to_string_pretty(&output.result)?).await?;
        self.replace(GRAPH_FILE, &serde_json::to_string(&output.graph_data)?).await?;

        let mut lines = String::new();
        for record in &output.records {
            lines.push_str(&serde_json::to_string(record)?);
            lines.push('\n');
        }
        self.replace(EXPLANATIONS_FILE, &lines).await?;

        info!(
            "REPORTS dir={} accounts={} rings={}",
            self.out.display(),
            output.result.summary.suspicious_accounts_flagged,
            output.result.summary.fraud_rings_detected
        );
        Ok(())
    }

    pub async fn append_run(&self, record: &RunRecord) -> Result<()> {
        let line = serde_json::to_string(record)? + "\n";
        self.append(RUNS_FILE, &line).await
    }

    async fn replace(&self, file: &str, content: &str) -> Result<()> {
        let path = self.out.join(file);
        fs::write(&path, content)
            .await
            .with_context(|| format!("writing {}", path.display()))
    }

    async fn append(&self, file: &str, content: &str) -> Result<()> {
        let mut f = OpenOptions::new().create(true).append(true)
            .open(self.out.join(file)).await?;
        f.write_all(content.as_bytes()).await?;
        Ok(())
    }
}
