pub mod cycles;
pub mod shell;
pub mod smurf;

use std::sync::Arc;

use tokio::task::{spawn_blocking, JoinError};

use crate::config::DetectionConfig;
use crate::error::{PipelineError, Result};
use crate::events::{DetectorKind, ShellChain, SmurfSignal};
use crate::state::GraphSnapshot;

pub use cycles::CycleReport;

/// Raw detector results for one batch, before behaviour filtering.
#[derive(Debug, Clone, Default)]
pub struct DetectorOutputs {
    pub cycles: CycleReport,
    pub smurfs: Vec<SmurfSignal>,
    pub shells: Vec<ShellChain>,
}

/// Run all detectors concurrently over a shared read-only snapshot.
/// Each detector is CPU-bound and runs on the blocking pool; a panicking
/// detector fails the whole batch.
pub async fn run_all(snapshot: Arc<GraphSnapshot>, config: Arc<DetectionConfig>) -> Result<DetectorOutputs> {
    let cycle_task = {
        let (s, c) = (Arc::clone(&snapshot), Arc::clone(&config));
        spawn_blocking(move || cycles::detect(&s.graph, &s.metrics.layering, &c.cycle))
    };
    let smurf_task = {
        let (s, c) = (Arc::clone(&snapshot), Arc::clone(&config));
        spawn_blocking(move || smurf::detect(&s.graph, &s.metrics.layering, &c.smurf))
    };
    let shell_task = {
        let (s, c) = (snapshot, config);
        spawn_blocking(move || shell::detect(&s.graph, &c.shell))
    };

    let (cyc, smf, shl) = tokio::join!(cycle_task, smurf_task, shell_task);

    Ok(DetectorOutputs {
        cycles: cyc.map_err(|e| task_failed(DetectorKind::Cycle, e))?,
        smurfs: smf.map_err(|e| task_failed(DetectorKind::Smurf, e))?,
        shells: shl.map_err(|e| task_failed(DetectorKind::Shell, e))?,
    })
}

fn task_failed(kind: DetectorKind, err: JoinError) -> PipelineError {
    PipelineError::DetectorTask(format!("{kind} detector: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Transaction;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn detectors_see_the_same_snapshot() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let txs = vec![
            Transaction::new("1", "A", "B", 1000.0, ts),
            Transaction::new("2", "B", "C", 1000.0, ts),
            Transaction::new("3", "C", "A", 1000.0, ts),
        ];
        let snapshot = Arc::new(GraphSnapshot::build(&txs));
        let out = run_all(snapshot, Arc::new(DetectionConfig::default())).await.unwrap();
        assert_eq!(out.cycles.cycles.len(), 1);
        assert!(out.smurfs.is_empty());
        assert_eq!(out.shells.len(), 1);
    }
}
