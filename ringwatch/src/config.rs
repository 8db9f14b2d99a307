// ringwatch/src/config.rs
//
// Externally tunable detection parameters.
//
// Every section is `#[serde(default)]`, so a JSON file only needs the keys it
// overrides:
//
//   { "smurf": { "time_window_hours": 24 }, "scoring": { "max_score": 90 } }

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub cycle: CycleConfig,
    pub smurf: SmurfConfig,
    pub shell: ShellConfig,
    pub merchant: MerchantConfig,
    pub payroll: PayrollConfig,
    pub scoring: ScoringConfig,
    pub output: OutputConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleConfig {
    pub min_length: usize,
    pub max_length: usize,
    pub dfs_depth_limit: usize,
    /// Skip edges whose endpoints share a layer. Trades recall on
    /// single-layer cycles for a smaller search.
    pub prune_same_layer: bool,
    /// Enumeration stops once this many distinct cycles are recorded.
    pub max_cycles: usize,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            min_length: 3,
            max_length: 5,
            dfs_depth_limit: 5,
            prune_same_layer: true,
            max_cycles: 10_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmurfConfig {
    pub fan_in_threshold: usize,
    pub fan_out_threshold: usize,
    pub time_window_hours: u32,
}

impl Default for SmurfConfig {
    fn default() -> Self {
        Self { fan_in_threshold: 10, fan_out_threshold: 10, time_window_hours: 72 }
    }
}

impl SmurfConfig {
    /// Minimum in-window transfer count for a hub to be flagged.
    pub fn density_threshold(&self) -> usize {
        self.fan_in_threshold.max(self.fan_out_threshold)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    pub chain_min_length: usize,
    pub degree_min: usize,
    pub degree_max: usize,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self { chain_min_length: 3, degree_min: 1, degree_max: 3 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MerchantConfig {
    pub high_fan_out: usize,
    pub low_fan_in: usize,
    /// Max coefficient of variation of outbound amounts.
    pub amount_cv_threshold: f64,
    pub high_volume_tx_count: usize,
    pub high_volume_degree: usize,
    pub flow_ratio_min: f64,
    pub flow_ratio_max: f64,
    /// Case-sensitive substrings that mark institutional accounts. A naming
    /// shortcut, not a classifier.
    pub keywords: Vec<String>,
}

impl Default for MerchantConfig {
    fn default() -> Self {
        Self {
            high_fan_out: 20,
            low_fan_in: 2,
            amount_cv_threshold: 0.3,
            high_volume_tx_count: 40,
            high_volume_degree: 8,
            flow_ratio_min: 0.7,
            flow_ratio_max: 1.3,
            keywords: vec!["MERCHANT".into(), "PAYROLL".into(), "BANK".into()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayrollConfig {
    pub max_fan_in: usize,
    pub min_receivers: usize,
    /// Max relative deviation of any outbound amount from the mean.
    pub amount_tolerance: f64,
}

impl Default for PayrollConfig {
    fn default() -> Self {
        Self { max_fan_in: 2, min_receivers: 5, amount_tolerance: 0.15 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub cycle: f64,
    pub smurf: f64,
    pub shell: f64,
    pub velocity: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self { cycle: 40.0, smurf: 30.0, shell: 20.0, velocity: 10.0 }
    }
}

/// Accepted for config compatibility. Merchant and payroll accounts are
/// forced to 0 before scoring, so these values never move a score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorePenalties {
    pub merchant: f64,
    pub payroll: f64,
}

impl Default for ScorePenalties {
    fn default() -> Self {
        Self { merchant: 50.0, payroll: 50.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: ScoreWeights,
    pub penalties: ScorePenalties,
    pub min_score: f64,
    pub max_score: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            penalties: ScorePenalties::default(),
            min_score: 0.0,
            max_score: 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub high_tier: f64,
    pub med_tier: f64,
    /// Score cap quoted in the consumer-facing low-activity reason.
    pub low_activity_cap: f64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { high_tier: 70.0, med_tier: 30.0, low_activity_cap: 35.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub capacity: usize,
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { capacity: 64, ttl_secs: 300 }
    }
}

impl DetectionConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let c = &self.cycle;
        if c.min_length < 2 {
            return invalid(format!("cycle.min_length must be >= 2, got {}", c.min_length));
        }
        if c.min_length > c.max_length {
            return invalid(format!(
                "cycle.min_length {} exceeds cycle.max_length {}",
                c.min_length, c.max_length
            ));
        }
        if c.dfs_depth_limit == 0 {
            return invalid("cycle.dfs_depth_limit must be positive".into());
        }
        if self.smurf.time_window_hours == 0 {
            return invalid("smurf.time_window_hours must be positive".into());
        }
        if self.shell.degree_min > self.shell.degree_max {
            return invalid(format!(
                "shell degree band [{}, {}] is inverted",
                self.shell.degree_min, self.shell.degree_max
            ));
        }
        let m = &self.merchant;
        if m.flow_ratio_min > m.flow_ratio_max {
            return invalid("merchant flow ratio band is inverted".into());
        }
        if m.keywords.iter().any(|k| k.is_empty()) {
            return invalid("merchant.keywords must not contain empty strings".into());
        }
        let w = &self.scoring.weights;
        if [w.cycle, w.smurf, w.shell, w.velocity].iter().any(|v| *v < 0.0 || !v.is_finite()) {
            return invalid("scoring weights must be finite and non-negative".into());
        }
        if self.scoring.min_score > self.scoring.max_score {
            return invalid(format!(
                "scoring.min_score {} exceeds scoring.max_score {}",
                self.scoring.min_score, self.scoring.max_score
            ));
        }
        if self.output.med_tier > self.output.high_tier {
            return invalid("output.med_tier exceeds output.high_tier".into());
        }
        Ok(())
    }
}

fn invalid(message: String) -> Result<()> {
    Err(PipelineError::InvalidConfig(message))
}
