// ringwatch/src/engine/scoring.rs
//
// Composite per-account suspicion score.
//
// Terms (weights from ScoringConfig):
//   cycle     w_cycle * min(cycles / 3, 1) * (1.0 if shortest cycle is 3 else 0.7)
//   smurf     min(w_smurf * (fan_in + fan_out) / 30, w_smurf), x1.1 when bipartite
//   shell     w_shell * min(chain_len / 5, 1)
//   velocity  w_velocity * min(tx / 100, 1), only once tx / 100 > 0.5
//   layering  min(layer * 1.5, 5), from layer 2 on
//
// The sum is rounded to one decimal and clamped to [min_score, max_score].
// Merchant and payroll accounts score 0 with no tags, whatever the
// configured penalties; the penalties never reach a score.
//
// Scoring reads only immutable inputs, so accounts can be scored in any
// order with identical results.

use petgraph::graph::NodeIndex;
use tracing::debug;

use crate::config::ScoringConfig;
use crate::events::{ExplainMeta, PatternTag, SmurfSignal};
use crate::filters::BehaviorMap;
use crate::output::round_to;
use crate::state::metrics::GraphMetrics;
use crate::workers::DetectorOutputs;

const CYCLE_SATURATION: f64 = 3.0;
const SMURF_SATURATION: f64 = 30.0;
const BIPARTITE_UPLIFT: f64 = 1.1;
const SHELL_SATURATION: f64 = 5.0;
const VELOCITY_SCALE: f64 = 100.0;
const VELOCITY_GATE: f64 = 0.5;
const LAYER_STEP: f64 = 1.5;
const LAYER_BONUS_CAP: f64 = 5.0;
const HIGH_FAN: usize = 10;

/// Detector evidence per account, index = node index.
#[derive(Debug, Clone, Default)]
pub struct PatternIndex {
    cycle_count: Vec<usize>,
    min_cycle_len: Vec<usize>,
    smurf: Vec<Option<SmurfSignal>>,
    shell_len: Vec<Option<usize>>,
    /// Cycle members, then smurf hubs, then shell members; each once.
    touched: Vec<NodeIndex>,
}

impl PatternIndex {
    pub fn build(node_count: usize, outputs: &DetectorOutputs) -> Self {
        let mut idx = Self {
            cycle_count: vec![0; node_count],
            min_cycle_len: vec![0; node_count],
            smurf: vec![None; node_count],
            shell_len: vec![None; node_count],
            touched: Vec::new(),
        };
        let mut seen = vec![false; node_count];
        let mut touch = |n: NodeIndex, touched: &mut Vec<NodeIndex>| {
            if let Some(s) = seen.get_mut(n.index()) {
                if !*s {
                    *s = true;
                    touched.push(n);
                }
            }
        };

        for cycle in &outputs.cycles.cycles {
            for &n in &cycle.members {
                let i = n.index();
                if i >= node_count { continue; }
                idx.cycle_count[i] += 1;
                let len = cycle.len();
                if idx.min_cycle_len[i] == 0 || len < idx.min_cycle_len[i] {
                    idx.min_cycle_len[i] = len;
                }
                touch(n, &mut idx.touched);
            }
        }
        for signal in &outputs.smurfs {
            if let Some(slot) = idx.smurf.get_mut(signal.node.index()) {
                *slot = Some(*signal);
                touch(signal.node, &mut idx.touched);
            }
        }
        for chain in &outputs.shells {
            for &n in &chain.members {
                if let Some(slot) = idx.shell_len.get_mut(n.index()) {
                    *slot = Some(chain.len());
                    touch(n, &mut idx.touched);
                }
            }
        }
        idx
    }

    /// Every account any detector reported, in detector order.
    pub fn touched(&self) -> &[NodeIndex] {
        &self.touched
    }

    pub fn cycle_count(&self, node: NodeIndex) -> usize {
        self.cycle_count.get(node.index()).copied().unwrap_or(0)
    }

    /// Shortest cycle through `node`; 0 when it is on none.
    pub fn min_cycle_len(&self, node: NodeIndex) -> usize {
        self.min_cycle_len.get(node.index()).copied().unwrap_or(0)
    }

    pub fn smurf(&self, node: NodeIndex) -> Option<SmurfSignal> {
        self.smurf.get(node.index()).copied().flatten()
    }

    pub fn shell_len(&self, node: NodeIndex) -> Option<usize> {
        self.shell_len.get(node.index()).copied().flatten()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccountScore {
    pub score: f64,
    pub patterns: Vec<PatternTag>,
}

pub struct ScoringEngine<'a> {
    cfg: &'a ScoringConfig,
    index: &'a PatternIndex,
    metrics: &'a GraphMetrics,
    behavior: &'a BehaviorMap,
}

impl<'a> ScoringEngine<'a> {
    pub fn new(
        cfg: &'a ScoringConfig,
        index: &'a PatternIndex,
        metrics: &'a GraphMetrics,
        behavior: &'a BehaviorMap,
    ) -> Self {
        Self { cfg, index, metrics, behavior }
    }

    pub fn score(&self, node: NodeIndex) -> AccountScore {
        let class = self.behavior.class(node);
        if class.is_filtered() {
            debug!(node = node.index(), %class, "Filtered account forced to zero");
            return AccountScore { score: 0.0, patterns: Vec::new() };
        }

        let w = &self.cfg.weights;
        let mut score = 0.0;
        let mut patterns = Vec::new();

        let cycles = self.index.cycle_count(node);
        if cycles > 0 {
            let min_len = self.index.min_cycle_len(node);
            let depth_bonus = if min_len == 3 { 1.0 } else { 0.7 };
            score += w.cycle * (cycles as f64 / CYCLE_SATURATION).min(1.0) * depth_bonus;
            patterns.push(PatternTag::CycleLength(min_len));
        }

        if let Some(s) = self.index.smurf(node) {
            let mut term = (w.smurf * (s.fan_in + s.fan_out) as f64 / SMURF_SATURATION).min(w.smurf);
            if s.bipartite {
                term *= BIPARTITE_UPLIFT;
                patterns.push(PatternTag::BipartitePattern);
            }
            score += term;
            if s.fan_in >= HIGH_FAN { patterns.push(PatternTag::HighFanIn); }
            if s.fan_out >= HIGH_FAN { patterns.push(PatternTag::HighFanOut); }
            patterns.push(PatternTag::Smurfing);
        }

        if let Some(len) = self.index.shell_len(node) {
            score += w.shell * (len as f64 / SHELL_SATURATION).min(1.0);
            patterns.push(PatternTag::ShellChain);
        }

        let velocity = self.metrics.get(node).tx_count as f64 / VELOCITY_SCALE;
        if velocity > VELOCITY_GATE {
            score += w.velocity * velocity.min(1.0);
            patterns.push(PatternTag::HighVelocity);
        }

        if let Some(layer) = self.metrics.layer(node).filter(|l| *l >= 2) {
            score += (layer as f64 * LAYER_STEP).min(LAYER_BONUS_CAP);
            patterns.push(PatternTag::LayeredDepth);
        }

        let mut unique = Vec::with_capacity(patterns.len());
        for p in patterns {
            if !unique.contains(&p) { unique.push(p); }
        }

        let score = round_to(score, 1).clamp(self.cfg.min_score, self.cfg.max_score);
        AccountScore { score, patterns: unique }
    }

    /// Statistics quoted by the explanation for `node`.
    pub fn meta(&self, node: NodeIndex) -> ExplainMeta {
        let m = self.metrics.get(node);
        ExplainMeta {
            tx_count: m.tx_count,
            fan_in: m.fan_in,
            fan_out: m.fan_out,
            level: self.metrics.layer(node).unwrap_or(0),
            cycle_count: self.index.cycle_count(node),
            min_cycle_length: self.index.min_cycle_len(node),
        }
    }
}
