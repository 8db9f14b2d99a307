// ringwatch/src/filters/merchant.rs
//
// Institutional-account heuristics. Any one rule marks an account merchant:
//
//   legacy       fan_out >= high_fan_out, fan_in <= low_fan_in, stable amounts
//   high volume  tx_count >= high_volume_tx_count, fan_in or fan_out
//                >= high_volume_degree, stable amounts, out/in flow ratio
//                inside [flow_ratio_min, flow_ratio_max]
//   keyword      account id contains one of the configured keywords
//
// "Stable amounts" means the outbound coefficient of variation is at most
// amount_cv_threshold.

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};

use crate::config::MerchantConfig;
use crate::error::{PipelineError, Result};
use crate::state::metrics::NodeMetrics;

pub struct MerchantRules<'a> {
    cfg: &'a MerchantConfig,
    keywords: Option<AhoCorasick>,
}

impl<'a> MerchantRules<'a> {
    pub fn new(cfg: &'a MerchantConfig) -> Result<Self> {
        let keywords = if cfg.keywords.is_empty() {
            None
        } else {
            let ac = AhoCorasickBuilder::new()
                .match_kind(MatchKind::LeftmostFirst)
                .build(&cfg.keywords)
                .map_err(|e| PipelineError::InvalidConfig(format!("merchant.keywords: {e}")))?;
            Some(ac)
        };
        Ok(Self { cfg, keywords })
    }

    pub fn is_merchant(&self, account_id: &str, m: &NodeMetrics) -> bool {
        self.legacy(m) || self.high_volume(m) || self.keyword(account_id)
    }

    fn stable_amounts(&self, m: &NodeMetrics) -> bool {
        m.amount_cv() <= self.cfg.amount_cv_threshold
    }

    fn legacy(&self, m: &NodeMetrics) -> bool {
        m.fan_out >= self.cfg.high_fan_out && m.fan_in <= self.cfg.low_fan_in && self.stable_amounts(m)
    }

    fn high_volume(&self, m: &NodeMetrics) -> bool {
        let busy = m.tx_count >= self.cfg.high_volume_tx_count
            && (m.fan_in >= self.cfg.high_volume_degree || m.fan_out >= self.cfg.high_volume_degree);
        let ratio = m.flow_ratio();
        busy && self.stable_amounts(m)
            && ratio >= self.cfg.flow_ratio_min
            && ratio <= self.cfg.flow_ratio_max
    }

    fn keyword(&self, account_id: &str) -> bool {
        self.keywords.as_ref().is_some_and(|ac| ac.is_match(account_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(fan_in: usize, fan_out: usize, tx_count: usize, total_in: f64, total_out: f64, cv: f64) -> NodeMetrics {
        let avg_out = 100.0;
        NodeMetrics {
            fan_in,
            fan_out,
            degree: fan_in + fan_out,
            total_in,
            total_out,
            avg_out,
            variance: (cv * avg_out).powi(2),
            std_dev: cv * avg_out,
            tx_count,
        }
    }

    #[test]
    fn legacy_rule_matches_stable_disperser() {
        let cfg = MerchantConfig::default();
        let rules = MerchantRules::new(&cfg).unwrap();
        assert!(rules.is_merchant("ACC1", &metrics(1, 25, 25, 0.0, 2500.0, 0.1)));
        assert!(!rules.is_merchant("ACC1", &metrics(1, 25, 25, 0.0, 2500.0, 0.9)));
    }

    #[test]
    fn high_volume_rule_needs_balanced_flow() {
        let cfg = MerchantConfig::default();
        let rules = MerchantRules::new(&cfg).unwrap();
        assert!(rules.is_merchant("ACC2", &metrics(10, 10, 50, 5000.0, 5000.0, 0.1)));
        assert!(!rules.is_merchant("ACC2", &metrics(10, 10, 50, 5000.0, 9000.0, 0.1)));
    }

    #[test]
    fn keyword_match_is_case_sensitive_substring() {
        let cfg = MerchantConfig::default();
        let rules = MerchantRules::new(&cfg).unwrap();
        let quiet = NodeMetrics::default();
        assert!(rules.is_merchant("ACME_MERCHANT_01", &quiet));
        assert!(rules.is_merchant("XBANKX", &quiet));
        assert!(!rules.is_merchant("acme_merchant_01", &quiet));
    }

    #[test]
    fn empty_keyword_list_disables_the_rule() {
        let cfg = MerchantConfig { keywords: Vec::new(), ..MerchantConfig::default() };
        let rules = MerchantRules::new(&cfg).unwrap();
        assert!(!rules.is_merchant("ACME_MERCHANT_01", &NodeMetrics::default()));
    }
}
