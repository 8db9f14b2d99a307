// ringwatch/src/filters/mod.rs
//
// Behaviour filters: accounts whose activity looks institutional (merchant)
// or like salary dispersal (payroll) are excluded from rings and scoring.
// Merchant wins when both apply.

pub mod merchant;
pub mod payroll;

use petgraph::graph::NodeIndex;
use tracing::debug;

use crate::config::DetectionConfig;
use crate::error::Result;
use crate::events::{BehaviorClass, FilteredAccount};
use crate::state::GraphSnapshot;

use merchant::MerchantRules;

/// Behaviour class per account, index = node index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BehaviorMap {
    classes: Vec<BehaviorClass>,
}

impl BehaviorMap {
    pub fn new(n: usize) -> Self {
        Self { classes: vec![BehaviorClass::None; n] }
    }

    pub fn set(&mut self, node: NodeIndex, class: BehaviorClass) {
        if let Some(slot) = self.classes.get_mut(node.index()) {
            *slot = class;
        }
    }

    pub fn class(&self, node: NodeIndex) -> BehaviorClass {
        self.classes.get(node.index()).copied().unwrap_or_default()
    }

    pub fn is_filtered(&self, node: NodeIndex) -> bool {
        self.class(node).is_filtered()
    }

    pub fn count(&self, class: BehaviorClass) -> usize {
        self.classes.iter().filter(|c| **c == class).count()
    }

    /// Filtered accounts in first-seen order.
    pub fn filtered(&self) -> impl Iterator<Item = (NodeIndex, BehaviorClass)> + '_ {
        self.classes
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_filtered())
            .map(|(i, c)| (NodeIndex::new(i), *c))
    }
}

pub fn classify(snapshot: &GraphSnapshot, config: &DetectionConfig) -> Result<BehaviorMap> {
    let graph = &snapshot.graph;
    let rules = MerchantRules::new(&config.merchant)?;
    let mut map = BehaviorMap::new(graph.node_count());

    for node in graph.nodes() {
        let m = snapshot.metrics.get(node);
        if rules.is_merchant(graph.account_id(node), &m) {
            map.set(node, BehaviorClass::Merchant);
        } else if payroll::is_payroll(graph, node, &config.payroll) {
            map.set(node, BehaviorClass::Payroll);
        }
    }

    debug!(
        merchants = map.count(BehaviorClass::Merchant),
        payroll = map.count(BehaviorClass::Payroll),
        "Behaviour filters applied"
    );
    Ok(map)
}

pub fn filtered_accounts(snapshot: &GraphSnapshot, map: &BehaviorMap) -> Vec<FilteredAccount> {
    map.filtered()
        .map(|(node, class)| FilteredAccount {
            account_id: snapshot.graph.account_id(node).to_string(),
            class,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Transaction;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn merchant_takes_precedence_over_payroll() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let txs: Vec<Transaction> = (0..6)
            .map(|i| Transaction::new(format!("T{i}"), "BANK_PAY", format!("E{i}"), 2000.0, ts))
            .collect();
        let snapshot = GraphSnapshot::build(&txs);
        let map = classify(&snapshot, &DetectionConfig::default()).unwrap();
        let payer = snapshot.graph.node("BANK_PAY").unwrap();
        assert_eq!(map.class(payer), BehaviorClass::Merchant);
    }

    #[test]
    fn payroll_sender_is_filtered_receivers_are_not() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut txs = Vec::new();
        for round in 0..5 {
            for e in 0..10 {
                let amount = 2000.0 + (e as f64) * 5.0;
                txs.push(Transaction::new(
                    format!("T{round}-{e}"),
                    "P",
                    format!("EMP{e}"),
                    amount,
                    ts + Duration::days(30 * round),
                ));
            }
        }
        let snapshot = GraphSnapshot::build(&txs);
        let map = classify(&snapshot, &DetectionConfig::default()).unwrap();
        assert_eq!(map.class(snapshot.graph.node("P").unwrap()), BehaviorClass::Payroll);
        assert!(!map.is_filtered(snapshot.graph.node("EMP3").unwrap()));

        let filtered = filtered_accounts(&snapshot, &map);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].account_id, "P");
    }

    #[test]
    fn unknown_node_is_unclassified() {
        let map = BehaviorMap::new(2);
        assert_eq!(map.class(NodeIndex::new(9)), BehaviorClass::None);
    }
}
