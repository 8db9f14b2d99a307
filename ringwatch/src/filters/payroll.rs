// ringwatch/src/filters/payroll.rs
//
// Payroll sender: few inbound counterparties, many receivers, and every
// outbound amount close to the mean (|a - mean| / mean <= amount_tolerance,
// mean taken as 1 when it is zero).

use petgraph::graph::NodeIndex;

use crate::config::PayrollConfig;
use crate::state::graph::TransactionGraph;

pub fn is_payroll(graph: &TransactionGraph, node: NodeIndex, cfg: &PayrollConfig) -> bool {
    if graph.fan_in(node) > cfg.max_fan_in || graph.fan_out(node) < cfg.min_receivers {
        return false;
    }

    let amounts: Vec<f64> = graph
        .out_edges(node)
        .flat_map(|(_, bucket)| bucket.iter().map(|tx| tx.amount))
        .collect();
    if amounts.is_empty() {
        return false;
    }

    let avg = amounts.iter().sum::<f64>() / amounts.len() as f64;
    let denom = if avg == 0.0 { 1.0 } else { avg };
    amounts.iter().all(|a| (a - avg).abs() / denom <= cfg.amount_tolerance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Transaction;
    use chrono::{TimeZone, Utc};

    fn payer(amounts: &[f64]) -> TransactionGraph {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let txs: Vec<Transaction> = amounts
            .iter()
            .enumerate()
            .map(|(i, a)| Transaction::new(format!("T{i}"), "P", format!("E{i}"), *a, ts))
            .collect();
        TransactionGraph::build(&txs)
    }

    #[test]
    fn uniform_salaries_are_payroll() {
        let g = payer(&[2000.0, 2050.0, 1980.0, 2010.0, 1990.0, 2020.0]);
        assert!(is_payroll(&g, g.node("P").unwrap(), &PayrollConfig::default()));
    }

    #[test]
    fn one_outlier_amount_disqualifies() {
        let g = payer(&[2000.0, 2000.0, 2000.0, 2000.0, 2000.0, 5000.0]);
        assert!(!is_payroll(&g, g.node("P").unwrap(), &PayrollConfig::default()));
    }

    #[test]
    fn too_few_receivers_disqualifies() {
        let g = payer(&[2000.0, 2000.0, 2000.0]);
        assert!(!is_payroll(&g, g.node("P").unwrap(), &PayrollConfig::default()));
    }
}
