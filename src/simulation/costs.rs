// src/simulation/costs.rs

use crate::model::chain::CHAIN_LENGTH;
use serde::{Deserialize, Serialize};

/// Per-unit, per-turn cost rates for one node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostRates {
    pub holding: f64,
    pub backlog: f64,
}

impl CostRates {
    pub const fn new(holding: f64, backlog: f64) -> Self {
        Self { holding, backlog }
    }

    /// `holding * stock + backlog * backlog`
    pub fn period_cost(&self, stock: u32, backlog: u32) -> f64 {
        self.holding * f64::from(stock) + self.backlog * f64::from(backlog)
    }
}

impl Default for CostRates {
    fn default() -> Self {
        Self::new(1.0, 2.0)
    }
}

/// Running cost bookkeeping for the four nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CostLedger {
    latest: [f64; CHAIN_LENGTH],
    cumulative: [f64; CHAIN_LENGTH],
}

impl CostLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Books one turn of costs.
    pub fn record(&mut self, period_costs: [f64; CHAIN_LENGTH]) {
        self.latest = period_costs;
        for (total, cost) in self.cumulative.iter_mut().zip(period_costs) {
            *total += cost;
        }
    }

    pub fn latest(&self) -> [f64; CHAIN_LENGTH] {
        self.latest
    }

    pub fn cumulative(&self) -> [f64; CHAIN_LENGTH] {
        self.cumulative
    }

    /// Sum over all nodes and all turns so far.
    pub fn total(&self) -> f64 {
        self.cumulative.iter().sum()
    }

    /// Reward signal: the negated latest period cost, so higher is better.
    pub fn rewards(&self) -> [f64; CHAIN_LENGTH] {
        self.latest.map(|cost| -cost)
    }
}
