// src/simulation/config.rs

use crate::error::ConfigError;
use crate::io::demand::DemandProcess;
use crate::model::chain::{NodeRole, CHAIN_LENGTH};
use crate::simulation::costs::CostRates;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Constructor-time settings for one environment. Immutable once the
/// environment is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of turns in a game.
    pub horizon: usize,
    /// Turns between an order being placed and reaching the upstream node.
    pub order_delay: usize,
    /// Turns between goods being shipped and reaching the downstream node.
    pub shipment_delay: usize,
    /// Turns between the Manufacturer's order and the goods entering its stock.
    pub supply_delay: usize,
    pub initial_stock: [u32; CHAIN_LENGTH],
    /// Units pre-loaded in every slot of every delay line at reset.
    pub initial_pipeline: u32,
    pub costs: [CostRates; CHAIN_LENGTH],
    /// Seed for the demand RNG.
    pub seed: u64,
    pub demand: DemandProcess,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            horizon: 20,
            order_delay: 2,
            shipment_delay: 2,
            supply_delay: 1,
            initial_stock: [12; CHAIN_LENGTH],
            initial_pipeline: 4,
            costs: [CostRates::default(); CHAIN_LENGTH],
            seed: 0,
            demand: DemandProcess::classic(),
        }
    }
}

impl SimulationConfig {
    /// The default game with the demand process of the given ruleset.
    pub fn for_env_type(env_type: EnvType) -> Self {
        Self {
            demand: env_type.demand(),
            ..Self::default()
        }
    }

    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: SimulationConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.horizon == 0 {
            return Err(ConfigError::ZeroHorizon);
        }
        for (pipeline, delay) in [
            ("order", self.order_delay),
            ("shipment", self.shipment_delay),
            ("supply", self.supply_delay),
        ] {
            if delay == 0 {
                return Err(ConfigError::ZeroDelay { pipeline });
            }
        }
        for (role, rates) in NodeRole::ALL.iter().zip(&self.costs) {
            for (kind, value) in [("holding", rates.holding), ("backlog", rates.backlog)] {
                if !value.is_finite() || value < 0.0 {
                    return Err(ConfigError::InvalidCostRate {
                        role: *role,
                        kind,
                        value,
                    });
                }
            }
        }
        self.demand.validate()
    }

    pub fn with_horizon(mut self, horizon: usize) -> Self {
        self.horizon = horizon;
        self
    }

    pub fn with_delays(mut self, order_delay: usize, shipment_delay: usize, supply_delay: usize) -> Self {
        self.order_delay = order_delay;
        self.shipment_delay = shipment_delay;
        self.supply_delay = supply_delay;
        self
    }

    pub fn with_initial_stock(mut self, initial_stock: [u32; CHAIN_LENGTH]) -> Self {
        self.initial_stock = initial_stock;
        self
    }

    pub fn with_initial_pipeline(mut self, units: u32) -> Self {
        self.initial_pipeline = units;
        self
    }

    /// Same holding/backlog rates for every node.
    pub fn with_uniform_costs(mut self, holding: f64, backlog: f64) -> Self {
        self.costs = [CostRates::new(holding, backlog); CHAIN_LENGTH];
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_demand(mut self, demand: DemandProcess) -> Self {
        self.demand = demand;
        self
    }

    /// Turns between `role` placing an order and the goods arriving, when its
    /// supplier has stock. The Manufacturer's supplier always has.
    pub fn lead_time(&self, role: NodeRole) -> usize {
        match role {
            NodeRole::Manufacturer => self.supply_delay,
            _ => self.order_delay + self.shipment_delay,
        }
    }

    /// Units already ordered by `role` but not received when a game starts:
    /// the pre-filled slots of its order line and its inbound shipment line.
    pub fn initial_supply_line(&self, role: NodeRole) -> u32 {
        self.initial_pipeline * self.lead_time(role) as u32
    }
}

/// The selectable rulesets. They differ only in customer demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvType {
    /// Demand 4 for four turns, then 8.
    Classical,
    /// Uniform demand in 0..=2.
    #[serde(rename = "uniform_0_2")]
    Uniform0To2,
    /// Normal demand, mean 10, standard deviation 4.
    #[serde(rename = "normal_10_4")]
    Normal10To4,
}

impl EnvType {
    pub fn demand(self) -> DemandProcess {
        match self {
            EnvType::Classical => DemandProcess::classic(),
            EnvType::Uniform0To2 => DemandProcess::Uniform { low: 0, high: 2 },
            EnvType::Normal10To4 => DemandProcess::Normal {
                mean: 10.0,
                std_dev: 4.0,
            },
        }
    }
}

impl FromStr for EnvType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "classical" => Ok(EnvType::Classical),
            "uniform_0_2" => Ok(EnvType::Uniform0To2),
            "normal_10_4" => Ok(EnvType::Normal10To4),
            other => Err(ConfigError::InvalidDemand {
                detail: format!("unknown env type '{}'", other),
            }),
        }
    }
}
