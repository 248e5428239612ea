// src/simulation/driver.rs

use crate::error::EnvError;
use crate::model::chain::{NodeRole, CHAIN_LENGTH};
use crate::model::observation::Observation;
use crate::simulation::engine::{Environment, StepOutcome};
use crate::strategy::traits::OrderPolicy;
use serde::Serialize;
use tracing::info;

// We make this Serialize so we can write it to CSV later
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRecord {
    pub turn: usize,
    pub role: NodeRole,
    pub stock: u32,
    pub backlog: u32,
    pub incoming_order: u32,
    pub order_placed: u32,
    pub period_cost: f64,
    pub cumulative_cost: f64,
}

/// End-of-game figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameSummary {
    pub turns: usize,
    pub total_cost: f64,
    pub node_costs: [f64; CHAIN_LENGTH],
}

impl GameSummary {
    /// Cumulative cost per node, in chain order.
    pub fn cost_breakdown(&self) -> Vec<(NodeRole, f64)> {
        NodeRole::ALL.iter().copied().zip(self.node_costs).collect()
    }
}

/// Runs one environment with one policy per node.
///
/// Each turn every policy sees only its own observation, all four orders are
/// collected, and only then is the turn applied.
pub struct Game {
    env: Environment,
    policies: [Box<dyn OrderPolicy>; CHAIN_LENGTH],
    pub history: Vec<HistoryRecord>,
    render: bool,
}

impl Game {
    pub fn new(env: Environment, policies: [Box<dyn OrderPolicy>; CHAIN_LENGTH]) -> Self {
        Self {
            env,
            policies,
            history: Vec::new(),
            render: false,
        }
    }

    /// Print the chain after reset and after every turn.
    pub fn with_render(mut self, render: bool) -> Self {
        self.render = render;
        self
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Plays a full game from reset to the horizon.
    pub fn play(&mut self) -> Result<GameSummary, EnvError> {
        self.history.clear();
        for policy in self.policies.iter_mut() {
            policy.reset();
        }

        let mut observations = self.env.reset();
        if self.render {
            self.env.render();
        }

        loop {
            let orders = collect_actions(&mut self.policies, &observations);
            let actions = orders.map(i64::from);
            let outcome = self.env.step(&actions)?;
            self.record_history(&observations, &orders, &outcome);

            if self.render {
                self.env.render();
            }
            if outcome.done {
                break;
            }
            observations = outcome.observations;
        }

        let summary = GameSummary {
            turns: self.env.turn(),
            total_cost: self.env.total_cost(),
            node_costs: self.env.cumulative_costs(),
        };
        info!(turns = summary.turns, total_cost = summary.total_cost, "Game complete");
        Ok(summary)
    }

    fn record_history(
        &mut self,
        observations: &[Observation; CHAIN_LENGTH],
        orders: &[u32; CHAIN_LENGTH],
        outcome: &StepOutcome,
    ) {
        for role in NodeRole::ALL {
            let i = role.index();
            let node = self.env.node(role);
            self.history.push(HistoryRecord {
                turn: outcome.info.turn,
                role,
                stock: node.stock,
                backlog: node.backlog,
                incoming_order: observations[i].incoming_order,
                order_placed: orders[i],
                period_cost: outcome.info.period_costs[i],
                cumulative_cost: outcome.info.cumulative_costs[i],
            });
        }
    }
}

/// The "collect actions" phase. Every policy gets exactly its own node's
/// observation.
#[cfg(not(feature = "parallel"))]
fn collect_actions(
    policies: &mut [Box<dyn OrderPolicy>; CHAIN_LENGTH],
    observations: &[Observation; CHAIN_LENGTH],
) -> [u32; CHAIN_LENGTH] {
    let mut orders = [0u32; CHAIN_LENGTH];
    for ((order, policy), observation) in orders.iter_mut().zip(policies.iter_mut()).zip(observations) {
        *order = policy.get_action(observation);
    }
    orders
}

/// The "collect actions" phase on the rayon pool. Returns once every policy
/// has decided.
#[cfg(feature = "parallel")]
fn collect_actions(
    policies: &mut [Box<dyn OrderPolicy>; CHAIN_LENGTH],
    observations: &[Observation; CHAIN_LENGTH],
) -> [u32; CHAIN_LENGTH] {
    use rayon::prelude::*;

    let mut orders = [0u32; CHAIN_LENGTH];
    orders
        .par_iter_mut()
        .zip(policies.par_iter_mut())
        .zip(observations.par_iter())
        .for_each(|((order, policy), observation)| *order = policy.get_action(observation));
    orders
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::demand::DemandProcess;
    use crate::simulation::config::SimulationConfig;
    use crate::strategy::implementations::{ConstantPolicy, NaivePolicy};

    fn constant_policies(quantity: u32) -> [Box<dyn OrderPolicy>; CHAIN_LENGTH] {
        std::array::from_fn(|_| Box::new(ConstantPolicy::new(quantity)) as Box<dyn OrderPolicy>)
    }

    #[test]
    fn test_play_records_every_node_every_turn() {
        let env = Environment::new(SimulationConfig::default().with_horizon(5)).unwrap();
        let mut game = Game::new(env, constant_policies(4));
        let summary = game.play().unwrap();
        assert_eq!(summary.turns, 5);
        assert_eq!(game.history.len(), 5 * CHAIN_LENGTH);
        assert_eq!(game.history[0].turn, 0);
        assert_eq!(game.history.last().unwrap().turn, 4);
        assert_eq!(game.history.last().unwrap().role, NodeRole::Manufacturer);
    }

    #[test]
    fn test_replaying_a_finished_game_restarts_it() {
        let config = SimulationConfig::default().with_demand(DemandProcess::Constant { value: 4 });
        let env = Environment::new(config).unwrap();
        let policies: [Box<dyn OrderPolicy>; CHAIN_LENGTH] =
            std::array::from_fn(|_| Box::new(NaivePolicy::new()) as Box<dyn OrderPolicy>);
        let mut game = Game::new(env, policies);
        let first = game.play().unwrap();
        let second = game.play().unwrap();
        assert_eq!(first, second);
        assert_eq!(game.history.len(), 20 * CHAIN_LENGTH);
    }

    #[test]
    fn test_cost_breakdown_sums_to_total() {
        let env = Environment::new(SimulationConfig::default()).unwrap();
        let mut game = Game::new(env, constant_policies(6));
        let summary = game.play().unwrap();
        let breakdown = summary.cost_breakdown();
        assert_eq!(breakdown[0].0, NodeRole::Retailer);
        let sum: f64 = breakdown.iter().map(|(_, cost)| cost).sum();
        assert!((sum - summary.total_cost).abs() < 1e-9);
    }
}
