// src/simulation/engine.rs

use crate::error::{ActionError, ConfigError, EnvError, InvariantViolation};
use crate::io::demand::DemandSampler;
use crate::model::chain::{NodeRole, CHAIN_LENGTH};
use crate::model::node::Node;
use crate::model::observation::Observation;
use crate::model::queues::DelayLine;
use crate::simulation::config::SimulationConfig;
use crate::simulation::costs::CostLedger;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::fmt;
use tracing::{debug, error, info, warn};

/// Largest order quantity `step()` accepts.
pub const MAX_ORDER_QUANTITY: u32 = 1_000_000;

/// Lifecycle of an [`Environment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EnvStatus {
    /// Built (or poisoned by an invariant violation) but not reset.
    Uninitialized,
    Running,
    /// The horizon has been reached.
    Done,
}

/// Bookkeeping about one applied turn. Global quantities only, never handed
/// to agents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepInfo {
    /// The turn that was just played.
    pub turn: usize,
    pub customer_demand: u32,
    /// Goods the Retailer shipped to end customers this turn.
    pub delivered_to_customers: u32,
    /// Goods the Manufacturer drew from external supply this turn.
    pub supply_drawn: u32,
    pub period_costs: [f64; CHAIN_LENGTH],
    pub cumulative_costs: [f64; CHAIN_LENGTH],
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub observations: [Observation; CHAIN_LENGTH],
    /// Negated period costs.
    pub rewards: [f64; CHAIN_LENGTH],
    pub done: bool,
    pub info: StepInfo,
}

/// The four-echelon beer game.
///
/// Owns every node, every delay line and the demand RNG. Agents interact with
/// it only through the [`Observation`]s it hands out.
pub struct Environment {
    config: SimulationConfig,
    demand: DemandSampler,
    rng: StdRng,
    status: EnvStatus,
    turn: usize,

    // The Actors
    nodes: [Node; CHAIN_LENGTH],

    // The Pipes (Delays)
    // Order lines flow UPSTREAM: index i carries node i's orders to node i + 1
    order_lines: [DelayLine; CHAIN_LENGTH - 1],
    // Shipment lines flow DOWNSTREAM: index i carries node i + 1's goods to node i
    shipment_lines: [DelayLine; CHAIN_LENGTH - 1],
    // Manufacturer's orders to the infinite external supply
    supply_line: DelayLine,

    demand_schedule: Vec<u32>,
    ledger: CostLedger,

    // Conservation ledger
    goods_introduced: u64,
    goods_delivered: u64,
}

impl Environment {
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let demand = config.demand.sampler()?;
        let rng = StdRng::seed_from_u64(config.seed);
        let nodes = NodeRole::ALL.map(|role| Node::new(role, config.initial_stock[role.index()]));
        let fill = config.initial_pipeline;

        let mut env = Self {
            order_lines: std::array::from_fn(|_| DelayLine::new(config.order_delay, fill)),
            shipment_lines: std::array::from_fn(|_| DelayLine::new(config.shipment_delay, fill)),
            supply_line: DelayLine::new(config.supply_delay, fill),
            demand,
            rng,
            status: EnvStatus::Uninitialized,
            turn: 0,
            nodes,
            demand_schedule: Vec::new(),
            ledger: CostLedger::new(),
            goods_introduced: 0,
            goods_delivered: 0,
            config,
        };
        env.goods_introduced = env.goods_in_system();
        Ok(env)
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn status(&self) -> EnvStatus {
        self.status
    }

    pub fn done(&self) -> bool {
        self.status == EnvStatus::Done
    }

    /// Index of the next turn to be played.
    pub fn turn(&self) -> usize {
        self.turn
    }

    /// Starts a new game: fresh nodes, fresh delay lines, zeroed costs and a
    /// newly drawn demand schedule.
    pub fn reset(&mut self) -> [Observation; CHAIN_LENGTH] {
        let config = &self.config;
        let fill = config.initial_pipeline;

        self.nodes = NodeRole::ALL.map(|role| Node::new(role, config.initial_stock[role.index()]));
        self.order_lines = std::array::from_fn(|_| DelayLine::new(config.order_delay, fill));
        self.shipment_lines = std::array::from_fn(|_| DelayLine::new(config.shipment_delay, fill));
        self.supply_line = DelayLine::new(config.supply_delay, fill);
        self.demand_schedule = self.demand.schedule(config.horizon, &mut self.rng);
        self.ledger = CostLedger::new();
        self.turn = 0;
        self.goods_delivered = 0;
        self.goods_introduced = self.goods_in_system();
        self.status = EnvStatus::Running;

        info!(
            horizon = self.config.horizon,
            goods = self.goods_introduced,
            "Environment reset"
        );
        self.observations()
    }

    /// Applies one turn with one order quantity per node, in chain order.
    ///
    /// Nothing is mutated unless the environment is running and every
    /// quantity is valid.
    pub fn step(&mut self, actions: &[i64]) -> Result<StepOutcome, EnvError> {
        if self.status != EnvStatus::Running {
            warn!(status = ?self.status, "step() called on an environment that is not running");
            return Err(EnvError::EnvironmentNotReset { status: self.status });
        }
        let orders = validate_actions(actions).map_err(|err| {
            warn!(turn = self.turn, %err, "Action rejected");
            err
        })?;

        match self.apply_turn(orders) {
            Ok(outcome) => Ok(outcome),
            Err(violation) => {
                error!(turn = self.turn, %violation, "Invariant violated, environment poisoned");
                self.status = EnvStatus::Uninitialized;
                Err(violation.into())
            }
        }
    }

    fn apply_turn(&mut self, orders: [u32; CHAIN_LENGTH]) -> Result<StepOutcome, InvariantViolation> {
        let turn = self.turn;

        // =================================================================
        // PHASE 1: ORDERS
        // Every order enters its line; the oldest order in each line reaches
        // the upstream node. The Manufacturer orders from infinite supply.
        // =================================================================
        let customer_demand = self.customer_demand(turn);
        let mut incoming = [customer_demand, 0, 0, 0];
        for (i, line) in self.order_lines.iter_mut().enumerate() {
            incoming[i + 1] = line.advance(orders[i]);
        }
        let supply_arrival = self.supply_line.advance(orders[CHAIN_LENGTH - 1]);

        // =================================================================
        // PHASE 2: ARRIVALS
        // Shipment heads are read before any node ships this turn, so no
        // node sees goods produced in the same turn.
        // =================================================================
        let mut arrivals = [0u32; CHAIN_LENGTH];
        for (i, line) in self.shipment_lines.iter().enumerate() {
            arrivals[i] = line.peek_arrival();
        }
        arrivals[CHAIN_LENGTH - 1] = supply_arrival;

        // =================================================================
        // PHASE 3: FULFILMENT
        // Backlog first, then the new order, as far as stock allows.
        // =================================================================
        let mut shipped = [0u32; CHAIN_LENGTH];
        for (i, node) in self.nodes.iter_mut().enumerate() {
            let on_hand = u64::from(node.stock) + u64::from(arrivals[i]);
            node.receive_shipment(arrivals[i])?;
            shipped[i] = node.fulfil(incoming[i])?;
            node.last_order_placed = orders[i];

            let taken = on_hand - u64::from(node.stock);
            if taken != u64::from(shipped[i]) {
                return Err(InvariantViolation::ShipmentMismatch {
                    role: node.role,
                    taken,
                    shipped: shipped[i],
                });
            }
        }

        // =================================================================
        // PHASE 4: DEPARTURES
        // Goods enter the shipment lines; the Retailer's go to customers.
        // =================================================================
        for (i, line) in self.shipment_lines.iter_mut().enumerate() {
            let arrived = line.advance(shipped[i + 1]);
            debug_assert_eq!(arrived, arrivals[i]);
        }
        self.goods_introduced += u64::from(orders[CHAIN_LENGTH - 1]);
        self.goods_delivered += u64::from(shipped[0]);

        // =================================================================
        // PHASE 5: COSTS & ADVANCE
        // =================================================================
        let period_costs: [f64; CHAIN_LENGTH] =
            std::array::from_fn(|i| self.config.costs[i].period_cost(self.nodes[i].stock, self.nodes[i].backlog));
        self.ledger.record(period_costs);

        self.check_invariants(turn)?;

        self.turn += 1;
        if self.turn >= self.config.horizon {
            self.status = EnvStatus::Done;
            info!(turns = self.turn, total_cost = self.ledger.total(), "Game finished");
        }

        debug!(
            turn,
            customer_demand,
            ?orders,
            ?shipped,
            period_cost = period_costs.iter().sum::<f64>(),
            "Turn applied"
        );

        Ok(StepOutcome {
            observations: self.observations(),
            rewards: self.ledger.rewards(),
            done: self.done(),
            info: StepInfo {
                turn,
                customer_demand,
                delivered_to_customers: shipped[0],
                supply_drawn: orders[CHAIN_LENGTH - 1],
                period_costs,
                cumulative_costs: self.ledger.cumulative(),
            },
        })
    }

    fn check_invariants(&self, turn: usize) -> Result<(), InvariantViolation> {
        let lines = self
            .order_lines
            .iter()
            .map(|line| ("order", line, self.config.order_delay))
            .chain(
                self.shipment_lines
                    .iter()
                    .map(|line| ("shipment", line, self.config.shipment_delay)),
            )
            .chain(std::iter::once(("supply", &self.supply_line, self.config.supply_delay)));
        for (name, line, delay) in lines {
            if line.len() != delay {
                return Err(InvariantViolation::PipelineLength {
                    line: name,
                    expected: delay,
                    actual: line.len(),
                });
            }
        }

        let expected = self.goods_introduced - self.goods_delivered;
        let actual = self.goods_in_system();
        if expected != actual {
            return Err(InvariantViolation::Conservation { turn, expected, actual });
        }
        Ok(())
    }

    /// One observation per node, each built from that node alone.
    fn observations(&self) -> [Observation; CHAIN_LENGTH] {
        std::array::from_fn(|i| self.build_observation(NodeRole::ALL[i]))
    }

    /// The private view handed to `role`'s agent for the coming turn.
    pub fn build_observation(&self, role: NodeRole) -> Observation {
        let i = role.index();
        let incoming_order = match i.checked_sub(1) {
            None => self.customer_demand(self.turn),
            Some(downstream) => self.order_lines[downstream].peek_arrival(),
        };
        Observation::build(&self.nodes[i], self.turn, incoming_order)
    }

    fn customer_demand(&self, turn: usize) -> u32 {
        self.demand_schedule.get(turn).copied().unwrap_or(0)
    }

    pub fn node(&self, role: NodeRole) -> &Node {
        &self.nodes[role.index()]
    }

    /// Goods physically held or in transit: all stock, all shipment lines and
    /// the Manufacturer's supply line.
    pub fn goods_in_system(&self) -> u64 {
        let stock: u64 = self.nodes.iter().map(|node| u64::from(node.stock)).sum();
        let shipping: u64 = self.shipment_lines.iter().map(DelayLine::in_transit).sum();
        stock + shipping + self.supply_line.in_transit()
    }

    /// Initial goods plus everything drawn from external supply.
    pub fn goods_introduced(&self) -> u64 {
        self.goods_introduced
    }

    /// Everything shipped to end customers.
    pub fn goods_delivered(&self) -> u64 {
        self.goods_delivered
    }

    pub fn demand_schedule(&self) -> &[u32] {
        &self.demand_schedule
    }

    pub fn cumulative_costs(&self) -> [f64; CHAIN_LENGTH] {
        self.ledger.cumulative()
    }

    pub fn period_costs(&self) -> [f64; CHAIN_LENGTH] {
        self.ledger.latest()
    }

    /// Total cost across all nodes and all turns played so far.
    pub fn total_cost(&self) -> f64 {
        self.ledger.total()
    }

    /// Prints the current state of the chain to stdout.
    pub fn render(&self) {
        println!("{}", self);
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Turn {}/{} ({:?}), demand next: {}",
            self.turn,
            self.config.horizon,
            self.status,
            self.customer_demand(self.turn)
        )?;
        writeln!(
            f,
            "{:<13} {:>7} {:>8} {:>7} {:>10}",
            "node", "stock", "backlog", "order", "cum_cost"
        )?;
        let cumulative = self.ledger.cumulative();
        for node in &self.nodes {
            writeln!(
                f,
                "{:<13} {:>7} {:>8} {:>7} {:>10.2}",
                node.role.to_string(),
                node.stock,
                node.backlog,
                node.last_order_placed,
                cumulative[node.role.index()]
            )?;
        }
        write!(f, "total cost: {:.2}", self.ledger.total())
    }
}

fn validate_actions(actions: &[i64]) -> Result<[u32; CHAIN_LENGTH], ActionError> {
    if actions.len() != CHAIN_LENGTH {
        return Err(ActionError::WrongCount {
            expected: CHAIN_LENGTH,
            actual: actions.len(),
        });
    }
    let mut orders = [0u32; CHAIN_LENGTH];
    for ((order, &quantity), role) in orders.iter_mut().zip(actions).zip(NodeRole::ALL) {
        if quantity < 0 {
            return Err(ActionError::Negative { role, quantity });
        }
        if quantity > i64::from(MAX_ORDER_QUANTITY) {
            return Err(ActionError::TooLarge {
                role,
                quantity,
                max: MAX_ORDER_QUANTITY,
            });
        }
        *order = quantity as u32;
    }
    Ok(orders)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::demand::DemandProcess;

    fn classical_env() -> Environment {
        let config = SimulationConfig::default().with_demand(DemandProcess::Constant { value: 4 });
        Environment::new(config).unwrap()
    }

    #[test]
    fn test_step_before_reset_fails() {
        let mut env = classical_env();
        assert_eq!(env.status(), EnvStatus::Uninitialized);
        assert_eq!(
            env.step(&[4, 4, 4, 4]),
            Err(EnvError::EnvironmentNotReset {
                status: EnvStatus::Uninitialized
            })
        );
    }

    #[test]
    fn test_negative_action_rejected_without_mutation() {
        let mut env = classical_env();
        env.reset();
        let before = env.node(NodeRole::Distributor).clone();
        let err = env.step(&[4, 4, -1, 4]).unwrap_err();
        assert_eq!(
            err,
            EnvError::InvalidAction(ActionError::Negative {
                role: NodeRole::Distributor,
                quantity: -1
            })
        );
        assert_eq!(env.turn(), 0);
        assert_eq!(env.node(NodeRole::Distributor), &before);
        assert_eq!(env.total_cost(), 0.0);
    }

    #[test]
    fn test_wrong_action_count_rejected() {
        let mut env = classical_env();
        env.reset();
        assert!(matches!(
            env.step(&[4, 4, 4]),
            Err(EnvError::InvalidAction(ActionError::WrongCount {
                expected: 4,
                actual: 3
            }))
        ));
        assert!(matches!(
            env.step(&[4, 4, 4, i64::from(MAX_ORDER_QUANTITY) + 1]),
            Err(EnvError::InvalidAction(ActionError::TooLarge { .. }))
        ));
    }

    #[test]
    fn test_step_after_done_fails_until_reset() {
        let mut env = Environment::new(SimulationConfig::default().with_horizon(2)).unwrap();
        env.reset();
        assert!(!env.step(&[4, 4, 4, 4]).unwrap().done);
        assert!(env.step(&[4, 4, 4, 4]).unwrap().done);
        assert_eq!(env.status(), EnvStatus::Done);
        assert_eq!(
            env.step(&[4, 4, 4, 4]),
            Err(EnvError::EnvironmentNotReset {
                status: EnvStatus::Done
            })
        );
        env.reset();
        assert_eq!(env.status(), EnvStatus::Running);
        assert!(env.step(&[0, 0, 0, 0]).is_ok());
    }

    #[test]
    fn test_observation_shows_only_own_state() {
        let config = SimulationConfig::default()
            .with_initial_stock([1, 2, 3, 5])
            .with_demand(DemandProcess::Fixed { values: vec![9] });
        let mut env = Environment::new(config).unwrap();
        let observations = env.reset();
        assert_eq!(
            observations[0],
            Observation {
                role: NodeRole::Retailer,
                turn: 0,
                stock: 1,
                backlog: 0,
                incoming_order: 9,
            }
        );
        for (i, obs) in observations.iter().enumerate().skip(1) {
            assert_eq!(obs.role, NodeRole::ALL[i]);
            assert_eq!(obs.stock, [1, 2, 3, 5][i]);
            // Pre-filled order line head.
            assert_eq!(obs.incoming_order, 4);
        }
    }

    #[test]
    fn test_rewards_are_negated_period_costs() {
        let mut env = classical_env();
        env.reset();
        let outcome = env.step(&[4, 4, 4, 4]).unwrap();
        assert_eq!(outcome.info.period_costs, [12.0; 4]);
        assert_eq!(outcome.rewards, [-12.0; 4]);
        assert_eq!(outcome.info.cumulative_costs, [12.0; 4]);
    }

    #[test]
    fn test_manufacturer_supply_arrives_after_one_turn() {
        let config = SimulationConfig::default()
            .with_initial_pipeline(0)
            .with_initial_stock([0, 0, 0, 0])
            .with_demand(DemandProcess::Constant { value: 0 });
        let mut env = Environment::new(config).unwrap();
        env.reset();
        env.step(&[0, 0, 0, 7]).unwrap();
        assert_eq!(env.node(NodeRole::Manufacturer).stock, 0);
        env.step(&[0, 0, 0, 0]).unwrap();
        assert_eq!(env.node(NodeRole::Manufacturer).stock, 7);
        assert_eq!(env.goods_introduced(), 7);
    }

    #[test]
    fn test_conservation_failure_poisons_until_reset() {
        let mut env = classical_env();
        env.reset();
        env.step(&[4, 4, 4, 4]).unwrap();

        env.goods_introduced += 1;
        assert!(matches!(
            env.step(&[4, 4, 4, 4]),
            Err(EnvError::InvariantViolation(InvariantViolation::Conservation { turn: 1, .. }))
        ));
        assert_eq!(env.status(), EnvStatus::Uninitialized);
        assert_eq!(
            env.step(&[4, 4, 4, 4]),
            Err(EnvError::EnvironmentNotReset {
                status: EnvStatus::Uninitialized
            })
        );

        env.reset();
        assert_eq!(env.status(), EnvStatus::Running);
        let outcome = env.step(&[4, 4, 4, 4]).unwrap();
        assert_eq!(outcome.info.turn, 0);
    }

    #[test]
    fn test_oversized_demand_rejected_at_construction() {
        let config = SimulationConfig::default().with_demand(DemandProcess::Constant { value: u32::MAX });
        assert!(matches!(
            Environment::new(config),
            Err(ConfigError::InvalidDemand { .. })
        ));
    }

    #[test]
    fn test_stock_overflow_ends_game_with_error() {
        let config = SimulationConfig::default().with_horizon(5_000);
        let mut env = Environment::new(config).unwrap();
        env.reset();
        let max = i64::from(MAX_ORDER_QUANTITY);

        let err = loop {
            match env.step(&[0, 0, 0, max]) {
                Ok(outcome) => assert!(!outcome.done),
                Err(err) => break err,
            }
        };
        assert_eq!(
            err,
            EnvError::InvariantViolation(InvariantViolation::CapacityExceeded {
                role: NodeRole::Manufacturer,
                quantity: "stock",
            })
        );
        assert_eq!(env.status(), EnvStatus::Uninitialized);
    }

    #[test]
    fn test_render_lists_every_node() {
        let mut env = classical_env();
        env.reset();
        let text = env.to_string();
        for role in NodeRole::ALL {
            assert!(text.contains(&role.to_string()));
        }
        assert!(text.contains("Turn 0/20"));
    }
}
