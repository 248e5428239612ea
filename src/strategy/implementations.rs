// src/strategy/implementations.rs

use crate::model::chain::NodeRole;
use crate::model::observation::Observation;
use crate::simulation::config::SimulationConfig;
use crate::strategy::optimization::optimal_base_stock;
use crate::strategy::tracker::SupplyLineTracker;
use crate::strategy::traits::OrderPolicy;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn non_negative(order: f64) -> u32 {
    if order < 0.0 {
        0
    } else {
        order.round() as u32
    }
}

// =========================================================================
// 1. Constant Policy
// =========================================================================

/// Orders the same quantity every turn, whatever happens.
#[derive(Debug, Clone)]
pub struct ConstantPolicy {
    quantity: u32,
}

impl ConstantPolicy {
    pub fn new(quantity: u32) -> Self {
        Self { quantity }
    }
}

impl OrderPolicy for ConstantPolicy {
    fn get_action(&mut self, _observation: &Observation) -> u32 {
        self.quantity
    }
}

// =========================================================================
// 2. Naive Policy (Pass-Through)
// =========================================================================

/// The "Panic" strategy. It simply orders exactly what was demanded of it.
/// It ignores stock levels and backlogs.
#[derive(Debug, Clone, Default)]
pub struct NaivePolicy;

impl NaivePolicy {
    pub fn new() -> Self {
        Self
    }
}

impl OrderPolicy for NaivePolicy {
    fn get_action(&mut self, observation: &Observation) -> u32 {
        observation.incoming_order
    }
}

// =========================================================================
// 3. Random Policy
// =========================================================================

/// Orders a uniformly random amount in `min..=max`.
/// Useful for simulating chaotic actors or testing system stability.
#[derive(Debug, Clone)]
pub struct RandomPolicy {
    min: u32,
    max: u32,
    rng: StdRng,
}

impl RandomPolicy {
    /// # Panics
    /// Panics if `min > max`.
    pub fn new(min: u32, max: u32, seed: u64) -> Self {
        assert!(min <= max, "min must not exceed max");
        Self {
            min,
            max,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// The dummy bot shipped with the game: 0 to 3 units per turn.
    pub fn dummy_bot(seed: u64) -> Self {
        Self::new(0, 3, seed)
    }
}

impl OrderPolicy for RandomPolicy {
    fn get_action(&mut self, _observation: &Observation) -> u32 {
        self.rng.gen_range(self.min..=self.max)
    }
}

// =========================================================================
// 4. Base Stock Policy (Rational / "Order-Up-To")
// =========================================================================

/// A standard rational policy used in supply chain management.
///
/// It tries to keep its inventory position (stock - backlog + supply line) at
/// a target level. The supply line is not observed; it is reconstructed by a
/// [`SupplyLineTracker`].
///
/// Formula: Order = Demand + (Target - InventoryPosition)
#[derive(Debug, Clone)]
pub struct BaseStockPolicy {
    target_stock: i64,
    tracker: SupplyLineTracker,
}

impl BaseStockPolicy {
    pub fn new(target_stock: u32) -> Self {
        Self {
            target_stock: i64::from(target_stock),
            tracker: SupplyLineTracker::default(),
        }
    }

    /// Goods already in transit towards this node when the game starts.
    pub fn with_initial_supply_line(mut self, units: u32) -> Self {
        self.tracker = SupplyLineTracker::new(units);
        self
    }

    /// Target from the newsvendor model for `role`'s costs and lead time.
    pub fn with_optimal_target(config: &SimulationConfig, role: NodeRole, mean_demand: f64, std_dev_demand: f64) -> Self {
        let target = optimal_base_stock(
            config.costs[role.index()],
            mean_demand,
            std_dev_demand,
            config.lead_time(role),
        );
        Self::new(target).with_initial_supply_line(config.initial_supply_line(role))
    }
}

impl OrderPolicy for BaseStockPolicy {
    fn get_action(&mut self, observation: &Observation) -> u32 {
        self.tracker.observe(observation);

        let position = observation.net_stock() + i64::from(self.tracker.supply_line());
        let gap = self.target_stock - position;
        let order = (i64::from(observation.incoming_order) + gap).clamp(0, i64::from(u32::MAX)) as u32;

        self.tracker.record_order(observation, order);
        order
    }

    fn reset(&mut self) {
        self.tracker.reset();
    }
}

// =========================================================================
// 5. Sterman Heuristic Policy
// =========================================================================

/// Anchor-and-adjust ordering after Sterman's beer game experiments.
///
/// Orders the incoming demand, plus a fraction `alpha` of the stock gap, plus
/// a fraction `beta` of the supply line gap. Human players typically
/// under-weight the supply line (small `beta`), which amplifies oscillations.
#[derive(Debug, Clone)]
pub struct StermanHeuristic {
    target_stock: f64,
    target_supply_line: f64,
    alpha: f64,
    beta: f64,
    tracker: SupplyLineTracker,
}

impl StermanHeuristic {
    /// A typical "Human" agent who mostly ignores the pipeline.
    pub fn new(target_stock: u32) -> Self {
        Self {
            target_stock: f64::from(target_stock),
            target_supply_line: f64::from(target_stock / 2),
            alpha: 1.0,
            beta: 0.2,
            tracker: SupplyLineTracker::default(),
        }
    }

    pub fn with_weights(mut self, alpha: f64, beta: f64) -> Self {
        self.alpha = alpha;
        self.beta = beta;
        self
    }

    /// Splits the newsvendor target into an on-hand part and the expected
    /// pipeline (mean demand over the lead time).
    pub fn with_optimal_target(config: &SimulationConfig, role: NodeRole, mean_demand: f64, std_dev_demand: f64) -> Self {
        let lead_time = config.lead_time(role);
        let total = optimal_base_stock(config.costs[role.index()], mean_demand, std_dev_demand, lead_time);
        let pipeline = (mean_demand * lead_time as f64).round();

        Self {
            target_stock: f64::from(total) - pipeline,
            target_supply_line: pipeline,
            alpha: 1.0,
            beta: 0.2,
            tracker: SupplyLineTracker::new(config.initial_supply_line(role)),
        }
    }
}

impl OrderPolicy for StermanHeuristic {
    fn get_action(&mut self, observation: &Observation) -> u32 {
        self.tracker.observe(observation);

        let stock_gap = self.target_stock - observation.net_stock() as f64;
        let supply_line_gap = self.target_supply_line - f64::from(self.tracker.supply_line());
        let order = non_negative(
            f64::from(observation.incoming_order) + self.alpha * stock_gap + self.beta * supply_line_gap,
        );

        self.tracker.record_order(observation, order);
        order
    }

    fn reset(&mut self) {
        self.tracker.reset();
    }
}

// =========================================================================
// 6. Smoothing Policy
// =========================================================================

/// Forecasts demand with exponential smoothing and orders the forecast plus a
/// damped correction of the inventory position.
#[derive(Debug, Clone)]
pub struct SmoothingPolicy {
    initial_forecast: f64,
    forecast: f64,
    gamma: f64, // Smoothing factor (0.1 = very stable, 0.9 = reactive)
    target_stock: f64,
    tracker: SupplyLineTracker,
}

impl SmoothingPolicy {
    pub fn new(initial_forecast: f64, gamma: f64, target_stock: u32) -> Self {
        Self {
            initial_forecast,
            forecast: initial_forecast,
            gamma,
            target_stock: f64::from(target_stock),
            tracker: SupplyLineTracker::default(),
        }
    }

    pub fn with_optimal_target(
        config: &SimulationConfig,
        role: NodeRole,
        gamma: f64,
        mean_demand: f64,
        std_dev_demand: f64,
    ) -> Self {
        let target = optimal_base_stock(
            config.costs[role.index()],
            mean_demand,
            std_dev_demand,
            config.lead_time(role),
        );
        let mut policy = Self::new(mean_demand, gamma, target);
        policy.tracker = SupplyLineTracker::new(config.initial_supply_line(role));
        policy
    }
}

impl OrderPolicy for SmoothingPolicy {
    fn get_action(&mut self, observation: &Observation) -> u32 {
        self.tracker.observe(observation);

        self.forecast = self.gamma * f64::from(observation.incoming_order) + (1.0 - self.gamma) * self.forecast;
        let position = observation.net_stock() as f64 + f64::from(self.tracker.supply_line());
        let correction = (self.target_stock - position) * self.gamma;
        let order = non_negative(self.forecast + correction);

        self.tracker.record_order(observation, order);
        order
    }

    fn reset(&mut self) {
        self.forecast = self.initial_forecast;
        self.tracker.reset();
    }
}

// =========================================================================
// 7. Scripted Policy
// =========================================================================

/// Plays a fixed sequence indexed by turn, then hands over to another policy.
#[derive(Debug)]
pub struct ScriptedPolicy {
    script: Vec<u32>,
    fallback: Box<dyn OrderPolicy>,
}

impl ScriptedPolicy {
    pub fn new(script: Vec<u32>) -> Self {
        Self {
            script,
            fallback: Box::new(ConstantPolicy::new(0)),
        }
    }

    pub fn then(mut self, fallback: Box<dyn OrderPolicy>) -> Self {
        self.fallback = fallback;
        self
    }
}

impl OrderPolicy for ScriptedPolicy {
    fn get_action(&mut self, observation: &Observation) -> u32 {
        match self.script.get(observation.turn) {
            Some(&quantity) => quantity,
            None => self.fallback.get_action(observation),
        }
    }

    fn reset(&mut self) {
        self.fallback.reset();
    }
}
