// src/strategy/tracker.rs

use crate::model::observation::Observation;

/// Reconstructs a node's supply line (goods ordered but not yet received)
/// from its own observations and orders.
///
/// Between two consecutive observations a node knows its old stock and
/// backlog, the order it had to serve, and its new stock and backlog. That is
/// enough to recover what it shipped and therefore what it received:
///
/// ```text
/// shipped  = old_backlog + incoming_order - new_backlog
/// received = new_stock - old_stock + shipped
/// ```
///
/// Goods already in the pipeline at reset are unknown to the node and are
/// seeded through `initial`.
#[derive(Debug, Clone, Default)]
pub struct SupplyLineTracker {
    initial: i64,
    supply_line: i64,
    previous: Option<(Observation, u32)>,
}

impl SupplyLineTracker {
    pub fn new(initial: u32) -> Self {
        Self {
            initial: i64::from(initial),
            supply_line: i64::from(initial),
            previous: None,
        }
    }

    /// Feeds the latest observation. Must be called once per turn, before
    /// [`record_order`](Self::record_order).
    pub fn observe(&mut self, observation: &Observation) {
        if observation.turn == 0 {
            self.reset();
        }
        if let Some((prev, _)) = self.previous {
            let shipped =
                i64::from(prev.backlog) + i64::from(prev.incoming_order) - i64::from(observation.backlog);
            let received = i64::from(observation.stock) - i64::from(prev.stock) + shipped;
            self.supply_line -= received;
        }
    }

    /// Remembers the order placed against the latest observation.
    pub fn record_order(&mut self, observation: &Observation, quantity: u32) {
        self.supply_line += i64::from(quantity);
        self.previous = Some((*observation, quantity));
    }

    /// Best estimate of goods in transit towards this node, never negative.
    pub fn supply_line(&self) -> u32 {
        self.supply_line.clamp(0, i64::from(u32::MAX)) as u32
    }

    pub fn reset(&mut self) {
        self.supply_line = self.initial;
        self.previous = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::chain::NodeRole;

    fn obs(turn: usize, stock: u32, backlog: u32, incoming_order: u32) -> Observation {
        Observation {
            role: NodeRole::Wholesaler,
            turn,
            stock,
            backlog,
            incoming_order,
        }
    }

    #[test]
    fn test_supply_line_grows_with_orders_and_shrinks_with_receipts() {
        let mut tracker = SupplyLineTracker::new(0);

        let t0 = obs(0, 10, 0, 4);
        tracker.observe(&t0);
        tracker.record_order(&t0, 6);
        assert_eq!(tracker.supply_line(), 6);

        // Shipped 4, received nothing: 10 - 4 = 6.
        let t1 = obs(1, 6, 0, 4);
        tracker.observe(&t1);
        assert_eq!(tracker.supply_line(), 6);
        tracker.record_order(&t1, 0);

        // Shipped 4, received 6: 6 - 4 + 6 = 8.
        let t2 = obs(2, 8, 0, 0);
        tracker.observe(&t2);
        assert_eq!(tracker.supply_line(), 0);
    }

    #[test]
    fn test_backlog_counts_as_not_shipped() {
        let mut tracker = SupplyLineTracker::new(3);
        let t0 = obs(0, 0, 0, 5);
        tracker.observe(&t0);
        tracker.record_order(&t0, 0);
        // Received 3, shipped 3, backlog 2.
        tracker.observe(&obs(1, 0, 2, 1));
        assert_eq!(tracker.supply_line(), 0);
    }

    #[test]
    fn test_turn_zero_resets() {
        let mut tracker = SupplyLineTracker::new(8);
        let t0 = obs(0, 12, 0, 4);
        tracker.observe(&t0);
        tracker.record_order(&t0, 20);
        assert_eq!(tracker.supply_line(), 28);
        tracker.observe(&t0);
        assert_eq!(tracker.supply_line(), 8);
    }
}
