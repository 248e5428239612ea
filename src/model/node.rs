// src/model/node.rs

use crate::error::InvariantViolation;
use crate::model::chain::NodeRole;
use serde::Serialize;

/// The state of a single echelon in the supply chain.
///
/// Stock and backlog are unsigned: unmet demand never shows up as negative
/// stock, it accrues in `backlog` instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    // Identity
    pub role: NodeRole,

    // State Variables
    pub stock: u32,
    pub backlog: u32,

    // Tracking for Analysis/Logging
    pub last_incoming_order: u32,    // Demand from downstream
    pub last_shipment_received: u32, // Goods from upstream
    pub last_shipment_sent: u32,     // Goods sent downstream
    pub last_order_placed: u32,      // Decision made by this node's agent
}

impl Node {
    pub fn new(role: NodeRole, initial_stock: u32) -> Self {
        Self {
            role,
            stock: initial_stock,
            backlog: 0,
            last_incoming_order: 0,
            last_shipment_received: 0,
            last_shipment_sent: 0,
            last_order_placed: 0,
        }
    }

    /// Goods arriving from upstream go straight into stock.
    pub fn receive_shipment(&mut self, quantity: u32) -> Result<(), InvariantViolation> {
        self.stock = self
            .stock
            .checked_add(quantity)
            .ok_or(InvariantViolation::CapacityExceeded {
                role: self.role,
                quantity: "stock",
            })?;
        self.last_shipment_received = quantity;
        Ok(())
    }

    /// Serves the prior backlog first, then the new incoming order, as far as
    /// stock allows. The shortfall is carried forward as backlog.
    ///
    /// Returns the quantity shipped downstream.
    pub fn fulfil(&mut self, incoming_order: u32) -> Result<u32, InvariantViolation> {
        self.last_incoming_order = incoming_order;

        // Total obligation = Old Backlog + New Order
        let owed = self
            .backlog
            .checked_add(incoming_order)
            .ok_or(InvariantViolation::CapacityExceeded {
                role: self.role,
                quantity: "backlog",
            })?;
        let shipped = owed.min(self.stock);

        // shipped <= stock and shipped <= owed
        self.stock -= shipped;
        self.backlog = owed - shipped;

        self.last_shipment_sent = shipped;
        Ok(shipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fulfil_with_enough_stock_clears_backlog() {
        let mut node = Node::new(NodeRole::Wholesaler, 10);
        node.backlog = 3;
        let shipped = node.fulfil(4).unwrap();
        assert_eq!(shipped, 7);
        assert_eq!(node.stock, 3);
        assert_eq!(node.backlog, 0);
    }

    #[test]
    fn test_fulfil_shortage_ships_everything_and_backlogs_rest() {
        let mut node = Node::new(NodeRole::Retailer, 5);
        node.backlog = 2;
        let shipped = node.fulfil(8).unwrap();
        assert_eq!(shipped, 5);
        assert_eq!(node.stock, 0);
        assert_eq!(node.backlog, 5);
        assert_eq!(node.last_shipment_sent, 5);
    }

    #[test]
    fn test_zero_order_only_serves_backlog() {
        let mut node = Node::new(NodeRole::Distributor, 0);
        node.backlog = 4;
        node.receive_shipment(3).unwrap();
        assert_eq!(node.fulfil(0).unwrap(), 3);
        assert_eq!(node.backlog, 1);
        assert_eq!(node.last_shipment_received, 3);
    }

    #[test]
    fn test_stock_overflow_is_reported_not_wrapped() {
        let mut node = Node::new(NodeRole::Manufacturer, u32::MAX - 1);
        assert_eq!(
            node.receive_shipment(2),
            Err(InvariantViolation::CapacityExceeded {
                role: NodeRole::Manufacturer,
                quantity: "stock",
            })
        );
        assert_eq!(node.stock, u32::MAX - 1);
    }

    #[test]
    fn test_backlog_overflow_is_reported_not_wrapped() {
        let mut node = Node::new(NodeRole::Retailer, 0);
        node.backlog = u32::MAX;
        assert_eq!(
            node.fulfil(1),
            Err(InvariantViolation::CapacityExceeded {
                role: NodeRole::Retailer,
                quantity: "backlog",
            })
        );
        assert_eq!(node.backlog, u32::MAX);
    }
}
