// src/model/observation.rs

use crate::model::chain::NodeRole;
use crate::model::node::Node;
use serde::Serialize;

/// What a single node's agent is allowed to see before placing its order.
///
/// This is a projection of one node's state. It never carries another node's
/// stock or backlog, nor anything in transit other than the order this node
/// has to serve next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Observation {
    pub role: NodeRole,
    /// Index of the turn about to be played.
    pub turn: usize,
    pub stock: u32,
    pub backlog: u32,
    /// The order (or customer demand, for the Retailer) this node must serve
    /// in the coming turn.
    pub incoming_order: u32,
}

impl Observation {
    pub fn build(node: &Node, turn: usize, incoming_order: u32) -> Self {
        Self {
            role: node.role,
            turn,
            stock: node.stock,
            backlog: node.backlog,
            incoming_order,
        }
    }

    /// Stock minus backlog; negative when the node owes more than it holds.
    pub fn net_stock(&self) -> i64 {
        i64::from(self.stock) - i64::from(self.backlog)
    }
}
