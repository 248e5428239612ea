// src/model/chain.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of echelons in the chain. The game is always played with four.
pub const CHAIN_LENGTH: usize = 4;

/// A position in the supply chain.
///
/// Goods flow customer <- Retailer <- Wholesaler <- Distributor <- Manufacturer <- supply,
/// orders flow the other way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeRole {
    Retailer,
    Wholesaler,
    Distributor,
    Manufacturer,
}

impl NodeRole {
    /// All roles in chain order, customer side first.
    pub const ALL: [NodeRole; CHAIN_LENGTH] = [
        NodeRole::Retailer,
        NodeRole::Wholesaler,
        NodeRole::Distributor,
        NodeRole::Manufacturer,
    ];

    pub fn index(self) -> usize {
        match self {
            NodeRole::Retailer => 0,
            NodeRole::Wholesaler => 1,
            NodeRole::Distributor => 2,
            NodeRole::Manufacturer => 3,
        }
    }

    /// The node this one orders from. `None` for the Manufacturer (external supply).
    pub fn upstream(self) -> Option<NodeRole> {
        NodeRole::ALL.get(self.index() + 1).copied()
    }

    /// The node this one ships to. `None` for the Retailer (end customers).
    pub fn downstream(self) -> Option<NodeRole> {
        self.index().checked_sub(1).map(|i| NodeRole::ALL[i])
    }
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeRole::Retailer => "Retailer",
            NodeRole::Wholesaler => "Wholesaler",
            NodeRole::Distributor => "Distributor",
            NodeRole::Manufacturer => "Manufacturer",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjacency_is_linear() {
        assert_eq!(NodeRole::Retailer.downstream(), None);
        assert_eq!(NodeRole::Retailer.upstream(), Some(NodeRole::Wholesaler));
        assert_eq!(NodeRole::Distributor.upstream(), Some(NodeRole::Manufacturer));
        assert_eq!(NodeRole::Manufacturer.upstream(), None);
        assert_eq!(NodeRole::Manufacturer.downstream(), Some(NodeRole::Distributor));
    }

    #[test]
    fn test_index_matches_chain_order() {
        for (i, role) in NodeRole::ALL.iter().enumerate() {
            assert_eq!(role.index(), i);
        }
    }
}
