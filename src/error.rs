// src/error.rs

use crate::model::chain::NodeRole;
use crate::simulation::engine::EnvStatus;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by [`Environment::step`](crate::simulation::engine::Environment::step).
#[derive(Debug, Error, PartialEq)]
pub enum EnvError {
    /// The caller passed an unusable action vector. The turn was not applied.
    #[error("invalid action: {0}")]
    InvalidAction(#[from] ActionError),

    /// `step()` was called before `reset()`, after the horizon, or after a fault.
    #[error("environment not reset (status: {status:?})")]
    EnvironmentNotReset { status: EnvStatus },

    /// The engine broke one of its own invariants. The run must be aborted.
    #[error("invariant violation: {0}")]
    InvariantViolation(#[from] InvariantViolation),
}

/// Why an action vector was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActionError {
    #[error("expected {expected} order quantities, got {actual}")]
    WrongCount { expected: usize, actual: usize },

    #[error("{role} ordered {quantity}; order quantities must be non-negative")]
    Negative { role: NodeRole, quantity: i64 },

    #[error("{role} ordered {quantity}; maximum order quantity is {max}")]
    TooLarge { role: NodeRole, quantity: i64, max: u32 },
}

/// Engine defects. None of these is a legal outcome of a valid game.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvariantViolation {
    /// Stock leaving a node does not match what it put into its shipment line.
    #[error("{role} took {taken} units out of stock but shipped {shipped}")]
    ShipmentMismatch { role: NodeRole, taken: u64, shipped: u32 },

    /// A node's stock or backlog no longer fits in a `u32`.
    #[error("{role} {quantity} overflowed")]
    CapacityExceeded {
        role: NodeRole,
        quantity: &'static str,
    },

    #[error("delay line '{line}' has length {actual}, configured delay is {expected}")]
    PipelineLength {
        line: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("goods not conserved at turn {turn}: expected {expected} units in the system, found {actual}")]
    Conservation { turn: usize, expected: u64, actual: u64 },
}

/// Problems with a [`SimulationConfig`](crate::simulation::config::SimulationConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{pipeline} delay must be at least 1 turn")]
    ZeroDelay { pipeline: &'static str },

    #[error("horizon must be at least 1 turn")]
    ZeroHorizon,

    #[error("{role} {kind} cost rate must be finite and non-negative, got {value}")]
    InvalidCostRate {
        role: NodeRole,
        kind: &'static str,
        value: f64,
    },

    #[error("invalid demand process: {detail}")]
    InvalidDemand { detail: String },

    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Failures while exporting history or submitting a score.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
