// src/strategy/traits.rs

use crate::model::observation::Observation;
use std::fmt::Debug;

/// Defines the decision-making logic for a supply chain agent.
///
/// A policy is handed its own node's [`Observation`] and nothing else. It may
/// keep private state between turns (forecasts, its own order history).
///
/// We require `Debug` so we can print the agent state if needed.
/// We require `Send` so the driver can collect decisions on worker threads.
pub trait OrderPolicy: Debug + Send {
    /// How much to order from the upstream supplier this turn.
    fn get_action(&mut self, observation: &Observation) -> u32;

    /// Called at the start of every game. Policies with memory clear it here.
    fn reset(&mut self) {}
}
