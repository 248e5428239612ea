//! A four-echelon beer game: Retailer, Wholesaler, Distributor and
//! Manufacturer each place one order per turn under multi-turn order and
//! shipment delays, without seeing each other's stock.
//!
//! The [`Environment`] is a deterministic turn engine with a reset/step
//! lifecycle. Ordering decisions come from pluggable [`OrderPolicy`]
//! implementations, each fed only its own node's [`Observation`]. The
//! [`Game`] driver ties the two together.
//!
//! ```
//! use supply_chain_game::{Environment, SimulationConfig};
//!
//! let mut env = Environment::new(SimulationConfig::default()).unwrap();
//! let observations = env.reset();
//! assert_eq!(observations[0].stock, 12);
//!
//! let outcome = env.step(&[4, 4, 4, 4]).unwrap();
//! assert!(!outcome.done);
//! ```

pub mod error;
pub mod io;
pub mod model;
pub mod simulation;
pub mod strategy;

pub use error::{ActionError, ConfigError, EnvError, InvariantViolation, ReportError};
pub use io::demand::DemandProcess;
pub use model::chain::{NodeRole, CHAIN_LENGTH};
pub use model::observation::Observation;
pub use simulation::config::{EnvType, SimulationConfig};
pub use simulation::costs::CostRates;
pub use simulation::driver::{Game, GameSummary, HistoryRecord};
pub use simulation::engine::{EnvStatus, Environment, StepInfo, StepOutcome};
pub use strategy::traits::OrderPolicy;
