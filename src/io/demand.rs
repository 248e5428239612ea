// src/io/demand.rs

use crate::error::ConfigError;
use crate::simulation::engine::MAX_ORDER_QUANTITY;
use rand::Rng;
use rand_distr::{Distribution, Normal, Uniform};
use serde::{Deserialize, Serialize};

/// The exogenous customer demand presented to the Retailer each turn.
///
/// Demand never depends on what the agents do. A whole schedule is drawn at
/// `reset()` from the environment's seeded RNG.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DemandProcess {
    /// The same demand every turn.
    Constant { value: u32 },

    /// The classic "Step" pattern: `initial` until `at_turn`, then `after`.
    /// This is the scenario used in the MIT Beer Game to trigger the Bullwhip effect.
    Step { initial: u32, after: u32, at_turn: usize },

    /// Uniform integer demand in `low..=high`.
    Uniform { low: u32, high: u32 },

    /// Normal (Bell Curve) demand, rounded to the nearest integer and clamped at 0.
    Normal { mean: f64, std_dev: f64 },

    /// An explicit sequence. Turns past its end see zero demand.
    Fixed { values: Vec<u32> },
}

impl DemandProcess {
    /// Demand jumps from 4 to 8 at turn 4.
    pub fn classic() -> Self {
        DemandProcess::Step {
            initial: 4,
            after: 8,
            at_turn: 4,
        }
    }

    /// Per-turn mean and standard deviation, as used for order-up-to
    /// targets. A step reports its level after the change, with half the
    /// step size as spread.
    pub fn moments(&self) -> (f64, f64) {
        match self {
            DemandProcess::Constant { value } => (f64::from(*value), 0.0),
            DemandProcess::Step { initial, after, .. } => {
                let (initial, after) = (f64::from(*initial), f64::from(*after));
                (after, (after - initial).abs() / 2.0)
            }
            DemandProcess::Uniform { low, high } => {
                let width = f64::from(*high) - f64::from(*low) + 1.0;
                ((f64::from(*low) + f64::from(*high)) / 2.0, ((width * width - 1.0) / 12.0).sqrt())
            }
            DemandProcess::Normal { mean, std_dev } => (mean.max(0.0), *std_dev),
            DemandProcess::Fixed { values } if values.is_empty() => (0.0, 0.0),
            DemandProcess::Fixed { values } => {
                let n = values.len() as f64;
                let mean = values.iter().map(|&v| f64::from(v)).sum::<f64>() / n;
                let variance = values.iter().map(|&v| (f64::from(v) - mean).powi(2)).sum::<f64>() / n;
                (mean, variance.sqrt())
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sampler().map(|_| ())
    }

    /// Checks the parameters once and returns something that can draw
    /// schedules without failing.
    pub fn sampler(&self) -> Result<DemandSampler, ConfigError> {
        self.check_ceiling()?;
        let sampler = match self {
            DemandProcess::Constant { value } => DemandSampler::Fixed(vec![*value], Tail::Repeat),
            DemandProcess::Step {
                initial,
                after,
                at_turn,
            } => DemandSampler::Step {
                initial: *initial,
                after: *after,
                at_turn: *at_turn,
            },
            DemandProcess::Uniform { low, high } => {
                if low > high {
                    return Err(ConfigError::InvalidDemand {
                        detail: format!("uniform range is empty: low {} > high {}", low, high),
                    });
                }
                DemandSampler::Uniform(Uniform::new_inclusive(*low, *high))
            }
            DemandProcess::Normal { mean, std_dev } => {
                if !mean.is_finite() || !std_dev.is_finite() {
                    return Err(ConfigError::InvalidDemand {
                        detail: format!("normal(mean {}, std_dev {}) must be finite", mean, std_dev),
                    });
                }
                let normal = Normal::new(*mean, *std_dev).map_err(|e| ConfigError::InvalidDemand {
                    detail: format!("normal(mean {}, std_dev {}): {}", mean, std_dev, e),
                })?;
                DemandSampler::Normal(normal)
            }
            DemandProcess::Fixed { values } => DemandSampler::Fixed(values.clone(), Tail::Zero),
        };
        Ok(sampler)
    }

    /// Customer demand is capped like any order quantity. Normal draws are
    /// clamped at sampling time instead.
    fn check_ceiling(&self) -> Result<(), ConfigError> {
        let largest = match self {
            DemandProcess::Constant { value } => *value,
            DemandProcess::Step { initial, after, .. } => (*initial).max(*after),
            DemandProcess::Uniform { high, .. } => *high,
            DemandProcess::Normal { .. } => 0,
            DemandProcess::Fixed { values } => values.iter().copied().max().unwrap_or(0),
        };
        if largest > MAX_ORDER_QUANTITY {
            return Err(ConfigError::InvalidDemand {
                detail: format!("demand {} exceeds the maximum of {}", largest, MAX_ORDER_QUANTITY),
            });
        }
        Ok(())
    }
}

/// What a fixed sequence yields once it runs out.
#[derive(Debug, Clone, Copy)]
pub enum Tail {
    Repeat,
    Zero,
}

/// A validated [`DemandProcess`].
#[derive(Debug, Clone)]
pub enum DemandSampler {
    Step { initial: u32, after: u32, at_turn: usize },
    Uniform(Uniform<u32>),
    Normal(Normal<f64>),
    Fixed(Vec<u32>, Tail),
}

impl DemandSampler {
    /// Draws demand for turns `0..horizon`.
    pub fn schedule<R: Rng>(&self, horizon: usize, rng: &mut R) -> Vec<u32> {
        match self {
            DemandSampler::Step {
                initial,
                after,
                at_turn,
            } => (0..horizon)
                .map(|turn| if turn < *at_turn { *initial } else { *after })
                .collect(),
            DemandSampler::Uniform(uniform) => (0..horizon).map(|_| uniform.sample(rng)).collect(),
            DemandSampler::Normal(normal) => (0..horizon)
                .map(|_| {
                    // Round to nearest integer, clamp into 0..=MAX_ORDER_QUANTITY.
                    let value = normal.sample(rng).round();
                    value.clamp(0.0, f64::from(MAX_ORDER_QUANTITY)) as u32
                })
                .collect(),
            DemandSampler::Fixed(values, tail) => (0..horizon)
                .map(|turn| match (values.get(turn), tail) {
                    (Some(value), _) => *value,
                    (None, Tail::Repeat) => values.last().copied().unwrap_or(0),
                    (None, Tail::Zero) => 0,
                })
                .collect(),
        }
    }
}
