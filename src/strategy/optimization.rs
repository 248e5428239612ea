// src/strategy/optimization.rs

//! Order-up-to targets from the newsvendor model.
//!
//! The target balances the cost of holding one more unit against the cost of
//! owing one more unit, over the time it takes an order to be replenished.

use crate::simulation::costs::CostRates;

/// Probability of not stocking out that balances holding against backlog.
///
/// `CR = backlog / (backlog + holding)`, zero when both rates are zero.
pub fn critical_ratio(rates: CostRates) -> f64 {
    let total = rates.backlog + rates.holding;
    if total <= 0.0 {
        return 0.0;
    }
    rates.backlog / total
}

/// Approximate standard normal quantile (Abramowitz & Stegun 26.2.23,
/// absolute error below 4.5e-4). Clamped to +/- 5 sigma at the tails.
fn standard_normal_quantile(p: f64) -> f64 {
    const C: [f64; 3] = [2.515517, 0.802853, 0.010328];
    const D: [f64; 3] = [1.432788, 0.189269, 0.001308];

    if p >= 1.0 {
        return 5.0;
    }
    if p <= 0.0 {
        return -5.0;
    }

    // The rational approximation is for the lower tail.
    let tail = p.min(1.0 - p);
    let t = (-2.0 * tail.ln()).sqrt();
    let x = t - (C[0] + C[1] * t + C[2] * t * t) / (1.0 + D[0] * t + D[1] * t * t + D[2] * t * t * t);

    if p < 0.5 {
        -x
    } else {
        x
    }
}

/// Order-up-to level covering `lead_time` turns plus the one-turn review period.
///
/// `mean * L + z * std_dev * sqrt(L)` with `L = lead_time + 1`, assuming
/// independent demand per turn. Never negative.
pub fn optimal_base_stock(rates: CostRates, mean_demand: f64, std_dev_demand: f64, lead_time: usize) -> u32 {
    let z = standard_normal_quantile(critical_ratio(rates));
    let horizon = (lead_time + 1) as f64;
    let target = mean_demand * horizon + z * std_dev_demand * horizon.sqrt();
    target.max(0.0).round() as u32
}
