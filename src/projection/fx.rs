//! Exchange-rate forecast from purchasing-power-parity drift

use crate::params::FxAssumptions;

/// Projected FX rate `t` years after quarter 1
///
/// `fx(t) = fx0 * ((1 + local_inflation) / (1 + foreign_inflation))^t`
pub fn projected_rate(fx: &FxAssumptions, t_years: f64) -> f64 {
    fx.rate * ((1.0 + fx.local_inflation) / (1.0 + fx.foreign_inflation)).powf(t_years)
}

/// FX rate for a 1-based projection quarter, measured from the start of quarter 1
pub fn quarter_rate(fx: &FxAssumptions, quarter: u32) -> f64 {
    projected_rate(fx, (quarter - 1) as f64 / 4.0)
}
