//! Investor return metrics derived from a projection result

use super::cashflows::{CurrencyBasis, ProjectionResult};
use super::irr::{calculate_irr, npv_at_rate};
use log::warn;
use serde::{Deserialize, Serialize};

/// Headline returns in one display basis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnsSummary {
    pub basis: CurrencyBasis,
    /// Equity investment converted at the origination FX rate
    pub equity_investment: f64,
    pub unlevered_investment: f64,
    /// Annualized project IRR, None when the stream has no real IRR
    pub unlevered_irr: Option<f64>,
    /// Annualized equity IRR, None when the stream has no real IRR
    pub levered_irr: Option<f64>,
    /// Levered IRR minus unlevered IRR
    pub leverage_boost: Option<f64>,
    /// Equity NPV at the investor discount rate
    pub npv: f64,
    /// Sum of levered cash flows over equity investment (0 without equity)
    pub moic: f64,
    /// Implied price of the first calendar year with generation
    pub year_one_price: f64,
}

impl ReturnsSummary {
    pub fn compute(result: &ProjectionResult, basis: CurrencyBasis, investor_discount_rate: f64) -> Self {
        let ufcf = result.ufcf(basis);
        let lfcf = result.lfcf(basis);
        let origination = basis.money_factor(result.origination_fx_rate);

        let unlevered_irr = calculate_irr(&ufcf, 4);
        let levered_irr = calculate_irr(&lfcf, 4);
        if levered_irr.is_none() {
            warn!("Levered IRR undefined for {:?} cash flows", basis);
        }

        let equity_investment = result.equity_investment * origination;
        let moic = if equity_investment > 0.0 {
            lfcf.iter().sum::<f64>() / equity_investment
        } else {
            0.0
        };

        // Prepend t = 0 so the first quarter is discounted one period
        let mut discounted = Vec::with_capacity(lfcf.len() + 1);
        discounted.push(0.0);
        discounted.extend_from_slice(&lfcf);
        let npv = npv_at_rate(&discounted, investor_discount_rate / 4.0);

        let year_one_price = result
            .annual(basis)
            .iter()
            .find(|y| y.generation_mwh > 0.0)
            .map_or(0.0, |y| y.implied_price);

        Self {
            basis,
            equity_investment,
            unlevered_investment: result.unlevered_investment * origination,
            unlevered_irr,
            levered_irr,
            leverage_boost: levered_irr.zip(unlevered_irr).map(|(l, u)| l - u),
            npv,
            moic,
            year_one_price,
        }
    }

    /// Levered IRR with undefined reported as 0, for displays that need a number
    pub fn levered_irr_or_zero(&self) -> f64 {
        self.levered_irr.unwrap_or(0.0)
    }

    pub fn unlevered_irr_or_zero(&self) -> f64 {
        self.unlevered_irr.unwrap_or(0.0)
    }
}
