//! Generation, pricing and operating costs for a single quarter

use crate::params::ProjectParameters;

/// Scaling from MWh x (currency/kWh) to currency millions
const REVENUE_SCALE: f64 = 1000.0;

/// Operating figures for one quarter (money in local-currency millions)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct QuarterOperations {
    pub generation_mwh: f64,
    /// PPA price charged to the client (per kWh)
    pub price: f64,
    /// Utility tariff the client would otherwise pay (per kWh)
    pub utility_price: f64,
    pub revenue: f64,
    /// Client saving against buying the same energy from the utility
    pub client_savings: f64,
    pub opex: f64,
    pub gross_profit: f64,
    pub sga: f64,
    pub ica: f64,
    pub ebitda: f64,
}

impl QuarterOperations {
    /// Construction quarters produce nothing and cost nothing operationally
    pub fn idle() -> Self {
        Self::default()
    }

    /// Figures for the `k`-th operating quarter (1-based)
    pub fn operating(params: &ProjectParameters, k: u32) -> Self {
        let t = (k - 1) as f64 / 4.0;
        let ppa = &params.ppa;
        let costs = &params.costs;

        let degradation_factor = (1.0 - params.technical.degradation).powf(t);
        let escalation_factor = (1.0 + ppa.escalator).powf(t);
        let utility_factor = (1.0 + ppa.utility_inflation).powf(t);
        let opex_factor = (1.0 + costs.opex_inflation).powf(t);

        let generation_mwh = params.technical.annual_generation_mwh / 4.0 * degradation_factor;
        let price = ppa.tariff * (1.0 - ppa.client_discount) * escalation_factor;
        let utility_price = ppa.tariff * utility_factor;

        let revenue = generation_mwh * price / REVENUE_SCALE;
        let client_savings = generation_mwh * (utility_price - price) / REVENUE_SCALE;

        let opex = costs.opex_annual / 4.0 * opex_factor;
        let gross_profit = revenue - opex;
        let sga = gross_profit * costs.sga_pct;
        let ica = params.fiscal.ica_rate.map_or(0.0, |rate| revenue * rate);
        let ebitda = gross_profit - sga - ica;

        Self {
            generation_mwh,
            price,
            utility_price,
            revenue,
            client_savings,
            opex,
            gross_profit,
            sga,
            ica,
            ebitda,
        }
    }
}
