//! Cashflow output structures for projections

use super::debt::DebtPhase;
use super::exit::ExitEvent;
use super::state::Phase;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Display basis for money-valued outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurrencyBasis {
    /// Local currency, millions (the engine's native unit)
    LocalMillions,
    /// Foreign currency, thousands
    ForeignThousands,
}

impl CurrencyBasis {
    /// Multiplier applied to local-currency millions at the given FX rate
    pub fn money_factor(&self, fx_rate: f64) -> f64 {
        match self {
            CurrencyBasis::LocalMillions => 1.0,
            CurrencyBasis::ForeignThousands => 1000.0 / fx_rate,
        }
    }

    /// Multiplier applied to per-kWh prices at the given FX rate
    pub fn price_factor(&self, fx_rate: f64) -> f64 {
        match self {
            CurrencyBasis::LocalMillions => 1.0,
            CurrencyBasis::ForeignThousands => 1.0 / fx_rate,
        }
    }
}

/// A single row of projection output for one quarter (money in local-currency millions)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarterRecord {
    // Timing
    pub quarter: u32,
    pub phase: Phase,
    pub calendar_year: i32,
    pub calendar_quarter: u32,
    pub global_year: u32,
    pub operating_year: u32,
    pub period_end: Option<NaiveDate>,
    pub fx_rate: f64,

    // Generation & revenue
    pub generation_mwh: f64,
    pub price: f64,
    pub utility_price: f64,
    pub revenue: f64,
    pub client_savings: f64,

    // Costs
    pub opex: f64,
    pub gross_profit: f64,
    pub sga: f64,
    pub ica: f64,
    pub ebitda: f64,
    pub depreciation: f64,
    pub book_value: f64,

    // Investment
    pub capex_unlevered: f64,
    pub capex_levered: f64,

    // Debt
    pub debt_phase: DebtPhase,
    pub debt_opening: f64,
    pub interest: f64,
    pub principal: f64,
    pub debt_closing: f64,

    // Tax
    pub tax_base_unlevered_pre_benefit: f64,
    pub tax_base_levered_pre_benefit: f64,
    pub capex_benefit: f64,
    pub capex_benefit_remaining: f64,
    pub tax_base_unlevered: f64,
    pub tax_base_levered: f64,
    pub cumulative_base_unlevered: f64,
    pub cumulative_base_levered: f64,
    pub tax_unlevered: f64,
    pub tax_levered: f64,
    pub cumulative_tax_unlevered: f64,
    pub cumulative_tax_levered: f64,
    pub transaction_tax_unlevered: f64,
    pub transaction_tax_levered: f64,

    // Exit proceeds injected into the final retained quarter
    pub exit_unlevered: f64,
    pub exit_levered: f64,

    // Free cash flow, exit included
    pub ufcf: f64,
    pub lfcf: f64,
}

impl QuarterRecord {
    /// Copy of this row with money and prices expressed in `basis`
    ///
    /// Every money field uses the same per-quarter factor so sums and differences
    /// between fields still reconcile after conversion.
    pub fn converted(&self, basis: CurrencyBasis) -> QuarterRecord {
        let m = basis.money_factor(self.fx_rate);
        let p = basis.price_factor(self.fx_rate);

        QuarterRecord {
            price: self.price * p,
            utility_price: self.utility_price * p,
            revenue: self.revenue * m,
            client_savings: self.client_savings * m,
            opex: self.opex * m,
            gross_profit: self.gross_profit * m,
            sga: self.sga * m,
            ica: self.ica * m,
            ebitda: self.ebitda * m,
            depreciation: self.depreciation * m,
            book_value: self.book_value * m,
            capex_unlevered: self.capex_unlevered * m,
            capex_levered: self.capex_levered * m,
            debt_opening: self.debt_opening * m,
            interest: self.interest * m,
            principal: self.principal * m,
            debt_closing: self.debt_closing * m,
            tax_base_unlevered_pre_benefit: self.tax_base_unlevered_pre_benefit * m,
            tax_base_levered_pre_benefit: self.tax_base_levered_pre_benefit * m,
            capex_benefit: self.capex_benefit * m,
            capex_benefit_remaining: self.capex_benefit_remaining * m,
            tax_base_unlevered: self.tax_base_unlevered * m,
            tax_base_levered: self.tax_base_levered * m,
            cumulative_base_unlevered: self.cumulative_base_unlevered * m,
            cumulative_base_levered: self.cumulative_base_levered * m,
            tax_unlevered: self.tax_unlevered * m,
            tax_levered: self.tax_levered * m,
            cumulative_tax_unlevered: self.cumulative_tax_unlevered * m,
            cumulative_tax_levered: self.cumulative_tax_levered * m,
            transaction_tax_unlevered: self.transaction_tax_unlevered * m,
            transaction_tax_levered: self.transaction_tax_levered * m,
            exit_unlevered: self.exit_unlevered * m,
            exit_levered: self.exit_levered * m,
            ufcf: self.ufcf * m,
            lfcf: self.lfcf * m,
            ..self.clone()
        }
    }
}

/// Flow quantities summed over one calendar year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualRecord {
    pub calendar_year: i32,
    pub quarters: u32,
    pub generation_mwh: f64,
    /// Generation-weighted average PPA price (0 when nothing was generated)
    pub implied_price: f64,
    pub revenue: f64,
    pub client_savings: f64,
    pub opex: f64,
    pub sga: f64,
    pub ica: f64,
    pub ebitda: f64,
    pub depreciation: f64,
    pub capex_unlevered: f64,
    pub capex_levered: f64,
    pub interest: f64,
    pub principal: f64,
    pub capex_benefit: f64,
    pub tax_unlevered: f64,
    pub tax_levered: f64,
    pub transaction_tax_unlevered: f64,
    pub transaction_tax_levered: f64,
    pub ufcf: f64,
    pub lfcf: f64,
    /// Share of client consumption covered by generation (0 when consumption is unknown)
    pub coverage_ratio: f64,
}

impl AnnualRecord {
    fn empty(calendar_year: i32) -> Self {
        Self {
            calendar_year,
            quarters: 0,
            generation_mwh: 0.0,
            implied_price: 0.0,
            revenue: 0.0,
            client_savings: 0.0,
            opex: 0.0,
            sga: 0.0,
            ica: 0.0,
            ebitda: 0.0,
            depreciation: 0.0,
            capex_unlevered: 0.0,
            capex_levered: 0.0,
            interest: 0.0,
            principal: 0.0,
            capex_benefit: 0.0,
            tax_unlevered: 0.0,
            tax_levered: 0.0,
            transaction_tax_unlevered: 0.0,
            transaction_tax_levered: 0.0,
            ufcf: 0.0,
            lfcf: 0.0,
            coverage_ratio: 0.0,
        }
    }

    fn add(&mut self, row: &QuarterRecord) {
        self.quarters += 1;
        self.generation_mwh += row.generation_mwh;
        // Weighted price sum, normalised in `finish`
        self.implied_price += row.generation_mwh * row.price;
        self.revenue += row.revenue;
        self.client_savings += row.client_savings;
        self.opex += row.opex;
        self.sga += row.sga;
        self.ica += row.ica;
        self.ebitda += row.ebitda;
        self.depreciation += row.depreciation;
        self.capex_unlevered += row.capex_unlevered;
        self.capex_levered += row.capex_levered;
        self.interest += row.interest;
        self.principal += row.principal;
        self.capex_benefit += row.capex_benefit;
        self.tax_unlevered += row.tax_unlevered;
        self.tax_levered += row.tax_levered;
        self.transaction_tax_unlevered += row.transaction_tax_unlevered;
        self.transaction_tax_levered += row.transaction_tax_levered;
        self.ufcf += row.ufcf;
        self.lfcf += row.lfcf;
    }

    fn finish(&mut self, client_consumption_mwh: f64) {
        self.implied_price = if self.generation_mwh > 0.0 {
            self.implied_price / self.generation_mwh
        } else {
            0.0
        };
        let consumption = client_consumption_mwh * self.quarters as f64 / 4.0;
        self.coverage_ratio = if consumption > 0.0 {
            self.generation_mwh / consumption
        } else {
            0.0
        };
    }
}

/// Group quarterly rows by calendar year (rows must be in quarter order)
pub fn aggregate_annual(rows: &[QuarterRecord], client_consumption_mwh: f64) -> Vec<AnnualRecord> {
    let mut years: Vec<AnnualRecord> = Vec::new();

    for row in rows {
        match years.last_mut() {
            Some(year) if year.calendar_year == row.calendar_year => year.add(row),
            _ => {
                let mut year = AnnualRecord::empty(row.calendar_year);
                year.add(row);
                years.push(year);
            }
        }
    }

    for year in &mut years {
        year.finish(client_consumption_mwh);
    }
    years
}

/// Full quarterly series over construction and the whole PPA term, before any exit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projection {
    pub quarters: Vec<QuarterRecord>,
}

/// Projection truncated at the exit quarter with exit proceeds injected
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionResult {
    /// Quarterly rows from quarter 1 through the exit quarter
    pub quarters: Vec<QuarterRecord>,

    pub exit: ExitEvent,

    /// Equity cash put in before operations (local-currency millions)
    pub equity_investment: f64,

    /// Total project cash cost before operations (local-currency millions)
    pub unlevered_investment: f64,

    /// FX rate at origination, used to convert the investments
    pub origination_fx_rate: f64,

    pub client_consumption_mwh: f64,
}

impl ProjectionResult {
    /// Quarterly rows in the given display basis
    pub fn quarters_in(&self, basis: CurrencyBasis) -> Vec<QuarterRecord> {
        self.quarters.iter().map(|r| r.converted(basis)).collect()
    }

    /// Annual aggregation in the given display basis
    pub fn annual(&self, basis: CurrencyBasis) -> Vec<AnnualRecord> {
        aggregate_annual(&self.quarters_in(basis), self.client_consumption_mwh)
    }

    /// Unlevered free cash flow stream in the given basis
    pub fn ufcf(&self, basis: CurrencyBasis) -> Vec<f64> {
        self.quarters
            .iter()
            .map(|r| r.ufcf * basis.money_factor(r.fx_rate))
            .collect()
    }

    /// Levered free cash flow stream in the given basis
    pub fn lfcf(&self, basis: CurrencyBasis) -> Vec<f64> {
        self.quarters
            .iter()
            .map(|r| r.lfcf * basis.money_factor(r.fx_rate))
            .collect()
    }

    /// Get summary statistics
    pub fn summary(&self) -> ProjectionSummary {
        let total_generation: f64 = self.quarters.iter().map(|r| r.generation_mwh).sum();
        let total_revenue: f64 = self.quarters.iter().map(|r| r.revenue).sum();
        let total_ebitda: f64 = self.quarters.iter().map(|r| r.ebitda).sum();
        let total_tax_levered: f64 = self.quarters.iter().map(|r| r.tax_levered).sum();
        let total_ufcf: f64 = self.quarters.iter().map(|r| r.ufcf).sum();
        let total_lfcf: f64 = self.quarters.iter().map(|r| r.lfcf).sum();
        let total_capex_benefit: f64 = self.quarters.iter().map(|r| r.capex_benefit).sum();

        ProjectionSummary {
            total_quarters: self.quarters.len() as u32,
            total_generation,
            total_revenue,
            total_ebitda,
            total_tax_levered,
            total_capex_benefit,
            total_ufcf,
            total_lfcf,
            exit_valuation: self.exit.valuation,
        }
    }
}

/// Summary statistics for a projection (local-currency millions)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionSummary {
    pub total_quarters: u32,
    pub total_generation: f64,
    pub total_revenue: f64,
    pub total_ebitda: f64,
    pub total_tax_levered: f64,
    pub total_capex_benefit: f64,
    pub total_ufcf: f64,
    pub total_lfcf: f64,
    pub exit_valuation: f64,
}
