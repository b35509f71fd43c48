//! Project parameters: the immutable value object consumed by the projection engine
//!
//! All rates are decimals (0.05 = 5%). Money is in local-currency millions, generation in
//! MWh, tariffs in local currency per kWh. Build instances from [`ProjectInputs`], which
//! holds the user-facing percent form and validates ranges on conversion.

mod inputs;

pub use inputs::{ExitMethod, ProjectInputs, REFERENCE_SPECIFIC_YIELD};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Longest CAPEX tax-benefit window the incentive scheme allows
pub const MAX_BENEFIT_WINDOW_YEARS: u32 = 15;

/// Macro assumptions driving the FX forecast
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FxAssumptions {
    /// Local currency per unit of foreign currency at quarter 1
    pub rate: f64,
    /// Annual local inflation (numerator of the PPP drift)
    pub local_inflation: f64,
    /// Annual foreign inflation (denominator of the PPP drift)
    pub foreign_inflation: f64,
}

/// Power purchase agreement terms
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PpaTerms {
    pub term_years: u32,
    /// Utility tariff at contract start (local currency per kWh)
    pub tariff: f64,
    /// Annual utility tariff inflation
    pub utility_inflation: f64,
    /// Discount granted to the client against the utility tariff
    pub client_discount: f64,
    /// Annual PPA price escalator, already resolved to utility inflation when indexed
    pub escalator: f64,
    /// Whether the escalator is pegged to utility inflation
    pub escalator_indexed: bool,
}

/// Technical generation assumptions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechnicalSpec {
    /// Contracted generation in the first operating year (MWh)
    pub annual_generation_mwh: f64,
    /// Annual output degradation
    pub degradation: f64,
    /// Client annual consumption (MWh), 0 when unknown
    pub client_consumption_mwh: f64,
}

/// Construction, CAPEX and operating cost assumptions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostAssumptions {
    pub construction_quarters: u32,
    pub capex: f64,
    pub opex_annual: f64,
    pub opex_inflation: f64,
    /// SGA as a share of gross profit during operation
    pub sga_pct: f64,
    /// SGA spent during construction as a share of CAPEX
    pub sga_construction_pct: f64,
}

impl CostAssumptions {
    /// Construction-period SGA, a cash cost disbursed alongside CAPEX
    pub fn construction_sga(&self) -> f64 {
        self.capex * self.sga_construction_pct
    }
}

/// Time-boxed incentive letting part of CAPEX offset taxable income
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapexBenefit {
    /// Window length in calendar years, at most [`MAX_BENEFIT_WINDOW_YEARS`]
    pub window_years: u32,
    /// Share of CAPEX eligible for the incentive
    pub eligible_fraction: f64,
}

impl CapexBenefit {
    /// Total deduction available over the window
    pub fn pool(&self, capex: f64) -> f64 {
        0.5 * self.eligible_fraction * capex
    }
}

/// Income, gains and transaction taxes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiscalRegime {
    pub tax_rate: f64,
    pub capital_gains_rate: f64,
    pub depreciation_years: u32,
    /// Financial transaction tax on cash disbursements
    pub transaction_tax_rate: f64,
    /// Municipal industry-and-commerce tax on revenue, when levied
    pub ica_rate: Option<f64>,
    pub capex_benefit: Option<CapexBenefit>,
}

/// Senior debt terms
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtTerms {
    /// Share of CAPEX funded by debt
    pub ratio: f64,
    pub annual_rate: f64,
    pub tenor_years: u32,
    /// Structuring fee as a share of the principal
    pub structuring_fee_pct: f64,
    /// Interest-only quarters counted from quarter 1
    pub grace_quarters: u32,
}

impl DebtTerms {
    pub fn principal(&self, capex: f64) -> f64 {
        capex * self.ratio
    }

    pub fn structuring_fee(&self, capex: f64) -> f64 {
        self.principal(capex) * self.structuring_fee_pct
    }
}

/// How the asset is valued on disposal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ExitStrategy {
    /// Sale at a fixed value (local-currency millions)
    FixedValue(f64),
    /// Trailing four-quarter EBITDA times a multiple
    EbitdaMultiple(f64),
}

/// Disposal terms
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExitTerms {
    pub strategy: ExitStrategy,
    /// Operating year at whose end the asset is sold (1-based)
    pub exit_year: u32,
}

/// Calendar anchor of quarter 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarStart {
    pub year: i32,
    /// Calendar quarter 1-4
    pub quarter: u32,
}

impl CalendarStart {
    /// Anchor quarter 1 to the calendar quarter containing `date`
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            quarter: (date.month() - 1) / 3 + 1,
        }
    }
}

/// Complete, validated parameter set for one projection run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectParameters {
    pub fx: FxAssumptions,
    pub ppa: PpaTerms,
    pub technical: TechnicalSpec,
    pub costs: CostAssumptions,
    pub fiscal: FiscalRegime,
    /// None when the project is fully equity funded
    pub debt: Option<DebtTerms>,
    pub exit: ExitTerms,
    /// Investor cost of equity used for NPV
    pub investor_discount_rate: f64,
    pub start: CalendarStart,
}

impl ProjectParameters {
    /// Construction plus the full PPA term
    pub fn total_quarters(&self) -> u32 {
        self.costs.construction_quarters + self.ppa.term_years * 4
    }

    /// Last retained quarter once the exit truncates the series
    pub fn exit_quarter(&self) -> u32 {
        self.costs.construction_quarters + self.exit.exit_year * 4
    }

    pub fn debt_principal(&self) -> f64 {
        self.debt
            .as_ref()
            .map_or(0.0, |d| d.principal(self.costs.capex))
    }

    pub fn structuring_fee(&self) -> f64 {
        self.debt
            .as_ref()
            .map_or(0.0, |d| d.structuring_fee(self.costs.capex))
    }

    /// Total project cash cost before operations
    pub fn unlevered_investment(&self) -> f64 {
        self.costs.capex + self.costs.construction_sga()
    }

    /// Share of the project cost funded by equity, fees included
    pub fn levered_investment(&self) -> f64 {
        self.unlevered_investment() + self.structuring_fee() - self.debt_principal()
    }

    /// Same project, different disposal terms
    pub fn with_exit(&self, exit: ExitTerms) -> Self {
        Self {
            exit,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calendar_start_from_date() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 14).unwrap();
        assert_eq!(CalendarStart::from_date(date), CalendarStart { year: 2026, quarter: 3 });
    }

    #[test]
    fn test_investment_split() {
        let params = ProjectInputs::default().to_parameters().unwrap();
        // 120 capex, 70% debt, 2% fee on 84 principal
        assert!((params.debt_principal() - 84.0).abs() < 1e-12);
        assert!((params.structuring_fee() - 1.68).abs() < 1e-12);
        assert!((params.levered_investment() - 37.68).abs() < 1e-9);
        assert!((params.unlevered_investment() - 120.0).abs() < 1e-12);
    }

    #[test]
    fn test_exit_quarter() {
        let params = ProjectInputs::default().to_parameters().unwrap();
        assert_eq!(params.total_quarters(), 42);
        assert_eq!(params.exit_quarter(), 42);

        let early = params.with_exit(ExitTerms {
            strategy: ExitStrategy::FixedValue(50.0),
            exit_year: 5,
        });
        assert_eq!(early.exit_quarter(), 22);
        assert_eq!(early.total_quarters(), 42);
    }
}
