//! User-facing project inputs
//!
//! Mirrors what an analyst types: percentages as percent, optional overrides left empty.
//! Every field falls back to the reference deal so partial JSON files load cleanly.

use super::{
    CalendarStart, CapexBenefit, CostAssumptions, DebtTerms, ExitStrategy, ExitTerms,
    FiscalRegime, FxAssumptions, PpaTerms, ProjectParameters, TechnicalSpec,
    MAX_BENEFIT_WINDOW_YEARS,
};
use crate::error::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Annual MWh per installed kWp at the reference site
pub const REFERENCE_SPECIFIC_YIELD: f64 = 44.86 / 29.25;

/// Exit valuation method as selected in the input form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitMethod {
    FixedAssetValue,
    EbitdaMultiple,
}

/// Flat parameter set in input units
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProjectInputs {
    // Currency & FX
    /// Local currency per USD
    pub fx_rate: f64,
    pub us_inflation_pct: f64,
    /// Local inflation for the PPP drift; utility inflation when empty
    pub local_inflation_pct: Option<f64>,

    // PPA & revenue
    pub ppa_term_years: u32,
    /// Utility tariff (local currency per kWh)
    pub tariff: f64,
    pub utility_inflation_pct: f64,
    pub client_discount_pct: f64,
    pub index_escalator_to_inflation: bool,
    pub ppa_escalator_pct: f64,

    // Technical
    /// Contracted first-year generation; derived from the module layout when empty
    pub annual_generation_mwh: Option<f64>,
    pub num_modules: u32,
    pub module_power_w: f64,
    /// MWh per kWp per year
    pub specific_yield: f64,
    pub degradation_pct: f64,
    pub client_consumption_mwh: f64,

    // Costs & construction
    pub construction_quarters: u32,
    pub capex: f64,
    pub opex_annual: f64,
    pub opex_inflation_pct: f64,
    pub sga_pct: f64,
    pub sga_construction_pct: f64,

    // Tax & depreciation
    pub tax_rate_pct: f64,
    pub capital_gains_pct: f64,
    pub depreciation_years: u32,
    pub transaction_tax_pct: f64,
    pub ica_enabled: bool,
    pub ica_rate_pct: f64,
    pub capex_benefit_enabled: bool,
    pub capex_benefit_years: u32,
    pub capex_benefit_eligible_pct: f64,

    // Financing
    pub enable_debt: bool,
    pub debt_ratio_pct: f64,
    pub interest_rate_pct: f64,
    pub loan_tenor_years: u32,
    pub structuring_fee_pct: f64,
    /// Interest-only quarters; the construction period when empty
    pub grace_period_quarters: Option<u32>,

    // Exit & returns
    pub exit_method: ExitMethod,
    /// Exit at the end of the PPA when empty
    pub exit_year: Option<u32>,
    pub exit_value: f64,
    pub exit_multiple: f64,
    pub investor_discount_pct: f64,

    // Calendar
    pub start_year: i32,
    pub start_quarter: u32,
}

impl Default for ProjectInputs {
    fn default() -> Self {
        Self {
            fx_rate: 4100.0,
            us_inflation_pct: 2.5,
            local_inflation_pct: None,
            ppa_term_years: 10,
            tariff: 881.6,
            utility_inflation_pct: 5.0,
            client_discount_pct: 25.0,
            index_escalator_to_inflation: false,
            ppa_escalator_pct: 3.5,
            annual_generation_mwh: None,
            num_modules: 45,
            module_power_w: 650.0,
            specific_yield: REFERENCE_SPECIFIC_YIELD,
            degradation_pct: 0.6,
            client_consumption_mwh: 0.0,
            construction_quarters: 2,
            capex: 120.0,
            opex_annual: 4.0,
            opex_inflation_pct: 5.0,
            sga_pct: 10.0,
            sga_construction_pct: 0.0,
            tax_rate_pct: 35.0,
            capital_gains_pct: 10.0,
            depreciation_years: 5,
            transaction_tax_pct: 0.4,
            ica_enabled: false,
            ica_rate_pct: 1.0,
            capex_benefit_enabled: false,
            capex_benefit_years: 15,
            capex_benefit_eligible_pct: 100.0,
            enable_debt: true,
            debt_ratio_pct: 70.0,
            interest_rate_pct: 12.1,
            loan_tenor_years: 9,
            structuring_fee_pct: 2.0,
            grace_period_quarters: None,
            exit_method: ExitMethod::FixedAssetValue,
            exit_year: None,
            exit_value: 10.0,
            exit_multiple: 7.0,
            investor_discount_pct: 12.0,
            start_year: 2025,
            start_quarter: 1,
        }
    }
}

fn pct(value: f64) -> f64 {
    value / 100.0
}

fn check(ok: bool, field: &str, reason: &str) -> ModelResult<()> {
    if ok {
        Ok(())
    } else {
        Err(ModelError::invalid(field, reason))
    }
}

fn check_pct(value: f64, field: &str) -> ModelResult<()> {
    check(
        (0.0..=100.0).contains(&value),
        field,
        "must be between 0 and 100 percent",
    )
}

impl ProjectInputs {
    /// Load inputs from a JSON file; missing fields take reference values
    pub fn load_json(path: &Path) -> ModelResult<Self> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    /// Save inputs as pretty-printed JSON
    pub fn save_json(&self, path: &Path) -> ModelResult<()> {
        crate::report::write_json(path, self)
    }

    /// Installed capacity implied by the module layout (kWp)
    pub fn system_size_kwp(&self) -> f64 {
        self.num_modules as f64 * self.module_power_w / 1000.0
    }

    /// Contracted first-year generation, explicit or derived from the module layout
    pub fn resolved_generation_mwh(&self) -> f64 {
        self.annual_generation_mwh
            .unwrap_or_else(|| self.system_size_kwp() * self.specific_yield)
    }

    fn validate(&self) -> ModelResult<()> {
        check(self.fx_rate > 0.0, "fx_rate", "must be positive")?;
        check(
            1.0 + pct(self.us_inflation_pct) > 0.0,
            "us_inflation_pct",
            "must be above -100 percent",
        )?;
        check(
            (1..=30).contains(&self.ppa_term_years),
            "ppa_term_years",
            "must be between 1 and 30",
        )?;
        check(self.tariff >= 0.0, "tariff", "cannot be negative")?;
        check_pct(self.client_discount_pct, "client_discount_pct")?;
        check(
            (0.0..100.0).contains(&self.degradation_pct),
            "degradation_pct",
            "must be at least 0 and below 100 percent",
        )?;
        check(
            self.resolved_generation_mwh() >= 0.0,
            "annual_generation_mwh",
            "cannot be negative",
        )?;
        check(
            self.client_consumption_mwh >= 0.0,
            "client_consumption_mwh",
            "cannot be negative",
        )?;

        check(
            self.construction_quarters <= 40,
            "construction_quarters",
            "must be at most 40",
        )?;
        check(self.capex >= 0.0, "capex", "cannot be negative")?;
        check(self.opex_annual >= 0.0, "opex_annual", "cannot be negative")?;
        check_pct(self.sga_pct, "sga_pct")?;
        check_pct(self.sga_construction_pct, "sga_construction_pct")?;

        check_pct(self.tax_rate_pct, "tax_rate_pct")?;
        check_pct(self.capital_gains_pct, "capital_gains_pct")?;
        check_pct(self.transaction_tax_pct, "transaction_tax_pct")?;
        check(
            (3..=25).contains(&self.depreciation_years),
            "depreciation_years",
            "must be between 3 and 25",
        )?;
        if self.ica_enabled {
            check_pct(self.ica_rate_pct, "ica_rate_pct")?;
        }
        if self.capex_benefit_enabled {
            check(
                self.capex_benefit_years > 0,
                "capex_benefit_years",
                "must be at least 1",
            )?;
            check_pct(self.capex_benefit_eligible_pct, "capex_benefit_eligible_pct")?;
        }

        if self.enable_debt {
            check_pct(self.debt_ratio_pct, "debt_ratio_pct")?;
            check(
                (1..=30).contains(&self.loan_tenor_years),
                "loan_tenor_years",
                "must be between 1 and 30",
            )?;
            check_pct(self.structuring_fee_pct, "structuring_fee_pct")?;
            let grace = self.grace_period_quarters.unwrap_or(self.construction_quarters);
            check(
                self.loan_tenor_years * 4 > grace,
                "grace_period_quarters",
                "must be shorter than the loan tenor",
            )?;
        }

        let exit_year = self.exit_year.unwrap_or(self.ppa_term_years);
        check(
            (1..=self.ppa_term_years).contains(&exit_year),
            "exit_year",
            "must fall within the PPA term",
        )?;
        if self.exit_method == ExitMethod::EbitdaMultiple {
            check(self.exit_multiple >= 0.0, "exit_multiple", "cannot be negative")?;
        }
        check(
            (1..=4).contains(&self.start_quarter),
            "start_quarter",
            "must be between 1 and 4",
        )?;

        Ok(())
    }

    /// Validate and convert into the engine's decimal-rate parameter set
    pub fn to_parameters(&self) -> ModelResult<ProjectParameters> {
        self.validate()?;

        let utility_inflation = pct(self.utility_inflation_pct);
        let escalator = if self.index_escalator_to_inflation {
            utility_inflation
        } else {
            pct(self.ppa_escalator_pct)
        };

        let debt = if self.enable_debt {
            Some(DebtTerms {
                ratio: pct(self.debt_ratio_pct),
                annual_rate: pct(self.interest_rate_pct),
                tenor_years: self.loan_tenor_years,
                structuring_fee_pct: pct(self.structuring_fee_pct),
                grace_quarters: self
                    .grace_period_quarters
                    .unwrap_or(self.construction_quarters),
            })
        } else {
            None
        };

        let strategy = match self.exit_method {
            ExitMethod::FixedAssetValue => ExitStrategy::FixedValue(self.exit_value),
            ExitMethod::EbitdaMultiple => ExitStrategy::EbitdaMultiple(self.exit_multiple),
        };

        Ok(ProjectParameters {
            fx: FxAssumptions {
                rate: self.fx_rate,
                local_inflation: pct(self.local_inflation_pct.unwrap_or(self.utility_inflation_pct)),
                foreign_inflation: pct(self.us_inflation_pct),
            },
            ppa: PpaTerms {
                term_years: self.ppa_term_years,
                tariff: self.tariff,
                utility_inflation,
                client_discount: pct(self.client_discount_pct),
                escalator,
                escalator_indexed: self.index_escalator_to_inflation,
            },
            technical: TechnicalSpec {
                annual_generation_mwh: self.resolved_generation_mwh(),
                degradation: pct(self.degradation_pct),
                client_consumption_mwh: self.client_consumption_mwh,
            },
            costs: CostAssumptions {
                construction_quarters: self.construction_quarters,
                capex: self.capex,
                opex_annual: self.opex_annual,
                opex_inflation: pct(self.opex_inflation_pct),
                sga_pct: pct(self.sga_pct),
                sga_construction_pct: pct(self.sga_construction_pct),
            },
            fiscal: FiscalRegime {
                tax_rate: pct(self.tax_rate_pct),
                capital_gains_rate: pct(self.capital_gains_pct),
                depreciation_years: self.depreciation_years,
                transaction_tax_rate: pct(self.transaction_tax_pct),
                ica_rate: self.ica_enabled.then(|| pct(self.ica_rate_pct)),
                capex_benefit: self.capex_benefit_enabled.then(|| CapexBenefit {
                    window_years: self.capex_benefit_years.min(MAX_BENEFIT_WINDOW_YEARS),
                    eligible_fraction: pct(self.capex_benefit_eligible_pct),
                }),
            },
            debt,
            exit: ExitTerms {
                strategy,
                exit_year: self.exit_year.unwrap_or(self.ppa_term_years),
            },
            investor_discount_rate: pct(self.investor_discount_pct),
            start: CalendarStart {
                year: self.start_year,
                quarter: self.start_quarter,
            },
        })
    }
}
