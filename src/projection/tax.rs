//! Cumulative-basis income tax with loss carryforward and the CAPEX tax benefit
//!
//! Tax owed to date is `tax_rate * max(cumulative_base, 0)`; each quarter pays the excess
//! of that over tax already paid, never less than zero. Losses therefore defer tax until
//! the cumulative base turns positive and tax once paid is never returned. Unlevered and
//! levered regimes keep independent accumulators.
//!
//! The CAPEX benefit pool is consumed only inside its calendar window, at most half of the
//! quarter's newly accrued positive (levered, pre-benefit) cumulative base, and is deducted
//! identically from both regimes.

/// Calendar years in which the CAPEX benefit may be consumed (inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenefitWindow {
    pub first_year: i32,
    pub last_year: i32,
}

impl BenefitWindow {
    /// Window opening the calendar year after operations begin
    pub fn after_operations_start(operations_start_year: i32, window_years: u32) -> Self {
        Self {
            first_year: operations_start_year + 1,
            last_year: operations_start_year + window_years as i32,
        }
    }

    pub fn contains(&self, calendar_year: i32) -> bool {
        (self.first_year..=self.last_year).contains(&calendar_year)
    }
}

/// Running accumulators for both tax regimes
#[derive(Debug, Clone, PartialEq)]
pub struct TaxState {
    pub cumulative_base_unlevered: f64,
    pub cumulative_base_levered: f64,
    /// Levered base before the benefit, which sizes benefit consumption
    pub cumulative_pre_benefit_base: f64,
    pub cumulative_tax_unlevered: f64,
    pub cumulative_tax_levered: f64,
    /// Unused CAPEX benefit pool
    pub benefit_remaining: f64,
}

/// Taxable items of one quarter
#[derive(Debug, Clone, Copy)]
pub struct TaxableIncome {
    pub ebitda: f64,
    pub depreciation: f64,
    pub interest: f64,
    /// Whether the quarter falls inside the benefit window
    pub benefit_eligible: bool,
}

/// Tax outcome of one quarter
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TaxAssessment {
    pub base_unlevered_pre_benefit: f64,
    pub base_levered_pre_benefit: f64,
    pub capex_benefit: f64,
    pub benefit_remaining: f64,
    pub base_unlevered: f64,
    pub base_levered: f64,
    pub cumulative_base_unlevered: f64,
    pub cumulative_base_levered: f64,
    pub tax_unlevered: f64,
    pub tax_levered: f64,
    pub cumulative_tax_unlevered: f64,
    pub cumulative_tax_levered: f64,
}

/// Tax due now so that total paid matches `tax_rate` on the positive cumulative base
fn tax_due(tax_rate: f64, cumulative_base: f64, cumulative_paid: f64) -> f64 {
    (tax_rate * cumulative_base.max(0.0) - cumulative_paid).max(0.0)
}

impl TaxState {
    pub fn new(benefit_pool: f64) -> Self {
        Self {
            cumulative_base_unlevered: 0.0,
            cumulative_base_levered: 0.0,
            cumulative_pre_benefit_base: 0.0,
            cumulative_tax_unlevered: 0.0,
            cumulative_tax_levered: 0.0,
            benefit_remaining: benefit_pool.max(0.0),
        }
    }

    /// Assess one quarter and roll the accumulators forward
    pub fn assess(&mut self, income: TaxableIncome, tax_rate: f64) -> TaxAssessment {
        let base_unlevered_pre_benefit = income.ebitda - income.depreciation;
        let base_levered_pre_benefit = income.ebitda - income.interest - income.depreciation;

        let prior_positive = self.cumulative_pre_benefit_base.max(0.0);
        self.cumulative_pre_benefit_base += base_levered_pre_benefit;
        let newly_accrued = (self.cumulative_pre_benefit_base.max(0.0) - prior_positive).max(0.0);

        let capex_benefit = if income.benefit_eligible && self.benefit_remaining > 0.0 {
            (0.5 * newly_accrued).min(self.benefit_remaining)
        } else {
            0.0
        };
        self.benefit_remaining = (self.benefit_remaining - capex_benefit).max(0.0);

        let base_unlevered = base_unlevered_pre_benefit - capex_benefit;
        let base_levered = base_levered_pre_benefit - capex_benefit;

        self.cumulative_base_unlevered += base_unlevered;
        self.cumulative_base_levered += base_levered;

        let tax_unlevered = tax_due(tax_rate, self.cumulative_base_unlevered, self.cumulative_tax_unlevered);
        let tax_levered = tax_due(tax_rate, self.cumulative_base_levered, self.cumulative_tax_levered);

        self.cumulative_tax_unlevered += tax_unlevered;
        self.cumulative_tax_levered += tax_levered;

        TaxAssessment {
            base_unlevered_pre_benefit,
            base_levered_pre_benefit,
            capex_benefit,
            benefit_remaining: self.benefit_remaining,
            base_unlevered,
            base_levered,
            cumulative_base_unlevered: self.cumulative_base_unlevered,
            cumulative_base_levered: self.cumulative_base_levered,
            tax_unlevered,
            tax_levered,
            cumulative_tax_unlevered: self.cumulative_tax_unlevered,
            cumulative_tax_levered: self.cumulative_tax_levered,
        }
    }
}
