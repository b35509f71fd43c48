//! Core projection engine for quarterly project-finance projections

use crate::params::{ExitTerms, ProjectParameters};
use super::cashflows::{Projection, ProjectionResult, QuarterRecord};
use super::debt::{DebtFacility, DebtService};
use super::exit;
use super::fx;
use super::operations::QuarterOperations;
use super::state::ProjectionState;
use super::tax::{BenefitWindow, TaxableIncome};
use log::debug;

/// Residual book value treated as fully written off
const BOOK_VALUE_EPSILON: f64 = 1e-9;

/// Main projection engine
pub struct ProjectionEngine {
    params: ProjectParameters,
    facility: Option<DebtFacility>,
    benefit_window: Option<BenefitWindow>,
}

impl ProjectionEngine {
    /// Create a new projection engine for a validated parameter set
    pub fn new(params: ProjectParameters) -> Self {
        let facility = params
            .debt
            .as_ref()
            .map(|terms| DebtFacility::new(terms, params.costs.capex));

        let operations_start = super::state::calendar_of(&params, params.costs.construction_quarters + 1).0;
        let benefit_window = params
            .fiscal
            .capex_benefit
            .as_ref()
            .map(|b| BenefitWindow::after_operations_start(operations_start, b.window_years));

        Self {
            params,
            facility,
            benefit_window,
        }
    }

    pub fn params(&self) -> &ProjectParameters {
        &self.params
    }

    pub fn facility(&self) -> Option<&DebtFacility> {
        self.facility.as_ref()
    }

    /// Project construction and the whole PPA term, without an exit
    pub fn project_full(&self) -> Projection {
        let total = self.params.total_quarters();
        debug!(
            "Projecting {} quarters ({} construction), debt principal {:.4}, quarterly payment {:.4}",
            total,
            self.params.costs.construction_quarters,
            self.facility.as_ref().map_or(0.0, |f| f.principal),
            self.facility.as_ref().map_or(0.0, |f| f.payment),
        );

        let mut state = ProjectionState::new(&self.params, self.facility.as_ref());
        let mut quarters = Vec::with_capacity(total as usize);

        for _quarter in 1..=total {
            state.advance_quarter(&self.params);
            quarters.push(self.calculate_quarter(&mut state));
        }

        Projection { quarters }
    }

    /// Project and exit on the configured terms
    pub fn run(&self) -> ProjectionResult {
        self.run_with_exit(&self.params.exit)
    }

    /// Project, truncate at the exit quarter and inject the exit proceeds
    pub fn run_with_exit(&self, terms: &ExitTerms) -> ProjectionResult {
        let full = self.project_full();
        let exit_quarter = self.params.costs.construction_quarters + terms.exit_year * 4;

        let mut quarters = full.quarters;
        quarters.truncate(exit_quarter as usize);

        let event = exit::evaluate(&quarters, terms, self.params.fiscal.capital_gains_rate)
            .unwrap_or_default();
        exit::inject(&mut quarters, &event);

        ProjectionResult {
            quarters,
            exit: event,
            equity_investment: self.params.levered_investment(),
            unlevered_investment: self.params.unlevered_investment(),
            origination_fx_rate: self.params.fx.rate,
            client_consumption_mwh: self.params.technical.client_consumption_mwh,
        }
    }

    /// CAPEX outflows (unlevered, levered) for the current quarter
    ///
    /// Spread evenly over construction; with no construction period the whole
    /// investment lands in quarter 1.
    fn capex_outflows(&self, state: &ProjectionState) -> (f64, f64) {
        let construction = self.params.costs.construction_quarters;
        let unlevered = self.params.unlevered_investment();
        let levered = self.params.levered_investment();

        if construction == 0 {
            if state.quarter == 1 {
                (unlevered, levered)
            } else {
                (0.0, 0.0)
            }
        } else if state.quarter <= construction {
            (unlevered / construction as f64, levered / construction as f64)
        } else {
            (0.0, 0.0)
        }
    }

    /// Straight-line depreciation, capped at the remaining book value
    fn depreciation(&self, state: &ProjectionState) -> f64 {
        let capex = self.params.costs.capex;
        let years = self.params.fiscal.depreciation_years;
        if !state.is_operating() || state.operating_year > years {
            return 0.0;
        }

        let remaining = state.book_value(capex);
        let scheduled = (capex / years as f64 / 4.0).min(remaining);
        if remaining - scheduled < BOOK_VALUE_EPSILON {
            remaining
        } else {
            scheduled
        }
    }

    /// Calculate cashflows for a single quarter
    fn calculate_quarter(&self, state: &mut ProjectionState) -> QuarterRecord {
        let params = &self.params;
        let fx_rate = fx::quarter_rate(&params.fx, state.quarter);

        let ops = if state.is_operating() {
            QuarterOperations::operating(params, state.operating_quarter)
        } else {
            QuarterOperations::idle()
        };

        let (capex_unlevered, capex_levered) = self.capex_outflows(state);

        let depreciation = self.depreciation(state);
        state.accumulated_depreciation += depreciation;
        let book_value = state.book_value(params.costs.capex);

        let debt = match &self.facility {
            Some(facility) => facility.service(state.quarter, state.debt_balance),
            None => DebtService::none(),
        };
        state.debt_balance = debt.closing_balance;

        let benefit_eligible = state.is_operating()
            && self
                .benefit_window
                .is_some_and(|w| w.contains(state.calendar_year));
        let tax = state.tax.assess(
            TaxableIncome {
                ebitda: ops.ebitda,
                depreciation,
                interest: debt.interest,
                benefit_eligible,
            },
            params.fiscal.tax_rate,
        );

        // Financial transaction tax on every cash disbursement; a negative SGA
        // on an operating loss pays nothing out
        let operating_outlays = ops.opex.max(0.0) + ops.sga.max(0.0) + ops.ica.max(0.0);
        let ftt_rate = params.fiscal.transaction_tax_rate;
        let transaction_tax_unlevered = ftt_rate * (capex_unlevered + operating_outlays + tax.tax_unlevered);
        let transaction_tax_levered =
            ftt_rate * (capex_levered + operating_outlays + debt.interest + debt.principal + tax.tax_levered);

        let ufcf = ops.ebitda - tax.tax_unlevered - capex_unlevered - transaction_tax_unlevered;
        let lfcf = ops.ebitda
            - tax.tax_levered
            - debt.interest
            - debt.principal
            - capex_levered
            - transaction_tax_levered;

        QuarterRecord {
            quarter: state.quarter,
            phase: state.phase,
            calendar_year: state.calendar_year,
            calendar_quarter: state.calendar_quarter,
            global_year: state.global_year,
            operating_year: state.operating_year,
            period_end: state.period_end(),
            fx_rate,
            generation_mwh: ops.generation_mwh,
            price: ops.price,
            utility_price: ops.utility_price,
            revenue: ops.revenue,
            client_savings: ops.client_savings,
            opex: ops.opex,
            gross_profit: ops.gross_profit,
            sga: ops.sga,
            ica: ops.ica,
            ebitda: ops.ebitda,
            depreciation,
            book_value,
            capex_unlevered,
            capex_levered,
            debt_phase: debt.phase,
            debt_opening: debt.opening_balance,
            interest: debt.interest,
            principal: debt.principal,
            debt_closing: debt.closing_balance,
            tax_base_unlevered_pre_benefit: tax.base_unlevered_pre_benefit,
            tax_base_levered_pre_benefit: tax.base_levered_pre_benefit,
            capex_benefit: tax.capex_benefit,
            capex_benefit_remaining: tax.benefit_remaining,
            tax_base_unlevered: tax.base_unlevered,
            tax_base_levered: tax.base_levered,
            cumulative_base_unlevered: tax.cumulative_base_unlevered,
            cumulative_base_levered: tax.cumulative_base_levered,
            tax_unlevered: tax.tax_unlevered,
            tax_levered: tax.tax_levered,
            cumulative_tax_unlevered: tax.cumulative_tax_unlevered,
            cumulative_tax_levered: tax.cumulative_tax_levered,
            transaction_tax_unlevered,
            transaction_tax_levered,
            exit_unlevered: 0.0,
            exit_levered: 0.0,
            ufcf,
            lfcf,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{ExitStrategy, ProjectInputs};
    use crate::projection::state::Phase;
    use approx::assert_relative_eq;

    fn engine(inputs: ProjectInputs) -> ProjectionEngine {
        ProjectionEngine::new(inputs.to_parameters().unwrap())
    }

    #[test]
    fn test_series_length_and_phases() {
        let projection = engine(ProjectInputs::default()).project_full();
        assert_eq!(projection.quarters.len(), 42);
        assert_eq!(projection.quarters[0].phase, Phase::Construction);
        assert_eq!(projection.quarters[1].phase, Phase::Construction);
        assert_eq!(projection.quarters[2].phase, Phase::Operation);
        assert_eq!(projection.quarters[0].revenue, 0.0);
        assert_eq!(projection.quarters[0].generation_mwh, 0.0);
        assert!(projection.quarters[2].revenue > 0.0);
    }

    #[test]
    fn test_capex_spread_over_construction() {
        let projection = engine(ProjectInputs::default()).project_full();
        let q = &projection.quarters;
        assert_relative_eq!(q[0].capex_unlevered, 60.0);
        assert_relative_eq!(q[1].capex_unlevered, 60.0);
        assert_relative_eq!(q[0].capex_levered, 37.68 / 2.0, epsilon = 1e-9);
        assert_eq!(q[2].capex_unlevered, 0.0);
    }

    #[test]
    fn test_zero_construction_disburses_in_first_quarter() {
        let projection = engine(ProjectInputs {
            construction_quarters: 0,
            ..Default::default()
        })
        .project_full();
        let q = &projection.quarters;

        assert_eq!(q.len(), 40);
        assert!(q.iter().all(|r| r.phase == Phase::Operation));
        assert_relative_eq!(q[0].capex_unlevered, 120.0);
        assert!(q[0].revenue > 0.0);
        let total: f64 = q.iter().map(|r| r.capex_unlevered).sum();
        assert_relative_eq!(total, 120.0);
    }

    #[test]
    fn test_depreciation_writes_off_exactly() {
        let projection = engine(ProjectInputs::default()).project_full();
        let q = &projection.quarters;

        // 5-year term: operating quarters 1..=20 are quarters 3..=22
        assert_relative_eq!(q[2].depreciation, 6.0, epsilon = 1e-12);
        assert_eq!(q[21].book_value, 0.0);
        assert!(q[20].book_value > 0.0);
        assert_eq!(q[22].depreciation, 0.0);
        let total: f64 = q.iter().map(|r| r.depreciation).sum();
        assert_relative_eq!(total, 120.0, epsilon = 1e-9);
    }

    #[test]
    fn test_grace_then_amortization() {
        let projection = engine(ProjectInputs::default()).project_full();
        let q = &projection.quarters;
        assert_eq!(q[0].principal, 0.0);
        assert!(q[0].interest > 0.0);
        assert!(q[2].principal > 0.0);
        // 9-year tenor retires the loan by quarter 36
        assert_eq!(q[35].debt_closing, 0.0);
        assert_eq!(q[36].interest, 0.0);
    }

    #[test]
    fn test_no_debt_matches_unlevered() {
        let projection = engine(ProjectInputs {
            enable_debt: false,
            ..Default::default()
        })
        .project_full();
        for r in &projection.quarters {
            assert_eq!(r.lfcf, r.ufcf);
            assert_eq!(r.debt_closing, 0.0);
            assert_eq!(r.interest, 0.0);
        }
    }

    #[test]
    fn test_transaction_tax_on_disbursements() {
        let projection = engine(ProjectInputs::default()).project_full();
        let r = &projection.quarters[0];
        assert_relative_eq!(r.transaction_tax_unlevered, 0.004 * 60.0, epsilon = 1e-12);
        assert_relative_eq!(
            r.transaction_tax_levered,
            0.004 * (r.capex_levered + r.interest),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_transaction_tax_in_operating_quarter() {
        let projection = engine(ProjectInputs {
            ica_enabled: true,
            ..Default::default()
        })
        .project_full();
        // Past the depreciation term, loan still amortizing
        let r = &projection.quarters[33];
        assert!(r.sga > 0.0 && r.ica > 0.0 && r.principal > 0.0);
        assert!(r.tax_unlevered > 0.0);

        let unlevered_base = r.opex + r.sga + r.ica + r.tax_unlevered;
        let levered_base = r.opex + r.sga + r.ica + r.interest + r.principal + r.tax_levered;
        assert_relative_eq!(r.transaction_tax_unlevered, 0.004 * unlevered_base, epsilon = 1e-12);
        assert_relative_eq!(r.transaction_tax_levered, 0.004 * levered_base, epsilon = 1e-12);
    }

    #[test]
    fn test_operating_loss_sga_not_netted_from_transaction_tax() {
        // Revenue below OPEX turns SGA negative
        let projection = engine(ProjectInputs {
            tariff: 50.0,
            enable_debt: false,
            ..Default::default()
        })
        .project_full();
        let r = &projection.quarters[2];
        assert!(r.sga < 0.0);
        assert_eq!(r.tax_unlevered, 0.0);
        assert_relative_eq!(r.transaction_tax_unlevered, 0.004 * r.opex, epsilon = 1e-12);
        assert_eq!(r.transaction_tax_levered, r.transaction_tax_unlevered);
    }

    #[test]
    fn test_run_truncates_and_injects_exit() {
        let e = engine(ProjectInputs {
            exit_year: Some(5),
            exit_value: 40.0,
            ..Default::default()
        });
        let full = e.project_full();
        let result = e.run();

        assert_eq!(result.quarters.len(), 22);
        assert_eq!(result.exit.exit_quarter, 22);
        let last = result.quarters.last().unwrap();
        assert_relative_eq!(last.ufcf, full.quarters[21].ufcf + result.exit.unlevered_inflow);
        assert_relative_eq!(last.lfcf, full.quarters[21].lfcf + result.exit.levered_inflow);
        assert_eq!(result.quarters[..21], full.quarters[..21]);
    }

    #[test]
    fn test_run_with_exit_overrides_terms() {
        let e = engine(ProjectInputs::default());
        let result = e.run_with_exit(&ExitTerms {
            strategy: ExitStrategy::EbitdaMultiple(6.0),
            exit_year: 4,
        });
        assert_eq!(result.quarters.len(), 18);
        assert_relative_eq!(result.exit.valuation, result.exit.trailing_ebitda * 6.0);
    }

    #[test]
    fn test_capex_benefit_window_and_pool() {
        let e = engine(ProjectInputs {
            capex_benefit_enabled: true,
            capex_benefit_years: 3,
            capex_benefit_eligible_pct: 100.0,
            ..Default::default()
        });
        let q = e.project_full().quarters;

        // Operations start in 2025 Q3, window covers 2026-2028
        for r in &q {
            if r.capex_benefit > 0.0 {
                assert!((2026..=2028).contains(&r.calendar_year));
            }
        }
        let used: f64 = q.iter().map(|r| r.capex_benefit).sum();
        assert!(used <= 60.0 + 1e-9);
        assert!(q.windows(2).all(|w| w[1].capex_benefit_remaining <= w[0].capex_benefit_remaining));
    }
}
