//! Disposal valuation, capital-gains tax and exit injection

use crate::params::{ExitStrategy, ExitTerms};
use super::cashflows::QuarterRecord;
use serde::{Deserialize, Serialize};

/// Terminal disposal of the asset (local-currency millions)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ExitEvent {
    pub exit_quarter: u32,
    pub valuation: f64,
    /// Trailing four-quarter EBITDA at exit (reported for both strategies)
    pub trailing_ebitda: f64,
    pub book_value: f64,
    pub debt_balance: f64,
    pub gain: f64,
    pub capital_gains_tax: f64,
    pub unlevered_inflow: f64,
    pub levered_inflow: f64,
    /// FX rate of the exit quarter, used to convert the proceeds
    pub fx_rate: f64,
}

/// Value the asset at the last row of an already truncated series
///
/// Returns None for an empty series.
pub fn evaluate(rows: &[QuarterRecord], terms: &ExitTerms, capital_gains_rate: f64) -> Option<ExitEvent> {
    let last = rows.last()?;

    let trailing_ebitda: f64 = rows.iter().rev().take(4).map(|r| r.ebitda).sum();
    let valuation = match terms.strategy {
        ExitStrategy::FixedValue(value) => value,
        ExitStrategy::EbitdaMultiple(multiple) => trailing_ebitda * multiple,
    };

    let gain = valuation - last.book_value;
    let capital_gains_tax = if gain > 0.0 { gain * capital_gains_rate } else { 0.0 };

    Some(ExitEvent {
        exit_quarter: last.quarter,
        valuation,
        trailing_ebitda,
        book_value: last.book_value,
        debt_balance: last.debt_closing,
        gain,
        capital_gains_tax,
        unlevered_inflow: valuation - capital_gains_tax,
        levered_inflow: valuation - last.debt_closing - capital_gains_tax,
        fx_rate: last.fx_rate,
    })
}

/// Add exit proceeds to the final row's free cash flows
pub fn inject(rows: &mut [QuarterRecord], exit: &ExitEvent) {
    if let Some(last) = rows.last_mut() {
        last.exit_unlevered = exit.unlevered_inflow;
        last.exit_levered = exit.levered_inflow;
        last.ufcf += exit.unlevered_inflow;
        last.lfcf += exit.levered_inflow;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ProjectInputs;
    use crate::projection::ProjectionEngine;
    use approx::assert_relative_eq;

    fn rows() -> Vec<QuarterRecord> {
        let params = ProjectInputs::default().to_parameters().unwrap();
        ProjectionEngine::new(params).project_full().quarters
    }

    #[test]
    fn test_fixed_value_gain_taxed() {
        let rows = rows();
        let truncated = &rows[..22];
        let last = truncated.last().unwrap();
        let exit = evaluate(
            truncated,
            &ExitTerms {
                strategy: ExitStrategy::FixedValue(50.0),
                exit_year: 5,
            },
            0.10,
        )
        .unwrap();

        assert_eq!(exit.exit_quarter, 22);
        assert_relative_eq!(exit.gain, 50.0 - last.book_value);
        assert_relative_eq!(exit.capital_gains_tax, exit.gain * 0.10);
        assert_relative_eq!(exit.unlevered_inflow, 50.0 - exit.capital_gains_tax);
        assert_relative_eq!(
            exit.levered_inflow,
            50.0 - last.debt_closing - exit.capital_gains_tax
        );
        assert_eq!(exit.fx_rate, last.fx_rate);
    }

    #[test]
    fn test_loss_on_sale_untaxed() {
        let rows = rows();
        let exit = evaluate(
            &rows[..6],
            &ExitTerms {
                strategy: ExitStrategy::FixedValue(1.0),
                exit_year: 1,
            },
            0.10,
        )
        .unwrap();
        assert!(exit.gain < 0.0);
        assert_eq!(exit.capital_gains_tax, 0.0);
    }

    #[test]
    fn test_multiple_uses_trailing_four_quarters() {
        let rows = rows();
        let truncated = &rows[..14];
        let expected: f64 = truncated[10..14].iter().map(|r| r.ebitda).sum();
        let exit = evaluate(
            truncated,
            &ExitTerms {
                strategy: ExitStrategy::EbitdaMultiple(7.0),
                exit_year: 3,
            },
            0.10,
        )
        .unwrap();
        assert_relative_eq!(exit.trailing_ebitda, expected, epsilon = 1e-12);
        assert_relative_eq!(exit.valuation, expected * 7.0, epsilon = 1e-11);
    }

    #[test]
    fn test_inject_only_touches_last_row() {
        let mut rows = rows()[..10].to_vec();
        let before = rows.clone();
        let exit = evaluate(
            &rows,
            &ExitTerms {
                strategy: ExitStrategy::FixedValue(30.0),
                exit_year: 2,
            },
            0.10,
        )
        .unwrap();
        inject(&mut rows, &exit);

        assert_eq!(&rows[..9], &before[..9]);
        assert_relative_eq!(rows[9].ufcf, before[9].ufcf + exit.unlevered_inflow);
        assert_relative_eq!(rows[9].lfcf, before[9].lfcf + exit.levered_inflow);
    }

    #[test]
    fn test_empty_series_has_no_exit() {
        let terms = ExitTerms {
            strategy: ExitStrategy::FixedValue(1.0),
            exit_year: 1,
        };
        assert!(evaluate(&[], &terms, 0.1).is_none());
    }
}
