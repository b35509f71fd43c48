//! Amortizing senior debt: grace period, constant-payment amortization, repayment

use crate::params::DebtTerms;
use serde::{Deserialize, Serialize};

/// Balances below this are treated as repaid
const BALANCE_EPSILON: f64 = 1e-9;

/// Service state of the loan in a given quarter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DebtPhase {
    NoDebt,
    /// Interest-only service
    Grace,
    Amortizing,
    Repaid,
}

/// Constant quarterly payment that retires `principal` over `periods` at `rate`
pub fn annuity_payment(rate: f64, periods: u32, principal: f64) -> f64 {
    if periods == 0 {
        return 0.0;
    }
    if rate == 0.0 {
        return principal / periods as f64;
    }
    principal * rate / (1.0 - (1.0 + rate).powi(-(periods as i32)))
}

/// Loan sized at financial close
#[derive(Debug, Clone, PartialEq)]
pub struct DebtFacility {
    pub principal: f64,
    pub quarterly_rate: f64,
    pub grace_quarters: u32,
    /// Tenor minus grace, in quarters
    pub amortization_quarters: u32,
    /// Fixed quarterly debt service once amortization starts
    pub payment: f64,
}

/// One quarter of debt service
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebtService {
    pub phase: DebtPhase,
    pub opening_balance: f64,
    pub interest: f64,
    pub principal: f64,
    pub closing_balance: f64,
}

impl DebtService {
    pub fn none() -> Self {
        Self {
            phase: DebtPhase::NoDebt,
            opening_balance: 0.0,
            interest: 0.0,
            principal: 0.0,
            closing_balance: 0.0,
        }
    }

    pub fn total(&self) -> f64 {
        self.interest + self.principal
    }
}

impl DebtFacility {
    pub fn new(terms: &DebtTerms, capex: f64) -> Self {
        let principal = terms.principal(capex);
        let quarterly_rate = terms.annual_rate / 4.0;
        let amortization_quarters = (terms.tenor_years * 4).saturating_sub(terms.grace_quarters);

        Self {
            principal,
            quarterly_rate,
            grace_quarters: terms.grace_quarters,
            amortization_quarters,
            payment: annuity_payment(quarterly_rate, amortization_quarters, principal),
        }
    }

    /// Service the loan in `quarter` (1-based) given the opening balance
    pub fn service(&self, quarter: u32, opening_balance: f64) -> DebtService {
        if opening_balance <= 0.0 {
            return DebtService {
                phase: DebtPhase::Repaid,
                opening_balance: 0.0,
                interest: 0.0,
                principal: 0.0,
                closing_balance: 0.0,
            };
        }

        let interest = opening_balance * self.quarterly_rate;

        let (phase, mut principal) = if quarter > self.grace_quarters {
            let scheduled = (self.payment - interest).clamp(0.0, opening_balance);
            (DebtPhase::Amortizing, scheduled)
        } else {
            (DebtPhase::Grace, 0.0)
        };

        // Sweep floating-point residue on the final payment
        if opening_balance - principal < BALANCE_EPSILON && principal > 0.0 {
            principal = opening_balance;
        }

        DebtService {
            phase,
            opening_balance,
            interest,
            principal,
            closing_balance: opening_balance - principal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn terms(grace_quarters: u32) -> DebtTerms {
        DebtTerms {
            ratio: 0.7,
            annual_rate: 0.121,
            tenor_years: 9,
            structuring_fee_pct: 0.02,
            grace_quarters,
        }
    }

    #[test]
    fn test_annuity_payment_matches_closed_form() {
        // 100 over 4 periods at 10%: 31.5470804...
        assert_relative_eq!(annuity_payment(0.10, 4, 100.0), 31.547080370609, epsilon = 1e-9);
        assert_relative_eq!(annuity_payment(0.0, 4, 100.0), 25.0);
        assert_eq!(annuity_payment(0.05, 0, 100.0), 0.0);
    }

    #[test]
    fn test_facility_sizing() {
        let facility = DebtFacility::new(&terms(2), 120.0);
        assert_relative_eq!(facility.principal, 84.0, epsilon = 1e-12);
        assert_relative_eq!(facility.quarterly_rate, 0.03025);
        assert_eq!(facility.amortization_quarters, 34);
    }

    #[test]
    fn test_grace_is_interest_only() {
        let facility = DebtFacility::new(&terms(2), 120.0);
        let q1 = facility.service(1, facility.principal);
        assert_eq!(q1.phase, DebtPhase::Grace);
        assert_eq!(q1.principal, 0.0);
        assert_relative_eq!(q1.interest, 84.0 * 0.03025, epsilon = 1e-12);
        assert_eq!(q1.closing_balance, q1.opening_balance);

        let q3 = facility.service(3, facility.principal);
        assert_eq!(q3.phase, DebtPhase::Amortizing);
        assert_relative_eq!(q3.total(), facility.payment, epsilon = 1e-12);
    }

    #[test]
    fn test_full_schedule_retires_loan() {
        let facility = DebtFacility::new(&terms(2), 120.0);
        let mut balance = facility.principal;
        let mut previous = balance;

        for quarter in 1..=36 {
            let service = facility.service(quarter, balance);
            assert!(service.principal >= 0.0);
            assert!(service.closing_balance >= 0.0);
            assert!(service.closing_balance <= previous);
            previous = service.closing_balance;
            balance = service.closing_balance;
        }
        assert_eq!(balance, 0.0);

        let after = facility.service(37, balance);
        assert_eq!(after.phase, DebtPhase::Repaid);
        assert_eq!(after.interest, 0.0);
        assert_eq!(after.principal, 0.0);
    }

    #[test]
    fn test_principal_clamped_to_balance() {
        let facility = DebtFacility::new(&terms(0), 120.0);
        let service = facility.service(10, 1.0);
        assert_eq!(service.principal, 1.0);
        assert_eq!(service.closing_balance, 0.0);
    }
}
