//! Running state of a project during projection

use crate::params::ProjectParameters;
use super::debt::DebtFacility;
use super::tax::TaxState;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Project phase of a quarter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Construction,
    Operation,
}

/// State of the project at a point in time during projection
#[derive(Debug, Clone)]
pub struct ProjectionState {
    /// Current projection quarter (1-indexed)
    pub quarter: u32,

    /// Project year counted from quarter 1 (1-indexed)
    pub global_year: u32,

    /// Calendar year and quarter (1-4)
    pub calendar_year: i32,
    pub calendar_quarter: u32,

    pub phase: Phase,

    /// Quarter within operations (1-indexed, 0 during construction)
    pub operating_quarter: u32,

    /// Operating year (1-indexed, 0 during construction)
    pub operating_year: u32,

    /// Outstanding debt at the start of the quarter
    pub debt_balance: f64,

    /// Depreciation booked to date
    pub accumulated_depreciation: f64,

    /// Cumulative tax accumulators and CAPEX benefit pool
    pub tax: TaxState,
}

impl ProjectionState {
    /// Initialize state before quarter 1, with the loan fully drawn
    pub fn new(params: &ProjectParameters, facility: Option<&DebtFacility>) -> Self {
        let benefit_pool = params
            .fiscal
            .capex_benefit
            .as_ref()
            .map_or(0.0, |b| b.pool(params.costs.capex));

        Self {
            quarter: 0,
            global_year: 0,
            calendar_year: params.start.year,
            calendar_quarter: params.start.quarter,
            phase: Phase::Construction,
            operating_quarter: 0,
            operating_year: 0,
            debt_balance: facility.map_or(0.0, |f| f.principal),
            accumulated_depreciation: 0.0,
            tax: TaxState::new(benefit_pool),
        }
    }

    /// Advance to next quarter
    pub fn advance_quarter(&mut self, params: &ProjectParameters) {
        self.quarter += 1;
        self.global_year = (self.quarter - 1) / 4 + 1;

        let (year, quarter) = calendar_of(params, self.quarter);
        self.calendar_year = year;
        self.calendar_quarter = quarter;

        if self.quarter <= params.costs.construction_quarters {
            self.phase = Phase::Construction;
            self.operating_quarter = 0;
            self.operating_year = 0;
        } else {
            self.phase = Phase::Operation;
            self.operating_quarter = self.quarter - params.costs.construction_quarters;
            self.operating_year = (self.operating_quarter - 1) / 4 + 1;
        }
    }

    pub fn is_operating(&self) -> bool {
        self.phase == Phase::Operation
    }

    /// Remaining undepreciated CAPEX
    pub fn book_value(&self, capex: f64) -> f64 {
        (capex - self.accumulated_depreciation).max(0.0)
    }

    /// Last calendar day of the current quarter
    pub fn period_end(&self) -> Option<NaiveDate> {
        if self.calendar_quarter == 4 {
            NaiveDate::from_ymd_opt(self.calendar_year, 12, 31)
        } else {
            NaiveDate::from_ymd_opt(self.calendar_year, self.calendar_quarter * 3 + 1, 1)
                .and_then(|d| d.pred_opt())
        }
    }
}

/// Calendar (year, quarter) of a 1-based projection quarter
pub fn calendar_of(params: &ProjectParameters, quarter: u32) -> (i32, u32) {
    let offset = params.start.quarter - 1 + quarter - 1;
    (params.start.year + (offset / 4) as i32, offset % 4 + 1)
}
