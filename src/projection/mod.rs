//! Quarterly projection engine: operations, debt, tax, cash flows, exit and returns

mod state;
mod engine;
mod cashflows;
pub mod fx;
pub mod operations;
pub mod debt;
pub mod tax;
pub mod exit;
pub mod irr;
mod returns;

pub use state::{ProjectionState, Phase, calendar_of};
pub use engine::ProjectionEngine;
pub use cashflows::{
    aggregate_annual, AnnualRecord, CurrencyBasis, Projection, ProjectionResult,
    ProjectionSummary, QuarterRecord,
};
pub use debt::{DebtFacility, DebtPhase, DebtService};
pub use exit::ExitEvent;
pub use irr::{calculate_irr, npv_at_rate};
pub use returns::ReturnsSummary;
