//! BTM Solar Finance - Quarterly project-finance engine for behind-the-meter solar PPAs
//!
//! This library provides:
//! - Validated project parameters from analyst inputs (JSON-persistable)
//! - Quarterly projection of generation, revenue, costs, debt, tax and free cash flow
//! - Exit valuation with capital-gains tax and local/foreign currency display
//! - IRR, NPV and MOIC, plus a parallel exit-year x exit-value sensitivity sweep

pub mod error;
pub mod params;
pub mod projection;
pub mod report;
pub mod scenario;

// Re-export commonly used types
pub use error::{ModelError, ModelResult};
pub use params::{ProjectInputs, ProjectParameters};
pub use projection::{CurrencyBasis, ProjectionEngine, ProjectionResult, QuarterRecord, ReturnsSummary};
pub use scenario::{ScenarioRunner, SensitivityCell, SensitivityGrid};
