//! Scenario runner for batch projections and the exit sensitivity sweep
//!
//! Every scenario and every grid cell is an independent full projection over read-only
//! parameters, so batches run in parallel with rayon.

use crate::params::{ExitStrategy, ExitTerms, ProjectParameters};
use crate::projection::{CurrencyBasis, ProjectionEngine, ProjectionResult, ReturnsSummary};
use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Exit years crossed with fixed exit values (local-currency millions)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityGrid {
    pub exit_years: Vec<u32>,
    pub exit_values: Vec<f64>,
}

impl SensitivityGrid {
    /// Row-major cells: every value for the first year, then the next year
    pub fn cells(&self) -> Vec<(u32, f64)> {
        self.exit_years
            .iter()
            .flat_map(|&year| self.exit_values.iter().map(move |&value| (year, value)))
            .collect()
    }
}

/// IRRs for one (exit year, exit value) pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityCell {
    pub exit_year: u32,
    pub exit_value: f64,
    pub unlevered_irr: Option<f64>,
    pub levered_irr: Option<f64>,
}

/// Runs projections for a base parameter set and its variations
///
/// # Example
/// ```ignore
/// let runner = ScenarioRunner::new(ProjectInputs::default().to_parameters()?);
/// let grid = SensitivityGrid { exit_years: vec![5, 10], exit_values: vec![0.0, 10.0, 20.0] };
/// for cell in runner.sensitivity(&grid, CurrencyBasis::LocalMillions) {
///     println!("{} {} {:?}", cell.exit_year, cell.exit_value, cell.levered_irr);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    base: ProjectParameters,
}

impl ScenarioRunner {
    pub fn new(base: ProjectParameters) -> Self {
        Self { base }
    }

    /// Run the base case
    pub fn run(&self) -> ProjectionResult {
        ProjectionEngine::new(self.base.clone()).run()
    }

    /// Base case returns in one display basis
    pub fn returns(&self, basis: CurrencyBasis) -> ReturnsSummary {
        ReturnsSummary::compute(&self.run(), basis, self.base.investor_discount_rate)
    }

    /// Run alternative parameter sets
    pub fn run_scenarios(&self, scenarios: &[ProjectParameters]) -> Vec<ProjectionResult> {
        scenarios
            .par_iter()
            .map(|params| ProjectionEngine::new(params.clone()).run())
            .collect()
    }

    /// IRR for one exit year and fixed exit value, as a standalone run
    pub fn sensitivity_cell(&self, exit_year: u32, exit_value: f64, basis: CurrencyBasis) -> SensitivityCell {
        let params = self.base.with_exit(ExitTerms {
            strategy: ExitStrategy::FixedValue(exit_value),
            exit_year,
        });
        let discount = params.investor_discount_rate;
        let result = ProjectionEngine::new(params).run();
        let returns = ReturnsSummary::compute(&result, basis, discount);

        SensitivityCell {
            exit_year,
            exit_value,
            unlevered_irr: returns.unlevered_irr,
            levered_irr: returns.levered_irr,
        }
    }

    /// Sweep exit year x exit value; cells whose year falls outside the PPA term are skipped
    pub fn sensitivity(&self, grid: &SensitivityGrid, basis: CurrencyBasis) -> Vec<SensitivityCell> {
        let term = self.base.ppa.term_years;
        let cells: Vec<(u32, f64)> = grid
            .cells()
            .into_iter()
            .filter(|&(year, _)| (1..=term).contains(&year))
            .collect();
        info!("Running sensitivity grid with {} cells", cells.len());

        cells
            .par_iter()
            .map(|&(year, value)| self.sensitivity_cell(year, value, basis))
            .collect()
    }

    /// Get reference to base parameters for inspection
    pub fn params(&self) -> &ProjectParameters {
        &self.base
    }
}
