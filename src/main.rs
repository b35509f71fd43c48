//! BTM Solar Finance CLI
//!
//! Command-line interface for running project projections and exit sensitivities

use anyhow::{Context, Result};
use btm_solar_finance::{
    report, CurrencyBasis, ProjectInputs, ProjectionResult, ReturnsSummary, ScenarioRunner,
    SensitivityGrid,
};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

/// Quarterly project-finance model for behind-the-meter solar PPAs
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Display currency for money outputs
#[derive(Clone, Copy, ValueEnum)]
enum Currency {
    /// Local currency, millions
    Local,
    /// Foreign currency, thousands
    Foreign,
}

impl From<Currency> for CurrencyBasis {
    fn from(currency: Currency) -> Self {
        match currency {
            Currency::Local => CurrencyBasis::LocalMillions,
            Currency::Foreign => CurrencyBasis::ForeignThousands,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the projection and write quarterly, annual and returns outputs
    Run {
        /// Project inputs JSON (reference deal when omitted)
        #[arg(short, long)]
        params: Option<PathBuf>,
        #[arg(short, long, value_enum, default_value = "local")]
        currency: Currency,
        /// Directory for output files
        #[arg(short, long, default_value = "projection_output")]
        output_dir: PathBuf,
    },
    /// Sweep exit year x fixed exit value and write the IRR grid
    Sensitivity {
        #[arg(short, long)]
        params: Option<PathBuf>,
        /// Exit years, comma separated
        #[arg(long, value_delimiter = ',', required = true)]
        years: Vec<u32>,
        /// Fixed exit values in local-currency millions, comma separated
        #[arg(long, value_delimiter = ',', required = true)]
        values: Vec<f64>,
        #[arg(short, long, value_enum, default_value = "local")]
        currency: Currency,
        #[arg(short, long, default_value = "sensitivity.csv")]
        output: PathBuf,
    },
    /// Write the reference deal inputs as JSON
    Defaults {
        #[arg(short, long, default_value = "project_inputs.json")]
        output: PathBuf,
    },
}

fn load_inputs(path: Option<&Path>) -> Result<ProjectInputs> {
    match path {
        Some(path) => ProjectInputs::load_json(path)
            .with_context(|| format!("Failed to load inputs from {}", path.display())),
        None => Ok(ProjectInputs::default()),
    }
}

fn fmt_pct(rate: Option<f64>) -> String {
    rate.map_or_else(|| "n/a".to_string(), |r| format!("{:.1}%", r * 100.0))
}

fn print_result(result: &ProjectionResult, returns: &ReturnsSummary, basis: CurrencyBasis) {
    let rows = result.quarters_in(basis);

    println!("Projection Results ({} quarters, {:?}):", rows.len(), basis);
    println!(
        "{:>4} {:>7} {:>12} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "Qtr", "Period", "Phase", "Gen MWh", "Revenue", "EBITDA", "Debt", "UFCF", "LFCF"
    );
    println!("{}", "-".repeat(92));
    for row in &rows {
        println!(
            "{:>4} {:>4}Q{} {:>12} {:>10.2} {:>10.3} {:>10.3} {:>10.3} {:>10.3} {:>10.3}",
            row.quarter,
            row.calendar_year,
            row.calendar_quarter,
            format!("{:?}", row.phase),
            row.generation_mwh,
            row.revenue,
            row.ebitda,
            row.debt_closing,
            row.ufcf,
            row.lfcf,
        );
    }

    println!("\nReturns:");
    println!("  Equity Investment: {:.2}", returns.equity_investment);
    println!("  Project IRR:       {}", fmt_pct(returns.unlevered_irr));
    println!("  Equity IRR:        {}", fmt_pct(returns.levered_irr));
    println!("  Leverage Boost:    {}", fmt_pct(returns.leverage_boost));
    println!("  Equity NPV:        {:.2}", returns.npv);
    println!("  MOIC:              {:.2}x", returns.moic);
    println!("  Year 1 Price:      {:.4} /kWh", returns.year_one_price);
    println!(
        "  Exit:              value {:.2}, gains tax {:.2}, quarter {}",
        result.exit.valuation, result.exit.capital_gains_tax, result.exit.exit_quarter
    );
}

fn run(params: Option<&Path>, basis: CurrencyBasis, output_dir: &Path) -> Result<()> {
    let parameters = load_inputs(params)?.to_parameters()?;
    let runner = ScenarioRunner::new(parameters);

    let result = runner.run();
    let returns = ReturnsSummary::compute(&result, basis, runner.params().investor_discount_rate);
    print_result(&result, &returns, basis);

    fs::create_dir_all(output_dir)
        .with_context(|| format!("Unable to create {}", output_dir.display()))?;
    let quarterly_path = output_dir.join("quarterly.csv");
    report::write_csv(&quarterly_path, &result.quarters_in(basis))
        .with_context(|| format!("Unable to write {}", quarterly_path.display()))?;
    let annual_path = output_dir.join("annual.csv");
    report::write_csv(&annual_path, &result.annual(basis))
        .with_context(|| format!("Unable to write {}", annual_path.display()))?;
    let returns_path = output_dir.join("returns.json");
    report::write_json(&returns_path, &returns)
        .with_context(|| format!("Unable to write {}", returns_path.display()))?;

    println!("\nFull results written to: {}", output_dir.display());
    Ok(())
}

fn sensitivity(
    params: Option<&Path>,
    grid: SensitivityGrid,
    basis: CurrencyBasis,
    output: &Path,
) -> Result<()> {
    let runner = ScenarioRunner::new(load_inputs(params)?.to_parameters()?);
    let cells = runner.sensitivity(&grid, basis);

    println!("{:>6} {:>12} {:>12} {:>12}", "Year", "Exit Value", "Project IRR", "Equity IRR");
    for cell in &cells {
        println!(
            "{:>6} {:>12.2} {:>12} {:>12}",
            cell.exit_year,
            cell.exit_value,
            fmt_pct(cell.unlevered_irr),
            fmt_pct(cell.levered_irr)
        );
    }

    report::write_csv(output, &cells)
        .with_context(|| format!("Unable to write {}", output.display()))?;
    info!("Sensitivity grid written to {}", output.display());
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    match Cli::parse().command {
        Commands::Run {
            params,
            currency,
            output_dir,
        } => run(params.as_deref(), currency.into(), &output_dir),
        Commands::Sensitivity {
            params,
            years,
            values,
            currency,
            output,
        } => sensitivity(
            params.as_deref(),
            SensitivityGrid {
                exit_years: years,
                exit_values: values,
            },
            currency.into(),
            &output,
        ),
        Commands::Defaults { output } => {
            ProjectInputs::default()
                .save_json(&output)
                .with_context(|| format!("Unable to write {}", output.display()))?;
            println!("Reference inputs written to: {}", output.display());
            Ok(())
        }
    }
}
