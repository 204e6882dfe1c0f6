mod commands;
mod input;
mod output;
mod report;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::development::{
    AbsorptionArgs, AssumptionsArgs, EstimateArgs, PhasesArgs, SalesPeriodArgs,
};

/// Residential development NPV, IRR and payback estimation
#[derive(Parser)]
#[command(
    name = "devcalc",
    version,
    about = "Residential development NPV, IRR and payback estimation",
    long_about = "Models one construction phase of a residential development quarter by \
                  quarter: sales absorption, price escalation, escrow revenue recognition, \
                  construction and promotion costs, then NPV, simple and discounted payback \
                  and IRR."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log pipeline stages to stderr (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full cash-flow estimation and investment metrics
    Estimate(EstimateArgs),
    /// Split a project into construction phases
    Phases(PhasesArgs),
    /// Quarters needed to sell out one phase at a launch price
    SalesPeriod(SalesPeriodArgs),
    /// Quarterly absorption schedule of one phase
    Absorption(AbsorptionArgs),
    /// Print the effective market assumptions
    Assumptions(AssumptionsArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Estimate(args) => commands::development::run_estimate(args),
        Commands::Phases(args) => commands::development::run_phases(args),
        Commands::SalesPeriod(args) => commands::development::run_sales_period(args),
        Commands::Absorption(args) => commands::development::run_absorption(args),
        Commands::Assumptions(args) => commands::development::run_assumptions(args),
        Commands::Version => {
            println!("devcalc {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
