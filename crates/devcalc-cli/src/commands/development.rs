use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::{json, Value};

use devcalc_core::development::{absorption, phasing, sales_period};
use devcalc_core::report::{EstimationReport, ReportEmitter};
use devcalc_core::{
    estimate_project, CostBasis, CostSchedule, EstimationInput, MarketAssumptions, PriceSegment,
    ProjectParameters,
};

use crate::input;
use crate::report::FileReportEmitter;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SegmentArg {
    MassMarket,
    UpperClass,
}

impl From<SegmentArg> for PriceSegment {
    fn from(arg: SegmentArg) -> Self {
        match arg {
            SegmentArg::MassMarket => PriceSegment::MassMarket,
            SegmentArg::UpperClass => PriceSegment::UpperClass,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CostScheduleArg {
    FullTable,
    ConstructionOnly,
}

impl From<CostScheduleArg> for CostSchedule {
    fn from(arg: CostScheduleArg) -> Self {
        match arg {
            CostScheduleArg::FullTable => CostSchedule::FullTable,
            CostScheduleArg::ConstructionOnly => CostSchedule::ConstructionOnly,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CostBasisArg {
    ProjectFloorArea,
    PhaseFloorArea,
}

impl From<CostBasisArg> for CostBasis {
    fn from(arg: CostBasisArg) -> Self {
        match arg {
            CostBasisArg::ProjectFloorArea => CostBasis::ProjectFloorArea,
            CostBasisArg::PhaseFloorArea => CostBasis::PhaseFloorArea,
        }
    }
}

/// Arguments for the full estimation
#[derive(Args)]
pub struct EstimateArgs {
    /// Total floor area of the building, m²
    #[arg(long)]
    pub floor_area: Option<Decimal>,

    /// Sellable apartment area, m²
    #[arg(long)]
    pub apartment_area: Option<Decimal>,

    /// Construction cost per m² of floor area
    #[arg(long)]
    pub construction_costs: Option<Decimal>,

    /// Construction period in quarters
    #[arg(long)]
    pub construction_period: Option<u32>,

    /// Price per m² at sales launch (multiple of the price step)
    #[arg(long)]
    pub start_price: Option<Decimal>,

    /// Price factor reached by completion (e.g. 1.3 for +30%)
    #[arg(long)]
    pub completion_premium: Option<Decimal>,

    /// Annual inflation factor (e.g. 1.05 for 5%)
    #[arg(long)]
    pub inflation: Option<Decimal>,

    /// Annual discount factor (e.g. 1.06 for 6%)
    #[arg(long)]
    pub discount_rate: Option<Decimal>,

    /// Path to JSON file with project parameters (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Market assumptions file (YAML or JSON); built-in defaults otherwise
    #[arg(long)]
    pub assumptions: Option<String>,

    /// Override the construction cost schedule from the assumptions
    #[arg(long, value_enum)]
    pub cost_schedule: Option<CostScheduleArg>,

    /// Override the floor area construction costs are charged on
    #[arg(long, value_enum)]
    pub cost_basis: Option<CostBasisArg>,

    /// Write inputs.csv, cash_flow.csv and charts into this directory
    #[arg(long)]
    pub report_dir: Option<String>,
}

/// Arguments for phase planning
#[derive(Args)]
pub struct PhasesArgs {
    /// Sellable apartment area, m²
    #[arg(long)]
    pub apartment_area: Decimal,

    /// Total floor area, m²
    #[arg(long)]
    pub floor_area: Decimal,

    /// Price per m² at sales launch
    #[arg(long)]
    pub start_price: Decimal,

    /// Market assumptions file (YAML or JSON)
    #[arg(long)]
    pub assumptions: Option<String>,
}

/// Arguments for sales-period estimation
#[derive(Args)]
pub struct SalesPeriodArgs {
    /// Price per m² at sales launch
    #[arg(long)]
    pub start_price: Decimal,

    /// Price segment (classified from the start price if omitted)
    #[arg(long, value_enum)]
    pub segment: Option<SegmentArg>,

    /// Include the full interpolated reference curve
    #[arg(long)]
    pub curve: bool,

    /// Market assumptions file (YAML or JSON)
    #[arg(long)]
    pub assumptions: Option<String>,
}

/// Arguments for the absorption schedule
#[derive(Args)]
pub struct AbsorptionArgs {
    /// Sellable area of one phase, m²
    #[arg(long)]
    pub phase_area: Decimal,

    /// Construction period in quarters
    #[arg(long)]
    pub construction_period: u32,

    /// Sales period in quarters
    #[arg(long)]
    pub sales_period: u32,

    /// Market assumptions file (YAML or JSON)
    #[arg(long)]
    pub assumptions: Option<String>,
}

/// Arguments for printing the market assumptions
#[derive(Args)]
pub struct AssumptionsArgs {
    /// Market assumptions file to load and validate
    #[arg(long)]
    pub assumptions: Option<String>,
}

fn load_assumptions(path: Option<&str>) -> Result<MarketAssumptions, Box<dyn std::error::Error>> {
    let assumptions: MarketAssumptions = match path {
        Some(p) => input::file::read_config(p)?,
        None => MarketAssumptions::default(),
    };
    assumptions.validate()?;
    Ok(assumptions)
}

fn project_parameters(args: &EstimateArgs) -> Result<ProjectParameters, Box<dyn std::error::Error>> {
    if let Some(ref path) = args.input {
        return input::file::read_json(path);
    }
    if let Some(data) = input::stdin::read_stdin()? {
        return Ok(serde_json::from_value(data)?);
    }
    Ok(ProjectParameters {
        floor_area: args
            .floor_area
            .ok_or("--floor-area is required (or provide --input)")?,
        apartment_area: args
            .apartment_area
            .ok_or("--apartment-area is required (or provide --input)")?,
        construction_costs: args
            .construction_costs
            .ok_or("--construction-costs is required (or provide --input)")?,
        construction_period: args
            .construction_period
            .ok_or("--construction-period is required (or provide --input)")?,
        start_price: args
            .start_price
            .ok_or("--start-price is required (or provide --input)")?,
        completion_premium: args
            .completion_premium
            .ok_or("--completion-premium is required (or provide --input)")?,
        inflation_annual: args
            .inflation
            .ok_or("--inflation is required (or provide --input)")?,
        discount_rate_annual: args
            .discount_rate
            .ok_or("--discount-rate is required (or provide --input)")?,
    })
}

pub fn run_estimate(args: EstimateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let parameters = project_parameters(&args)?;
    let mut assumptions = load_assumptions(args.assumptions.as_deref())?;
    if let Some(schedule) = args.cost_schedule {
        assumptions.construction_cost_schedule = schedule.into();
    }
    if let Some(basis) = args.cost_basis {
        assumptions.construction_cost_basis = basis.into();
    }

    let result = estimate_project(&EstimationInput {
        parameters,
        assumptions,
    })?;

    if let Some(ref dir) = args.report_dir {
        let report = EstimationReport::from_output(&result.result);
        FileReportEmitter::new(dir).emit(&report)?;
        log::info!("report written to {dir}");
    }

    Ok(serde_json::to_value(result)?)
}

pub fn run_phases(args: PhasesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let assumptions = load_assumptions(args.assumptions.as_deref())?;
    let plan = phasing::plan_phases(
        args.apartment_area,
        args.floor_area,
        args.start_price,
        &assumptions,
    )?;
    Ok(serde_json::to_value(plan)?)
}

pub fn run_sales_period(args: SalesPeriodArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let assumptions = load_assumptions(args.assumptions.as_deref())?;
    let segment = args
        .segment
        .map(PriceSegment::from)
        .unwrap_or_else(|| assumptions.classify(args.start_price));
    let quarters = sales_period::estimate_sales_period(segment, args.start_price, &assumptions)?;

    let mut value = json!({
        "price_segment": segment,
        "start_price": args.start_price,
        "sales_period": quarters,
    });
    if args.curve {
        let curve = sales_period::sales_period_curve(assumptions.segment(segment), assumptions.price_step)?;
        value["curve"] = serde_json::to_value(curve)?;
    }
    Ok(value)
}

pub fn run_absorption(args: AbsorptionArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let assumptions = load_assumptions(args.assumptions.as_deref())?;
    let schedule = absorption::absorption_schedule(
        args.phase_area,
        args.construction_period,
        args.sales_period,
        &assumptions,
    )?;
    Ok(serde_json::to_value(schedule)?)
}

pub fn run_assumptions(args: AssumptionsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let assumptions = load_assumptions(args.assumptions.as_deref())?;
    Ok(serde_json::to_value(assumptions)?)
}
