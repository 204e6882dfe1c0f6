use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::assumptions::{CostBasis, CostSchedule, MarketAssumptions, PriceSegment};
use crate::development::absorption::{self, AbsorptionQuarter};
use crate::development::costs;
use crate::development::metrics::{self, InvestmentMetrics};
use crate::development::phasing;
use crate::development::pricing;
use crate::development::rates;
use crate::development::revenue;
use crate::development::sales_period;
use crate::error::DevCalcError;
use crate::types::{
    with_metadata, BuildingStatus, ComputationOutput, Factor, Money, Quarter, Rate, SquareMeters,
};
use crate::DevCalcResult;

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// User-supplied parameters of one residential development.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectParameters {
    /// Total floor area of the building (m²)
    pub floor_area: SquareMeters,
    /// Sellable apartment area (m²)
    pub apartment_area: SquareMeters,
    /// Construction cost per m² of floor area
    pub construction_costs: Money,
    /// Construction period in quarters
    pub construction_period: Quarter,
    /// Price per m² at sales launch; a multiple of the assumptions' price step
    pub start_price: Money,
    /// Price factor reached by completion (1.3 = +30% over launch price)
    pub completion_premium: Factor,
    /// Annual inflation factor (1.05 = 5%)
    pub inflation_annual: Factor,
    /// Annual discount factor (1.06 = 6%)
    pub discount_rate_annual: Factor,
}

/// Project parameters plus the market configuration they are evaluated under.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimationInput {
    pub parameters: ProjectParameters,
    #[serde(default)]
    pub assumptions: MarketAssumptions,
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// The input record enriched with every derived field and the summary metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedParameters {
    pub floor_area: SquareMeters,
    pub apartment_area: SquareMeters,
    pub construction_costs: Money,
    pub construction_period: Quarter,
    pub start_price: Money,
    pub completion_premium: Factor,
    pub inflation_annual: Factor,
    pub discount_rate_annual: Factor,
    pub inflation_quarterly: Factor,
    pub discount_rate_quarterly: Factor,
    pub price_segment: PriceSegment,
    pub n_phases: u32,
    pub phase_floor_area: SquareMeters,
    pub phase_apartment_area: SquareMeters,
    pub sales_period: Quarter,
    pub absorption_shape: u32,
    pub npv: Money,
    pub pbp: Option<Quarter>,
    pub dpbp: Option<Quarter>,
    pub irr: Option<Rate>,
}

/// One quarter of the cash-flow table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowRow {
    pub quarter: Quarter,
    pub status: BuildingStatus,
    pub price_index: Factor,
    pub price: Money,
    pub sales_sq_m: SquareMeters,
    /// Gross bookings this quarter, before escrow
    pub sales_rub: Money,
    /// Revenue recognised this quarter
    pub revenue: Money,
    pub construction_costs: Money,
    pub promotion: Money,
    pub expenses: Money,
    pub cf: Money,
    pub discount_coef: Factor,
    pub dcf: Money,
    pub cf_cumsum: Money,
    pub dcf_cumsum: Money,
}

/// Complete result of one estimation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimationOutput {
    pub parameters: EnrichedParameters,
    pub absorption: Vec<AbsorptionQuarter>,
    pub cash_flow: Vec<CashFlowRow>,
    pub metrics: InvestmentMetrics,
}

// ---------------------------------------------------------------------------
// Core computation
// ---------------------------------------------------------------------------

/// Run the full estimation for one phase of a residential development.
///
/// Converts rates, plans phases, estimates the sales period, spreads sales
/// over it, escalates prices, recognises revenue under escrow, allocates
/// costs and discounts the resulting cash flow. Any failure aborts the run
/// before output is produced.
pub fn estimate_project(
    input: &EstimationInput,
) -> DevCalcResult<ComputationOutput<EstimationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let params = &input.parameters;
    let assumptions = &input.assumptions;

    // ── Validation ───────────────────────────────────────────────────
    assumptions.validate()?;
    validate_input(params)?;

    // ── Rates ────────────────────────────────────────────────────────
    let quarterly = rates::convert_rates(params.inflation_annual, params.discount_rate_annual)?;

    // ── Phasing and sales period ─────────────────────────────────────
    let plan = phasing::plan_phases(
        params.apartment_area,
        params.floor_area,
        params.start_price,
        assumptions,
    )?;
    log::info!("construction phases: {}", plan.n_phases);

    let sales_period =
        sales_period::estimate_sales_period(plan.price_segment, params.start_price, assumptions)?;
    log::info!("sales period of one phase: {sales_period} quarters");
    if sales_period <= params.construction_period {
        return Err(DevCalcError::InvalidConfiguration(
            revenue::NO_RELEASE_QUARTER.into(),
        ));
    }

    // ── Absorption ───────────────────────────────────────────────────
    let schedule = absorption::absorption_schedule(
        plan.phase_apartment_area,
        params.construction_period,
        sales_period,
        assumptions,
    )?;

    // ── Prices and bookings ──────────────────────────────────────────
    let total_quarters = params.construction_period.max(sales_period);
    let curve = pricing::price_index_curve(
        params.construction_period,
        total_quarters,
        params.completion_premium,
        quarterly.inflation_quarterly,
    )?;

    let statuses: Vec<BuildingStatus> = curve.iter().map(|p| p.status).collect();
    let prices: Vec<Money> = curve
        .iter()
        .map(|p| params.start_price * p.price_index)
        .collect();
    let areas: Vec<SquareMeters> = curve.iter().map(|p| schedule.area_in(p.quarter)).collect();
    let sales_rub: Vec<Money> = prices.iter().zip(&areas).map(|(p, a)| *p * *a).collect();

    // ── Revenue under escrow ─────────────────────────────────────────
    let revenue = revenue::recognize_revenue(&statuses, &sales_rub)?;
    let total_revenue: Money = revenue.iter().sum();
    log::info!("recognised revenue: {}", total_revenue.round_dp(2));

    // ── Costs ────────────────────────────────────────────────────────
    let cost_area = match assumptions.construction_cost_basis {
        CostBasis::ProjectFloorArea => params.floor_area,
        CostBasis::PhaseFloorArea => plan.phase_floor_area,
    };
    let quarter_costs = costs::allocate_costs(
        params.construction_costs,
        cost_area,
        params.construction_period,
        &sales_rub,
        assumptions,
    )?;

    // ── Metrics ──────────────────────────────────────────────────────
    let cash_flows: Vec<Money> = revenue
        .iter()
        .zip(&quarter_costs)
        .map(|(rev, c)| *rev - c.expenses)
        .collect();
    let metrics_out = metrics::compute_metrics(&cash_flows, quarterly.discount_rate_quarterly)?;
    let investment = metrics_out.metrics.clone();
    log::info!(
        "NPV {} | PBP {:?} | DPBP {:?} | IRR {:?}",
        investment.npv,
        investment.pbp,
        investment.dpbp,
        investment.irr
    );

    let cash_flow: Vec<CashFlowRow> = curve
        .iter()
        .zip(&prices)
        .zip(&areas)
        .zip(&sales_rub)
        .zip(&revenue)
        .zip(&quarter_costs)
        .zip(&metrics_out.flows)
        .map(|((((((point, price), area), sales), rev), cost), flow)| CashFlowRow {
            quarter: point.quarter,
            status: point.status,
            price_index: point.price_index,
            price: *price,
            sales_sq_m: *area,
            sales_rub: *sales,
            revenue: *rev,
            construction_costs: cost.construction_costs,
            promotion: cost.promotion,
            expenses: cost.expenses,
            cf: flow.cf,
            discount_coef: flow.discount_coef,
            dcf: flow.dcf,
            cf_cumsum: flow.cf_cumsum,
            dcf_cumsum: flow.dcf_cumsum,
        })
        .collect();

    // ── Warnings ─────────────────────────────────────────────────────
    if plan.n_phases > 1 {
        warnings.push(format!(
            "Project split into {} phases of {} m² sellable area; figures cover one phase",
            plan.n_phases,
            plan.phase_apartment_area.round_dp(2)
        ));
        if assumptions.construction_cost_basis == CostBasis::ProjectFloorArea {
            warnings.push(format!(
                "Construction costs are charged on the whole {} m² floor area against one phase's sales",
                params.floor_area.round_dp(0)
            ));
        }
    }
    let post_completion = total_quarters - params.construction_period;
    if assumptions.construction_cost_schedule == CostSchedule::FullTable && post_completion > 0 {
        warnings.push(format!(
            "Construction costs are charged for {post_completion} quarter(s) after completion"
        ));
    }
    let unsold_at_completion: SquareMeters = cash_flow
        .iter()
        .filter(|r| r.status == BuildingStatus::Completed)
        .map(|r| r.sales_sq_m)
        .sum();
    if unsold_at_completion > Decimal::ZERO {
        let pct = unsold_at_completion / plan.phase_apartment_area * dec!(100);
        warnings.push(format!(
            "{} m² ({}%) of the phase is sold after completion",
            unsold_at_completion.round_dp(0),
            pct.round_dp(1)
        ));
    }
    if investment.npv < Decimal::ZERO {
        warnings.push(format!("Negative NPV of {}", investment.npv));
    }
    if investment.pbp.is_none() {
        warnings.push("Cumulative cash flow never turns positive: no payback".into());
    }
    if investment.dpbp.is_none() {
        warnings.push("Cumulative discounted cash flow never turns positive: no discounted payback".into());
    }
    if let Some(reason) = &metrics_out.irr_failure {
        warnings.push(format!("IRR not available: {reason}"));
    }
    for w in &warnings {
        log::warn!("{w}");
    }

    let parameters = EnrichedParameters {
        floor_area: params.floor_area,
        apartment_area: params.apartment_area,
        construction_costs: params.construction_costs,
        construction_period: params.construction_period,
        start_price: params.start_price,
        completion_premium: params.completion_premium,
        inflation_annual: params.inflation_annual,
        discount_rate_annual: params.discount_rate_annual,
        inflation_quarterly: quarterly.inflation_quarterly,
        discount_rate_quarterly: quarterly.discount_rate_quarterly,
        price_segment: plan.price_segment,
        n_phases: plan.n_phases,
        phase_floor_area: plan.phase_floor_area,
        phase_apartment_area: plan.phase_apartment_area,
        sales_period,
        absorption_shape: schedule.shape,
        npv: investment.npv,
        pbp: investment.pbp,
        dpbp: investment.dpbp,
        irr: investment.irr,
    };

    let output = EstimationOutput {
        parameters,
        absorption: schedule.quarters,
        cash_flow,
        metrics: investment,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Residential development cash flow (quarterly, escrow revenue recognition)",
        &serde_json::json!({
            "price_segment": plan.price_segment.as_str(),
            "max_phase_size": plan.max_phase_size.to_string(),
            "promotion_rate": assumptions.promotion_rate.to_string(),
            "construction_cost_schedule": assumptions.construction_cost_schedule,
            "construction_cost_basis": assumptions.construction_cost_basis,
            "absorption_quantiles": [
                assumptions.absorption_lower_quantile,
                assumptions.absorption_upper_quantile
            ],
            "irr_basis": "quarterly, on discounted cash flows",
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn validate_input(params: &ProjectParameters) -> DevCalcResult<()> {
    if params.floor_area <= Decimal::ZERO {
        return Err(DevCalcError::invalid("floor_area", "Floor area must be positive"));
    }
    if params.construction_costs < Decimal::ZERO {
        return Err(DevCalcError::invalid(
            "construction_costs",
            "Construction cost rate cannot be negative",
        ));
    }
    if params.construction_period < 1 {
        return Err(DevCalcError::invalid(
            "construction_period",
            "Construction period must be at least one quarter",
        ));
    }
    if params.start_price <= Decimal::ZERO {
        return Err(DevCalcError::invalid("start_price", "Launch price must be positive"));
    }
    if params.completion_premium < Decimal::ONE {
        return Err(DevCalcError::invalid(
            "completion_premium",
            "Completion premium is a factor of at least 1.0",
        ));
    }
    if params.inflation_annual <= Decimal::ZERO {
        return Err(DevCalcError::invalid(
            "inflation_annual",
            "Inflation is a positive factor (1.05 = 5%)",
        ));
    }
    if params.discount_rate_annual <= Decimal::ZERO {
        return Err(DevCalcError::invalid(
            "discount_rate_annual",
            "Discount rate is a positive factor (1.06 = 6%)",
        ));
    }
    Ok(())
}
