//! Report sheets and the emitter interface used to persist them.
//!
//! The core only assembles the sheets; writing files or rendering charts is
//! left to a [`ReportEmitter`] implementation supplied by the caller.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::development::estimation::{CashFlowRow, EnrichedParameters, EstimationOutput};
use crate::development::metrics::InvestmentMetrics;
use crate::types::{Money, Quarter, SquareMeters};
use crate::DevCalcResult;

/// Column headers of the cash-flow sheet, in table order.
pub const CASH_FLOW_COLUMNS: [&str; 15] = [
    "quarter",
    "status",
    "price_index",
    "price",
    "sales_sq_m",
    "sales_rub",
    "revenue",
    "construction_costs",
    "promotion",
    "expenses",
    "CF",
    "discount_coef",
    "DCF",
    "CF_cumsum",
    "DCF_cumsum",
];

const MONEY_DP: u32 = 2;
const FACTOR_DP: u32 = 6;

/// Everything a report writer needs, already formatted as sheet cells.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimationReport {
    /// Sheet 1: enriched parameter record as key/value pairs
    pub inputs: Vec<(String, String)>,
    /// Sheet 2: one row per quarter, cells in `CASH_FLOW_COLUMNS` order
    pub cash_flow: Vec<Vec<String>>,
    /// Series for the absorption chart
    pub absorption: Vec<(Quarter, SquareMeters)>,
    /// Series for the cumulative CF / DCF chart
    pub cumulative: Vec<(Quarter, Money, Money)>,
    pub metrics: InvestmentMetrics,
    pub start_price: Money,
    pub phase_apartment_area: SquareMeters,
}

/// Terminal side effect of a successful run.
pub trait ReportEmitter {
    fn emit(&self, report: &EstimationReport) -> DevCalcResult<()>;
}

impl EstimationReport {
    pub fn from_output(output: &EstimationOutput) -> Self {
        Self {
            inputs: parameter_sheet(&output.parameters),
            cash_flow: output.cash_flow.iter().map(cash_flow_cells).collect(),
            absorption: output
                .absorption
                .iter()
                .map(|q| (q.quarter, q.sales_sq_m))
                .collect(),
            cumulative: output
                .cash_flow
                .iter()
                .map(|r| (r.quarter, r.cf_cumsum, r.dcf_cumsum))
                .collect(),
            metrics: output.metrics.clone(),
            start_price: output.parameters.start_price,
            phase_apartment_area: output.parameters.phase_apartment_area,
        }
    }

    /// NPV / PBP / DPBP / IRR summary used to annotate the cash-flow chart.
    pub fn metrics_summary(&self) -> String {
        format!(
            "NPV = {}\nPBP = {}\nDPBP = {}\nIRR = {}",
            self.metrics.npv,
            quarters_label(self.metrics.pbp),
            quarters_label(self.metrics.dpbp),
            self.metrics
                .irr
                .map(|r| r.round_dp(3).to_string())
                .unwrap_or_else(|| "n/a".into()),
        )
    }
}

fn quarters_label(quarter: Option<Quarter>) -> String {
    match quarter {
        Some(q) => format!("{q} quarters"),
        None => "no payback".into(),
    }
}

fn money(value: Decimal) -> String {
    value.round_dp(MONEY_DP).to_string()
}

fn factor(value: Decimal) -> String {
    value.round_dp(FACTOR_DP).to_string()
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn parameter_sheet(p: &EnrichedParameters) -> Vec<(String, String)> {
    [
        ("floor_area", money(p.floor_area)),
        ("apartment_area", money(p.apartment_area)),
        ("construction_costs", money(p.construction_costs)),
        ("construction_period", p.construction_period.to_string()),
        ("start_price", money(p.start_price)),
        ("completion_premium", factor(p.completion_premium)),
        ("inflation_annual", factor(p.inflation_annual)),
        ("discount_rate_annual", factor(p.discount_rate_annual)),
        ("inflation_quarterly", factor(p.inflation_quarterly)),
        ("discount_rate_quarterly", factor(p.discount_rate_quarterly)),
        ("price_segment", p.price_segment.as_str().to_string()),
        ("n_phases", p.n_phases.to_string()),
        ("phase_floor_area", money(p.phase_floor_area)),
        ("phase_apartment_area", money(p.phase_apartment_area)),
        ("sales_period", p.sales_period.to_string()),
        ("absorption_shape", p.absorption_shape.to_string()),
        ("NPV", p.npv.to_string()),
        ("PBP", optional(p.pbp)),
        ("DPBP", optional(p.dpbp)),
        ("IRR", optional(p.irr.map(factor))),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

fn cash_flow_cells(row: &CashFlowRow) -> Vec<String> {
    vec![
        row.quarter.to_string(),
        row.status.as_str().to_string(),
        factor(row.price_index),
        money(row.price),
        money(row.sales_sq_m),
        money(row.sales_rub),
        money(row.revenue),
        money(row.construction_costs),
        money(row.promotion),
        money(row.expenses),
        money(row.cf),
        factor(row.discount_coef),
        money(row.dcf),
        money(row.cf_cumsum),
        money(row.dcf_cumsum),
    ]
}
