use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;

use devcalc_core::development::{absorption, phasing, sales_period};
use devcalc_core::{MarketAssumptions, PriceSegment};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn checked(assumptions: MarketAssumptions) -> NapiResult<MarketAssumptions> {
    assumptions.validate().map_err(to_napi_error)?;
    Ok(assumptions)
}

// ---------------------------------------------------------------------------
// Full estimation
// ---------------------------------------------------------------------------

#[napi]
pub fn estimate_project(input_json: String) -> NapiResult<String> {
    let input: devcalc_core::EstimationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = devcalc_core::estimate_project(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Pipeline stages
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct PhasesInput {
    apartment_area: Decimal,
    floor_area: Decimal,
    start_price: Decimal,
    #[serde(default)]
    assumptions: MarketAssumptions,
}

#[napi]
pub fn plan_phases(input_json: String) -> NapiResult<String> {
    let input: PhasesInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let assumptions = checked(input.assumptions)?;
    let output = phasing::plan_phases(
        input.apartment_area,
        input.floor_area,
        input.start_price,
        &assumptions,
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct SalesPeriodInput {
    start_price: Decimal,
    price_segment: Option<PriceSegment>,
    #[serde(default)]
    assumptions: MarketAssumptions,
}

#[napi]
pub fn estimate_sales_period(input_json: String) -> NapiResult<u32> {
    let input: SalesPeriodInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let assumptions = checked(input.assumptions)?;
    let segment = input
        .price_segment
        .unwrap_or_else(|| assumptions.classify(input.start_price));
    sales_period::estimate_sales_period(segment, input.start_price, &assumptions)
        .map_err(to_napi_error)
}

#[derive(Deserialize)]
struct AbsorptionInput {
    phase_area: Decimal,
    construction_period: u32,
    sales_period: u32,
    #[serde(default)]
    assumptions: MarketAssumptions,
}

#[napi]
pub fn absorption_schedule(input_json: String) -> NapiResult<String> {
    let input: AbsorptionInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let assumptions = checked(input.assumptions)?;
    let output = absorption::absorption_schedule(
        input.phase_area,
        input.construction_period,
        input.sales_period,
        &assumptions,
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
