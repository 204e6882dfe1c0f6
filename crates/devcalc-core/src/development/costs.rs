use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::assumptions::{CostSchedule, MarketAssumptions};
use crate::error::DevCalcError;
use crate::types::{Money, Quarter, SquareMeters};
use crate::DevCalcResult;

/// Expense lines for one quarter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuarterCosts {
    pub construction_costs: Money,
    pub promotion: Money,
    pub expenses: Money,
}

/// Construction cost per quarter: `cost_rate × floor_area / construction_period`.
pub fn quarterly_construction_cost(
    cost_rate: Money,
    floor_area: SquareMeters,
    construction_period: Quarter,
) -> DevCalcResult<Money> {
    if construction_period == 0 {
        return Err(DevCalcError::DivisionByZero {
            context: "construction cost per quarter".into(),
        });
    }
    Ok(cost_rate * floor_area / Decimal::from(construction_period))
}

/// Allocate construction and promotion costs to every row of the table.
///
/// Promotion is a share of the quarter's gross bookings (`sales_rub`), not
/// of recognised revenue. Construction cost is flat across the table unless
/// the schedule is [`CostSchedule::ConstructionOnly`].
pub fn allocate_costs(
    cost_rate: Money,
    floor_area: SquareMeters,
    construction_period: Quarter,
    sales_rub: &[Money],
    assumptions: &MarketAssumptions,
) -> DevCalcResult<Vec<QuarterCosts>> {
    if cost_rate < Decimal::ZERO {
        return Err(DevCalcError::invalid(
            "construction_costs",
            "Construction cost rate cannot be negative",
        ));
    }
    let per_quarter = quarterly_construction_cost(cost_rate, floor_area, construction_period)?;

    let costs = sales_rub
        .iter()
        .zip(1..)
        .map(|(sales, quarter): (&Money, Quarter)| {
            let construction_costs = match assumptions.construction_cost_schedule {
                CostSchedule::FullTable => per_quarter,
                CostSchedule::ConstructionOnly if quarter <= construction_period => per_quarter,
                CostSchedule::ConstructionOnly => Decimal::ZERO,
            };
            let promotion = *sales * assumptions.promotion_rate;
            QuarterCosts {
                construction_costs,
                promotion,
                expenses: construction_costs + promotion,
            }
        })
        .collect();

    Ok(costs)
}
