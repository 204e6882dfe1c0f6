use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::assumptions::{MarketAssumptions, PriceSegment, SegmentAssumptions};
use crate::error::DevCalcError;
use crate::types::{Money, Quarter};
use crate::DevCalcResult;

/// One grid point of the reference curve: launch price → quarters to sell out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesPeriodPoint {
    pub price: Money,
    pub quarters: Decimal,
}

/// Reference curve for a segment on a `price_step` grid. Only the two
/// endpoints are market anchors; interior points are linear interpolation.
pub fn sales_period_curve(
    segment: &SegmentAssumptions,
    price_step: Money,
) -> DevCalcResult<Vec<SalesPeriodPoint>> {
    if price_step <= Decimal::ZERO {
        return Err(DevCalcError::InvalidConfiguration(
            "price_step must be positive".into(),
        ));
    }
    let span = segment.max_price - segment.min_price;
    if span <= Decimal::ZERO {
        return Err(DevCalcError::InvalidConfiguration(
            "segment min_price must be below max_price".into(),
        ));
    }

    let steps = (span / price_step)
        .floor()
        .to_u32()
        .ok_or_else(|| DevCalcError::InvalidConfiguration("price grid too large".into()))?;
    let steps_dec = Decimal::from(steps);
    let duration_span = segment.max_quarters - segment.min_quarters;

    let mut curve: Vec<SalesPeriodPoint> = (0..=steps)
        .map(|i| {
            let i_dec = Decimal::from(i);
            SalesPeriodPoint {
                price: segment.min_price + price_step * i_dec,
                quarters: segment.min_quarters + duration_span * i_dec / steps_dec,
            }
        })
        .collect();

    // Keep the max-price anchor even if the grid stops short of it
    if let Some(last) = curve.last() {
        if last.price < segment.max_price {
            curve.push(SalesPeriodPoint {
                price: segment.max_price,
                quarters: segment.max_quarters,
            });
        }
    }

    Ok(curve)
}

/// Number of quarters one phase takes to sell out at `start_price`, rounded up.
///
/// `start_price` must sit on the curve's grid inside the segment's range.
pub fn estimate_sales_period(
    segment: PriceSegment,
    start_price: Money,
    assumptions: &MarketAssumptions,
) -> DevCalcResult<Quarter> {
    let seg = assumptions.segment(segment);
    if start_price < seg.min_price || start_price > seg.max_price {
        return Err(DevCalcError::invalid(
            "start_price",
            format!(
                "{start_price} is outside the {} price range [{}, {}]",
                segment.as_str(),
                seg.min_price,
                seg.max_price
            ),
        ));
    }

    let curve = sales_period_curve(seg, assumptions.price_step)?;
    let point = curve
        .iter()
        .find(|p| p.price == start_price)
        .ok_or_else(|| {
            DevCalcError::invalid(
                "start_price",
                format!(
                    "{start_price} is not on the {} price grid (multiples of {})",
                    segment.as_str(),
                    assumptions.price_step
                ),
            )
        })?;

    let sales_period = point
        .quarters
        .ceil()
        .to_u32()
        .filter(|q| *q >= 1)
        .ok_or_else(|| {
            DevCalcError::InvalidConfiguration(format!(
                "sales period {} is not a positive number of quarters",
                point.quarters
            ))
        })?;

    log::debug!(
        "sales period: {} at {start_price} -> {} ({sales_period} quarters)",
        segment.as_str(),
        point.quarters
    );

    Ok(sales_period)
}
