use rust_decimal::{Decimal, MathematicalOps};
use serde::{Deserialize, Serialize};

use crate::error::DevCalcError;
use crate::types::{BuildingStatus, Factor, Quarter};
use crate::DevCalcResult;

/// Price index for one quarter relative to the launch price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricePoint {
    pub quarter: Quarter,
    pub status: BuildingStatus,
    pub price_index: Factor,
}

/// Quarterly price-index curve over `total_quarters`.
///
/// During construction the index compounds at
/// `completion_premium^(1/construction_period)` so it reaches the premium in
/// the last construction quarter. After completion it compounds at the
/// quarterly inflation factor off the peak construction-era index.
pub fn price_index_curve(
    construction_period: Quarter,
    total_quarters: Quarter,
    completion_premium: Factor,
    inflation_quarterly: Factor,
) -> DevCalcResult<Vec<PricePoint>> {
    if construction_period == 0 {
        return Err(DevCalcError::invalid(
            "construction_period",
            "Construction period must be at least one quarter",
        ));
    }
    if completion_premium <= Decimal::ZERO {
        return Err(DevCalcError::invalid(
            "completion_premium",
            "Completion premium must be a positive factor",
        ));
    }

    let exponent = Decimal::ONE / Decimal::from(construction_period);
    let quarterly_increase = completion_premium.checked_powd(exponent).ok_or_else(|| {
        DevCalcError::invalid(
            "completion_premium",
            format!("Cannot spread {completion_premium} over {construction_period} quarters"),
        )
    })?;

    let total = total_quarters.max(construction_period);
    let mut curve: Vec<PricePoint> = Vec::with_capacity(total as usize);

    for quarter in 1..=construction_period {
        curve.push(PricePoint {
            quarter,
            status: BuildingStatus::Construction,
            price_index: quarterly_increase.powi(i64::from(quarter)),
        });
    }

    let peak = curve
        .iter()
        .map(|p| p.price_index)
        .max()
        .unwrap_or(Decimal::ONE);

    for (k, quarter) in (construction_period + 1..=total).enumerate() {
        curve.push(PricePoint {
            quarter,
            status: BuildingStatus::Completed,
            price_index: peak * inflation_quarterly.powi(k as i64 + 1),
        });
    }

    Ok(curve)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_index_reaches_premium_at_completion() {
        let curve = price_index_curve(10, 13, dec!(1.3), dec!(1.0122722344)).unwrap();
        assert_eq!(curve.len(), 13);
        assert!((curve[9].price_index - dec!(1.3)).abs() < dec!(0.000001));
        assert!((curve[0].price_index - dec!(1.026583)).abs() < dec!(0.00001));
    }

    #[test]
    fn test_post_completion_grows_at_inflation() {
        let infl = dec!(1.0122722344);
        let curve = price_index_curve(10, 13, dec!(1.3), infl).unwrap();
        assert_eq!(curve[10].status, BuildingStatus::Completed);
        assert!((curve[10].price_index - curve[9].price_index * infl).abs() < dec!(0.0000001));
        assert!((curve[12].price_index - curve[9].price_index * infl * infl * infl).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_post_completion_is_slower_than_construction() {
        let curve = price_index_curve(8, 12, dec!(1.4), dec!(1.0122722344)).unwrap();
        let build_growth = curve[7].price_index / curve[6].price_index;
        let after_growth = curve[9].price_index / curve[8].price_index;
        assert!(after_growth < build_growth);
    }

    #[test]
    fn test_status_split_at_construction_period() {
        let curve = price_index_curve(4, 6, dec!(1.2), dec!(1.01)).unwrap();
        let statuses: Vec<BuildingStatus> = curve.iter().map(|p| p.status).collect();
        assert_eq!(
            statuses,
            vec![
                BuildingStatus::Construction,
                BuildingStatus::Construction,
                BuildingStatus::Construction,
                BuildingStatus::Construction,
                BuildingStatus::Completed,
                BuildingStatus::Completed,
            ]
        );
    }

    #[test]
    fn test_no_completed_rows_when_sales_end_first() {
        let curve = price_index_curve(10, 8, dec!(1.3), dec!(1.01)).unwrap();
        assert_eq!(curve.len(), 10);
        assert!(curve.iter().all(|p| p.status == BuildingStatus::Construction));
    }

    #[test]
    fn test_zero_construction_period_rejected() {
        assert!(matches!(
            price_index_curve(0, 8, dec!(1.3), dec!(1.01)),
            Err(DevCalcError::InvalidParameter { .. })
        ));
    }
}
