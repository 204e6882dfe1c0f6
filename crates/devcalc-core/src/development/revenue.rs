use rust_decimal::Decimal;

use crate::error::DevCalcError;
use crate::types::{BuildingStatus, Money};
use crate::DevCalcResult;

pub(crate) const NO_RELEASE_QUARTER: &str = "no post-completion quarter exists to release escrow";

/// Recognised revenue per quarter under escrow.
///
/// Proceeds booked while the building is under construction stay in escrow
/// and are released in full in the first completed quarter, together with
/// that quarter's own bookings. Later quarters recognise their own bookings.
/// Total recognised revenue always equals total bookings.
pub fn recognize_revenue(statuses: &[BuildingStatus], sales_rub: &[Money]) -> DevCalcResult<Vec<Money>> {
    if statuses.len() != sales_rub.len() {
        return Err(DevCalcError::InvalidConfiguration(format!(
            "{} status rows but {} sales rows",
            statuses.len(),
            sales_rub.len()
        )));
    }

    let release = statuses
        .iter()
        .position(|s| *s == BuildingStatus::Completed)
        .ok_or_else(|| {
            DevCalcError::InvalidConfiguration(
                NO_RELEASE_QUARTER.into(),
            )
        })?;

    if statuses[release..]
        .iter()
        .any(|s| *s == BuildingStatus::Construction)
    {
        return Err(DevCalcError::InvalidConfiguration(
            "construction quarter found after completion".into(),
        ));
    }

    let escrow: Money = sales_rub[..release].iter().sum();
    log::debug!("revenue: releasing {escrow} of escrowed sales in quarter {}", release + 1);

    let revenue = sales_rub
        .iter()
        .enumerate()
        .map(|(i, sales)| match i.cmp(&release) {
            std::cmp::Ordering::Less => Decimal::ZERO,
            std::cmp::Ordering::Equal => *sales + escrow,
            std::cmp::Ordering::Greater => *sales,
        })
        .collect();

    Ok(revenue)
}
