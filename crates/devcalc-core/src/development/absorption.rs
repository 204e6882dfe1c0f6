use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use statrs::distribution::{Continuous, ContinuousCDF, Gamma};

use crate::assumptions::MarketAssumptions;
use crate::error::DevCalcError;
use crate::types::{Quarter, SquareMeters};
use crate::DevCalcResult;

/// Sellable area sold in one quarter of the sales period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbsorptionQuarter {
    pub quarter: Quarter,
    /// Share of the phase area sold this quarter (shares sum to 1)
    pub share: Decimal,
    pub sales_sq_m: SquareMeters,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbsorptionSchedule {
    /// Gamma shape parameter used to draw the curve
    pub shape: u32,
    pub quarters: Vec<AbsorptionQuarter>,
}

impl AbsorptionSchedule {
    pub fn total_area(&self) -> SquareMeters {
        self.quarters.iter().map(|q| q.sales_sq_m).sum()
    }

    /// Area sold in `quarter`, zero outside the sales period.
    pub fn area_in(&self, quarter: Quarter) -> SquareMeters {
        quarter
            .checked_sub(1)
            .and_then(|i| self.quarters.get(i as usize))
            .map(|q| q.sales_sq_m)
            .unwrap_or(Decimal::ZERO)
    }
}

/// Gamma shape for the absorption curve: a third of the construction period,
/// never below 1.
pub fn absorption_shape(construction_period: Quarter) -> u32 {
    (construction_period / 3).max(1)
}

/// Spread the phase's sellable area over `sales_period` quarters.
///
/// The Gamma(shape, 1) density is sampled at `sales_period` evenly spaced
/// points between its lower and upper quantiles, normalised to shares, and
/// scaled by the phase area. The result is right-skewed with its mode early
/// in the sales period.
pub fn absorption_schedule(
    phase_apartment_area: SquareMeters,
    construction_period: Quarter,
    sales_period: Quarter,
    assumptions: &MarketAssumptions,
) -> DevCalcResult<AbsorptionSchedule> {
    if phase_apartment_area <= Decimal::ZERO {
        return Err(DevCalcError::invalid(
            "phase_apartment_area",
            "Phase sellable area must be positive",
        ));
    }
    if sales_period == 0 {
        return Err(DevCalcError::invalid(
            "sales_period",
            "Sales period must be at least one quarter",
        ));
    }

    let shape = absorption_shape(construction_period);
    let gamma = Gamma::new(f64::from(shape), 1.0).map_err(|e| {
        DevCalcError::InvalidConfiguration(format!("Invalid Gamma shape {shape}: {e}"))
    })?;

    let lower = gamma.inverse_cdf(assumptions.absorption_lower_quantile);
    let upper = gamma.inverse_cdf(assumptions.absorption_upper_quantile);
    let densities = linspace(lower, upper, sales_period as usize)
        .into_iter()
        .map(|x| {
            let y = gamma.pdf(x);
            Decimal::from_f64(y).ok_or_else(|| {
                DevCalcError::InvalidConfiguration(format!("Gamma density {y} at {x} is not finite"))
            })
        })
        .collect::<DevCalcResult<Vec<Decimal>>>()?;

    let total: Decimal = densities.iter().sum();
    if total.is_zero() {
        return Err(DevCalcError::DivisionByZero {
            context: "absorption density normalisation".into(),
        });
    }

    let quarters = densities
        .into_iter()
        .zip(1..)
        .map(|(density, quarter)| {
            let share = density / total;
            AbsorptionQuarter {
                quarter,
                share,
                sales_sq_m: phase_apartment_area * share,
            }
        })
        .collect();

    Ok(AbsorptionSchedule { shape, quarters })
}

/// `n` evenly spaced points from `start` to `end` inclusive.
fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}
