use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::assumptions::{MarketAssumptions, PriceSegment};
use crate::error::DevCalcError;
use crate::types::{Money, SquareMeters};
use crate::DevCalcResult;

/// How the project is split into independently marketed phases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhasePlan {
    pub price_segment: PriceSegment,
    pub max_phase_size: SquareMeters,
    pub n_phases: u32,
    pub phase_floor_area: SquareMeters,
    pub phase_apartment_area: SquareMeters,
}

/// Split the project into equal phases no larger than the segment's
/// `max_phase_size`.
///
/// `n_phases = floor(apartment_area / max_phase_size) + 1`, so an area that
/// is an exact multiple of the limit still gets the extra phase.
pub fn plan_phases(
    apartment_area: SquareMeters,
    floor_area: SquareMeters,
    start_price: Money,
    assumptions: &MarketAssumptions,
) -> DevCalcResult<PhasePlan> {
    if apartment_area <= Decimal::ZERO {
        return Err(DevCalcError::invalid(
            "apartment_area",
            "Sellable apartment area must be positive",
        ));
    }
    if apartment_area > floor_area {
        return Err(DevCalcError::invalid(
            "apartment_area",
            format!("Sellable area ({apartment_area}) exceeds floor area ({floor_area})"),
        ));
    }

    let price_segment = assumptions.classify(start_price);
    let max_phase_size = assumptions.segment(price_segment).max_phase_size;
    if max_phase_size <= Decimal::ZERO {
        return Err(DevCalcError::InvalidConfiguration(format!(
            "{}: max_phase_size must be positive",
            price_segment.as_str()
        )));
    }

    let n_phases = (apartment_area / max_phase_size)
        .floor()
        .to_u32()
        .and_then(|n| n.checked_add(1))
        .ok_or_else(|| DevCalcError::invalid("apartment_area", "Too many phases"))?;
    let divisor = Decimal::from(n_phases);

    log::debug!(
        "phasing: {} segment, limit {max_phase_size} m², {n_phases} phase(s)",
        price_segment.as_str()
    );

    Ok(PhasePlan {
        price_segment,
        max_phase_size,
        n_phases,
        phase_floor_area: floor_area / divisor,
        phase_apartment_area: apartment_area / divisor,
    })
}
