use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::DevCalcError;
use crate::types::{Money, Rate, SquareMeters};
use crate::DevCalcResult;

/// Price class of a residential project, chosen by the launch price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSegment {
    MassMarket,
    UpperClass,
}

impl PriceSegment {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceSegment::MassMarket => "mass_market",
            PriceSegment::UpperClass => "upper_class",
        }
    }
}

/// Whether construction cost is charged for every table row or only until
/// completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostSchedule {
    /// Flat charge on every quarter of the cash-flow table
    #[default]
    FullTable,
    /// Charge only quarters 1..=construction_period
    ConstructionOnly,
}

/// Floor area the construction cost rate is applied to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostBasis {
    /// Whole building, whatever the number of phases
    #[default]
    ProjectFloorArea,
    /// Floor area of the single modelled phase
    PhaseFloorArea,
}

/// Market reference data for one price segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentAssumptions {
    /// Lowest launch price covered by the sales-period curve (per m²)
    pub min_price: Money,
    /// Highest launch price covered by the sales-period curve (per m²)
    pub max_price: Money,
    /// Quarters to sell out a phase launched at `min_price`
    pub min_quarters: Decimal,
    /// Quarters to sell out a phase launched at `max_price`
    pub max_quarters: Decimal,
    /// Largest sellable area marketed as one phase
    pub max_phase_size: SquareMeters,
}

/// Immutable market configuration consumed by the estimation pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketAssumptions {
    /// Launch prices below this are mass market, others upper class
    pub segment_threshold: Money,
    /// Grid resolution of the sales-period curve
    pub price_step: Money,
    pub mass_market: SegmentAssumptions,
    pub upper_class: SegmentAssumptions,
    /// Promotion and agent commission as a share of gross bookings
    pub promotion_rate: Rate,
    /// Quantiles bounding the sampled part of the absorption density
    pub absorption_lower_quantile: f64,
    pub absorption_upper_quantile: f64,
    pub construction_cost_schedule: CostSchedule,
    pub construction_cost_basis: CostBasis,
}

impl Default for MarketAssumptions {
    fn default() -> Self {
        Self {
            segment_threshold: dec!(120000),
            price_step: dec!(1000),
            mass_market: SegmentAssumptions {
                min_price: dec!(80000),
                max_price: dec!(120000),
                min_quarters: dec!(10),
                max_quarters: dec!(14),
                max_phase_size: dec!(55000),
            },
            upper_class: SegmentAssumptions {
                min_price: dec!(120000),
                max_price: dec!(150000),
                min_quarters: dec!(12),
                max_quarters: dec!(16),
                max_phase_size: dec!(40000),
            },
            promotion_rate: dec!(0.06),
            absorption_lower_quantile: 0.01,
            absorption_upper_quantile: 0.99,
            construction_cost_schedule: CostSchedule::FullTable,
            construction_cost_basis: CostBasis::ProjectFloorArea,
        }
    }
}

impl MarketAssumptions {
    pub fn segment(&self, segment: PriceSegment) -> &SegmentAssumptions {
        match segment {
            PriceSegment::MassMarket => &self.mass_market,
            PriceSegment::UpperClass => &self.upper_class,
        }
    }

    /// Classify a launch price into its segment.
    pub fn classify(&self, start_price: Money) -> PriceSegment {
        if start_price < self.segment_threshold {
            PriceSegment::MassMarket
        } else {
            PriceSegment::UpperClass
        }
    }

    /// Reject structurally inconsistent configuration before any stage runs.
    pub fn validate(&self) -> DevCalcResult<()> {
        if self.price_step <= Decimal::ZERO {
            return Err(DevCalcError::InvalidConfiguration(
                "price_step must be positive".into(),
            ));
        }
        if self.promotion_rate < Decimal::ZERO {
            return Err(DevCalcError::InvalidConfiguration(
                "promotion_rate cannot be negative".into(),
            ));
        }
        let (lo, hi) = (self.absorption_lower_quantile, self.absorption_upper_quantile);
        if !(lo > 0.0 && hi < 1.0 && lo < hi) {
            return Err(DevCalcError::InvalidConfiguration(format!(
                "absorption quantiles must satisfy 0 < lower < upper < 1 (got {lo}, {hi})"
            )));
        }
        for segment in [PriceSegment::MassMarket, PriceSegment::UpperClass] {
            let s = self.segment(segment);
            let name = segment.as_str();
            if s.min_price >= s.max_price {
                return Err(DevCalcError::InvalidConfiguration(format!(
                    "{name}: min_price must be below max_price"
                )));
            }
            if ((s.max_price - s.min_price) % self.price_step) != Decimal::ZERO {
                return Err(DevCalcError::InvalidConfiguration(format!(
                    "{name}: price range is not a whole number of price steps"
                )));
            }
            if s.min_quarters < Decimal::ONE || s.max_quarters < Decimal::ONE {
                return Err(DevCalcError::InvalidConfiguration(format!(
                    "{name}: sales durations must be at least one quarter"
                )));
            }
            if s.max_phase_size <= Decimal::ZERO {
                return Err(DevCalcError::InvalidConfiguration(format!(
                    "{name}: max_phase_size must be positive"
                )));
            }
        }
        Ok(())
    }
}
