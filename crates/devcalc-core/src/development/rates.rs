use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::DevCalcError;
use crate::types::Factor;
use crate::DevCalcResult;

/// Quarterly equivalents of the annual inflation and discount factors.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QuarterlyRates {
    pub inflation_quarterly: Factor,
    pub discount_rate_quarterly: Factor,
}

/// Convert an annual multiplicative factor (1.05 = +5%/yr) to its quarterly
/// equivalent, `annual^(1/4)`.
pub fn quarterly_factor(field: &str, annual: Factor) -> DevCalcResult<Factor> {
    if annual < Decimal::ZERO {
        return Err(DevCalcError::invalid(
            field,
            format!("Annual factor must be non-negative, got {annual}"),
        ));
    }
    if annual.is_zero() {
        return Ok(Decimal::ZERO);
    }
    annual
        .checked_powd(dec!(0.25))
        .ok_or_else(|| DevCalcError::invalid(field, format!("Cannot take quarterly root of {annual}")))
}

pub fn convert_rates(inflation_annual: Factor, discount_rate_annual: Factor) -> DevCalcResult<QuarterlyRates> {
    Ok(QuarterlyRates {
        inflation_quarterly: quarterly_factor("inflation_annual", inflation_annual)?,
        discount_rate_quarterly: quarterly_factor("discount_rate_annual", discount_rate_annual)?,
    })
}
