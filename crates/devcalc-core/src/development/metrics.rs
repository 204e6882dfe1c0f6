use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::DevCalcError;
use crate::time_value;
use crate::types::{Factor, Money, Quarter, Rate};
use crate::DevCalcResult;

const IRR_GUESS: Decimal = dec!(0.10);

/// Discounting columns for one quarter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscountedFlow {
    pub quarter: Quarter,
    pub cf: Money,
    pub discount_coef: Factor,
    pub dcf: Money,
    pub cf_cumsum: Money,
    pub dcf_cumsum: Money,
}

/// Summary investment metrics. Payback and IRR are `None` when they do not
/// exist for the series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentMetrics {
    /// Sum of discounted cash flows, truncated to a whole currency unit
    pub npv: Money,
    /// First quarter in which cumulative cash flow is positive
    pub pbp: Option<Quarter>,
    /// First quarter in which cumulative discounted cash flow is positive
    pub dpbp: Option<Quarter>,
    /// Periodic (quarterly) IRR of the discounted cash-flow series
    pub irr: Option<Rate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsOutput {
    pub flows: Vec<DiscountedFlow>,
    pub metrics: InvestmentMetrics,
    /// Why IRR is missing, when it is
    #[serde(skip_serializing_if = "Option::is_none")]
    pub irr_failure: Option<String>,
}

/// Discount quarterly cash flows (quarter 1 first) and derive NPV, simple
/// and discounted payback, and IRR.
///
/// `discount_coef = discount_rate_quarterly^quarter`, `DCF = CF / coef`.
pub fn compute_metrics(cash_flows: &[Money], discount_rate_quarterly: Factor) -> DevCalcResult<MetricsOutput> {
    if discount_rate_quarterly <= Decimal::ZERO {
        return Err(DevCalcError::invalid(
            "discount_rate_quarterly",
            "Quarterly discount factor must be positive",
        ));
    }

    let mut flows: Vec<DiscountedFlow> = Vec::with_capacity(cash_flows.len());
    let mut cf_cumsum = Decimal::ZERO;
    let mut dcf_cumsum = Decimal::ZERO;

    for (cf, quarter) in cash_flows.iter().zip(1..) {
        let discount_coef = discount_rate_quarterly.powi(i64::from(quarter));
        if discount_coef.is_zero() {
            return Err(DevCalcError::DivisionByZero {
                context: format!("discount coefficient at quarter {quarter}"),
            });
        }
        let dcf = *cf / discount_coef;
        cf_cumsum += *cf;
        dcf_cumsum += dcf;
        flows.push(DiscountedFlow {
            quarter,
            cf: *cf,
            discount_coef,
            dcf,
            cf_cumsum,
            dcf_cumsum,
        });
    }

    let npv = flows.iter().map(|f| f.dcf).sum::<Decimal>().trunc();
    let pbp = first_positive(flows.iter().map(|f| (f.quarter, f.cf_cumsum)));
    let dpbp = first_positive(flows.iter().map(|f| (f.quarter, f.dcf_cumsum)));

    let dcf_series: Vec<Money> = flows.iter().map(|f| f.dcf).collect();
    let (irr, irr_failure) = match time_value::irr(&dcf_series, IRR_GUESS) {
        Ok(rate) => (Some(rate), None),
        Err(e) => (None, Some(e.to_string())),
    };

    Ok(MetricsOutput {
        flows,
        metrics: InvestmentMetrics { npv, pbp, dpbp, irr },
        irr_failure,
    })
}

fn first_positive(cumulative: impl Iterator<Item = (Quarter, Money)>) -> Option<Quarter> {
    cumulative
        .filter(|(_, total)| *total > Decimal::ZERO)
        .map(|(quarter, _)| quarter)
        .next()
}
