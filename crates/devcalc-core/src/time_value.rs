use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::DevCalcError;
use crate::types::{Money, Rate};
use crate::DevCalcResult;

const IRR_LOWER_BOUND: f64 = -0.99;
const IRR_UPPER_BOUND: f64 = 10.0;
const IRR_TOLERANCE: f64 = 1e-12;
const MAX_IRR_ITERATIONS: u32 = 200;
const IRR_DECIMAL_PLACES: u32 = 12;

/// Net Present Value of a series of cash flows, the first flow at t = 0.
pub fn npv(rate: Rate, cash_flows: &[Money]) -> DevCalcResult<Money> {
    if rate <= dec!(-1) {
        return Err(DevCalcError::invalid(
            "rate",
            "Discount rate must be greater than -100%",
        ));
    }

    let mut result = Decimal::ZERO;
    let one_plus_r = Decimal::ONE + rate;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount *= one_plus_r;
        }
        if discount.is_zero() {
            return Err(DevCalcError::DivisionByZero {
                context: format!("NPV discount factor at period {t}"),
            });
        }
        result += cf / discount;
    }

    Ok(result)
}

/// Internal Rate of Return of a periodic cash-flow series (first flow at t = 0).
///
/// The NPV polynomial can have several real roots when the series changes
/// sign more than once. All sign changes on a grid over (-99%, 1000%] are
/// bracketed and refined by bisection, and the root closest to zero is
/// returned. Newton-Raphson from `guess` is the fallback for tangent roots.
///
/// Evaluation is done in f64: discount factors near -100% overflow Decimal.
pub fn irr(cash_flows: &[Money], guess: Rate) -> DevCalcResult<Rate> {
    if cash_flows.len() < 2 {
        return Err(DevCalcError::InsufficientData(
            "IRR requires at least 2 cash flows".into(),
        ));
    }

    let flows = cash_flows
        .iter()
        .map(|cf| {
            cf.to_f64()
                .ok_or_else(|| DevCalcError::invalid("cash_flows", format!("{cf} is not representable as f64")))
        })
        .collect::<DevCalcResult<Vec<f64>>>()?;

    let has_inflow = flows.iter().any(|cf| *cf > 0.0);
    let has_outflow = flows.iter().any(|cf| *cf < 0.0);
    if !has_inflow || !has_outflow {
        return Err(DevCalcError::NoConvergence {
            function: "IRR".into(),
            iterations: 0,
            last_delta: Decimal::from_f64(npv_f64(0.0, &flows)).unwrap_or(Decimal::MAX),
        });
    }

    let root = bracketed_roots(&flows)
        .into_iter()
        .min_by(|a, b| a.abs().total_cmp(&b.abs()));

    let rate = match root {
        Some(r) => r,
        None => newton_raphson(&flows, guess.to_f64().unwrap_or(0.1))?,
    };

    Decimal::from_f64(rate)
        .map(|r| r.round_dp(IRR_DECIMAL_PLACES))
        .ok_or_else(|| DevCalcError::NoConvergence {
            function: "IRR".into(),
            iterations: MAX_IRR_ITERATIONS,
            last_delta: Decimal::MAX,
        })
}

fn npv_f64(rate: f64, flows: &[f64]) -> f64 {
    let one_plus_r = 1.0 + rate;
    let mut discount = 1.0;
    let mut total = 0.0;
    for (t, cf) in flows.iter().enumerate() {
        if t > 0 {
            discount *= one_plus_r;
        }
        total += cf / discount;
    }
    total
}

/// Rates probed for sign changes: 1% steps up to 100%, then 10% steps.
fn scan_grid() -> Vec<f64> {
    let fine = (0..=199).map(|i| IRR_LOWER_BOUND + 0.01 * i as f64);
    let coarse = (1..=90).map(|i| 1.0 + 0.1 * i as f64);
    fine.chain(coarse).filter(|r| *r <= IRR_UPPER_BOUND).collect()
}

fn bracketed_roots(flows: &[f64]) -> Vec<f64> {
    let grid = scan_grid();
    let mut roots = Vec::new();

    for pair in grid.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        let f_lo = npv_f64(lo, flows);
        let f_hi = npv_f64(hi, flows);
        if f_lo == 0.0 {
            roots.push(lo);
        } else if f_lo.signum() != f_hi.signum() && f_hi != 0.0 {
            roots.push(bisect(flows, lo, hi, f_lo));
        }
    }

    roots
}

fn bisect(flows: &[f64], mut lo: f64, mut hi: f64, mut f_lo: f64) -> f64 {
    for _ in 0..MAX_IRR_ITERATIONS {
        let mid = (lo + hi) / 2.0;
        let f_mid = npv_f64(mid, flows);
        if f_mid == 0.0 || (hi - lo) / 2.0 < IRR_TOLERANCE {
            return mid;
        }
        if f_mid.signum() == f_lo.signum() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }
    (lo + hi) / 2.0
}

fn newton_raphson(flows: &[f64], guess: f64) -> DevCalcResult<f64> {
    let scale: f64 = flows.iter().map(|cf| cf.abs()).sum();
    let mut rate = guess;
    let mut npv_val = npv_f64(rate, flows);

    for i in 0..MAX_IRR_ITERATIONS {
        let one_plus_r = 1.0 + rate;
        let mut dnpv = 0.0;
        let mut discount = 1.0;
        for (t, cf) in flows.iter().enumerate() {
            if t > 0 {
                discount *= one_plus_r;
                dnpv -= t as f64 * cf / (discount * one_plus_r);
            }
        }

        if npv_val.abs() <= scale * IRR_TOLERANCE {
            return Ok(rate);
        }

        if dnpv == 0.0 || !dnpv.is_finite() {
            return Err(DevCalcError::NoConvergence {
                function: "IRR".into(),
                iterations: i,
                last_delta: Decimal::from_f64(npv_val).unwrap_or(Decimal::MAX),
            });
        }

        rate = (rate - npv_val / dnpv).clamp(IRR_LOWER_BOUND, IRR_UPPER_BOUND);
        npv_val = npv_f64(rate, flows);
    }

    Err(DevCalcError::NoConvergence {
        function: "IRR".into(),
        iterations: MAX_IRR_ITERATIONS,
        last_delta: Decimal::from_f64(npv_val).unwrap_or(Decimal::MAX),
    })
}
