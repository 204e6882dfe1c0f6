use devcalc_core::development::{absorption, costs, metrics, phasing, pricing, revenue, sales_period};
use devcalc_core::{BuildingStatus, MarketAssumptions, PriceSegment};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Stage-level checks against the public API
// ===========================================================================

#[test]
fn test_phase_boundaries_mass_market() {
    let a = MarketAssumptions::default();
    let small = phasing::plan_phases(dec!(54000), dec!(90000), dec!(100000), &a).unwrap();
    let large = phasing::plan_phases(dec!(56000), dec!(90000), dec!(100000), &a).unwrap();
    assert_eq!(small.n_phases, 1);
    assert_eq!(large.n_phases, 2);
    assert_eq!(large.price_segment, PriceSegment::MassMarket);
}

#[test]
fn test_sales_period_endpoints() {
    let a = MarketAssumptions::default();
    assert_eq!(
        sales_period::estimate_sales_period(PriceSegment::MassMarket, dec!(80000), &a).unwrap(),
        10
    );
    assert_eq!(
        sales_period::estimate_sales_period(PriceSegment::MassMarket, dec!(120000), &a).unwrap(),
        14
    );
}

#[test]
fn test_custom_assumptions_change_sales_period() {
    let mut a = MarketAssumptions::default();
    a.mass_market.max_quarters = dec!(18);
    // 10 + 8 × 25/40 = 15
    assert_eq!(
        sales_period::estimate_sales_period(PriceSegment::MassMarket, dec!(105000), &a).unwrap(),
        15
    );
}

#[test]
fn test_escrow_release_of_four_construction_quarters() {
    use BuildingStatus::{Completed, Construction};
    let statuses = [Construction, Construction, Construction, Construction, Completed];
    let sales = [dec!(10), dec!(20), dec!(30), dec!(40), dec!(25)];
    let revenue = revenue::recognize_revenue(&statuses, &sales).unwrap();
    assert_eq!(revenue[4], dec!(100) + dec!(25));
    assert!(revenue[..4].iter().all(|r| r.is_zero()));
}

#[test]
fn test_payback_at_quarter_six_without_discounting() {
    let cfs = [
        dec!(-50),
        dec!(-40),
        dec!(-30),
        dec!(-20),
        dec!(-10),
        dec!(200),
    ];
    let out = metrics::compute_metrics(&cfs, Decimal::ONE).unwrap();
    assert_eq!(out.metrics.pbp, Some(6));
    assert_eq!(out.metrics.dpbp, Some(6));
}

#[test]
fn test_stages_chain_into_consistent_table() {
    let a = MarketAssumptions::default();
    let schedule = absorption::absorption_schedule(dec!(7000), 10, 13, &a).unwrap();
    let curve = pricing::price_index_curve(10, 13, dec!(1.3), dec!(1.0122722344)).unwrap();
    let statuses: Vec<BuildingStatus> = curve.iter().map(|p| p.status).collect();
    let sales: Vec<Decimal> = curve
        .iter()
        .map(|p| dec!(105000) * p.price_index * schedule.area_in(p.quarter))
        .collect();
    let revenue = revenue::recognize_revenue(&statuses, &sales).unwrap();
    let costs = costs::allocate_costs(dec!(60000), dec!(10000), 10, &sales, &a).unwrap();
    assert_eq!(revenue.len(), costs.len());
    let total_sales: Decimal = sales.iter().sum();
    let total_promotion: Decimal = costs.iter().map(|c| c.promotion).sum();
    assert!((total_promotion - total_sales * dec!(0.06)).abs() < dec!(0.0001));
}
