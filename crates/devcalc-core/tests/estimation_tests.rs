use devcalc_core::development::estimation::{estimate_project, EstimationInput, ProjectParameters};
use devcalc_core::time_value;
use devcalc_core::{BuildingStatus, CostSchedule, DevCalcError, MarketAssumptions};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn params(start_price: Decimal, completion_premium: Decimal) -> ProjectParameters {
    ProjectParameters {
        floor_area: dec!(10000),
        apartment_area: dec!(7000),
        construction_costs: dec!(60000),
        construction_period: 10,
        start_price,
        completion_premium,
        inflation_annual: dec!(1.05),
        discount_rate_annual: dec!(1.06),
    }
}

fn input(parameters: ProjectParameters) -> EstimationInput {
    EstimationInput {
        parameters,
        assumptions: MarketAssumptions::default(),
    }
}

fn valid_cases() -> Vec<ProjectParameters> {
    let mut cases = vec![
        params(dec!(105000), dec!(1.3)),
        params(dec!(110000), dec!(1.5)),
        params(dec!(119000), dec!(1.2)),
        params(dec!(120000), dec!(1.3)),
        params(dec!(150000), dec!(1.4)),
    ];
    let mut two_phase = params(dec!(90000), dec!(1.3));
    two_phase.construction_period = 4;
    two_phase.apartment_area = dec!(60000);
    two_phase.floor_area = dec!(80000);
    cases.push(two_phase);
    let mut short_build = params(dec!(90000), dec!(1.2));
    short_build.construction_period = 2;
    cases.push(short_build);
    cases
}

// ===========================================================================
// Conservation invariants
// ===========================================================================

#[test]
fn test_revenue_equals_bookings_for_all_cases() {
    for p in valid_cases() {
        let out = estimate_project(&input(p.clone())).unwrap().result;
        let booked: Decimal = out.cash_flow.iter().map(|r| r.sales_rub).sum();
        let recognised: Decimal = out.cash_flow.iter().map(|r| r.revenue).sum();
        assert!(
            (booked - recognised).abs() < dec!(0.0001),
            "start_price {}: booked {booked} != recognised {recognised}",
            p.start_price
        );
    }
}

#[test]
fn test_absorption_sums_to_phase_area_for_all_cases() {
    for p in valid_cases() {
        let out = estimate_project(&input(p)).unwrap().result;
        let sold: Decimal = out.absorption.iter().map(|q| q.sales_sq_m).sum();
        assert!(
            (sold - out.parameters.phase_apartment_area).abs() < dec!(0.0001),
            "sold {sold} vs phase {}",
            out.parameters.phase_apartment_area
        );
    }
}

#[test]
fn test_construction_rows_carry_no_revenue() {
    for p in valid_cases() {
        let out = estimate_project(&input(p)).unwrap().result;
        for row in out
            .cash_flow
            .iter()
            .filter(|r| r.status == BuildingStatus::Construction)
        {
            assert_eq!(row.revenue, Decimal::ZERO);
        }
    }
}

// ===========================================================================
// Known answers
// ===========================================================================

#[test]
fn test_default_project_known_answer() {
    let out = estimate_project(&input(params(dec!(105000), dec!(1.3))))
        .unwrap()
        .result;
    let p = &out.parameters;
    assert_eq!(p.n_phases, 1);
    assert_eq!(p.sales_period, 13);
    assert_eq!(p.absorption_shape, 3);
    assert_eq!(out.cash_flow[0].construction_costs, dec!(60000000));
    assert_eq!(out.metrics.pbp, Some(11));
    assert_eq!(out.metrics.dpbp, Some(11));
    // NPV ≈ -41.67m
    assert!(
        out.metrics.npv > dec!(-42500000) && out.metrics.npv < dec!(-41000000),
        "NPV {}",
        out.metrics.npv
    );
    let irr = out.metrics.irr.expect("IRR should exist");
    assert!((irr - dec!(-0.0133)).abs() < dec!(0.001), "IRR {irr}");
}

#[test]
fn test_profitable_project_known_answer() {
    let out = estimate_project(&input(params(dec!(110000), dec!(1.5))))
        .unwrap()
        .result;
    // NPV ≈ 40.6m
    assert!(
        out.metrics.npv > dec!(39500000) && out.metrics.npv < dec!(41700000),
        "NPV {}",
        out.metrics.npv
    );
    let irr = out.metrics.irr.expect("IRR should exist");
    assert!((irr - dec!(0.0118)).abs() < dec!(0.001), "IRR {irr}");
}

#[test]
fn test_two_phase_project_models_one_phase() {
    let mut p = params(dec!(90000), dec!(1.3));
    p.construction_period = 4;
    p.apartment_area = dec!(60000);
    p.floor_area = dec!(80000);
    let out = estimate_project(&input(p)).unwrap();
    let r = &out.result;
    assert_eq!(r.parameters.n_phases, 2);
    assert_eq!(r.parameters.phase_apartment_area, dec!(30000));
    assert_eq!(r.parameters.phase_floor_area, dec!(40000));
    assert_eq!(r.parameters.sales_period, 11);
    assert!(out.warnings.iter().any(|w| w.contains("2 phases")));
    // 60,000 × 80,000 / 4: the whole building is charged against one phase
    assert_eq!(r.cash_flow[0].construction_costs, dec!(1200000000));
    assert!(r.cash_flow.iter().all(|row| row.construction_costs == dec!(1200000000)));
    assert_eq!(r.metrics.pbp, None);
    assert_eq!(r.metrics.dpbp, None);
    assert_eq!(r.metrics.irr, None);
    assert!(out.warnings.iter().any(|w| w.contains("no payback")));
    assert!(out.warnings.iter().any(|w| w.contains("IRR not available")));
}

#[test]
fn test_short_construction_uses_unit_shape() {
    let mut p = params(dec!(90000), dec!(1.2));
    p.construction_period = 2;
    let out = estimate_project(&input(p)).unwrap().result;
    assert_eq!(out.parameters.absorption_shape, 1);
    assert_eq!(out.cash_flow.len(), 11);
    // Exponential shape: sales fall every quarter
    for pair in out.absorption.windows(2) {
        assert!(pair[0].sales_sq_m > pair[1].sales_sq_m);
    }
}

// ===========================================================================
// Discounting properties
// ===========================================================================

#[test]
fn test_npv_falls_as_discount_rate_rises() {
    let rates = [dec!(1.0), dec!(1.03), dec!(1.06), dec!(1.10), dec!(1.15), dec!(1.20)];
    let npvs: Vec<Decimal> = rates
        .iter()
        .map(|r| {
            let mut p = params(dec!(110000), dec!(1.5));
            p.discount_rate_annual = *r;
            estimate_project(&input(p)).unwrap().result.metrics.npv
        })
        .collect();
    for pair in npvs.windows(2) {
        assert!(pair[1] < pair[0], "NPV not decreasing: {npvs:?}");
    }
}

#[test]
fn test_zero_discounting_collapses_paybacks() {
    let mut p = params(dec!(110000), dec!(1.5));
    p.discount_rate_annual = dec!(1.0);
    let out = estimate_project(&input(p)).unwrap().result;
    assert_eq!(out.metrics.pbp, out.metrics.dpbp);
    let undiscounted: Decimal = out.cash_flow.iter().map(|r| r.cf).sum();
    assert!((out.metrics.npv - undiscounted.trunc()).abs() <= Decimal::ONE);
}

#[test]
fn test_irr_round_trip_zeroes_npv() {
    for p in valid_cases() {
        let out = estimate_project(&input(p)).unwrap().result;
        if let Some(irr) = out.metrics.irr {
            let dcf: Vec<Decimal> = out.cash_flow.iter().map(|r| r.dcf).collect();
            let residual = time_value::npv(irr, &dcf).unwrap();
            assert!(residual.abs() < dec!(1), "residual {residual} at IRR {irr}");
        }
    }
}

#[test]
fn test_construction_only_costs_raise_npv() {
    let full = estimate_project(&input(params(dec!(110000), dec!(1.5))))
        .unwrap()
        .result;
    let trimmed = estimate_project(&EstimationInput {
        parameters: params(dec!(110000), dec!(1.5)),
        assumptions: MarketAssumptions {
            construction_cost_schedule: CostSchedule::ConstructionOnly,
            ..MarketAssumptions::default()
        },
    })
    .unwrap()
    .result;
    assert!(trimmed.metrics.npv > full.metrics.npv);
    assert_eq!(trimmed.cash_flow[12].construction_costs, Decimal::ZERO);
}

#[test]
fn test_runs_are_deterministic() {
    let a = estimate_project(&input(params(dec!(105000), dec!(1.3)))).unwrap();
    let b = estimate_project(&input(params(dec!(105000), dec!(1.3)))).unwrap();
    assert_eq!(
        serde_json::to_value(&a.result).unwrap(),
        serde_json::to_value(&b.result).unwrap()
    );
    assert_eq!(a.warnings, b.warnings);
}

// ===========================================================================
// Failures
// ===========================================================================

#[test]
fn test_off_grid_start_price_fails() {
    let err = estimate_project(&input(params(dec!(105500), dec!(1.3)))).unwrap_err();
    assert!(matches!(err, DevCalcError::InvalidParameter { ref field, .. } if field == "start_price"));
}

#[test]
fn test_start_price_below_any_segment_fails() {
    let err = estimate_project(&input(params(dec!(70000), dec!(1.3)))).unwrap_err();
    assert!(matches!(err, DevCalcError::InvalidParameter { .. }));
}

#[test]
fn test_sellable_area_above_floor_area_fails() {
    let mut p = params(dec!(105000), dec!(1.3));
    p.apartment_area = dec!(12000);
    assert!(matches!(
        estimate_project(&input(p)),
        Err(DevCalcError::InvalidParameter { .. })
    ));
}

#[test]
fn test_no_completed_quarter_fails() {
    let mut p = params(dec!(105000), dec!(1.3));
    p.construction_period = 16;
    let err = estimate_project(&input(p)).unwrap_err();
    match err {
        DevCalcError::InvalidConfiguration(msg) => {
            assert_eq!(msg, "no post-completion quarter exists to release escrow")
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_zero_discount_factor_fails() {
    let mut p = params(dec!(105000), dec!(1.3));
    p.discount_rate_annual = Decimal::ZERO;
    assert!(matches!(
        estimate_project(&input(p)),
        Err(DevCalcError::InvalidParameter { .. })
    ));
}

#[test]
fn test_input_deserialises_with_default_assumptions() {
    let json = r#"{
        "parameters": {
            "floor_area": 10000,
            "apartment_area": 7000,
            "construction_costs": 60000,
            "construction_period": 10,
            "start_price": 105000,
            "completion_premium": 1.3,
            "inflation_annual": 1.05,
            "discount_rate_annual": 1.06
        }
    }"#;
    let parsed: EstimationInput = serde_json::from_str(json).unwrap();
    assert_eq!(parsed.assumptions.promotion_rate, dec!(0.06));
    let out = estimate_project(&parsed).unwrap();
    assert_eq!(out.result.parameters.sales_period, 13);
}
