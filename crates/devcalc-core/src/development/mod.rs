//! Quarterly cash-flow model of one construction phase of a residential
//! development, from launch price to NPV, payback and IRR.
//!
//! Stages run in this order inside [`estimation::estimate_project`]:
//! rates → phasing → sales period → absorption → pricing → revenue →
//! costs → metrics. Each stage is also callable on its own.

pub mod absorption;
pub mod costs;
pub mod estimation;
pub mod metrics;
pub mod phasing;
pub mod pricing;
pub mod rates;
pub mod revenue;
pub mod sales_period;
