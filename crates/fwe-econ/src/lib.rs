#![deny(warnings)]

//! Stochastic scenario models for the FWE pipeline.
//!
//! This crate provides:
//! - A seedable normal-draw stream shared by the stochastic stages
//! - The uncertainty multiplier model
//! - The logistics delay simulator
//! - KPI aggregation over optimizer totals

use thiserror::Error;

pub mod delay;
pub mod kpi;
pub mod rng;
pub mod uncertainty;

pub use delay::DelaySimulator;
pub use kpi::{aggregate, Kpis};
pub use rng::RandomnessSource;
pub use uncertainty::UncertaintyModel;

/// Errors produced by the economic stages.
#[derive(Debug, Error, PartialEq)]
pub enum EconError {
    /// Daily caloric need is zero or negative, so days of supply is undefined.
    #[error("daily caloric need is {need}; population and demand must be > 0")]
    Division { need: f64 },
    /// Numeric input or result is NaN or infinite.
    #[error("non-finite value for {0}")]
    NonFinite(&'static str),
}
