//! Route classification domain.
//!
//! A question is resolved by one of three strategies. The router model is
//! asked to reason first and then emit a label; [`parse_classification`]
//! turns that free-form response into a [`Classification`] and fails closed
//! to [`RouteDecision::Hybrid`] whenever no valid label can be found.

mod route;

pub use route::{Classification, RouteDecision, parse_classification};
