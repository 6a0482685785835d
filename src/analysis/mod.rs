//! Analysis modules.
//!
//! Aggregation of raw incident records into dashboard summary views.

pub mod aggregator;

pub use aggregator::*;
