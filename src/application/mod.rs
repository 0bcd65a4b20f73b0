//! Process-boundary error aggregation.

pub mod error;
