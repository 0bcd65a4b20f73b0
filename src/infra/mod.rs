//! Runtime bootstrap: tracing subscriber and metric descriptions.

pub mod error;
pub mod telemetry;
