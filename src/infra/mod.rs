//! Runtime bootstrap: telemetry installation and infrastructure errors.

pub mod error;
pub mod telemetry;
