//! Compute core for the satellite pixel / candidate site buffer study.
//!
//! The crate holds the validated value types shared by the load, compute and
//! report stages, the sensor-grid resolution estimator and the buffer
//! extractor. Everything here is pure and performs no I/O.

pub mod geo;
pub mod math;
pub mod prelude;
pub mod processing;
pub mod telemetry;

pub use prelude::{ExtractionConfig, StudyError, StudyResult};
