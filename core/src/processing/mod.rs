pub mod extraction;
pub mod resolution;

pub use extraction::{extract_within_radius, BufferExtractor, Extracted, NestedExtraction};
pub use resolution::{estimate_resolution, ResolutionEstimator, ResolutionResult};
