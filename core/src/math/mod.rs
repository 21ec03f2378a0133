pub mod distance;
pub mod stats;

pub use distance::{DistanceMetric, EARTH_RADIUS_KM};
pub use stats::DistanceStats;
