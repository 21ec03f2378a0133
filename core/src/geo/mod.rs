pub mod buffer;
pub mod grid;
pub mod point;
pub mod site;

pub use buffer::BufferZone;
pub use grid::{BoundingBox, FilterSummary, MissingValue, PixelGrid, PixelRecord, RawPixel};
pub use point::GeoPoint;
pub use site::Site;
