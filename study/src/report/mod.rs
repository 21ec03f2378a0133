pub mod bridge;
pub mod export;
pub mod model;
