pub mod grid;
pub mod sites;
pub mod synthetic;
