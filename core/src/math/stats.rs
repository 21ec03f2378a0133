use serde::{Deserialize, Serialize};

/// Summary of matched distances reported alongside an extraction pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DistanceStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl DistanceStats {
    pub fn from_distances(distances: &[f64]) -> Self {
        if distances.is_empty() {
            return Self::default();
        }
        let min = distances.iter().copied().fold(f64::INFINITY, f64::min);
        let max = distances.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = distances.iter().sum::<f64>() / distances.len() as f64;
        Self {
            count: distances.len(),
            min,
            max,
            mean,
        }
    }
}
