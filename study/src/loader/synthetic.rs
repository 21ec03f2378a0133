use anyhow::{ensure, Context};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use sitecore::geo::grid::{BoundingBox, MissingValue, RawPixel};

/// Configuration for generating a synthetic sensor lattice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub bounds: BoundingBox,
    /// Lattice step in degrees.
    pub spacing: f64,
    /// Maximum offset applied to each sample, as a fraction of `spacing`.
    pub jitter: f64,
    /// Share of samples replaced by the sentinel value.
    pub missing_fraction: f64,
    pub seed: u64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            bounds: BoundingBox {
                min_lon: 9.0,
                min_lat: 3.0,
                max_lon: 11.0,
                max_lat: 5.0,
            },
            spacing: 0.05,
            jitter: 0.1,
            missing_fraction: 0.02,
            seed: 0,
        }
    }
}

impl GridConfig {
    fn steps(&self, span: f64) -> usize {
        (span / self.spacing).floor() as usize + 1
    }
}

/// Builds raw samples row by row from the south-west corner. Missing samples
/// carry the sentinel so they exercise the same filtering as real rasters.
pub fn build_grid(config: &GridConfig, missing: &MissingValue) -> anyhow::Result<Vec<RawPixel>> {
    ensure!(
        config.spacing.is_finite() && config.spacing > 0.0,
        "grid spacing must be positive, got {}",
        config.spacing
    );
    ensure!(
        (0.0..=1.0).contains(&config.missing_fraction),
        "missing fraction must lie in [0, 1], got {}",
        config.missing_fraction
    );
    let bounds = config.bounds;
    let cols = config.steps(bounds.max_lon - bounds.min_lon);
    let rows = config.steps(bounds.max_lat - bounds.min_lat);
    let sample_count = cols
        .checked_mul(rows)
        .context("overflow computing sample count for synthetic grid")?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let max_offset = config.jitter.abs() * config.spacing;
    let mut samples = Vec::with_capacity(sample_count);

    for row in 0..rows {
        for col in 0..cols {
            let id = (row * cols + col) as u64;
            if config.missing_fraction > 0.0 && rng.gen_bool(config.missing_fraction) {
                samples.push(RawPixel {
                    id,
                    lon: missing.sentinel,
                    lat: missing.sentinel,
                });
                continue;
            }
            let (dx, dy) = if max_offset > 0.0 {
                (
                    rng.gen_range(-max_offset..max_offset),
                    rng.gen_range(-max_offset..max_offset),
                )
            } else {
                (0.0, 0.0)
            };
            samples.push(RawPixel {
                id,
                lon: bounds.min_lon + col as f64 * config.spacing + dx,
                lat: bounds.min_lat + row as f64 * config.spacing + dy,
            });
        }
    }

    Ok(samples)
}
