use crate::loader::synthetic::GridConfig;
use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};
use sitecore::geo::grid::{BoundingBox, MissingValue, DEFAULT_SENTINEL};
use sitecore::geo::Site;
use sitecore::math::DistanceMetric;
use sitecore::prelude::ExtractionConfig;
use std::fs;
use std::path::Path;

/// Buffer radii used when none are configured, in km.
pub const DEFAULT_NEAR_KM: f64 = 5.0;
pub const DEFAULT_FAR_KM: f64 = 10.0;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Sensor grid sampling interval in degrees.
    pub d_lat: f64,
    pub d_lon: f64,
    /// Latitudes for the resolution table.
    pub latitudes: Vec<f64>,
    /// Radii in the unit of `metric`. When unset, 5 km and 10 km are
    /// converted into that unit.
    pub near_radius: Option<f64>,
    pub far_radius: Option<f64>,
    pub metric: DistanceMetric,
    pub sentinel: f64,
    pub bounds: Option<BoundingBox>,
    pub sites: Vec<Site>,
    pub outline_vertices: usize,
    pub parallel: bool,
    /// Lattice used by `--synthetic` runs.
    pub synthetic: GridConfig,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            d_lat: 0.05,
            d_lon: 0.05,
            latitudes: vec![0.0],
            near_radius: None,
            far_radius: None,
            metric: DistanceMetric::Haversine,
            sentinel: DEFAULT_SENTINEL,
            bounds: None,
            sites: Vec::new(),
            outline_vertices: 64,
            parallel: false,
            synthetic: GridConfig::default(),
        }
    }
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        config
            .validate()
            .with_context(|| format!("validating workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(
        near_radius: Option<f64>,
        far_radius: Option<f64>,
        metric: DistanceMetric,
    ) -> Self {
        Self {
            near_radius,
            far_radius,
            metric,
            ..Default::default()
        }
    }

    pub fn near_radius(&self) -> f64 {
        self.near_radius
            .unwrap_or_else(|| self.metric.radius_from_km(DEFAULT_NEAR_KM))
    }

    pub fn far_radius(&self) -> f64 {
        self.far_radius
            .unwrap_or_else(|| self.metric.radius_from_km(DEFAULT_FAR_KM))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.to_extraction_config()?;
        ensure!(
            self.outline_vertices >= 3,
            "outline_vertices must be at least 3, got {}",
            self.outline_vertices
        );
        if let Some(bounds) = self.bounds {
            BoundingBox::new(bounds.min_lon, bounds.min_lat, bounds.max_lon, bounds.max_lat)
                .context("invalid region of interest")?;
        }
        Ok(())
    }

    pub fn to_extraction_config(&self) -> anyhow::Result<ExtractionConfig> {
        ExtractionConfig::new(self.near_radius(), self.far_radius(), self.metric)
            .context("invalid buffer radii")
    }

    pub fn missing_value(&self) -> MissingValue {
        MissingValue::new(self.sentinel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::synthetic::build_grid;
    use sitecore::geo::PixelGrid;
    use sitecore::math::distance::km_to_degrees;
    use sitecore::processing::BufferExtractor;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_from_args_produces_extraction_config() {
        let cfg =
            WorkflowConfig::from_args(Some(0.045), Some(0.09), DistanceMetric::PlanarDegrees);
        let extraction = cfg.to_extraction_config().unwrap();
        assert_eq!(extraction.far_radius, 0.09);
        assert_eq!(extraction.metric, DistanceMetric::PlanarDegrees);
    }

    #[test]
    fn default_radii_follow_metric_unit() {
        let km = WorkflowConfig::from_args(None, None, DistanceMetric::Haversine)
            .to_extraction_config()
            .unwrap();
        assert_eq!(km.near_radius, DEFAULT_NEAR_KM);
        assert_eq!(km.far_radius, DEFAULT_FAR_KM);

        let deg = WorkflowConfig::from_args(None, None, DistanceMetric::PlanarDegrees)
            .to_extraction_config()
            .unwrap();
        assert_eq!(deg.near_radius, km_to_degrees(DEFAULT_NEAR_KM));
        assert_eq!(deg.far_radius, km_to_degrees(DEFAULT_FAR_KM));
        assert!(deg.far_radius < 0.1);
    }

    #[test]
    fn explicit_radius_is_kept_as_given() {
        let cfg = WorkflowConfig::from_args(Some(0.02), None, DistanceMetric::PlanarDegrees);
        assert_eq!(cfg.near_radius(), 0.02);
        assert_eq!(cfg.far_radius(), km_to_degrees(DEFAULT_FAR_KM));
    }

    #[test]
    fn planar_defaults_select_haversine_pixels_near_equator() {
        let missing = MissingValue::default();
        let raws = build_grid(&GridConfig::default(), &missing).unwrap();
        let (grid, _) = PixelGrid::filter_raw(raws, &missing);
        let sites = vec![Site::new("A1", 9.70, 4.05).unwrap()];

        let passes: Vec<_> = [DistanceMetric::Haversine, DistanceMetric::PlanarDegrees]
            .into_iter()
            .map(|metric| {
                let cfg = WorkflowConfig::from_args(None, None, metric)
                    .to_extraction_config()
                    .unwrap();
                BufferExtractor::from(&cfg)
                    .extract_nested(&sites, grid.records(), cfg.near_radius, cfg.far_radius)
                    .unwrap()
            })
            .collect();
        let (geodesic, planar) = (&passes[0], &passes[1]);

        assert!(!planar.far.is_empty());
        assert!(planar.far.len() < grid.len());
        assert!(planar.near.len() <= planar.far.len());
        let geodesic_far: Vec<u64> = geodesic.far.iter().map(|m| m.pixel.id).collect();
        let overlap = planar
            .far
            .iter()
            .filter(|m| geodesic_far.contains(&m.pixel.id))
            .count();
        assert!(overlap + 2 >= geodesic.far.len());
        assert!(planar.far.len().abs_diff(geodesic.far.len()) <= 2 + geodesic.far.len() / 5);
    }

    #[test]
    fn config_load_rejects_degenerate_outline() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"outline_vertices: 2\n").unwrap();
        let path = temp.into_temp_path();
        assert!(WorkflowConfig::load(&path).is_err());
    }

    #[test]
    fn config_load_reads_synthetic_grid() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"synthetic:\n  spacing: 0.1\n  seed: 9\n").unwrap();
        let path = temp.into_temp_path();
        let cfg = WorkflowConfig::load(&path).unwrap();
        assert_eq!(cfg.synthetic.spacing, 0.1);
        assert_eq!(cfg.synthetic.seed, 9);
        assert_eq!(
            cfg.synthetic.missing_fraction,
            GridConfig::default().missing_fraction
        );
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        let yaml = concat!(
            "d_lat: 0.1\n",
            "latitudes: [0.0, 45.0]\n",
            "metric: planar-degrees\n",
            "near_radius: 0.05\n",
            "far_radius: 0.1\n",
            "sites:\n",
            "  - { label: A1, lon: 9.7, lat: 4.05 }\n",
        );
        temp.write_all(yaml.as_bytes()).unwrap();
        let path = temp.into_temp_path();
        let cfg = WorkflowConfig::load(&path).unwrap();
        assert_eq!(cfg.d_lat, 0.1);
        assert_eq!(cfg.d_lon, 0.05);
        assert_eq!(cfg.latitudes.len(), 2);
        assert_eq!(cfg.metric, DistanceMetric::PlanarDegrees);
        assert_eq!(cfg.sites[0].label(), "A1");
    }

    #[test]
    fn bundled_study_config_is_valid() {
        let cfg = WorkflowConfig::load(concat!(env!("CARGO_MANIFEST_DIR"), "/data/study.yaml"))
            .unwrap();
        assert_eq!(cfg.sites.len(), 2);
        assert!(cfg.bounds.is_some());
        assert_eq!(cfg.to_extraction_config().unwrap().near_radius, 5.0);
    }

    #[test]
    fn config_load_rejects_inverted_radii() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"near_radius: 10.0\nfar_radius: 5.0\n").unwrap();
        let path = temp.into_temp_path();
        assert!(WorkflowConfig::load(&path).is_err());
    }

    #[test]
    fn config_load_rejects_invalid_site() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"sites:\n  - { label: X, lon: 9.7, lat: 95.0 }\n")
            .unwrap();
        let path = temp.into_temp_path();
        assert!(WorkflowConfig::load(&path).is_err());
    }
}
