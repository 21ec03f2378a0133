use crate::geo::grid::PixelRecord;
use crate::geo::site::Site;
use crate::math::distance::DistanceMetric;
use crate::prelude::{validate_radius, ExtractionConfig, StudyResult};
use crate::telemetry::log::LogManager;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// A candidate pixel that fell inside a buffer pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extracted {
    /// Position of the pixel in the candidate slice.
    pub index: usize,
    pub pixel: PixelRecord,
    pub site_index: usize,
    pub nearest_site: String,
    /// Distance to the nearest site, in the unit of the metric.
    pub distance: f64,
}

/// Near and far buffer results over the same inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedExtraction {
    pub near_radius: f64,
    pub far_radius: f64,
    pub metric: DistanceMetric,
    pub near: Vec<Extracted>,
    pub far: Vec<Extracted>,
}

/// Selects candidate pixels whose nearest site lies within a radius.
#[derive(Debug, Clone)]
pub struct BufferExtractor {
    metric: DistanceMetric,
    logger: LogManager,
}

impl BufferExtractor {
    pub fn new(metric: DistanceMetric) -> Self {
        Self {
            metric,
            logger: LogManager::new("extraction"),
        }
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Lazily yields matches in candidate order. The radius is checked up
    /// front; no sites means no matches.
    pub fn iter_within_radius<'a>(
        &self,
        sites: &'a [Site],
        candidates: &'a [PixelRecord],
        radius: f64,
    ) -> StudyResult<impl Iterator<Item = Extracted> + 'a> {
        validate_radius(radius)?;
        let metric = self.metric;
        Ok(candidates
            .iter()
            .enumerate()
            .filter_map(move |(index, pixel)| {
                match_candidate(metric, sites, index, pixel, radius)
            }))
    }

    pub fn extract_within_radius(
        &self,
        sites: &[Site],
        candidates: &[PixelRecord],
        radius: f64,
    ) -> StudyResult<Vec<Extracted>> {
        let matches: Vec<Extracted> = self.iter_within_radius(sites, candidates, radius)?.collect();
        self.log_pass(sites.len(), candidates.len(), radius, matches.len());
        Ok(matches)
    }

    /// Same result as [`extract_within_radius`](Self::extract_within_radius)
    /// with the per-candidate checks spread over the rayon pool.
    pub fn extract_parallel(
        &self,
        sites: &[Site],
        candidates: &[PixelRecord],
        radius: f64,
    ) -> StudyResult<Vec<Extracted>> {
        validate_radius(radius)?;
        let metric = self.metric;
        let matches: Vec<Extracted> = candidates
            .par_iter()
            .enumerate()
            .filter_map(|(index, pixel)| match_candidate(metric, sites, index, pixel, radius))
            .collect();
        self.log_pass(sites.len(), candidates.len(), radius, matches.len());
        Ok(matches)
    }

    /// Runs the near and far passes independently.
    pub fn extract_nested(
        &self,
        sites: &[Site],
        candidates: &[PixelRecord],
        near_radius: f64,
        far_radius: f64,
    ) -> StudyResult<NestedExtraction> {
        let near = self.extract_within_radius(sites, candidates, near_radius)?;
        let far = self.extract_within_radius(sites, candidates, far_radius)?;
        Ok(NestedExtraction {
            near_radius,
            far_radius,
            metric: self.metric,
            near,
            far,
        })
    }

    fn log_pass(&self, sites: usize, candidates: usize, radius: f64, matched: usize) {
        if sites == 0 && candidates > 0 {
            self.logger.caution("no sites supplied; extraction pass is empty");
        }
        self.logger.record(&format!(
            "radius {} {}: {}/{} candidates within reach of {} sites",
            radius,
            self.metric.unit(),
            matched,
            candidates,
            sites
        ));
    }
}

impl From<&ExtractionConfig> for BufferExtractor {
    fn from(config: &ExtractionConfig) -> Self {
        Self::new(config.metric)
    }
}

pub fn extract_within_radius(
    sites: &[Site],
    candidates: &[PixelRecord],
    radius: f64,
    metric: DistanceMetric,
) -> StudyResult<Vec<Extracted>> {
    BufferExtractor::new(metric).extract_within_radius(sites, candidates, radius)
}

/// Nearest site by index and distance; ties keep the earlier site.
fn nearest_site(
    metric: DistanceMetric,
    sites: &[Site],
    pixel: &PixelRecord,
) -> Option<(usize, f64)> {
    sites
        .iter()
        .enumerate()
        .map(|(idx, site)| (idx, metric.distance(site.point(), &pixel.point)))
        .fold(None, |best, (idx, distance)| match best {
            Some((_, best_distance)) if best_distance <= distance => best,
            _ => Some((idx, distance)),
        })
}

fn match_candidate(
    metric: DistanceMetric,
    sites: &[Site],
    index: usize,
    pixel: &PixelRecord,
    radius: f64,
) -> Option<Extracted> {
    let (site_index, distance) = nearest_site(metric, sites, pixel)?;
    if distance > radius {
        return None;
    }
    Some(Extracted {
        index,
        pixel: *pixel,
        site_index,
        nearest_site: sites[site_index].label().to_string(),
        distance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::grid::PixelGrid;
    use crate::geo::point::GeoPoint;
    use crate::prelude::StudyError;

    fn sites() -> Vec<Site> {
        vec![
            Site::new("A1", 9.70, 4.05).unwrap(),
            Site::new("B2", 10.10, 3.90).unwrap(),
        ]
    }

    fn lattice() -> PixelGrid {
        let mut points = Vec::new();
        for i in 0..30 {
            for j in 0..30 {
                let lon = 9.5 + i as f64 * 0.025;
                let lat = 3.7 + j as f64 * 0.025;
                points.push(GeoPoint::new(lon, lat).unwrap());
            }
        }
        PixelGrid::from_points(points)
    }

    fn ids(matches: &[Extracted]) -> Vec<u64> {
        matches.iter().map(|m| m.pixel.id).collect()
    }

    #[test]
    fn near_buffer_is_subset_of_far_buffer() {
        let grid = lattice();
        for metric in [DistanceMetric::Haversine, DistanceMetric::PlanarDegrees] {
            let extractor = BufferExtractor::new(metric);
            let radii = match metric {
                DistanceMetric::Haversine => [1.0, 5.0, 10.0, 20.0],
                DistanceMetric::PlanarDegrees => [0.01, 0.045, 0.09, 0.2],
            };
            for pair in radii.windows(2) {
                let small = extractor
                    .extract_within_radius(&sites(), grid.records(), pair[0])
                    .unwrap();
                let large = extractor
                    .extract_within_radius(&sites(), grid.records(), pair[1])
                    .unwrap();
                assert!(small.len() <= large.len());
                let large_ids = ids(&large);
                assert!(ids(&small).iter().all(|id| large_ids.contains(id)));
            }
        }
    }

    #[test]
    fn no_sites_yields_nothing() {
        let grid = lattice();
        let matches =
            extract_within_radius(&[], grid.records(), 10.0, DistanceMetric::Haversine).unwrap();
        assert!(matches.is_empty());
    }

    #[test]
    fn no_candidates_yields_nothing() {
        let matches =
            extract_within_radius(&sites(), &[], 10.0, DistanceMetric::Haversine).unwrap();
        assert!(matches.is_empty());
    }

    #[test]
    fn non_positive_radius_is_rejected() {
        let grid = lattice();
        let extractor = BufferExtractor::new(DistanceMetric::Haversine);
        for radius in [0.0, -1.0, f64::NAN] {
            assert!(matches!(
                extractor.extract_within_radius(&sites(), grid.records(), radius),
                Err(StudyError::Validation(_))
            ));
            assert!(extractor.iter_within_radius(&[], &[], radius).is_err());
        }
    }

    #[test]
    fn every_match_is_within_radius_of_its_nearest_site() {
        let grid = lattice();
        let site_list = sites();
        let matches =
            extract_within_radius(&site_list, grid.records(), 5.0, DistanceMetric::Haversine)
                .unwrap();
        assert!(!matches.is_empty());
        for m in &matches {
            assert!(m.distance <= 5.0);
            assert_eq!(m.nearest_site, site_list[m.site_index].label());
            assert_eq!(grid.records()[m.index], m.pixel);
            let direct = DistanceMetric::Haversine
                .distance(site_list[m.site_index].point(), &m.pixel.point);
            assert_eq!(direct, m.distance);
        }
        let matched: Vec<u64> = ids(&matches);
        for record in grid.iter().filter(|r| !matched.contains(&r.id)) {
            assert!(site_list
                .iter()
                .all(|s| DistanceMetric::Haversine.distance(s.point(), &record.point) > 5.0));
        }
    }

    #[test]
    fn matches_follow_candidate_order() {
        let grid = lattice();
        let matches =
            extract_within_radius(&sites(), grid.records(), 10.0, DistanceMetric::Haversine)
                .unwrap();
        assert!(matches.windows(2).all(|w| w[0].index < w[1].index));
    }

    #[test]
    fn tie_goes_to_first_site() {
        let twins = vec![
            Site::new("east", 0.1, 0.0).unwrap(),
            Site::new("west", -0.1, 0.0).unwrap(),
        ];
        let grid = PixelGrid::from_points(vec![GeoPoint::new(0.0, 0.0).unwrap()]);
        let matches =
            extract_within_radius(&twins, grid.records(), 0.2, DistanceMetric::PlanarDegrees)
                .unwrap();
        assert_eq!(matches[0].nearest_site, "east");
    }

    #[test]
    fn repeated_calls_are_identical() {
        let grid = lattice();
        let extractor = BufferExtractor::new(DistanceMetric::Haversine);
        let first = extractor.extract_nested(&sites(), grid.records(), 5.0, 10.0).unwrap();
        let second = extractor.extract_nested(&sites(), grid.records(), 5.0, 10.0).unwrap();
        assert_eq!(first, second);
        assert!(first.near.len() <= first.far.len());
    }

    #[test]
    fn parallel_matches_sequential() {
        let grid = lattice();
        let extractor = BufferExtractor::new(DistanceMetric::Haversine);
        let sequential = extractor.extract_within_radius(&sites(), grid.records(), 10.0).unwrap();
        let parallel = extractor.extract_parallel(&sites(), grid.records(), 10.0).unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn lazy_iterator_can_stop_early() {
        let grid = lattice();
        let extractor = BufferExtractor::new(DistanceMetric::Haversine);
        let first_two: Vec<_> = extractor
            .iter_within_radius(&sites(), grid.records(), 10.0)
            .unwrap()
            .take(2)
            .collect();
        assert_eq!(first_two.len(), 2);
    }
}
