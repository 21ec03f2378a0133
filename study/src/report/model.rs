use crate::workflow::runner::WorkflowResult;
use serde::{Deserialize, Serialize};
use sitecore::geo::{FilterSummary, GeoPoint};
use sitecore::math::{DistanceMetric, DistanceStats};
use sitecore::processing::{Extracted, ResolutionResult};

/// One extracted pixel, flattened for coordinate lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedPoint {
    pub id: u64,
    pub lon: f64,
    pub lat: f64,
    pub site: String,
    pub distance: f64,
}

impl From<&Extracted> for ExtractedPoint {
    fn from(extracted: &Extracted) -> Self {
        Self {
            id: extracted.pixel.id,
            lon: extracted.pixel.point.lon(),
            lat: extracted.pixel.point.lat(),
            site: extracted.nearest_site.clone(),
            distance: extracted.distance,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BufferOutline {
    pub site: String,
    pub radius: f64,
    pub ring: Vec<GeoPoint>,
}

/// Everything a map renderer or export step needs from one study pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudyReport {
    pub resolution: Vec<ResolutionResult>,
    pub metric: DistanceMetric,
    pub near_radius: f64,
    pub far_radius: f64,
    pub candidates: usize,
    pub near: Vec<ExtractedPoint>,
    pub far: Vec<ExtractedPoint>,
    pub near_stats: DistanceStats,
    pub far_stats: DistanceStats,
    pub outlines: Vec<BufferOutline>,
    pub filter: FilterSummary,
}

impl StudyReport {
    pub fn from_result(result: &WorkflowResult) -> Self {
        let extraction = &result.extraction;
        let flatten = |matches: &[Extracted]| -> Vec<ExtractedPoint> {
            matches.iter().map(ExtractedPoint::from).collect()
        };
        let stats = |matches: &[Extracted]| {
            let distances: Vec<f64> = matches.iter().map(|m| m.distance).collect();
            DistanceStats::from_distances(&distances)
        };

        let mut outlines = Vec::with_capacity(result.outlines.len() * 2);
        for outline in &result.outlines {
            outlines.push(BufferOutline {
                site: outline.site.clone(),
                radius: extraction.near_radius,
                ring: outline.near.clone(),
            });
            outlines.push(BufferOutline {
                site: outline.site.clone(),
                radius: extraction.far_radius,
                ring: outline.far.clone(),
            });
        }

        Self {
            resolution: result.resolution.clone(),
            metric: extraction.metric,
            near_radius: extraction.near_radius,
            far_radius: extraction.far_radius,
            candidates: result.candidates,
            near: flatten(&extraction.near),
            far: flatten(&extraction.far),
            near_stats: stats(&extraction.near),
            far_stats: stats(&extraction.far),
            outlines,
            filter: result.filter,
        }
    }

    pub fn summary_line(&self) -> String {
        format!(
            "candidates {} -> near({} {}) {} pixels, far({} {}) {} pixels, rejected {}",
            self.candidates,
            self.near_radius,
            self.metric.unit(),
            self.near.len(),
            self.far_radius,
            self.metric.unit(),
            self.far.len(),
            self.filter.rejected()
        )
    }
}
