use anyhow::{anyhow, Context};
use csv::ReaderBuilder;
use log::{info, warn};
use sitecore::geo::grid::{FilterSummary, MissingValue, RawPixel};
use sitecore::geo::PixelGrid;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// A pixel grid read from disk with its filtering tallies.
#[derive(Debug, Clone)]
pub struct LoadedGrid {
    pub grid: PixelGrid,
    pub summary: FilterSummary,
    /// Rows whose coordinates could not be parsed at all.
    pub unparsed: usize,
}

/// Reads a pixel table with `lon` and `lat` columns and an optional `id`
/// column. The delimiter is `;` when the header carries one, `,` otherwise.
pub fn load_grid<P: AsRef<Path>>(path: P, missing: &MissingValue) -> anyhow::Result<LoadedGrid> {
    let path_ref = path.as_ref();
    let contents = fs::read_to_string(path_ref)
        .with_context(|| format!("reading pixel grid {}", path_ref.display()))?;
    let loaded = parse_grid(&contents, missing)
        .with_context(|| format!("parsing pixel grid {}", path_ref.display()))?;

    info!(
        "loaded {} pixels from {} ({} missing, {} out of range, {} unparsed)",
        loaded.grid.len(),
        path_ref.display(),
        loaded.summary.missing,
        loaded.summary.out_of_range,
        loaded.unparsed
    );
    Ok(loaded)
}

pub fn parse_grid(contents: &str, missing: &MissingValue) -> anyhow::Result<LoadedGrid> {
    let header_line = contents.lines().next().unwrap_or_default();
    let delimiter = if header_line.contains(';') { b';' } else { b',' };

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(contents.as_bytes());

    let header_map: HashMap<String, usize> = rdr
        .headers()?
        .iter()
        .enumerate()
        .map(|(idx, header)| (header.to_ascii_lowercase(), idx))
        .collect();

    let lon_index = *header_map
        .get("lon")
        .ok_or_else(|| anyhow!("column 'lon' not found"))?;
    let lat_index = *header_map
        .get("lat")
        .ok_or_else(|| anyhow!("column 'lat' not found"))?;
    let id_index = header_map.get("id").copied();

    let mut unparsed = 0usize;
    let mut raws = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let parsed = record.ok().and_then(|r| {
            let lon = r.get(lon_index)?.parse::<f64>().ok()?;
            let lat = r.get(lat_index)?.parse::<f64>().ok()?;
            let id = match id_index {
                Some(idx) => r.get(idx)?.parse::<u64>().ok()?,
                None => row as u64,
            };
            Some(RawPixel { id, lon, lat })
        });
        match parsed {
            Some(raw) => raws.push(raw),
            None => unparsed += 1,
        }
    }
    if unparsed > 0 {
        warn!("skipped {} unparseable pixel rows", unparsed);
    }

    let (grid, summary) = PixelGrid::filter_raw(raws, missing);
    Ok(LoadedGrid {
        grid,
        summary,
        unparsed,
    })
}
