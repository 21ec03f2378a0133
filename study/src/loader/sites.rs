use anyhow::{bail, Context};
use csv::ReaderBuilder;
use sitecore::geo::site::SiteRecord;
use sitecore::geo::Site;
use std::fs;
use std::path::Path;

/// Reads a site table. `.yaml`/`.yml` and `.json` hold a list of
/// `{label, lon, lat}`; `.csv` needs a `label,lon,lat` header.
pub fn load_sites<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<Site>> {
    let path_ref = path.as_ref();
    let contents = fs::read_to_string(path_ref)
        .with_context(|| format!("reading site table {}", path_ref.display()))?;
    let extension = path_ref
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    let sites = match extension.as_str() {
        "yaml" | "yml" => serde_yaml::from_str::<Vec<Site>>(&contents)
            .with_context(|| format!("parsing site table {}", path_ref.display()))?,
        "json" => serde_json::from_str::<Vec<Site>>(&contents)
            .with_context(|| format!("parsing site table {}", path_ref.display()))?,
        "csv" => parse_site_csv(&contents)
            .with_context(|| format!("parsing site table {}", path_ref.display()))?,
        other => bail!(
            "unsupported site table format '{}' for {}",
            other,
            path_ref.display()
        ),
    };
    Ok(sites)
}

fn parse_site_csv(contents: &str) -> anyhow::Result<Vec<Site>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(contents.as_bytes());
    rdr.deserialize::<SiteRecord>()
        .enumerate()
        .map(|(row, record)| {
            let record = record.with_context(|| format!("site row {}", row + 1))?;
            Site::try_from(record).with_context(|| format!("site row {}", row + 1))
        })
        .collect()
}
