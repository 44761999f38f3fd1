//! City list loading

use crate::error::{Error, Result};
use crate::types::CityId;
use std::path::Path;

/// Parse a list of city ids
///
/// Ids may be separated by newlines, commas, or both. Surrounding whitespace,
/// blank entries and `#` comments are ignored; order and duplicates are
/// preserved.
///
/// # Examples
///
/// ```
/// use weather_collector::utils::parse_city_ids;
///
/// let ids = parse_city_ids("3439525, 3439781\n3440645").unwrap();
/// assert_eq!(ids, vec![3439525, 3439781, 3440645]);
/// ```
pub fn parse_city_ids(content: &str) -> Result<Vec<CityId>> {
    let mut ids = Vec::new();

    for (line_no, line) in content.lines().enumerate() {
        let line = line.split('#').next().unwrap_or_default();
        for entry in line.split(',') {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            let id = entry.parse::<CityId>().map_err(|e| Error::Config {
                message: format!("invalid city id {entry:?} on line {}: {e}", line_no + 1),
                key: Some("cities_path".into()),
            })?;
            ids.push(id);
        }
    }

    Ok(ids)
}

/// Read and parse the city id file at `path`
pub async fn load_cities(path: &Path) -> Result<Vec<CityId>> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "failed to read city list");
        Error::Io(e)
    })?;

    let ids = parse_city_ids(&content)?;
    tracing::info!(path = %path.display(), cities = ids.len(), "loaded city list");
    Ok(ids)
}
