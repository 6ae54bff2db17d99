use serde::Serialize;

use crate::grid::GRID_RESOLUTION;

/// Surface-level forcing variables fetched for every month.
pub const SURFACE_VARIABLES: [&str; 4] = [
    "mean_surface_downward_long_wave_radiation_flux",
    "mean_surface_downward_short_wave_radiation_flux",
    "mean_total_precipitation_rate",
    "surface_pressure",
];

/// Keyword/value payload for one dataset retrieval, serialized as the JSON
/// request dict the CDS expects. Field names match the CDS keywords.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetrievalRequest {
    pub product_type: String,
    pub format: String,
    pub variable: Vec<String>,
    pub date: String,
    pub time: String,
    pub area: String,
    pub grid: String,
}

impl RetrievalRequest {
    /// Hourly ERA5 surface-level reanalysis over `area` for `date_range`
    /// (a `YYYY-MM-DD/YYYY-MM-DD` pair), as NetCDF on the native grid.
    pub fn surface(date_range: &str, area: &str) -> Self {
        Self {
            product_type: "reanalysis".to_string(),
            format: "netcdf".to_string(),
            variable: SURFACE_VARIABLES.iter().map(|v| v.to_string()).collect(),
            date: date_range.to_string(),
            time: hourly_times(),
            area: area.to_string(),
            grid: format!("{GRID_RESOLUTION}/{GRID_RESOLUTION}"),
        }
    }
}

/// All 24 analysis hours, slash-joined: `00:00/01:00/.../23:00`.
fn hourly_times() -> String {
    (0..24)
        .map(|hour| format!("{hour:02}:00"))
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_request_serializes_to_cds_keywords() {
        let request = RetrievalRequest::surface("2008-02-01/2008-02-29", "51.75/-116.5/51.0/-115.5");
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["product_type"], "reanalysis");
        assert_eq!(value["format"], "netcdf");
        assert_eq!(value["date"], "2008-02-01/2008-02-29");
        assert_eq!(value["area"], "51.75/-116.5/51.0/-115.5");
        assert_eq!(value["grid"], "0.25/0.25");
        assert_eq!(value["variable"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn time_spec_lists_every_hour() {
        let times = hourly_times();
        assert!(times.starts_with("00:00/01:00"));
        assert!(times.ends_with("22:00/23:00"));
        assert_eq!(times.split('/').count(), 24);
    }
}
