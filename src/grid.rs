use std::fmt;

use crate::error::{Error, Result};

/// Spatial step of the published ERA5 grid, in degrees.
pub const GRID_RESOLUTION: f64 = 0.25;

/// Each grid point represents a cell extending half a step either side.
const HALF_CELL: f64 = GRID_RESOLUTION / 2.0;

/// Rectangular geographic extent, ordered the way the control file and the
/// CDS `area` keyword order it: `lat_max/lon_min/lat_min/lon_max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub lat_max: f64,
    pub lon_min: f64,
    pub lat_min: f64,
    pub lon_max: f64,
}

impl BoundingBox {
    pub fn new(lat_max: f64, lon_min: f64, lat_min: f64, lon_max: f64) -> Result<Self> {
        if lat_min > lat_max {
            return Err(Error::InvalidBoundingBox(format!(
                "lat_min {lat_min} is north of lat_max {lat_max}"
            )));
        }
        if lon_min > lon_max {
            return Err(Error::InvalidBoundingBox(format!(
                "lon_min {lon_min} is east of lon_max {lon_max}"
            )));
        }
        if !(-90.0..=90.0).contains(&lat_min) || !(-90.0..=90.0).contains(&lat_max) {
            return Err(Error::InvalidBoundingBox(format!(
                "latitudes must lie in [-90, 90], got {lat_min}/{lat_max}"
            )));
        }
        Ok(Self {
            lat_max,
            lon_min,
            lat_min,
            lon_max,
        })
    }

    /// Parse a `lat_max/lon_min/lat_min/lon_max` string, as stored under the
    /// `forcing_raw_space` setting.
    pub fn parse(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('/').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(Error::InvalidBoundingBox(format!(
                "expected `lat_max/lon_min/lat_min/lon_max`, got `{s}`"
            )));
        }

        let mut values = [0.0f64; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part.parse().map_err(|_| {
                Error::InvalidBoundingBox(format!("cannot parse coordinate `{part}`"))
            })?;
        }

        Self::new(values[0], values[1], values[2], values[3])
    }

    /// Snap the box outward to the 0.25-degree grid.
    ///
    /// Lower bounds are floored; a lower bound that sits more than half a
    /// cell past the floored line belongs to the next grid point's
    /// representative area and starts there instead. Upper bounds keep the
    /// plain ceiling, so the requested extent never loses a grid row or
    /// column the original box touches.
    pub fn snap_to_grid(&self) -> Self {
        Self {
            lat_max: snap_upper(self.lat_max),
            lon_min: snap_lower(self.lon_min),
            lat_min: snap_lower(self.lat_min),
            lon_max: snap_upper(self.lon_max),
        }
    }

    /// Format as the CDS `area` keyword: `lat_max/lon_min/lat_min/lon_max`.
    pub fn area_string(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            fmt_coord(self.lat_max),
            fmt_coord(self.lon_min),
            fmt_coord(self.lat_min),
            fmt_coord(self.lon_max)
        )
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.area_string())
    }
}

fn snap_lower(value: f64) -> f64 {
    let floored = (value / GRID_RESOLUTION).floor() * GRID_RESOLUTION;
    if value > floored + HALF_CELL {
        floored + GRID_RESOLUTION
    } else {
        floored
    }
}

fn snap_upper(value: f64) -> f64 {
    (value / GRID_RESOLUTION).ceil() * GRID_RESOLUTION
}

/// Grid coordinates always carry a decimal in the area string (`51.0`, not `51`).
fn fmt_coord(value: f64) -> String {
    let s = format!("{value}");
    if s.contains('.') { s } else { format!("{s}.0") }
}
