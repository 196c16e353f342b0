//! Grid and route geometry.

use common::{Coordinate, Error, Result};

/// Mean Earth radius used for great-circle distances (km).
pub const EARTH_RADIUS_KM: f64 = 6371.0;
/// Kilometres per degree of latitude (and of longitude at the equator).
pub const KM_PER_DEGREE: f64 = 111.0;

pub const MIN_RADIUS_KM: f64 = 1.0;
pub const MAX_RADIUS_KM: f64 = 200.0;
pub const MIN_GRID_SIZE: usize = 3;
pub const MAX_GRID_SIZE: usize = 10;

// Keeps the longitude span finite at the poles.
const MIN_COS_LAT: f64 = 1e-6;

/// A generated grid cell, row-major from the south-west corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCell {
    pub row: usize,
    pub col: usize,
    pub coordinate: Coordinate,
}

/// `size × size` cells spanning `radius_km` either side of `center`.
///
/// Offsets are symmetric around the center, so the unwrapped mean of all
/// cell coordinates is the center itself. Emitted longitudes are wrapped
/// into [-180, 180) and latitudes clamped to the poles.
pub fn generate_grid(center: Coordinate, radius_km: f64, size: usize) -> Result<Vec<GridCell>> {
    center.validate()?;
    if !(MIN_RADIUS_KM..=MAX_RADIUS_KM).contains(&radius_km) {
        return Err(Error::InvalidInput(format!(
            "radius_km must be between {MIN_RADIUS_KM} and {MAX_RADIUS_KM}, got {radius_km}"
        )));
    }
    if !(MIN_GRID_SIZE..=MAX_GRID_SIZE).contains(&size) {
        return Err(Error::InvalidInput(format!(
            "grid_size must be between {MIN_GRID_SIZE} and {MAX_GRID_SIZE}, got {size}"
        )));
    }

    let lat_range = radius_km / KM_PER_DEGREE;
    let cos_lat = center.lat.to_radians().cos().abs().max(MIN_COS_LAT);
    let lon_range = lat_range / cos_lat;

    let steps = (size - 1) as f64;
    let lat_step = 2.0 * lat_range / steps;
    let lon_step = 2.0 * lon_range / steps;

    let mut cells = Vec::with_capacity(size * size);
    for row in 0..size {
        let lat = (center.lat - lat_range + row as f64 * lat_step).clamp(-90.0, 90.0);
        for col in 0..size {
            let lon = wrap_longitude(center.lon - lon_range + col as f64 * lon_step);
            cells.push(GridCell {
                row,
                col,
                coordinate: Coordinate::new(lat, lon),
            });
        }
    }
    Ok(cells)
}

/// Longitude folded into [-180, 180).
pub fn wrap_longitude(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

/// `waypoints + 1` points by straight-line interpolation of lat/lon.
///
/// Endpoints are copied exactly. Interpolation is planar, not great-circle.
pub fn interpolate_route(start: Coordinate, end: Coordinate, waypoints: usize) -> Result<Vec<Coordinate>> {
    start.validate()?;
    end.validate()?;
    if waypoints == 0 {
        return Err(Error::InvalidInput("waypoints must be at least 1".into()));
    }

    let points = (0..=waypoints)
        .map(|i| {
            if i == 0 {
                start
            } else if i == waypoints {
                end
            } else {
                let t = i as f64 / waypoints as f64;
                Coordinate::new(
                    start.lat + (end.lat - start.lat) * t,
                    start.lon + (end.lon - start.lon) * t,
                )
            }
        })
        .collect();
    Ok(points)
}

/// Great-circle distance (km).
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
