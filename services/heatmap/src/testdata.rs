//! Synthetic hotspot grids for offline operation and tests.
//!
//! Reproduces the backend's heatmap generator: inverse distance
//! weighting (power 2) of five Delhi monitoring stations over a 13x19
//! lattice spanning 28.40-28.88 lat, 76.85-77.55 lng.

use async_trait::async_trait;

use aqi_common::{AqiResult, GridSample};

use crate::client::{GridResponse, GridSource};

const STATIONS: [(f64, f64, f64); 5] = [
    (28.6139, 77.2090, 340.0),
    (28.5355, 77.3910, 310.0),
    (28.4595, 77.0266, 290.0),
    (28.4089, 77.3178, 280.0),
    (28.6692, 77.4538, 360.0),
];

const LAT_MIN: f64 = 28.40;
const LAT_MAX: f64 = 28.88;
const LNG_MIN: f64 = 76.85;
const LNG_MAX: f64 = 77.55;
const N_LAT: usize = 12;
const N_LNG: usize = 18;

/// IDW-interpolated AQI at one lattice point.
fn idw_aqi(lat: f64, lng: f64) -> f64 {
    let mut numerator = 0.0;
    let mut denominator = 0.0;

    for (s_lat, s_lng, s_aqi) in STATIONS {
        let dist = ((lat - s_lat).powi(2) + (lng - s_lng).powi(2)).sqrt();
        let weight = if dist == 0.0 { 1e9 } else { 1.0 / dist.powi(2) };
        numerator += weight * s_aqi;
        denominator += weight;
    }

    if denominator > 0.0 {
        (numerator / denominator).trunc()
    } else {
        0.0
    }
}

/// A full synthetic hotspot response, matching the backend's shape.
pub fn delhi_grid_response() -> GridResponse {
    let lat_step = (LAT_MAX - LAT_MIN) / N_LAT as f64;
    let lng_step = (LNG_MAX - LNG_MIN) / N_LNG as f64;

    let mut grid = Vec::with_capacity((N_LAT + 1) * (N_LNG + 1));
    for i in 0..=N_LAT {
        let lat = LAT_MIN + i as f64 * lat_step;
        for j in 0..=N_LNG {
            let lng = LNG_MIN + j as f64 * lng_step;
            grid.push(GridSample::new(lat, lng, idw_aqi(lat, lng)));
        }
    }

    let grid_points = grid.len();
    GridResponse {
        grid,
        lat_step: Some(lat_step),
        lng_step: Some(lng_step),
        grid_points: Some(grid_points),
    }
}

/// Grid source serving the synthetic Delhi grid, for `--offline` runs.
pub struct OfflineGridSource;

#[async_trait]
impl GridSource for OfflineGridSource {
    async fn fetch_grid(&self) -> AqiResult<GridResponse> {
        Ok(delhi_grid_response())
    }
}
