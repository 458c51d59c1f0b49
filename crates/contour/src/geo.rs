//! Grid-index to geographic coordinate transform.
//!
//! Maps contour rings back onto the lat/lng lattice they were sampled
//! from and tags each polygon with its severity color and popup label.
//! Both step sizes are positive, so ring winding survives the
//! transform: outer rings stay counter-clockwise in (lng, lat),
//! matching the GeoJSON convention.

use aqi_common::severity::{classify, Rgb};
use aqi_common::DenseGrid;
use serde::{Deserialize, Serialize};

use crate::ring::{ContourPolygon, Ring};

/// A geographic coordinate pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// A contour polygon in geographic coordinates, ready for the map
/// rendering collaborator. Transient: rebuilt on every refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoPolygon {
    /// The threshold level this polygon bounds.
    pub value: f64,
    /// Severity color shared with the legend.
    pub color: Rgb,
    /// Popup label, e.g. "AQI Zone: 300+".
    pub label: String,
    pub outer: Vec<LatLng>,
    pub holes: Vec<Vec<LatLng>>,
}

/// Transform one contour polygon into geographic space.
pub fn to_geographic(polygon: &ContourPolygon, grid: &DenseGrid) -> GeoPolygon {
    GeoPolygon {
        value: polygon.value,
        color: classify(polygon.value),
        label: format!("AQI Zone: {}+", format_level(polygon.value)),
        outer: ring_to_geo(&polygon.outer, grid),
        holes: polygon.holes.iter().map(|h| ring_to_geo(h, grid)).collect(),
    }
}

/// Transform a full refresh cycle's polygons.
pub fn to_geographic_all(polygons: &[ContourPolygon], grid: &DenseGrid) -> Vec<GeoPolygon> {
    polygons.iter().map(|p| to_geographic(p, grid)).collect()
}

fn ring_to_geo(ring: &Ring, grid: &DenseGrid) -> Vec<LatLng> {
    ring.points
        .iter()
        .map(|p| {
            let (lat, lng) = grid.index_to_geo(p.x, p.y);
            LatLng { lat, lng }
        })
        .collect()
}

fn format_level(level: f64) -> String {
    if level.fract().abs() < 0.01 {
        format!("{:.0}", level)
    } else {
        format!("{:.1}", level)
    }
}
