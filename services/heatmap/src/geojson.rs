//! GeoJSON serialization of rendered layers.
//!
//! Each contour polygon becomes one Feature with a Polygon geometry:
//! the outer ring first, hole rings after, every ring explicitly
//! closed, coordinates ordered `[lng, lat]` per RFC 7946.

use contour::{GeoPolygon, LatLng};
use serde_json::{json, Value};

use crate::layer::RenderedLayer;

/// Serialize a layer as a GeoJSON FeatureCollection.
pub fn layer_to_geojson(layer: &RenderedLayer) -> Value {
    let features: Vec<Value> = layer.polygons.iter().map(polygon_to_feature).collect();

    json!({
        "type": "FeatureCollection",
        "features": features,
        "properties": {
            "generation": layer.generation,
            "refreshed_at": layer.refreshed_at.to_rfc3339(),
        },
    })
}

fn polygon_to_feature(polygon: &GeoPolygon) -> Value {
    let mut rings = vec![ring_coordinates(&polygon.outer)];
    rings.extend(polygon.holes.iter().map(|h| ring_coordinates(h)));

    json!({
        "type": "Feature",
        "geometry": {
            "type": "Polygon",
            "coordinates": rings,
        },
        "properties": {
            "value": polygon.value,
            "color": polygon.color.hex(),
            "label": polygon.label,
        },
    })
}

fn ring_coordinates(ring: &[LatLng]) -> Vec<[f64; 2]> {
    let mut coords: Vec<[f64; 2]> = ring.iter().map(|p| [p.lng, p.lat]).collect();
    if let Some(&first) = coords.first() {
        coords.push(first);
    }
    coords
}
