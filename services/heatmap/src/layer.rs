//! Attached-layer bookkeeping at the map rendering boundary.

use chrono::{DateTime, Utc};
use contour::GeoPolygon;
use serde::Serialize;
use tracing::info;

/// Handle for a layer the sink currently displays.
pub type LayerId = u64;

/// One refresh cycle's worth of renderable polygons.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedLayer {
    /// Refresh generation that produced this layer.
    pub generation: u64,
    pub refreshed_at: DateTime<Utc>,
    pub polygons: Vec<GeoPolygon>,
}

/// The map rendering collaborator.
///
/// Contract: the engine detaches the previously attached layer exactly
/// once before attaching its replacement, so implementations never see
/// two live layers and stale overlays cannot accumulate.
pub trait LayerSink: Send {
    fn attach(&mut self, layer: RenderedLayer) -> LayerId;
    fn detach(&mut self, id: LayerId);
}

/// Sink that serializes each attached layer to GeoJSON on stdout.
/// Stands in for the interactive map when running headless.
pub struct GeoJsonStdoutSink {
    next_id: LayerId,
    emit: bool,
}

impl GeoJsonStdoutSink {
    /// `emit = false` only logs layer turnover without printing bodies.
    pub fn new(emit: bool) -> Self {
        Self { next_id: 0, emit }
    }
}

impl LayerSink for GeoJsonStdoutSink {
    fn attach(&mut self, layer: RenderedLayer) -> LayerId {
        self.next_id += 1;
        info!(
            layer_id = self.next_id,
            generation = layer.generation,
            polygons = layer.polygons.len(),
            "layer attached"
        );
        if self.emit {
            println!("{}", crate::geojson::layer_to_geojson(&layer));
        }
        self.next_id
    }

    fn detach(&mut self, id: LayerId) {
        info!(layer_id = id, "layer detached");
    }
}
