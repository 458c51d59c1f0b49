//! Service configuration.

use std::time::Duration;

use aqi_common::severity::aqi_thresholds;

/// Runtime configuration for the heatmap service.
#[derive(Debug, Clone)]
pub struct HeatmapConfig {
    /// Base URL of the backend integration layer.
    pub backend_url: String,
    /// Time between refresh cycles in continuous mode.
    pub poll_interval: Duration,
    /// Contour levels to extract each cycle.
    pub thresholds: Vec<f64>,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8000".to_string(),
            poll_interval: Duration::from_secs(60),
            thresholds: aqi_thresholds(),
        }
    }
}
