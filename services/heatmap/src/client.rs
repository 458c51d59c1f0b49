//! HTTP client for the backend hotspot grid endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use aqi_common::grid::{DEFAULT_LAT_STEP, DEFAULT_LNG_STEP};
use aqi_common::{AqiError, AqiResult, GridSample, GridSpec};

/// Payload of `GET /hotspots`.
///
/// The pipeline treats this as opaque input: serde fills in what the
/// backend omits and the grid indexer drops whatever is unusable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GridResponse {
    #[serde(default)]
    pub grid: Vec<GridSample>,
    #[serde(default)]
    pub lat_step: Option<f64>,
    #[serde(default)]
    pub lng_step: Option<f64>,
    #[serde(default)]
    pub grid_points: Option<usize>,
}

impl GridResponse {
    /// Grid spacing, defaulting where the backend left the steps out.
    pub fn spec(&self) -> GridSpec {
        GridSpec::new(
            self.lat_step.unwrap_or(DEFAULT_LAT_STEP),
            self.lng_step.unwrap_or(DEFAULT_LNG_STEP),
        )
        .sanitized()
    }
}

/// Source of hotspot grids. The seam between the refresh engine and
/// the backend; tests substitute their own implementation.
#[async_trait]
pub trait GridSource: Send + Sync {
    async fn fetch_grid(&self) -> AqiResult<GridResponse>;
}

/// Production source backed by the backend HTTP API.
pub struct HttpGridSource {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpGridSource {
    pub fn new(base_url: &str) -> AqiResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AqiError::InternalError(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}/hotspots", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl GridSource for HttpGridSource {
    async fn fetch_grid(&self) -> AqiResult<GridResponse> {
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| AqiError::BackendError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AqiError::BackendError(format!(
                "{} returned {}",
                self.endpoint, status
            )));
        }

        let body: GridResponse = response
            .json()
            .await
            .map_err(|e| AqiError::DecodeError(e.to_string()))?;

        debug!(
            samples = body.grid.len(),
            lat_step = body.lat_step,
            lng_step = body.lng_step,
            "fetched hotspot grid"
        );

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_defaults_missing_steps() {
        let json = r#"{"grid":[{"lat":28.6,"lng":77.2,"aqi":340}]}"#;
        let response: GridResponse = serde_json::from_str(json).unwrap();
        let spec = response.spec();

        assert_eq!(spec.lat_step, DEFAULT_LAT_STEP);
        assert_eq!(spec.lng_step, DEFAULT_LNG_STEP);
        assert_eq!(response.grid.len(), 1);
    }

    #[test]
    fn test_response_uses_backend_steps() {
        let json = r#"{"grid":[],"lat_step":0.05,"lng_step":0.05,"grid_points":0}"#;
        let response: GridResponse = serde_json::from_str(json).unwrap();
        let spec = response.spec();

        assert_eq!(spec.lat_step, 0.05);
        assert_eq!(spec.lng_step, 0.05);
    }

    #[test]
    fn test_zero_step_sanitized() {
        let json = r#"{"grid":[],"lat_step":0.0,"lng_step":-1.0}"#;
        let response: GridResponse = serde_json::from_str(json).unwrap();
        let spec = response.spec();

        assert_eq!(spec.lat_step, DEFAULT_LAT_STEP);
        assert_eq!(spec.lng_step, DEFAULT_LNG_STEP);
    }
}
