//! Refresh engine: one fetch-to-layer cycle per invocation.
//!
//! Each refresh owns a fresh set of derived structures (dense grid,
//! rings, polygons); nothing is shared across cycles except the id of
//! the layer currently attached to the sink. Ordering guarantee:
//! last-requested-wins. A refresh that starts after another can never
//! have its result overwritten by the earlier one's late response.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{debug, info};

use aqi_common::{AqiError, AqiResult, DenseGrid};
use contour::{generate_contours, to_geographic_all};

use crate::client::{GridResponse, GridSource};
use crate::layer::{LayerId, LayerSink, RenderedLayer};

/// Result of one refresh cycle.
#[derive(Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The cycle's polygons were attached to the sink.
    Rendered { generation: u64, polygons: usize },
    /// A newer refresh started while this one was in flight; its
    /// response was discarded without touching the attached layer.
    Superseded { generation: u64 },
}

struct EngineState {
    sink: Box<dyn LayerSink>,
    attached: Option<LayerId>,
}

/// Drives the fetch -> index -> contour -> transform -> attach cycle.
///
/// Clone-cheap: clones share the generation counter and the attached
/// layer, so concurrent refreshes race correctly.
pub struct RefreshEngine {
    source: Arc<dyn GridSource>,
    thresholds: Arc<Vec<f64>>,
    generation: Arc<AtomicU64>,
    state: Arc<Mutex<EngineState>>,
}

impl Clone for RefreshEngine {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            thresholds: Arc::clone(&self.thresholds),
            generation: Arc::clone(&self.generation),
            state: Arc::clone(&self.state),
        }
    }
}

impl RefreshEngine {
    pub fn new(
        source: Arc<dyn GridSource>,
        sink: Box<dyn LayerSink>,
        thresholds: Vec<f64>,
    ) -> Self {
        Self {
            source,
            thresholds: Arc::new(thresholds),
            generation: Arc::new(AtomicU64::new(0)),
            state: Arc::new(Mutex::new(EngineState {
                sink,
                attached: None,
            })),
        }
    }

    /// Run one refresh cycle.
    ///
    /// A fetch failure is recoverable: the error is surfaced and the
    /// previously attached layer stays in place.
    pub async fn refresh(&self) -> AqiResult<RefreshOutcome> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(generation, "refresh cycle started");

        let response = self.source.fetch_grid().await?;

        // A newer refresh was requested while we waited; our response
        // is stale even if it arrived last.
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(generation, "refresh superseded during fetch");
            return Ok(RefreshOutcome::Superseded { generation });
        }

        let layer = build_layer(generation, &response, &self.thresholds);
        let polygons = layer.polygons.len();

        let mut state = self
            .state
            .lock()
            .map_err(|_| AqiError::InternalError("layer state poisoned".to_string()))?;

        // Re-check under the lock so two cycles cannot both attach.
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(generation, "refresh superseded before attach");
            return Ok(RefreshOutcome::Superseded { generation });
        }

        if let Some(old) = state.attached.take() {
            state.sink.detach(old);
        }
        let id = state.sink.attach(layer);
        state.attached = Some(id);

        info!(generation, polygons, "refresh cycle attached new layer");
        Ok(RefreshOutcome::Rendered {
            generation,
            polygons,
        })
    }
}

/// Run the synchronous pipeline for one response.
fn build_layer(generation: u64, response: &GridResponse, thresholds: &[f64]) -> RenderedLayer {
    let grid = DenseGrid::from_samples(&response.grid, response.spec());
    let polygons = generate_contours(&grid, thresholds);
    let polygons = to_geographic_all(&polygons, &grid);

    RenderedLayer {
        generation,
        refreshed_at: Utc::now(),
        polygons,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aqi_common::severity::aqi_thresholds;
    use aqi_common::GridSample;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    /// Sink that records layer turnover into shared state.
    #[derive(Default)]
    struct SinkLog {
        next_id: LayerId,
        attached: Vec<(LayerId, u64, usize)>,
        detached: Vec<LayerId>,
    }

    struct RecordingSink(Arc<Mutex<SinkLog>>);

    impl LayerSink for RecordingSink {
        fn attach(&mut self, layer: RenderedLayer) -> LayerId {
            let mut log = self.0.lock().unwrap();
            log.next_id += 1;
            let id = log.next_id;
            log.attached
                .push((id, layer.generation, layer.polygons.len()));
            id
        }

        fn detach(&mut self, id: LayerId) {
            self.0.lock().unwrap().detached.push(id);
        }
    }

    fn peak_response() -> GridResponse {
        let mut grid = Vec::new();
        for row in 0..3 {
            for col in 0..3 {
                let aqi = if row == 1 && col == 1 { 400.0 } else { 10.0 };
                grid.push(GridSample::new(row as f64, col as f64, aqi));
            }
        }
        GridResponse {
            grid,
            lat_step: Some(1.0),
            lng_step: Some(1.0),
            grid_points: Some(9),
        }
    }

    /// First call blocks until released, later calls return at once.
    struct SlowFirstSource {
        calls: AtomicUsize,
        release: Notify,
    }

    #[async_trait]
    impl GridSource for SlowFirstSource {
        async fn fetch_grid(&self) -> AqiResult<GridResponse> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                self.release.notified().await;
            }
            Ok(peak_response())
        }
    }

    struct StaticSource(GridResponse);

    #[async_trait]
    impl GridSource for StaticSource {
        async fn fetch_grid(&self) -> AqiResult<GridResponse> {
            Ok(self.0.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl GridSource for FailingSource {
        async fn fetch_grid(&self) -> AqiResult<GridResponse> {
            Err(AqiError::BackendError("connection refused".to_string()))
        }
    }

    fn engine_with_log(source: Arc<dyn GridSource>) -> (RefreshEngine, Arc<Mutex<SinkLog>>) {
        let log = Arc::new(Mutex::new(SinkLog::default()));
        let sink = RecordingSink(Arc::clone(&log));
        let engine = RefreshEngine::new(source, Box::new(sink), aqi_thresholds());
        (engine, log)
    }

    #[tokio::test]
    async fn test_refresh_attaches_polygons() {
        let (engine, log) = engine_with_log(Arc::new(StaticSource(peak_response())));

        let outcome = engine.refresh().await.unwrap();
        match outcome {
            RefreshOutcome::Rendered { generation, polygons } => {
                assert_eq!(generation, 1);
                assert!(polygons > 0);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        let log = log.lock().unwrap();
        assert_eq!(log.attached.len(), 1);
        assert!(log.detached.is_empty());
    }

    #[tokio::test]
    async fn test_second_refresh_detaches_previous_layer_once() {
        let (engine, log) = engine_with_log(Arc::new(StaticSource(peak_response())));

        engine.refresh().await.unwrap();
        engine.refresh().await.unwrap();

        let log = log.lock().unwrap();
        assert_eq!(log.attached.len(), 2);
        assert_eq!(log.detached, vec![1]);
    }

    #[tokio::test]
    async fn test_stale_response_is_discarded() {
        let source = Arc::new(SlowFirstSource {
            calls: AtomicUsize::new(0),
            release: Notify::new(),
        });
        let (engine, log) = engine_with_log(source.clone());

        // First refresh parks inside the fetch
        let slow = tokio::spawn({
            let engine = engine.clone();
            async move { engine.refresh().await }
        });
        tokio::task::yield_now().await;

        // Second refresh completes while the first is still in flight
        let fast = engine.refresh().await.unwrap();
        assert!(matches!(fast, RefreshOutcome::Rendered { generation: 2, .. }));

        // Let the first fetch resolve late; it must be discarded
        source.release.notify_one();
        let slow = slow.await.unwrap().unwrap();
        assert_eq!(slow, RefreshOutcome::Superseded { generation: 1 });

        let log = log.lock().unwrap();
        assert_eq!(log.attached.len(), 1);
        assert_eq!(log.attached[0].1, 2, "only generation 2 may render");
        assert!(log.detached.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_previous_layer() {
        let (engine, log) = engine_with_log(Arc::new(StaticSource(peak_response())));
        engine.refresh().await.unwrap();

        let failing = RefreshEngine::new(
            Arc::new(FailingSource),
            Box::new(RecordingSink(Arc::clone(&log))),
            aqi_thresholds(),
        );
        let err = failing.refresh().await.unwrap_err();
        assert!(err.is_recoverable());

        // The original layer is still the only attachment
        let log = log.lock().unwrap();
        assert_eq!(log.attached.len(), 1);
        assert!(log.detached.is_empty());
    }

    #[tokio::test]
    async fn test_empty_grid_renders_empty_layer() {
        let (engine, log) = engine_with_log(Arc::new(StaticSource(GridResponse::default())));

        let outcome = engine.refresh().await.unwrap();
        assert!(matches!(
            outcome,
            RefreshOutcome::Rendered { polygons: 0, .. }
        ));
        assert_eq!(log.lock().unwrap().attached.len(), 1);
    }
}
