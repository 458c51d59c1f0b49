//! AQI heatmap refresh service.
//!
//! Pulls the hotspot grid from the backend, runs the contouring
//! pipeline, and keeps exactly one rendered layer attached to the map
//! collaborator. Refreshes are last-requested-wins: a newer refresh
//! always supersedes a slower, earlier one.

pub mod client;
pub mod config;
pub mod geojson;
pub mod layer;
pub mod refresh;
pub mod testdata;

pub use client::{GridResponse, GridSource, HttpGridSource};
pub use config::HeatmapConfig;
pub use layer::{LayerId, LayerSink, RenderedLayer};
pub use refresh::{RefreshEngine, RefreshOutcome};
