//! Common types shared across the airahead heatmap pipeline.

pub mod error;
pub mod grid;
pub mod severity;

pub use error::{AqiError, AqiResult};
pub use grid::{DenseGrid, GridSample, GridSpec};
pub use severity::{Rgb, SeverityBand};
