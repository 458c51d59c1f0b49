//! Grid types for geo-referenced AQI samples.
//!
//! The backend hotspot endpoint delivers an unordered list of point
//! samples on a regular lat/lng lattice. [`DenseGrid::from_samples`]
//! reconstructs the dense row-major matrix the contour generator needs.

use serde::{Deserialize, Serialize};

/// Default grid spacing used when the backend omits step sizes.
/// Matches the Delhi-region lattice: (28.88-28.40)/12 and (77.55-76.85)/18.
pub const DEFAULT_LAT_STEP: f64 = 0.04;
pub const DEFAULT_LNG_STEP: f64 = 0.039;

/// One geo-referenced AQI observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSample {
    pub lat: f64,
    pub lng: f64,
    pub aqi: f64,
}

impl GridSample {
    pub fn new(lat: f64, lng: f64, aqi: f64) -> Self {
        Self { lat, lng, aqi }
    }

    /// A sample is usable only if every field is a finite number.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite() && self.aqi.is_finite()
    }
}

/// Uniform spacing between adjacent grid rows/columns, in degrees.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GridSpec {
    pub lat_step: f64,
    pub lng_step: f64,
}

impl GridSpec {
    pub fn new(lat_step: f64, lng_step: f64) -> Self {
        Self { lat_step, lng_step }
    }

    /// Replace non-finite or non-positive steps with the defaults.
    ///
    /// A zero step would make every row index infinite; substituting the
    /// default keeps the pipeline alive on malformed upstream metadata.
    pub fn sanitized(self) -> Self {
        let lat_step = if self.lat_step.is_finite() && self.lat_step > 0.0 {
            self.lat_step
        } else {
            DEFAULT_LAT_STEP
        };
        let lng_step = if self.lng_step.is_finite() && self.lng_step > 0.0 {
            self.lng_step
        } else {
            DEFAULT_LNG_STEP
        };
        Self { lat_step, lng_step }
    }
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            lat_step: DEFAULT_LAT_STEP,
            lng_step: DEFAULT_LNG_STEP,
        }
    }
}

/// Dense row-major matrix of AQI values on a regular lat/lng lattice.
///
/// `values[row * n_cols + col]` holds the AQI for the cell at
/// `lat_min + row * lat_step`, `lng_min + col * lng_step`. Cells no
/// sample mapped to stay at 0.0, which can suppress contours in sparse
/// regions; that is a known limitation of the upstream data, not a bug.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseGrid {
    pub n_rows: usize,
    pub n_cols: usize,
    pub lat_min: f64,
    pub lng_min: f64,
    pub lat_step: f64,
    pub lng_step: f64,
    values: Vec<f64>,
}

impl DenseGrid {
    /// Build a dense grid from an unordered sample list.
    ///
    /// Row/column counts come from the distinct latitude and longitude
    /// values present in the samples. Each sample is assigned to the
    /// nearest cell by rounding; samples that round outside the matrix
    /// are dropped silently (tolerance for noisy upstream data). When
    /// several samples round to the same cell the last one wins.
    ///
    /// The result depends only on the set of samples, not their order,
    /// except for colliding samples as noted above.
    pub fn from_samples(samples: &[GridSample], spec: GridSpec) -> Self {
        let spec = spec.sanitized();

        let mut lats: Vec<f64> = samples
            .iter()
            .filter(|s| s.is_valid())
            .map(|s| s.lat)
            .collect();
        let mut lngs: Vec<f64> = samples
            .iter()
            .filter(|s| s.is_valid())
            .map(|s| s.lng)
            .collect();

        lats.sort_by(|a, b| a.total_cmp(b));
        lats.dedup();
        lngs.sort_by(|a, b| a.total_cmp(b));
        lngs.dedup();

        let n_rows = lats.len();
        let n_cols = lngs.len();
        let lat_min = lats.first().copied().unwrap_or(0.0);
        let lng_min = lngs.first().copied().unwrap_or(0.0);

        let mut values = vec![0.0; n_rows * n_cols];

        for sample in samples.iter().filter(|s| s.is_valid()) {
            let row = ((sample.lat - lat_min) / spec.lat_step).round();
            let col = ((sample.lng - lng_min) / spec.lng_step).round();

            if row < 0.0 || col < 0.0 {
                continue;
            }
            let (row, col) = (row as usize, col as usize);
            if row < n_rows && col < n_cols {
                values[row * n_cols + col] = sample.aqi;
            }
        }

        Self {
            n_rows,
            n_cols,
            lat_min,
            lng_min,
            lat_step: spec.lat_step,
            lng_step: spec.lng_step,
            values,
        }
    }

    /// Build a grid directly from row-major values. Used by tests and
    /// the synthetic data generator.
    pub fn from_values(
        n_rows: usize,
        n_cols: usize,
        lat_min: f64,
        lng_min: f64,
        spec: GridSpec,
        values: Vec<f64>,
    ) -> AqiGridResult {
        if values.len() != n_rows * n_cols {
            return Err(crate::AqiError::InvalidSample(format!(
                "expected {} values for {}x{} grid, got {}",
                n_rows * n_cols,
                n_rows,
                n_cols,
                values.len()
            )));
        }
        let spec = spec.sanitized();
        Ok(Self {
            n_rows,
            n_cols,
            lat_min,
            lng_min,
            lat_step: spec.lat_step,
            lng_step: spec.lng_step,
            values,
        })
    }

    /// Value at (row, col). Out-of-range indices return 0.0.
    pub fn value(&self, row: usize, col: usize) -> f64 {
        if row >= self.n_rows || col >= self.n_cols {
            return 0.0;
        }
        self.values[row * self.n_cols + col]
    }

    /// Row-major backing slice.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Largest cell value, or None for an empty grid.
    pub fn max_value(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::max)
    }

    /// Smallest cell value, or None for an empty grid.
    pub fn min_value(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::min)
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.n_rows * self.n_cols
    }

    /// A grid with no rows or no columns holds no data.
    pub fn is_empty(&self) -> bool {
        self.n_rows == 0 || self.n_cols == 0
    }

    /// Convert a fractional grid-index coordinate to geographic degrees.
    ///
    /// `x` runs along columns (longitude), `y` along rows (latitude).
    pub fn index_to_geo(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.lat_min + y * self.lat_step,
            self.lng_min + x * self.lng_step,
        )
    }

    /// Inverse of [`index_to_geo`](Self::index_to_geo).
    pub fn geo_to_index(&self, lat: f64, lng: f64) -> (f64, f64) {
        (
            (lng - self.lng_min) / self.lng_step,
            (lat - self.lat_min) / self.lat_step,
        )
    }
}

type AqiGridResult = Result<DenseGrid, crate::AqiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_sample_gives_1x1_grid() {
        let samples = [GridSample::new(28.61, 77.20, 340.0)];
        let grid = DenseGrid::from_samples(&samples, GridSpec::default());

        assert_eq!(grid.n_rows, 1);
        assert_eq!(grid.n_cols, 1);
        assert_eq!(grid.value(0, 0), 340.0);
    }

    #[test]
    fn test_empty_samples_give_empty_grid() {
        let grid = DenseGrid::from_samples(&[], GridSpec::default());
        assert!(grid.is_empty());
        assert_eq!(grid.len(), 0);
        assert!(grid.max_value().is_none());
    }

    #[test]
    fn test_regular_lattice_round_trips() {
        let spec = GridSpec::new(1.0, 1.0);
        let mut samples = Vec::new();
        for row in 0..3 {
            for col in 0..4 {
                samples.push(GridSample::new(
                    10.0 + row as f64,
                    20.0 + col as f64,
                    (row * 4 + col) as f64,
                ));
            }
        }

        let grid = DenseGrid::from_samples(&samples, spec);
        assert_eq!(grid.n_rows, 3);
        assert_eq!(grid.n_cols, 4);
        assert_eq!(grid.value(2, 3), 11.0);
        assert_eq!(grid.lat_min, 10.0);
        assert_eq!(grid.lng_min, 20.0);
    }

    #[test]
    fn test_misaligned_sample_snaps_to_nearest_cell() {
        let spec = GridSpec::new(1.0, 1.0);
        let samples = [
            GridSample::new(0.0, 0.0, 1.0),
            GridSample::new(1.0, 1.0, 2.0),
            // Rounds to row 1, col 1
            GridSample::new(0.9, 1.1, 99.0),
        ];
        let grid = DenseGrid::from_samples(&samples, spec);
        assert_eq!(grid.value(1, 1), 99.0);
    }

    #[test]
    fn test_out_of_bounds_sample_dropped() {
        // Distinct lats {0, 1} give 2 rows, but the step of 0.1 makes the
        // second sample round to row 10, outside the matrix.
        let spec = GridSpec::new(0.1, 0.1);
        let samples = [GridSample::new(0.0, 0.0, 5.0), GridSample::new(1.0, 0.0, 7.0)];
        let grid = DenseGrid::from_samples(&samples, spec);

        assert_eq!(grid.n_rows, 2);
        assert_eq!(grid.value(0, 0), 5.0);
        // Dropped, cell keeps the default fill
        assert_eq!(grid.value(1, 0), 0.0);
    }

    #[test]
    fn test_nan_samples_skipped() {
        let samples = [
            GridSample::new(f64::NAN, 0.0, 5.0),
            GridSample::new(0.0, 0.0, f64::NAN),
            GridSample::new(0.0, 0.0, 42.0),
        ];
        let grid = DenseGrid::from_samples(&samples, GridSpec::new(1.0, 1.0));
        assert_eq!(grid.n_rows, 1);
        assert_eq!(grid.n_cols, 1);
        assert_eq!(grid.value(0, 0), 42.0);
    }

    #[test]
    fn test_zero_step_falls_back_to_default() {
        let spec = GridSpec::new(0.0, f64::NAN).sanitized();
        assert_eq!(spec.lat_step, DEFAULT_LAT_STEP);
        assert_eq!(spec.lng_step, DEFAULT_LNG_STEP);
    }

    #[test]
    fn test_geo_index_round_trip() {
        let grid = DenseGrid::from_values(
            3,
            3,
            28.40,
            76.85,
            GridSpec::default(),
            vec![0.0; 9],
        )
        .unwrap();

        let (lat, lng) = grid.index_to_geo(2.5, 1.25);
        let (x, y) = grid.geo_to_index(lat, lng);
        assert!((x - 2.5).abs() < 1e-9);
        assert!((y - 1.25).abs() < 1e-9);
    }

    #[test]
    fn test_from_values_length_mismatch() {
        let res = DenseGrid::from_values(2, 2, 0.0, 0.0, GridSpec::default(), vec![0.0; 3]);
        assert!(res.is_err());
    }
}
