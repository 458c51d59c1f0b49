//! Closed contour rings and polygon assembly.
//!
//! Marching squares emits unordered segments; this module stitches them
//! into closed rings, decides which rings are outer boundaries and
//! which are holes, and normalizes winding.
//!
//! Winding convention (documented contract for consumers): outer rings
//! are counter-clockwise (positive shoelace area in (x=col, y=row)
//! space with y increasing northward), holes are clockwise. The
//! geographic transform uses positive step sizes, so the same
//! convention holds for the (lng, lat) output — matching GeoJSON.

use aqi_common::DenseGrid;
use tracing::{debug, warn};

use crate::march::{march_squares, Point, Segment};

/// Tolerance for matching segment endpoints when stitching. Crossings
/// on a shared cell edge are computed from identical inputs in both
/// cells, so matches are bitwise-exact and the tolerance can be tight.
const MATCH_EPS: f64 = 1e-9;

/// A closed sequence of points in grid-index space. The first point is
/// not repeated at the end.
#[derive(Debug, Clone)]
pub struct Ring {
    pub points: Vec<Point>,
}

impl Ring {
    /// Shoelace area; positive for counter-clockwise winding.
    pub fn signed_area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let mut sum = 0.0;
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[(i + 1) % n];
            sum += a.x * b.y - b.x * a.y;
        }
        sum / 2.0
    }

    /// Even-odd (ray casting) point-in-ring test.
    pub fn contains(&self, p: &Point) -> bool {
        let n = self.points.len();
        if n < 3 {
            return false;
        }
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let pi = self.points[i];
            let pj = self.points[j];
            if (pi.y > p.y) != (pj.y > p.y) {
                let x_cross = pj.x + (p.y - pj.y) / (pi.y - pj.y) * (pi.x - pj.x);
                if p.x < x_cross {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    fn reverse(&mut self) {
        self.points.reverse();
    }

    /// Force counter-clockwise (`ccw = true`) or clockwise winding.
    fn orient(&mut self, ccw: bool) {
        if (self.signed_area() > 0.0) != ccw {
            self.reverse();
        }
    }
}

/// One contour polygon at a threshold level: an outer boundary plus
/// zero or more interior hole rings (lower-AQI pockets).
#[derive(Debug, Clone)]
pub struct ContourPolygon {
    /// The threshold this polygon bounds.
    pub value: f64,
    pub outer: Ring,
    pub holes: Vec<Ring>,
}

/// Generate contour polygons for every threshold level.
///
/// Coordinates are fractional grid-index values clamped to the grid
/// extent. Levels strictly below the grid minimum or above the grid
/// maximum produce no polygons; a grid with fewer than two rows or
/// columns produces an empty result. Never panics for any threshold.
pub fn generate_contours(grid: &DenseGrid, thresholds: &[f64]) -> Vec<ContourPolygon> {
    if grid.n_rows < 2 || grid.n_cols < 2 {
        return vec![];
    }

    let finite: Vec<f64> = grid.values().iter().copied().filter(|v| v.is_finite()).collect();
    let Some(&data_min) = finite.iter().min_by(|a, b| a.total_cmp(b)) else {
        return vec![];
    };
    let Some(&data_max) = finite.iter().max_by(|a, b| a.total_cmp(b)) else {
        return vec![];
    };

    let mut polygons = Vec::new();

    for &level in thresholds {
        if !level.is_finite() || level < data_min || level > data_max {
            continue;
        }
        polygons.extend(contours_for_level(grid, level));
    }

    debug!(
        n_rows = grid.n_rows,
        n_cols = grid.n_cols,
        data_min,
        data_max,
        num_levels = thresholds.len(),
        num_polygons = polygons.len(),
        "generated contour polygons"
    );

    polygons
}

/// Contours for one level over a padded copy of the grid.
///
/// The one-cell border of below-level padding guarantees every contour
/// closes inside the padded field; ring coordinates are then shifted
/// back and clamped to the real grid extent.
fn contours_for_level(grid: &DenseGrid, level: f64) -> Vec<ContourPolygon> {
    let (w, h) = (grid.n_cols, grid.n_rows);
    let (pw, ph) = (w + 2, h + 2);
    let pad = level - 1.0;

    let mut padded = vec![pad; pw * ph];
    for row in 0..h {
        for col in 0..w {
            padded[(row + 1) * pw + (col + 1)] = grid.value(row, col);
        }
    }

    let segments: Vec<Segment> = march_squares(&padded, pw, ph, level)
        .into_iter()
        .map(|s| Segment {
            start: Point::new(s.start.x - 1.0, s.start.y - 1.0),
            end: Point::new(s.end.x - 1.0, s.end.y - 1.0),
        })
        .collect();

    let mut rings: Vec<Ring> = stitch_rings(segments)
        .into_iter()
        .filter_map(|r| clamp_ring(r, w, h))
        .collect();

    assemble_polygons(level, &mut rings)
}

/// Connect unordered segments into closed rings.
///
/// Every crossing point is shared by exactly two cells, so each vertex
/// has degree two and greedy stitching terminates with closed loops.
/// Unclosed remainders (degenerate inputs) are discarded.
fn stitch_rings(segments: Vec<Segment>) -> Vec<Ring> {
    if segments.is_empty() {
        return vec![];
    }

    let mut rings = Vec::new();
    let mut used = vec![false; segments.len()];

    for start_idx in 0..segments.len() {
        if used[start_idx] {
            continue;
        }

        let mut points = vec![segments[start_idx].start, segments[start_idx].end];
        used[start_idx] = true;

        let mut changed = true;
        while changed {
            changed = false;
            let current_end = points[points.len() - 1];

            for (i, seg) in segments.iter().enumerate() {
                if used[i] {
                    continue;
                }
                if seg.start.distance(&current_end) < MATCH_EPS {
                    points.push(seg.end);
                    used[i] = true;
                    changed = true;
                    break;
                } else if seg.end.distance(&current_end) < MATCH_EPS {
                    points.push(seg.start);
                    used[i] = true;
                    changed = true;
                    break;
                }
            }
        }

        let closed = points.len() > 2 && points[0].distance(&points[points.len() - 1]) < MATCH_EPS;
        if !closed {
            warn!(points = points.len(), "discarding unclosed contour fragment");
            continue;
        }
        points.pop(); // drop the duplicate closing point
        rings.push(Ring { points });
    }

    rings
}

/// Clamp a ring to the grid extent and drop degenerate results.
///
/// Boundary-exit crossings land in the padding band; clamping flattens
/// them onto the grid frame, which can leave runs of duplicate points.
fn clamp_ring(mut ring: Ring, n_cols: usize, n_rows: usize) -> Option<Ring> {
    let max_x = (n_cols - 1) as f64;
    let max_y = (n_rows - 1) as f64;

    for p in &mut ring.points {
        p.x = p.x.clamp(0.0, max_x);
        p.y = p.y.clamp(0.0, max_y);
    }

    let mut deduped: Vec<Point> = Vec::with_capacity(ring.points.len());
    for p in ring.points {
        if let Some(last) = deduped.last() {
            if last.distance(&p) < 1e-9 {
                continue;
            }
        }
        deduped.push(p);
    }
    // First and last may have collapsed onto each other as well
    while deduped.len() > 1 && deduped[0].distance(&deduped[deduped.len() - 1]) < 1e-9 {
        deduped.pop();
    }

    if deduped.len() < 3 {
        return None;
    }
    Some(Ring { points: deduped })
}

/// Group rings of one level into polygons with holes.
///
/// A ring contained in an odd number of other rings bounds a hole; each
/// hole attaches to the smallest enclosing outer ring.
fn assemble_polygons(level: f64, rings: &mut [Ring]) -> Vec<ContourPolygon> {
    let n = rings.len();
    let mut is_hole = vec![false; n];

    for i in 0..n {
        let probe = rings[i].points[0];
        let depth = (0..n)
            .filter(|&j| j != i && rings[j].contains(&probe))
            .count();
        is_hole[i] = depth % 2 == 1;
    }

    for (ring, &hole) in rings.iter_mut().zip(is_hole.iter()) {
        ring.orient(!hole);
    }

    let mut polygons: Vec<ContourPolygon> = Vec::new();
    for (ring, &hole) in rings.iter().zip(is_hole.iter()) {
        if !hole {
            polygons.push(ContourPolygon {
                value: level,
                outer: ring.clone(),
                holes: vec![],
            });
        }
    }

    for (ring, &hole) in rings.iter().zip(is_hole.iter()) {
        if !hole {
            continue;
        }
        let probe = ring.points[0];
        let parent = polygons
            .iter_mut()
            .filter(|p| p.outer.contains(&probe))
            .min_by(|a, b| {
                a.outer
                    .signed_area()
                    .abs()
                    .total_cmp(&b.outer.signed_area().abs())
            });
        match parent {
            Some(poly) => poly.holes.push(ring.clone()),
            None => warn!(level, "hole ring without an enclosing outer ring"),
        }
    }

    polygons
}
