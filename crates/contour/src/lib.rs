//! Contour polygon extraction for gridded AQI data.
//!
//! Turns a dense AQI lattice into closed, severity-colored polygon
//! layers using marching squares:
//! - [`march`]: per-level edge-crossing segments over the grid
//! - [`ring`]: segment stitching, hole/outer assembly, [`generate_contours`]
//! - [`geo`]: grid-index space to geographic coordinates

pub mod geo;
pub mod march;
pub mod ring;

pub use geo::{to_geographic, to_geographic_all, GeoPolygon, LatLng};
pub use march::{march_squares, Point, Segment};
pub use ring::{generate_contours, ContourPolygon, Ring};
