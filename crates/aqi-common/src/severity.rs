//! AQI severity classification and color mapping.
//!
//! The contour colorer and the legend both go through [`classify`], so
//! the map overlay and the legend can never disagree about band colors.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete band breakpoints (upper bound inclusive).
const BAND_GOOD_MAX: f64 = 50.0;
const BAND_SATISFACTORY_MAX: f64 = 100.0;
const BAND_MODERATE_MAX: f64 = 200.0;
const BAND_POOR_MAX: f64 = 300.0;

/// Gradient endpoints for the Very Poor -> Severe range.
const GRADIENT_MIN: f64 = 300.0;
const GRADIENT_MAX: f64 = 500.0;
const GRADIENT_START: Rgb = Rgb::new(239, 68, 68); // bright red at 300
const GRADIENT_END: Rgb = Rgb::new(69, 10, 10); // dark red at 500+

const COLOR_GOOD: Rgb = Rgb::new(0x10, 0xB9, 0x81); // #10B981
const COLOR_SATISFACTORY: Rgb = Rgb::new(0x84, 0xCC, 0x16); // #84CC16
const COLOR_MODERATE: Rgb = Rgb::new(0xFA, 0xCC, 0x15); // #FACC15
const COLOR_POOR: Rgb = Rgb::new(0xF9, 0x73, 0x16); // #F97316

/// An opaque RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Lowercase `#rrggbb` form, as handed to the rendering collaborator.
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Per-channel linear interpolation, rounded to the nearest integer.
    pub fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let lerp_u8 =
            |a: u8, b: u8| -> u8 { ((a as f64) * (1.0 - t) + (b as f64) * t).round() as u8 };
        Rgb::new(
            lerp_u8(self.r, other.r),
            lerp_u8(self.g, other.g),
            lerp_u8(self.b, other.b),
        )
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

/// Map an AQI scalar to its severity color.
///
/// Total over all inputs: negative values (and NaN) land in the Good
/// band, values past 500 clamp to the dark end of the gradient.
pub fn classify(aqi: f64) -> Rgb {
    if aqi <= BAND_GOOD_MAX || aqi.is_nan() {
        return COLOR_GOOD;
    }
    if aqi <= BAND_SATISFACTORY_MAX {
        return COLOR_SATISFACTORY;
    }
    if aqi <= BAND_MODERATE_MAX {
        return COLOR_MODERATE;
    }
    // 300 itself belongs to the gradient: classify(300) is the bright
    // red endpoint of the interpolation, not the Poor band color.
    if aqi < BAND_POOR_MAX {
        return COLOR_POOR;
    }

    let clamped = aqi.clamp(GRADIENT_MIN, GRADIENT_MAX);
    let t = (clamped - GRADIENT_MIN) / (GRADIENT_MAX - GRADIENT_MIN);
    GRADIENT_START.lerp(GRADIENT_END, t)
}

/// One entry of the AQI legend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeverityBand {
    pub label: &'static str,
    pub range: &'static str,
    /// Color at the low end of the band.
    pub color: Rgb,
    /// For the gradient band, the color at the high end.
    pub gradient_to: Option<Rgb>,
}

/// Fixed legend description: four discrete bands plus the gradient band.
///
/// Colors are taken from the same constants [`classify`] uses.
pub fn legend() -> Vec<SeverityBand> {
    vec![
        SeverityBand {
            label: "Good",
            range: "0-50",
            color: COLOR_GOOD,
            gradient_to: None,
        },
        SeverityBand {
            label: "Satisfactory",
            range: "51-100",
            color: COLOR_SATISFACTORY,
            gradient_to: None,
        },
        SeverityBand {
            label: "Moderate",
            range: "101-200",
            color: COLOR_MODERATE,
            gradient_to: None,
        },
        SeverityBand {
            label: "Poor",
            range: "201-300",
            color: COLOR_POOR,
            gradient_to: None,
        },
        SeverityBand {
            label: "Very Poor \u{2192} Severe",
            range: "300-500+",
            color: GRADIENT_START,
            gradient_to: Some(GRADIENT_END),
        },
    ]
}

/// Contour levels used for the severity map: four coarse bands plus
/// ten-point increments across the 300-500 gradient range.
pub fn aqi_thresholds() -> Vec<f64> {
    let mut levels = vec![50.0, 100.0, 200.0, 300.0];
    let mut level = 310.0;
    while level <= 500.0 {
        levels.push(level);
        level += 10.0;
    }
    levels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discrete_band_colors() {
        assert_eq!(classify(0.0).hex(), "#10b981");
        assert_eq!(classify(75.0).hex(), "#84cc16");
        assert_eq!(classify(150.0).hex(), "#facc15");
        assert_eq!(classify(250.0).hex(), "#f97316");
    }

    #[test]
    fn test_band_boundary_inclusivity() {
        assert_eq!(classify(50.0), COLOR_GOOD);
        assert_eq!(classify(49.999), COLOR_GOOD);
        assert_eq!(classify(50.001), COLOR_SATISFACTORY);
    }

    #[test]
    fn test_negative_and_nan_fall_in_good_band() {
        assert_eq!(classify(-40.0), COLOR_GOOD);
        assert_eq!(classify(f64::NAN), COLOR_GOOD);
    }

    #[test]
    fn test_gradient_endpoints() {
        assert_eq!(classify(300.0), Rgb::new(239, 68, 68));
        assert_eq!(classify(500.0), Rgb::new(69, 10, 10));
        // Clamped past 500
        assert_eq!(classify(620.0), Rgb::new(69, 10, 10));
    }

    #[test]
    fn test_gradient_midpoint() {
        assert_eq!(classify(400.0), Rgb::new(154, 39, 39));
    }

    #[test]
    fn test_classify_is_deterministic() {
        for &v in &[12.0, 180.0, 355.5, 470.0] {
            assert_eq!(classify(v), classify(v));
        }
    }

    #[test]
    fn test_legend_matches_classifier() {
        let bands = legend();
        assert_eq!(bands.len(), 5);
        assert_eq!(bands[0].color, classify(25.0));
        assert_eq!(bands[3].color, classify(250.0));
        let gradient = bands.last().unwrap();
        assert_eq!(gradient.color, classify(300.0));
        assert_eq!(gradient.gradient_to, Some(classify(500.0)));
    }

    #[test]
    fn test_thresholds_strictly_increasing() {
        let levels = aqi_thresholds();
        assert_eq!(levels.first(), Some(&50.0));
        assert_eq!(levels.last(), Some(&500.0));
        assert_eq!(levels.len(), 24);
        assert!(levels.windows(2).all(|w| w[0] < w[1]));
    }
}
