use serde::{Deserialize, Serialize};

use super::geometry::{Point, Rect};

/// A display as reported by the host: its physical frame and the factor
/// between logical and physical pixels on it.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Screen {
    pub frame: Rect,
    pub scale: f64,
}

/// Converts between logical (device-independent) and physical units.
///
/// The first screen is treated as the primary one. With no screens every
/// scale lookup yields 1.0, which makes logical and physical units identical.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct CoordinateConverter {
    screens: Vec<Screen>,
}

impl CoordinateConverter {
    pub fn new(screens: Vec<Screen>) -> Self { Self { screens } }

    fn primary_scale(&self) -> f64 {
        self.screens.first().map(|s| sanitize(s.scale)).unwrap_or(1.0)
    }

    /// Scale of the screen sharing the largest area with `frame`.
    pub fn scale_for_frame(&self, frame: Rect) -> f64 {
        let mut best: Option<(f64, f64)> = None;
        for screen in &self.screens {
            let area = screen.frame.intersection_area(&frame);
            if area > 0.0 && best.is_none_or(|(a, _)| area > a) {
                best = Some((area, screen.scale));
            }
        }
        match best {
            Some((_, scale)) => sanitize(scale),
            None => self.scale_for_point(frame.mid()),
        }
    }

    pub fn scale_for_point(&self, point: Point) -> f64 {
        self.screens
            .iter()
            .find(|s| s.frame.contains(point))
            .map(|s| sanitize(s.scale))
            .unwrap_or_else(|| self.primary_scale())
    }

    /// Logical to physical, rounded to whole pixels.
    pub fn to_physical(logical: f64, scale: f64) -> f64 { (logical * sanitize(scale)).round() }

    pub fn to_logical(physical: f64, scale: f64) -> f64 {
        if scale <= 0.0 || !scale.is_finite() {
            return physical;
        }
        physical / scale
    }
}

fn sanitize(scale: f64) -> f64 { if scale > 0.0 && scale.is_finite() { scale } else { 1.0 } }
