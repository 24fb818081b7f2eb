//! Utility functions for visualization: colors, axis ranges, tick labels.

use crate::chart::{AxisRef, ChartSpec, Rgb8, SeriesKind};
use crate::models::Month;
use num_format::{Locale, ToFormattedString};
use plotters::prelude::*;

use super::text::estimate_text_width_px;

/// Convert a chart color into a Plotters color.
#[inline]
pub fn to_plotters(c: Rgb8) -> RGBColor {
    RGBColor(c.r, c.g, c.b)
}

/// Tick label for a category position: the month name at whole positions
/// `0..12`, nothing in between.
pub fn month_tick(x: f64) -> String {
    let r = x.round();
    if (x - r).abs() > 1e-6 || r < 0.0 {
        return String::new();
    }
    Month::from_index(r as usize)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Value tick label: thousands separators from 1,000 up, otherwise a
/// precision that shrinks with magnitude.
pub fn format_value_tick(v: f64) -> String {
    let a = v.abs();
    if a >= 1000.0 {
        (v.round() as i64).to_formatted_string(&Locale::en)
    } else if a >= 100.0 {
        format!("{v:.0}")
    } else if a >= 10.0 {
        format!("{v:.1}")
    } else {
        format!("{v:.2}")
    }
}

/// Y range for one axis, padded so value labels above the top point fit.
///
/// Bar axes always include zero. Axes with no values fall back to `0..1`.
pub fn value_range(spec: &ChartSpec, axis: AxisRef) -> (f64, f64) {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    let mut has_bars = false;
    for s in spec.series.iter().filter(|s| s.axis == axis) {
        has_bars |= matches!(s.kind, SeriesKind::Bar { .. });
        for v in s.points.iter().filter_map(|p| p.value) {
            lo = lo.min(v);
            hi = hi.max(v);
        }
    }
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    if has_bars {
        lo = lo.min(0.0);
        hi = hi.max(0.0);
    }
    if (hi - lo).abs() < f64::EPSILON {
        lo -= 1.0;
        hi += 1.0;
    }
    let pad = (hi - lo) * 0.12;
    let lo = if has_bars && lo >= 0.0 { lo } else { lo - pad };
    (lo, hi + pad)
}

/// Compute a tight label area width for a value axis (in pixels), based on
/// the formatted tick labels that will appear.
/// - `ymin..ymax`: the range passed to Plotters
/// - `ticks`: how many labels are requested
/// - `font_px`: font size used for axis labels
///
/// Returns a width clamped to a sensible range to avoid extremes.
pub fn compute_label_area_px(ymin: f64, ymax: f64, ticks: usize, font_px: u32) -> u32 {
    let mut max_px = 0u32;
    for i in 0..=ticks {
        let t = if ticks == 0 {
            0.0
        } else {
            i as f64 / ticks as f64
        };
        let v = ymin + (ymax - ymin) * t;
        max_px = max_px.max(estimate_text_width_px(&format_value_tick(v), font_px));
    }
    // Tick marks plus the rotated axis title.
    let with_padding = max_px.saturating_add(30);
    with_padding.clamp(48, 140)
}
