// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! This module provides the coordinate transforms between display space
//! (the scaled canvas view) and source space (original image pixels), the
//! scale-factor derivation, and the box geometry around annotated points.

use crate::models::annotation::{BoxRect, DisplayPoint, SourcePoint};

/// Margin applied to the fitted scale so the image leaves visual padding.
pub const FIT_MARGIN: f64 = 0.95;

/// Viewport substituted when the canvas has not been sized yet.
pub const FALLBACK_VIEWPORT: (f32, f32) = (800.0, 600.0);

/// Project a source-space point into display space.
///
/// Coordinates are multiplied by `scale` and truncated toward zero, so the
/// projection stays consistent with exported integer coordinates.
/// Precondition: `scale > 0`.
pub fn to_display(point: SourcePoint, scale: f64) -> DisplayPoint {
    DisplayPoint {
        x: (point.x as f64 * scale) as i32,
        y: (point.y as f64 * scale) as i32,
    }
}

/// Map a display-space point back onto the original image.
///
/// Inverse of [`to_display`] up to one unit of truncation error.
pub fn to_source(point: DisplayPoint, scale: f64) -> SourcePoint {
    SourcePoint {
        x: (point.x as f64 / scale) as i32,
        y: (point.y as f64 / scale) as i32,
    }
}

/// Derive the uniform scale factor that fits an image into a viewport.
///
/// Uses the smaller of the two axis ratios (preserving aspect ratio) with a
/// fixed margin. A viewport that has not been laid out yet reports a
/// near-zero size; in that case fixed defaults are substituted.
pub fn fit_scale(viewport_w: f32, viewport_h: f32, image_w: u32, image_h: u32) -> f64 {
    let (vw, vh) = if viewport_w < 10.0 || viewport_h < 10.0 {
        FALLBACK_VIEWPORT
    } else {
        (viewport_w, viewport_h)
    };

    let scale_w = vw as f64 / image_w as f64;
    let scale_h = vh as f64 / image_h as f64;
    scale_w.min(scale_h) * FIT_MARGIN
}

/// Compute the clamped square box around a source-space point.
///
/// `half` is the floored half side; each corner is clamped to the image
/// bounds independently, so a box near an edge shrinks on that side only
/// (no re-centering). Points outside the image clamp to a degenerate
/// rectangle on the nearest edge.
pub fn compute_box(point: SourcePoint, side_length: u32, image_w: u32, image_h: u32) -> BoxRect {
    let half = (side_length / 2) as i32;
    let w = image_w as i32;
    let h = image_h as i32;

    BoxRect {
        x1: (point.x - half).clamp(0, w),
        y1: (point.y - half).clamp(0, h),
        x2: (point.x + half).clamp(0, w),
        y2: (point.y + half).clamp(0, h),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_display_roundtrip_when_display_is_finer() {
        // At scale >= 1 every source pixel maps to a distinct display
        // pixel, so the round trip loses at most one unit to truncation.
        for &scale in &[1.0, 1.7, 3.0] {
            for &(x, y) in &[(0, 0), (17, 23), (511, 1), (1919, 1079)] {
                let p = SourcePoint::new(x, y);
                let back = to_source(to_display(p, scale), scale);
                assert!(
                    (back.x - p.x).abs() <= 1 && (back.y - p.y).abs() <= 1,
                    "roundtrip of ({}, {}) at scale {} gave ({}, {})",
                    x,
                    y,
                    scale,
                    back.x,
                    back.y
                );
            }
        }
    }

    #[test]
    fn test_display_source_roundtrip_when_source_is_finer() {
        // The click path: a display click maps onto the image and its
        // marker projects back within one display pixel at any downscale.
        for &scale in &[0.25, 0.5, 0.95, 1.0] {
            for &(x, y) in &[(0, 0), (17, 23), (511, 1), (759, 569)] {
                let d = DisplayPoint::new(x, y);
                let back = to_display(to_source(d, scale), scale);
                assert!(
                    (back.x - d.x).abs() <= 1 && (back.y - d.y).abs() <= 1,
                    "roundtrip of ({}, {}) at scale {} gave ({}, {})",
                    x,
                    y,
                    scale,
                    back.x,
                    back.y
                );
            }
        }
    }

    #[test]
    fn test_projection_truncates_toward_zero() {
        // 0.7 * 7 = 4.9 truncates to 4, never rounds to 5
        let p = to_display(SourcePoint::new(7, 7), 0.7);
        assert_eq!(p, DisplayPoint::new(4, 4));

        // 10 / 0.3 = 33.33.. truncates to 33
        let s = to_source(DisplayPoint::new(10, 10), 0.3);
        assert_eq!(s, SourcePoint::new(33, 33));
    }

    #[test]
    fn test_fit_scale_picks_limiting_axis() {
        // 1000x500 image in an 800x600 viewport: width is the limiting axis
        let scale = fit_scale(800.0, 600.0, 1000, 500);
        assert!((scale - 0.8 * FIT_MARGIN).abs() < 1e-9);

        // 500x1000 image: height limits
        let scale = fit_scale(800.0, 600.0, 500, 1000);
        assert!((scale - 0.6 * FIT_MARGIN).abs() < 1e-9);
    }

    #[test]
    fn test_fit_scale_unsized_viewport_falls_back() {
        let fallback = fit_scale(1.0, 1.0, 800, 600);
        let explicit = fit_scale(800.0, 600.0, 800, 600);
        assert!((fallback - explicit).abs() < 1e-9);
    }

    #[test]
    fn test_compute_box_centered() {
        let rect = compute_box(SourcePoint::new(50, 50), 20, 100, 100);
        assert_eq!(rect, BoxRect::new(40, 40, 60, 60));
    }

    #[test]
    fn test_compute_box_edge_clamp_is_asymmetric() {
        // Clamped at the near edge only; the far side keeps its extent
        let rect = compute_box(SourcePoint::new(5, 5), 20, 100, 100);
        assert_eq!(rect, BoxRect::new(0, 0, 15, 15));
    }

    #[test]
    fn test_compute_box_odd_side_floors_half() {
        let rect = compute_box(SourcePoint::new(50, 50), 21, 100, 100);
        assert_eq!(rect, BoxRect::new(40, 40, 60, 60));
    }

    #[test]
    fn test_compute_box_valid_for_any_point() {
        let candidates = [
            SourcePoint::new(-50, -50),
            SourcePoint::new(150, 50),
            SourcePoint::new(50, 150),
            SourcePoint::new(1000, 1000),
            SourcePoint::new(0, 0),
            SourcePoint::new(100, 100),
        ];
        for point in candidates {
            let rect = compute_box(point, 20, 100, 100);
            assert!(0 <= rect.x1 && rect.x1 <= rect.x2 && rect.x2 <= 100, "{:?}", rect);
            assert!(0 <= rect.y1 && rect.y1 <= rect.y2 && rect.y2 <= 100, "{:?}", rect);
        }
    }
}
