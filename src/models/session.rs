// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Labeling session state.
//!
//! This module holds the state bound to one open image: the decoded frame,
//! the display scale fixed at load time, and the ordered store of annotated
//! points with their derived boxes.

use crate::models::annotation::{BoxRect, DisplayPoint, SourcePoint};
use crate::util::geometry;
use image::RgbaImage;
use std::path::{Path, PathBuf};

/// The decoded original image plus its filesystem path.
///
/// Immutable once loaded; a new image replaces the whole frame.
pub struct ImageFrame {
    path: PathBuf,
    image: RgbaImage,
}

impl ImageFrame {
    pub fn new(path: PathBuf, image: RgbaImage) -> Self {
        Self { path, image }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// File name without directory or extension, used to name output trees.
    pub fn basename(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string())
    }
}

/// Ordered collection of annotated points and their derived boxes.
///
/// Invariant: `points` and `boxes` are index-aligned 1:1. Every mutation
/// that adds or removes a point adds or removes the paired box at the same
/// position. Boxes are derived state: they are regenerated from the points
/// whenever the side length changes, while the points themselves are never
/// recomputed.
#[derive(Default)]
pub struct AnnotationStore {
    points: Vec<SourcePoint>,
    boxes: Vec<BoxRect>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a point and its box at the end of the sequence.
    ///
    /// The point is not constrained to the image; the box is clamped to it.
    /// Returns the computed box for the caller to render.
    pub fn add(&mut self, point: SourcePoint, side_length: u32, image_w: u32, image_h: u32) -> BoxRect {
        let rect = geometry::compute_box(point, side_length, image_w, image_h);
        self.points.push(point);
        self.boxes.push(rect);
        rect
    }

    /// Remove the annotation nearest to a display-space click.
    ///
    /// Distances are Euclidean in display space; the first point in
    /// sequence wins ties. Nothing is removed unless the minimum distance
    /// is strictly below `max_distance`. Returns whether a removal
    /// occurred.
    pub fn remove_nearest(&mut self, click: DisplayPoint, scale: f64, max_distance: f64) -> bool {
        let mut nearest: Option<(usize, f64)> = None;

        for (i, &point) in self.points.iter().enumerate() {
            let projected = geometry::to_display(point, scale);
            let dx = (click.x - projected.x) as f64;
            let dy = (click.y - projected.y) as f64;
            let distance = (dx * dx + dy * dy).sqrt();

            if nearest.map_or(true, |(_, best)| distance < best) {
                nearest = Some((i, distance));
            }
        }

        match nearest {
            Some((index, distance)) if distance < max_distance => {
                self.points.remove(index);
                self.boxes.remove(index);
                true
            }
            _ => false,
        }
    }

    /// Regenerate every box from its point with a new side length.
    ///
    /// Annotation count, order and points are preserved.
    pub fn resize_all(&mut self, side_length: u32, image_w: u32, image_h: u32) {
        self.boxes = self
            .points
            .iter()
            .map(|&p| geometry::compute_box(p, side_length, image_w, image_h))
            .collect();
    }

    /// Empty both sequences.
    pub fn clear(&mut self) {
        self.points.clear();
        self.boxes.clear();
    }

    /// Current number of point/box pairs.
    pub fn count(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[SourcePoint] {
        &self.points
    }

    pub fn boxes(&self) -> &[BoxRect] {
        &self.boxes
    }
}

/// Everything bound to one open image.
///
/// Owned by the application and passed by reference into the canvas and
/// the exporters; replaced wholesale when a new image is opened.
pub struct LabelSession {
    pub frame: ImageFrame,
    pub scale: f64,
    pub store: AnnotationStore,
}

impl LabelSession {
    /// Start a session for a freshly loaded frame.
    ///
    /// The scale factor is derived once from the current viewport and held
    /// constant until the next load.
    pub fn new(frame: ImageFrame, viewport_w: f32, viewport_h: f32) -> Self {
        let scale = geometry::fit_scale(viewport_w, viewport_h, frame.width(), frame.height());
        log::info!(
            "Session for {} ({}x{}), scale {:.4}",
            frame.path().display(),
            frame.width(),
            frame.height(),
            scale
        );
        Self {
            frame,
            scale,
            store: AnnotationStore::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_points(points: &[(i32, i32)]) -> AnnotationStore {
        let mut store = AnnotationStore::new();
        for &(x, y) in points {
            store.add(SourcePoint::new(x, y), 20, 1000, 1000);
        }
        store
    }

    #[test]
    fn test_add_appends_aligned_pair() {
        let mut store = AnnotationStore::new();
        let rect = store.add(SourcePoint::new(50, 50), 20, 100, 100);

        assert_eq!(store.count(), 1);
        assert_eq!(rect, BoxRect::new(40, 40, 60, 60));
        assert_eq!(store.boxes()[0], rect);
        assert_eq!(store.points()[0], SourcePoint::new(50, 50));
    }

    #[test]
    fn test_remove_nearest_hits_closest() {
        let mut store = store_with_points(&[(100, 100), (200, 200), (300, 300)]);

        // Scale 1.0: display coordinates equal source coordinates
        let removed = store.remove_nearest(DisplayPoint::new(201, 200), 1.0, 3.0);

        assert!(removed);
        assert_eq!(store.count(), 2);
        assert_eq!(store.points()[0], SourcePoint::new(100, 100));
        assert_eq!(store.points()[1], SourcePoint::new(300, 300));
    }

    #[test]
    fn test_remove_nearest_respects_threshold() {
        let mut store = store_with_points(&[(100, 100)]);

        // 5 units away with threshold 3: nothing happens
        assert!(!store.remove_nearest(DisplayPoint::new(105, 100), 1.0, 3.0));
        assert_eq!(store.count(), 1);

        // Exactly at the threshold is still a miss (strict comparison)
        assert!(!store.remove_nearest(DisplayPoint::new(103, 100), 1.0, 3.0));
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_remove_nearest_scales_before_measuring() {
        let mut store = store_with_points(&[(100, 100)]);

        // At scale 0.5 the marker sits at display (50, 50); the source-space
        // position is far from the click and must not be used.
        assert!(store.remove_nearest(DisplayPoint::new(51, 50), 0.5, 3.0));
        assert!(store.is_empty());
    }

    #[test]
    fn test_remove_nearest_tie_keeps_scan_order() {
        // Two points equidistant from the click: the first in sequence goes
        let mut store = store_with_points(&[(98, 100), (102, 100)]);

        assert!(store.remove_nearest(DisplayPoint::new(100, 100), 1.0, 3.0));
        assert_eq!(store.points(), &[SourcePoint::new(102, 100)]);
    }

    #[test]
    fn test_remove_nearest_on_empty_store() {
        let mut store = AnnotationStore::new();
        assert!(!store.remove_nearest(DisplayPoint::new(0, 0), 1.0, 3.0));
    }

    #[test]
    fn test_resize_all_preserves_points_and_order() {
        let mut store = store_with_points(&[(100, 100), (200, 200)]);
        let points_before: Vec<_> = store.points().to_vec();

        store.resize_all(50, 1000, 1000);

        assert_eq!(store.count(), 2);
        assert_eq!(store.points(), points_before.as_slice());
        assert_eq!(store.boxes()[0], BoxRect::new(75, 75, 125, 125));
        assert_eq!(store.boxes()[1], BoxRect::new(175, 175, 225, 225));
    }

    #[test]
    fn test_clear_empties_both_sequences() {
        let mut store = store_with_points(&[(1, 1), (2, 2)]);
        store.clear();
        assert_eq!(store.count(), 0);
        assert!(store.boxes().is_empty());
    }

    #[test]
    fn test_session_fixes_scale_at_load() {
        let frame = ImageFrame::new(
            PathBuf::from("vineyard/row_03.jpg"),
            RgbaImage::new(1000, 500),
        );
        let session = LabelSession::new(frame, 800.0, 600.0);

        assert!((session.scale - 0.8 * geometry::FIT_MARGIN).abs() < 1e-9);
        assert_eq!(session.frame.basename(), "row_03");
        assert!(session.store.is_empty());
    }
}
