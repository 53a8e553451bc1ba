// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Object-detector collaborator interface.
//!
//! Inference itself lives behind the [`Detector`] trait: the application
//! hands a backend an image path and a confidence threshold and gets back
//! axis-aligned boxes with scores. No backend ships in the default build
//! (see the `detect-opencv` feature); turning detector results into
//! annotations is independent of the backend.

use crate::models::annotation::SourcePoint;
use crate::models::session::AnnotationStore;
use anyhow::Result;
use std::path::Path;

/// Conventional location of the trained grape detector weights.
pub const DEFAULT_WEIGHTS: &str = "models/grape_detector/weights/best.onnx";

/// One detected box with its confidence score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
    pub confidence: f32,
}

impl Detection {
    /// Integer center via floor division, matching the coordinate table.
    pub fn center(&self) -> SourcePoint {
        SourcePoint::new((self.x1 + self.x2) / 2, (self.y1 + self.y2) / 2)
    }
}

/// Runs inference on an image file.
///
/// Implementations apply the confidence threshold themselves and return
/// only boxes at or above it.
pub trait Detector {
    fn detect(&mut self, image: &Path, confidence_threshold: f32) -> Result<Vec<Detection>>;
}

/// Load the detector from the conventional weights path, if possible.
///
/// Returns `None` when the weights are missing or no inference backend is
/// compiled in; the caller surfaces detection as unavailable.
pub fn load_default() -> Option<Box<dyn Detector>> {
    let weights = Path::new(DEFAULT_WEIGHTS);
    if !weights.exists() {
        log::warn!("Detector weights not found at {}", weights.display());
        return None;
    }

    log::warn!("Detector weights found but no inference backend is compiled in (enable the `detect-opencv` feature)");
    None
}

/// Replace the store contents with one annotation per detection.
///
/// Existing annotations are cleared first, then each detection contributes
/// its center point, boxed with the current side length. Returns the
/// number of annotations placed.
pub fn annotate_detections(
    store: &mut AnnotationStore,
    detections: &[Detection],
    side_length: u32,
    image_w: u32,
    image_h: u32,
) -> usize {
    store.clear();
    for detection in detections {
        store.add(detection.center(), side_length, image_w, image_h);
    }
    store.count()
}
