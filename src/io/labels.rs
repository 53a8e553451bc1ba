// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! YOLO label export.
//!
//! Writes the consolidated detection-training tree: one normalized label
//! file and one full-size image copy per exported frame, plus the class
//! name file and the dataset descriptor. The normalized center is always
//! re-derived from the box corners so labels cannot drift from the stored
//! rectangles.

use crate::io::media;
use crate::models::annotation::BoxRect;
use crate::models::session::ImageFrame;
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Name of the reserved label-export subdirectory under the output root.
pub const EXPORT_DIR_NAME: &str = "yolo";

/// The one supported class.
pub const CLASS_NAME: &str = "uva";

/// Dataset descriptor consumed by YOLO training pipelines.
#[derive(Serialize)]
struct DatasetDescriptor {
    path: String,
    train: String,
    val: String,
    test: String,
    names: BTreeMap<u32, String>,
}

/// Format one label line: `<class> <cx> <cy> <w> <h>`.
///
/// Class is always `0`; the remaining fields are normalized by the image
/// dimensions and printed with six decimal digits, fixed point.
pub fn format_label_line(rect: &BoxRect, image_w: u32, image_h: u32) -> String {
    let w = image_w as f64;
    let h = image_h as f64;
    let cx = (rect.x1 + rect.x2) as f64 / 2.0 / w;
    let cy = (rect.y1 + rect.y2) as f64 / 2.0 / h;
    let bw = (rect.x2 - rect.x1) as f64 / w;
    let bh = (rect.y2 - rect.y1) as f64 / h;

    format!("0 {:.6} {:.6} {:.6} {:.6}", cx, cy, bw, bh)
}

/// Write a per-image label file, one line per non-degenerate box.
///
/// Returns the number of lines written.
pub(crate) fn write_label_file(
    path: &Path,
    boxes: &[BoxRect],
    image_w: u32,
    image_h: u32,
) -> Result<usize> {
    let mut content = String::new();
    let mut written = 0;

    for rect in boxes {
        if rect.is_degenerate() {
            log::warn!("Skipping degenerate box {:?}", rect);
            continue;
        }
        content.push_str(&format_label_line(rect, image_w, image_h));
        content.push('\n');
        written += 1;
    }

    std::fs::write(path, content)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(written)
}

/// Write the class name file and the dataset descriptor.
///
/// `classes.txt` is created once and never overwritten; `dataset.yaml` is
/// rewritten on every export so its absolute path stays current.
pub(crate) fn write_dataset_metadata(export_dir: &Path) -> Result<()> {
    let classes_path = export_dir.join("classes.txt");
    if !classes_path.exists() {
        std::fs::write(&classes_path, format!("{}\n", CLASS_NAME))
            .with_context(|| format!("failed to write {}", classes_path.display()))?;
    }

    let descriptor = DatasetDescriptor {
        path: std::path::absolute(export_dir)
            .with_context(|| format!("failed to resolve {}", export_dir.display()))?
            .to_string_lossy()
            .into_owned(),
        train: "images/train".to_string(),
        val: "images/val".to_string(),
        test: "images/test".to_string(),
        names: BTreeMap::from([(0, CLASS_NAME.to_string())]),
    };
    let yaml = serde_yaml::to_string(&descriptor)?;
    let descriptor_path = export_dir.join("dataset.yaml");
    std::fs::write(&descriptor_path, yaml)
        .with_context(|| format!("failed to write {}", descriptor_path.display()))?;

    Ok(())
}

/// Export the current boxes as a YOLO dataset fragment.
///
/// Creates `images/` and `labels/` under `export_dir`, overwrites the JPEG
/// image copy and the label file for this frame, and refreshes the dataset
/// metadata. Returns the number of label lines written.
pub fn export_labels(frame: &ImageFrame, boxes: &[BoxRect], export_dir: &Path) -> Result<usize> {
    let images_dir = export_dir.join("images");
    let labels_dir = export_dir.join("labels");
    std::fs::create_dir_all(&images_dir)
        .with_context(|| format!("failed to create {}", images_dir.display()))?;
    std::fs::create_dir_all(&labels_dir)
        .with_context(|| format!("failed to create {}", labels_dir.display()))?;

    let base = frame.basename();
    media::save_jpeg_copy(frame.image(), &images_dir.join(format!("{}.jpg", base)))?;

    let label_path = labels_dir.join(format!("{}.txt", base));
    let written = write_label_file(&label_path, boxes, frame.width(), frame.height())?;

    write_dataset_metadata(export_dir)?;

    log::info!(
        "Exported {} labels for {} to {}",
        written,
        base,
        export_dir.display()
    );
    Ok(written)
}
