// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Batch conversion of coordinate tables into the label-export tree.
//!
//! Walks the crop output root, re-derives normalized label lines from each
//! per-image coordinate table with the exact label-export formula, and
//! copies the matching original image into the consolidated tree. Running
//! the conversion twice over unchanged inputs produces byte-identical
//! output.

use crate::io::{crops, labels};
use anyhow::{Context, Result};
use std::path::Path;

/// Convert every coordinate table under `output_root` into YOLO labels.
///
/// Per-image subdirectories are scanned for `*_coordinates.csv` files; the
/// reserved label-export subdirectory is skipped. Original images are
/// looked up as `<originals_dir>/<base>.jpg`; a table without its original
/// is skipped with a warning. Returns the number of tables converted.
pub fn convert_coordinate_tables(output_root: &Path, originals_dir: &Path) -> Result<usize> {
    let export_dir = output_root.join(labels::EXPORT_DIR_NAME);
    let images_dir = export_dir.join("images");
    let labels_dir = export_dir.join("labels");
    std::fs::create_dir_all(&images_dir)
        .with_context(|| format!("failed to create {}", images_dir.display()))?;
    std::fs::create_dir_all(&labels_dir)
        .with_context(|| format!("failed to create {}", labels_dir.display()))?;

    let mut converted = 0;

    let entries = std::fs::read_dir(output_root)
        .with_context(|| format!("failed to read {}", output_root.display()))?;
    for entry in entries {
        let dir_path = entry?.path();
        if !dir_path.is_dir() || dir_path.file_name().is_some_and(|n| n == labels::EXPORT_DIR_NAME)
        {
            continue;
        }

        let files = std::fs::read_dir(&dir_path)
            .with_context(|| format!("failed to read {}", dir_path.display()))?;
        for file in files {
            let table_path = file?.path();
            let Some(name) = table_path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(base) = name.strip_suffix(crops::COORD_TABLE_SUFFIX) else {
                continue;
            };

            let original = originals_dir.join(format!("{}.jpg", base));
            if !original.exists() {
                log::warn!(
                    "No original image for {} at {}, skipping",
                    base,
                    original.display()
                );
                continue;
            }

            let (image_w, image_h) = image::image_dimensions(&original)
                .with_context(|| format!("failed to read {}", original.display()))?;
            std::fs::copy(&original, images_dir.join(format!("{}.jpg", base)))
                .with_context(|| format!("failed to copy {}", original.display()))?;

            let content = std::fs::read_to_string(&table_path)
                .with_context(|| format!("failed to read {}", table_path.display()))?;
            let boxes = crops::parse_table(&content)
                .with_context(|| format!("failed to parse {}", table_path.display()))?;

            let label_path = labels_dir.join(format!("{}.txt", base));
            labels::write_label_file(&label_path, &boxes, image_w, image_h)?;

            converted += 1;
        }
    }

    labels::write_dataset_metadata(&export_dir)?;

    log::info!(
        "Converted {} coordinate tables into {}",
        converted,
        export_dir.display()
    );
    Ok(converted)
}
