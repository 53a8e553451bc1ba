// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Crop export and the per-image coordinate table.
//!
//! Each export creates one directory per source image holding the cropped
//! PNGs and a small comma-separated table of their source-space
//! coordinates. The table stores integer centers (floor division) next to
//! the corners; the batch converter reads only the corners and re-derives
//! the float centers used by label files.

use crate::io::media;
use crate::models::annotation::BoxRect;
use crate::models::session::ImageFrame;
use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::path::Path;

/// Suffix of the coordinate table file next to the crops.
pub const COORD_TABLE_SUFFIX: &str = "_coordinates.csv";

/// Header of the coordinate table.
pub(crate) const TABLE_HEADER: &str = "filename,x1,y1,x2,y2,center_x,center_y";

/// File name of a single crop: `<base>_uva_<ordinal>.png`, 1-based.
pub(crate) fn crop_file_name(base: &str, ordinal: usize) -> String {
    format!("{}_uva_{}.png", base, ordinal)
}

/// Save every box as a cropped PNG and write the coordinate table.
///
/// Creates `<output_root>/<base>/` and fills it with the crops in store
/// order plus `<base>_coordinates.csv`. Degenerate boxes are skipped in
/// both the crop files and the table, keeping files and rows aligned.
/// Returns the number of crops written.
pub fn export_crops(frame: &ImageFrame, boxes: &[BoxRect], output_root: &Path) -> Result<usize> {
    let base = frame.basename();
    let out_dir = output_root.join(&base);
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let mut table = String::from(TABLE_HEADER);
    table.push('\n');
    let mut ordinal = 0;

    for rect in boxes {
        if rect.is_degenerate() {
            log::warn!("Skipping degenerate box {:?}", rect);
            continue;
        }
        ordinal += 1;

        let file_name = crop_file_name(&base, ordinal);
        let crop_path = out_dir.join(&file_name);
        media::crop(frame.image(), rect)
            .save(&crop_path)
            .with_context(|| format!("failed to write {}", crop_path.display()))?;

        let center = rect.center();
        let _ = writeln!(
            table,
            "{},{},{},{},{},{},{}",
            file_name, rect.x1, rect.y1, rect.x2, rect.y2, center.x, center.y
        );
    }

    let table_path = out_dir.join(format!("{}{}", base, COORD_TABLE_SUFFIX));
    std::fs::write(&table_path, table)
        .with_context(|| format!("failed to write {}", table_path.display()))?;

    log::info!("Saved {} crops to {}", ordinal, out_dir.display());
    Ok(ordinal)
}

/// Parse the corner coordinates out of a coordinate table.
///
/// Columns are located by header name, so extra columns or reordered
/// tables still parse; the center columns are deliberately ignored.
pub(crate) fn parse_table(content: &str) -> Result<Vec<BoxRect>> {
    let mut lines = content.lines();
    let header = lines.next().context("coordinate table is empty")?;
    let columns: Vec<&str> = header.split(',').map(str::trim).collect();

    let column = |name: &str| {
        columns
            .iter()
            .position(|c| *c == name)
            .with_context(|| format!("coordinate table has no '{}' column", name))
    };
    let (ix1, iy1, ix2, iy2) = (column("x1")?, column("y1")?, column("x2")?, column("y2")?);

    let mut boxes = Vec::new();
    for (number, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let value = |index: usize| -> Result<i32> {
            fields
                .get(index)
                .with_context(|| format!("row {} is truncated", number + 2))?
                .parse()
                .with_context(|| format!("row {} has a malformed coordinate", number + 2))
        };
        boxes.push(BoxRect::new(
            value(ix1)?,
            value(iy1)?,
            value(ix2)?,
            value(iy2)?,
        ));
    }
    Ok(boxes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;
    use std::path::PathBuf;

    fn test_frame() -> ImageFrame {
        ImageFrame::new(PathBuf::from("row_03.png"), RgbaImage::new(100, 100))
    }

    #[test]
    fn test_export_writes_crops_and_table() {
        let dir = tempfile::tempdir().unwrap();
        let boxes = [BoxRect::new(40, 40, 60, 60), BoxRect::new(0, 0, 15, 15)];

        let count = export_crops(&test_frame(), &boxes, dir.path()).unwrap();

        assert_eq!(count, 2);
        let out_dir = dir.path().join("row_03");
        assert!(out_dir.join("row_03_uva_1.png").exists());
        assert!(out_dir.join("row_03_uva_2.png").exists());

        let table = std::fs::read_to_string(out_dir.join("row_03_coordinates.csv")).unwrap();
        assert_eq!(
            table,
            "filename,x1,y1,x2,y2,center_x,center_y\n\
             row_03_uva_1.png,40,40,60,60,50,50\n\
             row_03_uva_2.png,0,0,15,15,7,7\n"
        );
    }

    #[test]
    fn test_crop_dimensions_match_box() {
        let dir = tempfile::tempdir().unwrap();
        export_crops(&test_frame(), &[BoxRect::new(0, 0, 15, 30)], dir.path()).unwrap();

        let crop = image::open(dir.path().join("row_03/row_03_uva_1.png")).unwrap();
        assert_eq!(crop.width(), 15);
        assert_eq!(crop.height(), 30);
    }

    #[test]
    fn test_degenerate_box_leaves_no_trace() {
        let dir = tempfile::tempdir().unwrap();
        let boxes = [BoxRect::new(0, 10, 0, 30), BoxRect::new(40, 40, 60, 60)];

        let count = export_crops(&test_frame(), &boxes, dir.path()).unwrap();

        assert_eq!(count, 1);
        let out_dir = dir.path().join("row_03");
        assert!(out_dir.join("row_03_uva_1.png").exists());
        assert!(!out_dir.join("row_03_uva_2.png").exists());
        let table = std::fs::read_to_string(out_dir.join("row_03_coordinates.csv")).unwrap();
        assert_eq!(table.lines().count(), 2); // header + one row
    }

    #[test]
    fn test_parse_table_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let boxes = [BoxRect::new(40, 40, 60, 60), BoxRect::new(3, 3, 8, 8)];
        export_crops(&test_frame(), &boxes, dir.path()).unwrap();

        let content =
            std::fs::read_to_string(dir.path().join("row_03/row_03_coordinates.csv")).unwrap();
        let parsed = parse_table(&content).unwrap();

        assert_eq!(parsed, boxes);
    }

    #[test]
    fn test_parse_table_rejects_missing_columns() {
        assert!(parse_table("filename,x1,y1\n").is_err());
        assert!(parse_table("").is_err());
    }

    #[test]
    fn test_parse_table_rejects_malformed_row() {
        let content = "filename,x1,y1,x2,y2,center_x,center_y\ncrop.png,a,0,10,10,5,5\n";
        assert!(parse_table(content).is_err());
    }
}
