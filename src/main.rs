// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! GRAPES - Grape Region Annotation and Point Export System
//!
//! A desktop application for marking grape locations in photographs and
//! exporting the derived bounding boxes as YOLO training data.

mod app;
mod detect;
mod io;
mod models;
mod ui;
mod util;

use anyhow::Result;
use app::GrapesApp;

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    // Configure egui options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 700.0])
            .with_min_inner_size([640.0, 480.0])
            .with_title("GRAPES - Grape Region Annotation and Point Export System"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "GRAPES",
        options,
        Box::new(|_cc| Ok(Box::new(GrapesApp::new()))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
