// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Toolbar with the main operations and numeric entries.
//!
//! The toolbar owns no state; it edits the text buffers handed in by the
//! application and reports which operation was requested.

/// Result of toolbar interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarAction {
    None,
    OpenImage,
    DetectGrapes,
    SaveCrops,
    ExportLabels,
    ConvertTables,
    /// The box-size entry changed; boxes should be regenerated if the new
    /// value parses.
    SideLengthChanged,
}

/// Display the toolbar buttons and entries.
pub fn show(
    ui: &mut egui::Ui,
    side_input: &mut String,
    threshold_input: &mut String,
) -> ToolbarAction {
    let mut action = ToolbarAction::None;

    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        if ui.button("Open Image…").clicked() {
            action = ToolbarAction::OpenImage;
        }
        if ui.button("Detect Grapes").clicked() {
            action = ToolbarAction::DetectGrapes;
        }
        if ui.button("Save Crops").clicked() {
            action = ToolbarAction::SaveCrops;
        }
        if ui.button("Export YOLO").clicked() {
            action = ToolbarAction::ExportLabels;
        }
        if ui.button("Convert Tables").clicked() {
            action = ToolbarAction::ConvertTables;
        }

        ui.separator();

        ui.label("Box size:");
        let side_entry = ui.add(egui::TextEdit::singleline(side_input).desired_width(48.0));
        if side_entry.changed() {
            action = ToolbarAction::SideLengthChanged;
        }

        ui.label("Threshold:");
        ui.add(egui::TextEdit::singleline(threshold_input).desired_width(48.0));
    });

    action
}
