// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! This module contains the main application structure that implements
//! the egui::App trait, owning the labeling session and dispatching
//! toolbar and canvas actions onto it. All operations run synchronously
//! on the interaction thread; a detection or export blocks until it
//! completes.

use crate::detect::{self, Detector};
use crate::io::{convert, crops, labels, media};
use crate::models::session::{ImageFrame, LabelSession};
use crate::ui::{canvas, toolbar};
use crate::util::geometry;
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Display-space radius within which a right click removes a point.
const REMOVE_RADIUS: f64 = 3.0;

/// Box side length on startup, in source pixels.
const DEFAULT_SIDE_LENGTH: u32 = 150;

/// Detector confidence threshold on startup.
const DEFAULT_CONFIDENCE: f32 = 0.5;

/// Severity of a modal user message.
enum MessageKind {
    Info,
    Warning,
    Error,
}

/// A message shown in a modal window until dismissed.
struct UserMessage {
    kind: MessageKind,
    text: String,
}

impl UserMessage {
    fn title(&self) -> &'static str {
        match self.kind {
            MessageKind::Info => "Success",
            MessageKind::Warning => "Warning",
            MessageKind::Error => "Error",
        }
    }
}

/// Main application state.
pub struct GrapesApp {
    /// State bound to the currently open image
    session: Option<LabelSession>,

    /// Loaded image texture for display
    image_texture: Option<egui::TextureHandle>,

    /// Detector backend, if one could be loaded at startup
    detector: Option<Box<dyn Detector>>,

    /// Last valid box side length
    side_length: u32,

    /// Last valid confidence threshold
    confidence: f32,

    /// Text buffers behind the toolbar entries
    side_input: String,
    threshold_input: String,

    /// Output root for crops and the consolidated label tree
    output_root: PathBuf,

    /// Directory searched for original images during batch conversion
    originals_dir: PathBuf,

    /// Status bar text
    status: String,

    /// Pending modal message
    message: Option<UserMessage>,

    /// Canvas viewport measured last frame, used when deriving the scale
    /// for the next image load
    canvas_size: egui::Vec2,
}

impl Default for GrapesApp {
    fn default() -> Self {
        Self::new()
    }
}

impl GrapesApp {
    /// Create a new GRAPES application instance.
    pub fn new() -> Self {
        Self {
            session: None,
            image_texture: None,
            detector: detect::load_default(),
            side_length: DEFAULT_SIDE_LENGTH,
            confidence: DEFAULT_CONFIDENCE,
            side_input: DEFAULT_SIDE_LENGTH.to_string(),
            threshold_input: DEFAULT_CONFIDENCE.to_string(),
            output_root: PathBuf::from("crops"),
            originals_dir: PathBuf::from("originals"),
            status: "Ready to open an image".to_string(),
            message: None,
            canvas_size: egui::Vec2::ZERO,
        }
    }

    fn info(&mut self, text: String) {
        self.message = Some(UserMessage {
            kind: MessageKind::Info,
            text,
        });
    }

    fn warn(&mut self, text: &str) {
        log::warn!("{}", text);
        self.message = Some(UserMessage {
            kind: MessageKind::Warning,
            text: text.to_string(),
        });
    }

    fn error(&mut self, what: &str, error: &anyhow::Error) {
        log::error!("{}: {:#}", what, error);
        self.message = Some(UserMessage {
            kind: MessageKind::Error,
            text: format!("{}: {:#}", what, error),
        });
    }

    /// Side length from the entry, falling back to the last valid value.
    fn current_side_length(&mut self) -> u32 {
        if let Some(value) = parse_side_length(&self.side_input) {
            self.side_length = value;
        }
        self.side_length
    }

    /// Confidence threshold from the entry, falling back to the last valid
    /// value.
    fn current_confidence(&mut self) -> f32 {
        if let Some(value) = parse_confidence(&self.threshold_input) {
            self.confidence = value;
        }
        self.confidence
    }

    /// Open a native file dialog and load the picked image.
    fn open_image(&mut self, ctx: &egui::Context) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", &["png", "jpg", "jpeg", "bmp"])
            .pick_file()
        else {
            return;
        };

        match self.load_session(path, ctx) {
            Ok(name) => self.status = format!("Image loaded: {}", name),
            Err(e) => self.error("Failed to load image", &e),
        }
    }

    /// Decode an image, build its texture, and start a fresh session.
    ///
    /// Any previous session (and its annotations) is replaced wholesale.
    fn load_session(&mut self, path: PathBuf, ctx: &egui::Context) -> Result<String> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let pixels = media::load_image(&path)?;
        let frame = ImageFrame::new(path, pixels);

        let size = [frame.width() as usize, frame.height() as usize];
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, frame.image().as_raw());
        let texture = ctx.load_texture("loaded_image", color_image, egui::TextureOptions::LINEAR);

        self.image_texture = Some(texture);
        self.session = Some(LabelSession::new(
            frame,
            self.canvas_size.x,
            self.canvas_size.y,
        ));
        Ok(name)
    }

    /// Run the detector over the current frame and replace the annotations
    /// with its results.
    fn detect_grapes(&mut self) {
        if self.session.is_none() {
            self.warn("No image has been loaded");
            return;
        }
        if self.detector.is_none() {
            self.warn("The grape detector is not available");
            return;
        }

        let confidence = self.current_confidence();
        let side_length = self.current_side_length();

        let result = match (self.session.as_mut(), self.detector.as_mut()) {
            (Some(session), Some(detector)) => {
                run_detection(session, detector.as_mut(), confidence, side_length)
            }
            _ => return,
        };

        match result {
            Ok(count) => {
                log::info!("Detection placed {} annotations", count);
                self.status = format!("Detected {} grapes above {:.2} confidence", count, confidence);
            }
            Err(e) => self.error("Failed to detect grapes", &e),
        }
    }

    /// Export the cropped boxes and their coordinate table.
    fn save_crops(&mut self) {
        if self.session.as_ref().map_or(true, |s| s.store.is_empty()) {
            self.warn("There are no boxes to save");
            return;
        }

        let result = self.session.as_ref().map(|session| {
            crops::export_crops(&session.frame, session.store.boxes(), &self.output_root)
                .map(|count| (count, self.output_root.join(session.frame.basename())))
        });

        match result {
            Some(Ok((count, out_dir))) => {
                self.status = format!("Saved {} crops", count);
                self.info(format!(
                    "Saved {} crops and their coordinates to '{}'",
                    count,
                    out_dir.display()
                ));
            }
            Some(Err(e)) => self.error("Failed to save crops", &e),
            None => {}
        }
    }

    /// Export the current annotations as a YOLO dataset fragment.
    fn export_labels(&mut self) {
        if self.session.as_ref().map_or(true, |s| s.store.is_empty()) {
            self.warn("There are no boxes to export");
            return;
        }

        let export_dir = self.output_root.join(labels::EXPORT_DIR_NAME);
        let result = self.session.as_ref().map(|session| {
            labels::export_labels(&session.frame, session.store.boxes(), &export_dir)
        });

        match result {
            Some(Ok(count)) => {
                self.status = format!("Exported {} annotations", count);
                self.info(format!(
                    "Exported {} annotations in YOLO format to '{}'",
                    count,
                    export_dir.display()
                ));
            }
            Some(Err(e)) => self.error("Failed to export labels", &e),
            None => {}
        }
    }

    /// Convert every saved coordinate table into the label-export tree.
    fn convert_tables(&mut self) {
        match convert::convert_coordinate_tables(&self.output_root, &self.originals_dir) {
            Ok(count) => {
                self.status = format!("Converted {} coordinate tables", count);
                self.info(format!(
                    "Converted {} images and their coordinate tables to YOLO format",
                    count
                ));
            }
            Err(e) => self.error("Failed to convert coordinate tables", &e),
        }
    }

    /// Re-derive every box after a change to the side-length entry.
    ///
    /// A malformed entry is ignored and the last valid value stays in
    /// effect.
    fn apply_side_length(&mut self) {
        let Some(value) = parse_side_length(&self.side_input) else {
            return;
        };
        self.side_length = value;

        if let Some(session) = self.session.as_mut() {
            session
                .store
                .resize_all(value, session.frame.width(), session.frame.height());
            self.status = format!("Box size set to {}", value);
            log::info!("Regenerated {} boxes with side {}", session.store.count(), value);
        }
    }

    fn handle_canvas_action(&mut self, action: canvas::CanvasAction) {
        match action {
            canvas::CanvasAction::AddPoint(display) => {
                let side_length = self.current_side_length();
                if let Some(session) = self.session.as_mut() {
                    let point = geometry::to_source(display, session.scale);
                    session.store.add(
                        point,
                        side_length,
                        session.frame.width(),
                        session.frame.height(),
                    );
                    self.status = format!("Point added: {} in total", session.store.count());
                    log::info!("Added point at ({}, {})", point.x, point.y);
                }
            }
            canvas::CanvasAction::RemoveNearest(display) => {
                if let Some(session) = self.session.as_mut() {
                    if session
                        .store
                        .remove_nearest(display, session.scale, REMOVE_RADIUS)
                    {
                        self.status = format!("Point removed: {} remaining", session.store.count());
                        log::info!("Removed point near display ({}, {})", display.x, display.y);
                    }
                }
            }
            canvas::CanvasAction::None => {}
        }
    }

    /// Render the pending modal message, if any.
    fn show_message(&mut self, ctx: &egui::Context) {
        let mut dismissed = false;
        if let Some(message) = &self.message {
            egui::Window::new(message.title())
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.label(&message.text);
                    ui.add_space(8.0);
                    ui.vertical_centered(|ui| {
                        if ui.button("OK").clicked() {
                            dismissed = true;
                        }
                    });
                });
        }
        if dismissed {
            self.message = None;
        }
    }
}

/// Hand the current frame to the detector and apply its results.
///
/// The frame is written to a scoped temporary JPEG for the backend; the
/// file is removed when the guard drops, on the error paths as well.
fn run_detection(
    session: &mut LabelSession,
    detector: &mut dyn Detector,
    confidence: f32,
    side_length: u32,
) -> Result<usize> {
    let temp = tempfile::Builder::new()
        .prefix("grapes_detect_")
        .suffix(".jpg")
        .tempfile()
        .context("failed to create temporary detection image")?;
    media::save_jpeg_copy(session.frame.image(), temp.path())?;

    let detections = detector.detect(temp.path(), confidence)?;
    Ok(detect::annotate_detections(
        &mut session.store,
        &detections,
        side_length,
        session.frame.width(),
        session.frame.height(),
    ))
}

/// Parse a box side length; only positive integers are valid.
fn parse_side_length(input: &str) -> Option<u32> {
    input.trim().parse().ok().filter(|&value| value > 0)
}

/// Parse a confidence threshold; valid values lie in (0, 1].
fn parse_confidence(input: &str) -> Option<f32> {
    input
        .trim()
        .parse()
        .ok()
        .filter(|&value| value > 0.0 && value <= 1.0)
}

impl eframe::App for GrapesApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Top menu bar
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open Image…").clicked() {
                        ui.close_menu();
                        self.open_image(ctx);
                    }
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
            });
        });

        // Toolbar
        let toolbar_action = egui::TopBottomPanel::top("toolbar")
            .show(ctx, |ui| {
                toolbar::show(ui, &mut self.side_input, &mut self.threshold_input)
            })
            .inner;

        match toolbar_action {
            toolbar::ToolbarAction::OpenImage => self.open_image(ctx),
            toolbar::ToolbarAction::DetectGrapes => self.detect_grapes(),
            toolbar::ToolbarAction::SaveCrops => self.save_crops(),
            toolbar::ToolbarAction::ExportLabels => self.export_labels(),
            toolbar::ToolbarAction::ConvertTables => self.convert_tables(),
            toolbar::ToolbarAction::SideLengthChanged => self.apply_side_length(),
            toolbar::ToolbarAction::None => {}
        }

        // Status bar
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(&self.status);
                if let Some(session) = &self.session {
                    ui.separator();
                    ui.label(format!("{} points", session.store.count()));
                }
            });
        });

        // Main canvas (center)
        let canvas_action = egui::CentralPanel::default()
            .show(ctx, |ui| {
                self.canvas_size = ui.available_size();
                canvas::show(ui, self.session.as_ref(), self.image_texture.as_ref())
            })
            .inner;

        self.handle_canvas_action(canvas_action);

        self.show_message(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_side_length() {
        assert_eq!(parse_side_length("150"), Some(150));
        assert_eq!(parse_side_length(" 20 "), Some(20));
        assert_eq!(parse_side_length("0"), None);
        assert_eq!(parse_side_length("-5"), None);
        assert_eq!(parse_side_length("abc"), None);
        assert_eq!(parse_side_length(""), None);
    }

    #[test]
    fn test_parse_confidence() {
        assert_eq!(parse_confidence("0.5"), Some(0.5));
        assert_eq!(parse_confidence("1.0"), Some(1.0));
        assert_eq!(parse_confidence("0"), None);
        assert_eq!(parse_confidence("1.5"), None);
        assert_eq!(parse_confidence("umbral"), None);
    }
}
