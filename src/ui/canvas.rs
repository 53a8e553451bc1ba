// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Drawing canvas for image display and point annotation.
//!
//! This module renders the scaled image with its point markers and box
//! outlines, and reports pointer clicks back to the application in display
//! coordinates. The image is anchored at the top-left corner, so display
//! space carries no offset.

use crate::models::annotation::{DisplayPoint, SourcePoint};
use crate::models::session::LabelSession;
use crate::util::geometry;

/// Radius of a point marker, in display pixels.
const MARKER_RADIUS: f32 = 3.0;

/// Result of canvas interaction.
pub enum CanvasAction {
    None,
    /// Left click: place a point at this display position.
    AddPoint(DisplayPoint),
    /// Right click: remove the nearest point to this display position.
    RemoveNearest(DisplayPoint),
}

/// Display the canvas area and handle mouse interactions.
pub fn show(
    ui: &mut egui::Ui,
    session: Option<&LabelSession>,
    image_texture: Option<&egui::TextureHandle>,
) -> CanvasAction {
    let mut action = CanvasAction::None;
    ui.style_mut().visuals.extreme_bg_color = egui::Color32::from_gray(40);

    let available_size = ui.available_size();

    egui::Frame::canvas(ui.style()).show(ui, |ui| {
        ui.set_min_size(available_size);

        if let (Some(session), Some(texture)) = (session, image_texture) {
            let display_w = (session.frame.width() as f64 * session.scale) as f32;
            let display_h = (session.frame.height() as f64 * session.scale) as f32;
            let image_rect =
                egui::Rect::from_min_size(ui.min_rect().min, egui::vec2(display_w, display_h));

            // Draw the image at its fixed session scale
            ui.painter().image(
                texture.id(),
                image_rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );

            let response = ui.allocate_rect(image_rect, egui::Sense::click());
            if let Some(pos) = response.interact_pointer_pos() {
                if image_rect.contains(pos) {
                    let display = DisplayPoint::new(
                        (pos.x - image_rect.min.x) as i32,
                        (pos.y - image_rect.min.y) as i32,
                    );
                    if response.clicked() {
                        action = CanvasAction::AddPoint(display);
                    } else if response.secondary_clicked() {
                        action = CanvasAction::RemoveNearest(display);
                    }
                }
            }

            // Markers and box outlines are redrawn from the store each frame
            let painter = ui.painter();
            for &point in session.store.points() {
                let projected = geometry::to_display(point, session.scale);
                let center = image_rect.min + egui::vec2(projected.x as f32, projected.y as f32);
                painter.circle_filled(center, MARKER_RADIUS, egui::Color32::RED);
            }
            for rect in session.store.boxes() {
                let min = geometry::to_display(SourcePoint::new(rect.x1, rect.y1), session.scale);
                let max = geometry::to_display(SourcePoint::new(rect.x2, rect.y2), session.scale);
                let outline = egui::Rect::from_min_max(
                    image_rect.min + egui::vec2(min.x as f32, min.y as f32),
                    image_rect.min + egui::vec2(max.x as f32, max.y as f32),
                );
                painter.rect_stroke(outline, 0.0, egui::Stroke::new(2.0, egui::Color32::GREEN));
            }
        } else {
            // Welcome message when no image is loaded
            ui.centered_and_justified(|ui| {
                ui.vertical_centered(|ui| {
                    ui.add_space(20.0);
                    ui.heading(
                        egui::RichText::new("GRAPES")
                            .size(32.0)
                            .color(egui::Color32::from_gray(200)),
                    );
                    ui.label(
                        egui::RichText::new("Grape Region Annotation and Point Export System")
                            .size(14.0)
                            .color(egui::Color32::from_gray(150)),
                    );
                    ui.add_space(20.0);
                    ui.label(
                        egui::RichText::new("Open an image to begin placing points")
                            .color(egui::Color32::from_gray(180)),
                    );
                    ui.add_space(10.0);
                    ui.label(
                        egui::RichText::new("Left click adds a grape, right click removes the nearest one")
                            .weak()
                            .color(egui::Color32::from_gray(130)),
                    );
                });
            });
        }
    });

    action
}
