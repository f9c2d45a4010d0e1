//! Preview panel geometry and texture conversion.

use eframe::egui::{self, Rect, vec2};
use image::RgbaImage;

/// Side length of the square preview panels.
pub const PANEL: f32 = 320.0;

/// Rect that fits a `width`×`height` image inside `panel`: centered,
/// aspect preserved, never upscaled.
pub fn fit_rect(width: u32, height: u32, panel: Rect) -> Rect {
    if width == 0 || height == 0 {
        return Rect::from_center_size(panel.center(), vec2(0.0, 0.0));
    }
    let scale = (panel.width() / width as f32)
        .min(panel.height() / height as f32)
        .min(1.0);
    let size = vec2(width as f32 * scale, height as f32 * scale);
    Rect::from_center_size(panel.center(), size)
}

/// Convert a decoded image into an egui texture payload.
pub fn color_image(image: &RgbaImage) -> egui::ColorImage {
    let size = [image.width() as usize, image.height() as usize];
    egui::ColorImage::from_rgba_unmultiplied(size, image.as_raw())
}
