//! File dialogs and image I/O for the open and save flows.

use image::RgbaImage;
use image::codecs::png::PngEncoder;
use rfd::FileDialog;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::engine::error::{EngineError, Result};

/// Extensions the open dialog offers.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tiff"];

/// Native open dialog filtered to the supported raster formats.
pub fn pick_input_file() -> Option<PathBuf> {
    FileDialog::new()
        .add_filter("Images", IMAGE_EXTENSIONS)
        .add_filter("All Files", &["*"])
        .pick_file()
}

/// Native save dialog, suggesting a PNG file name.
pub fn pick_save_file() -> Option<PathBuf> {
    FileDialog::new()
        .add_filter("PNG Image", &["png"])
        .set_file_name("result.png")
        .save_file()
}

/// Append `.png` when the chosen name has no extension.
pub fn ensure_png_extension(path: PathBuf) -> PathBuf {
    if path.extension().is_none() {
        path.with_extension("png")
    } else {
        path
    }
}

/// Decode an image file to RGBA.
pub fn decode_image(path: &Path) -> Result<RgbaImage> {
    Ok(image::open(path)?.to_rgba8())
}

/// Write an image to `path` as PNG.
pub fn save_png(image: &RgbaImage, path: &Path) -> Result<()> {
    let file =
        File::create(path).map_err(|source| EngineError::io("create save file", path, source))?;
    let mut writer = BufWriter::new(file);
    let encoder = PngEncoder::new(&mut writer);
    #[allow(deprecated)]
    encoder.encode(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ColorType::Rgba8,
    )?;
    Ok(())
}
