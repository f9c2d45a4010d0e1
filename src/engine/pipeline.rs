//! Image-to-tensor-to-matte plumbing shared by every model in the catalog.
//!
//! Preprocessing resizes to the model's square input, scales pixels by the
//! image's own peak value, normalizes with the model's mean/std, and lays
//! the result out channel-first. Postprocessing turns the raw prediction
//! plane back into an 8-bit matte and multiplies it into the original
//! alpha channel.

use image::codecs::png::PngEncoder;
use image::{GrayImage, RgbaImage};
use ndarray::Array4;

use super::catalog::ModelSpec;
use super::error::Result;

/// Class count of the garment head: background plus three clothing regions.
const GARMENT_CLASSES: usize = 4;

#[inline]
fn sigmoid(v: f32) -> f32 {
    1.0 / (1.0 + (-v).exp())
}

/// Resize, normalize, and lay out an image for model input.
///
/// Pixels are scaled by the brightest RGB value in the resized image rather
/// than a fixed 255, matching the published preprocessing of these weights.
/// Returns a tensor in `[1, 3, size, size]` layout.
pub fn preprocess(input: &RgbaImage, spec: &ModelSpec) -> Array4<f32> {
    let size = spec.input_size;
    let resized = image::imageops::resize(
        input,
        size,
        size,
        image::imageops::FilterType::Lanczos3,
    );

    let mut peak = 0u8;
    for pixel in resized.pixels() {
        peak = peak.max(pixel[0]).max(pixel[1]).max(pixel[2]);
    }
    // An all-black image would otherwise divide by zero.
    let peak = f32::from(peak.max(1));

    let side = size as usize;
    let mut tensor = Array4::<f32>::zeros((1, 3, side, side));
    for y in 0..side {
        for x in 0..side {
            let pixel = resized.get_pixel(x as u32, y as u32);
            // Channel-first layout: [R-plane, G-plane, B-plane]
            tensor[[0, 0, y, x]] = (pixel[0] as f32 / peak - spec.mean[0]) / spec.std[0];
            tensor[[0, 1, y, x]] = (pixel[1] as f32 / peak - spec.mean[1]) / spec.std[1];
            tensor[[0, 2, y, x]] = (pixel[2] as f32 / peak - spec.mean[2]) / spec.std[2];
        }
    }

    tensor
}

/// Convert a single-channel prediction plane into an 8-bit matte.
///
/// The plane is optionally squashed through a sigmoid first, then rescaled
/// so its minimum maps to 0 and its maximum to 255. A flat plane comes out
/// all zero.
pub fn saliency_matte(data: &[f32], height: u32, width: u32, apply_sigmoid: bool) -> GrayImage {
    let plane_len = ((height * width) as usize).min(data.len());
    let values: Vec<f32> = if apply_sigmoid {
        data[..plane_len].iter().map(|&v| sigmoid(v)).collect()
    } else {
        data[..plane_len].to_vec()
    };

    let mut lo = f32::INFINITY;
    let mut hi = f32::NEG_INFINITY;
    for &v in &values {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    let range = (hi - lo).max(f32::EPSILON);

    let pixels: Vec<u8> = values
        .iter()
        .map(|&v| (((v - lo) / range) * 255.0).clamp(0.0, 255.0) as u8)
        .collect();

    GrayImage::from_raw(width, height, pixels).unwrap_or_else(|| GrayImage::new(width, height))
}

/// Split a four-class garment prediction into one binary matte per class.
///
/// The plane layout is class-major. Every pixel goes to the class with the
/// highest raw score; softmax keeps that ordering, so none is applied.
/// Class 0 is background, classes 1 to 3 (upper, lower, full body) each
/// get a matte.
pub fn garment_masks(data: &[f32], height: u32, width: u32) -> Vec<GrayImage> {
    let plane = (height * width) as usize;
    let mut winners = vec![0u8; plane];
    for (idx, winner) in winners.iter_mut().enumerate() {
        let mut best = 0usize;
        let mut best_score = f32::NEG_INFINITY;
        for class in 0..GARMENT_CLASSES {
            let score = data
                .get(class * plane + idx)
                .copied()
                .unwrap_or(f32::NEG_INFINITY);
            if score > best_score {
                best_score = score;
                best = class;
            }
        }
        *winner = best as u8;
    }

    (1..GARMENT_CLASSES as u8)
        .map(|class| {
            let pixels: Vec<u8> = winners
                .iter()
                .map(|&w| if w == class { 255 } else { 0 })
                .collect();
            GrayImage::from_raw(width, height, pixels)
                .unwrap_or_else(|| GrayImage::new(width, height))
        })
        .collect()
}

/// Scale a matte to the target dimensions, skipping the no-op case.
pub fn resize_matte(matte: &GrayImage, width: u32, height: u32) -> GrayImage {
    if matte.dimensions() == (width, height) {
        return matte.clone();
    }
    image::imageops::resize(matte, width, height, image::imageops::FilterType::Lanczos3)
}

/// Multiply the matte into the image's alpha channel.
///
/// The matte must match the image dimensions. Color channels pass through
/// untouched.
pub fn apply_matte(original: &RgbaImage, matte: &GrayImage) -> RgbaImage {
    let (width, height) = original.dimensions();
    let mut output = original.clone();
    for y in 0..height {
        for x in 0..width {
            let matte_val = matte.get_pixel(x, y)[0];
            let pixel = output.get_pixel_mut(x, y);
            // Combine existing alpha with the matte
            let orig_alpha = pixel[3] as f32 / 255.0;
            let matte_alpha = matte_val as f32 / 255.0;
            pixel[3] = (orig_alpha * matte_alpha * 255.0).clamp(0.0, 255.0) as u8;
        }
    }
    output
}

/// Stack images top to bottom into one tall image.
pub fn stack_vertical(images: &[RgbaImage]) -> RgbaImage {
    let width = images.iter().map(|img| img.width()).max().unwrap_or(0);
    let height = images.iter().map(|img| img.height()).sum();
    let mut combined = RgbaImage::new(width, height);
    let mut offset = 0;
    for img in images {
        for (x, y, pixel) in img.enumerate_pixels() {
            combined.put_pixel(x, y + offset, *pixel);
        }
        offset += img.height();
    }
    combined
}

/// Encode an image as PNG into memory.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let encoder = PngEncoder::new(&mut buffer);
    #[allow(deprecated)]
    encoder.encode(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ColorType::Rgba8,
    )?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::catalog::ModelKind;
    use image::{Luma, Rgba};

    #[test]
    fn preprocess_scales_by_the_image_peak() {
        // A uniform image stays uniform through the resize, so its peak is
        // its own value and every pixel normalizes as if it were full scale.
        let input = RgbaImage::from_pixel(8, 8, Rgba([128, 128, 128, 255]));
        let spec = ModelKind::U2net.spec();
        let tensor = preprocess(&input, &spec);
        assert_eq!(tensor.shape(), &[1, 3, 320, 320]);
        let expected_r = (1.0 - spec.mean[0]) / spec.std[0];
        let expected_b = (1.0 - spec.mean[2]) / spec.std[2];
        assert!((tensor[[0, 0, 160, 160]] - expected_r).abs() < 1e-4);
        assert!((tensor[[0, 2, 160, 160]] - expected_b).abs() < 1e-4);
    }

    #[test]
    fn preprocess_survives_an_all_black_image() {
        let input = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));
        let tensor = preprocess(&input, &ModelKind::U2netp.spec());
        assert!(tensor.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn saliency_matte_rescales_to_full_range() {
        let data = [0.25, 0.5, 0.75, 1.0];
        let matte = saliency_matte(&data, 2, 2, false);
        assert_eq!(matte.get_pixel(0, 0)[0], 0);
        assert_eq!(matte.get_pixel(1, 1)[0], 255);
    }

    #[test]
    fn saliency_matte_flat_plane_goes_dark() {
        let data = [0.5f32; 4];
        let matte = saliency_matte(&data, 2, 2, false);
        assert!(matte.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn saliency_matte_squashes_logits_first() {
        let data = [-4.0, -2.0, 2.0, 4.0];
        let matte = saliency_matte(&data, 2, 2, true);
        assert_eq!(matte.get_pixel(0, 0)[0], 0);
        assert_eq!(matte.get_pixel(1, 1)[0], 255);
        // The sigmoid compresses the tails, pulling inner values off-center.
        assert!(matte.get_pixel(1, 0)[0] < 64);
    }

    #[test]
    fn garment_masks_pick_the_winning_class() {
        // Two pixels, four classes, scores laid out plane by plane.
        let data = [
            1.0, 0.0, // class 0
            5.0, 0.0, // class 1
            0.0, 0.0, // class 2
            0.0, 7.0, // class 3
        ];
        let masks = garment_masks(&data, 1, 2);
        assert_eq!(masks.len(), 3);
        assert_eq!(masks[0].get_pixel(0, 0)[0], 255);
        assert_eq!(masks[0].get_pixel(1, 0)[0], 0);
        assert!(masks[1].pixels().all(|p| p[0] == 0));
        assert_eq!(masks[2].get_pixel(1, 0)[0], 255);
    }

    #[test]
    fn apply_matte_multiplies_existing_alpha() {
        let original = RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 200]));
        let mut matte = GrayImage::from_pixel(2, 2, Luma([255]));
        matte.put_pixel(0, 0, Luma([0]));
        matte.put_pixel(1, 0, Luma([128]));
        let out = apply_matte(&original, &matte);
        assert_eq!(out.get_pixel(0, 0)[3], 0);
        assert_eq!(out.get_pixel(1, 0)[3], 100);
        assert_eq!(out.get_pixel(0, 1)[3], 200);
        assert_eq!(out.get_pixel(0, 0)[0], 10);
    }

    #[test]
    fn resize_matte_skips_matching_dimensions() {
        let matte = GrayImage::from_pixel(4, 4, Luma([7]));
        assert_eq!(resize_matte(&matte, 4, 4).as_raw(), matte.as_raw());
        assert_eq!(resize_matte(&matte, 8, 2).dimensions(), (8, 2));
    }

    #[test]
    fn stack_vertical_concatenates_top_to_bottom() {
        let top = RgbaImage::from_pixel(3, 2, Rgba([255, 0, 0, 255]));
        let bottom = RgbaImage::from_pixel(3, 1, Rgba([0, 255, 0, 255]));
        let stacked = stack_vertical(&[top, bottom]);
        assert_eq!(stacked.dimensions(), (3, 3));
        assert_eq!(stacked.get_pixel(0, 0)[0], 255);
        assert_eq!(stacked.get_pixel(0, 2)[1], 255);
    }

    #[test]
    fn encode_png_produces_a_decodable_image() {
        let image = RgbaImage::from_pixel(5, 4, Rgba([1, 2, 3, 4]));
        let bytes = encode_png(&image).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (5, 4));
        assert_eq!(decoded.get_pixel(0, 0), &Rgba([1, 2, 3, 4]));
    }
}
