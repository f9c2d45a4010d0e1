//! Matte edge refinement.
//!
//! Builds the classic trimap: matte values past the thresholds are certain
//! foreground or background, both regions are shrunk by a window erosion,
//! and everything left over is an uncertain band around the edge. Certain
//! pixels keep their hard value; the band gets a feathered ramp instead of
//! the raw model edge.

use image::{GrayImage, Luma};

/// Matte values above this count as certain foreground.
const FOREGROUND_THRESHOLD: u8 = 240;
/// Matte values below this count as certain background.
const BACKGROUND_THRESHOLD: u8 = 10;
/// Square window both certainty masks are eroded with.
const ERODE_SIZE: u32 = 10;

/// Refine a matte's edges with a trimap and a feathered uncertain band.
pub fn refine(matte: &GrayImage) -> GrayImage {
    let (width, height) = matte.dimensions();

    let mut foreground = GrayImage::new(width, height);
    let mut background = GrayImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let v = matte.get_pixel(x, y)[0];
            let fg = if v > FOREGROUND_THRESHOLD { 255 } else { 0 };
            let bg = if v < BACKGROUND_THRESHOLD { 255 } else { 0 };
            foreground.put_pixel(x, y, Luma([fg]));
            background.put_pixel(x, y, Luma([bg]));
        }
    }

    // Outside the frame counts as background, so certain-foreground shrinks
    // at the image border and certain-background does not.
    let foreground = erode(&foreground, ERODE_SIZE, 0);
    let background = erode(&background, ERODE_SIZE, 255);

    let mut trimap = GrayImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let value = if foreground.get_pixel(x, y)[0] == 255 {
                255
            } else if background.get_pixel(x, y)[0] == 255 {
                0
            } else {
                128
            };
            trimap.put_pixel(x, y, Luma([value]));
        }
    }

    // Only the uncertain band picks up the feathered ramp.
    let feathered = blur(&trimap, (ERODE_SIZE / 2) as f32);
    let mut refined = GrayImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let value = match trimap.get_pixel(x, y)[0] {
                255 => 255,
                0 => 0,
                _ => feathered.get_pixel(x, y)[0],
            };
            refined.put_pixel(x, y, Luma([value]));
        }
    }

    refined
}

/// Separable window-minimum erosion. `outside` stands in for pixels past
/// the border.
fn erode(mask: &GrayImage, window: u32, outside: u8) -> GrayImage {
    let (width, height) = mask.dimensions();
    let lo = -((window / 2) as i32);
    let hi = (window - window / 2) as i32 - 1;

    // Horizontal pass
    let mut temp = GrayImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let mut min_val = 255u8;
            for dx in lo..=hi {
                let nx = x as i32 + dx;
                let v = if nx >= 0 && nx < width as i32 {
                    mask.get_pixel(nx as u32, y)[0]
                } else {
                    outside
                };
                min_val = min_val.min(v);
            }
            temp.put_pixel(x, y, Luma([min_val]));
        }
    }

    // Vertical pass
    let mut result = GrayImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let mut min_val = 255u8;
            for dy in lo..=hi {
                let ny = y as i32 + dy;
                let v = if ny >= 0 && ny < height as i32 {
                    temp.get_pixel(x, ny as u32)[0]
                } else {
                    outside
                };
                min_val = min_val.min(v);
            }
            result.put_pixel(x, y, Luma([min_val]));
        }
    }

    result
}

/// Simple box-approximated blur for grayscale images.
/// Uses separable horizontal + vertical passes with clamped edges.
fn blur(img: &GrayImage, radius: f32) -> GrayImage {
    let (width, height) = img.dimensions();
    let r = (radius.ceil() as i32).max(1);

    // Horizontal pass
    let mut temp = GrayImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let mut sum = 0.0f32;
            let mut count = 0.0f32;
            for dx in -r..=r {
                let nx = (x as i32 + dx).clamp(0, width as i32 - 1) as u32;
                sum += img.get_pixel(nx, y)[0] as f32;
                count += 1.0;
            }
            temp.put_pixel(x, y, Luma([(sum / count) as u8]));
        }
    }

    // Vertical pass
    let mut result = GrayImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let mut sum = 0.0f32;
            let mut count = 0.0f32;
            for dy in -r..=r {
                let ny = (y as i32 + dy).clamp(0, height as i32 - 1) as u32;
                sum += temp.get_pixel(x, ny)[0] as f32;
                count += 1.0;
            }
            result.put_pixel(x, y, Luma([(sum / count) as u8]));
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn erode_spreads_the_minimum_over_the_window() {
        let mut mask = GrayImage::from_pixel(7, 7, Luma([255]));
        mask.put_pixel(3, 3, Luma([0]));

        let eroded = erode(&mask, 3, 255);
        assert_eq!(eroded.get_pixel(2, 2)[0], 0);
        assert_eq!(eroded.get_pixel(4, 4)[0], 0);
        assert_eq!(eroded.get_pixel(5, 3)[0], 255);
        // Border stays intact when the outside counts as set.
        assert_eq!(eroded.get_pixel(0, 0)[0], 255);

        let eroded = erode(&mask, 3, 0);
        assert_eq!(eroded.get_pixel(0, 0)[0], 0);
    }

    #[test]
    fn refine_keeps_certain_regions_hard() {
        // Left half solid foreground, right half solid background.
        let mut matte = GrayImage::new(40, 40);
        for y in 0..40 {
            for x in 0..40 {
                let v = if x < 20 { 255 } else { 0 };
                matte.put_pixel(x, y, Luma([v]));
            }
        }

        let refined = refine(&matte);
        assert_eq!(refined.get_pixel(10, 20)[0], 255);
        assert_eq!(refined.get_pixel(30, 20)[0], 0);
        // The band around the edge ramps instead of stepping.
        let band = refined.get_pixel(20, 20)[0];
        assert!(band > 0 && band < 255);
    }

    #[test]
    fn refine_blanks_an_empty_matte() {
        let matte = GrayImage::new(25, 25);
        let refined = refine(&matte);
        assert!(refined.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn refine_softens_the_frame_edge_of_a_full_matte() {
        let matte = GrayImage::from_pixel(30, 30, Luma([255]));
        let refined = refine(&matte);
        assert_eq!(refined.get_pixel(15, 15)[0], 255);
        let corner = refined.get_pixel(0, 0)[0];
        assert!(corner > 0 && corner < 255);
    }
}
