//! Alpha flattening for opaque output formats.

use image::{DynamicImage, Rgb, RgbImage};

/// Background composited under transparent pixels (white).
pub const DEFAULT_BACKGROUND: [u8; 3] = [255, 255, 255];

/// Composite `img` over a solid background, producing an opaque RGB image.
///
/// Images without an alpha channel are converted without blending.
pub fn flatten_alpha(img: &DynamicImage, background: [u8; 3]) -> RgbImage {
    if !has_alpha_channel(img) {
        return img.to_rgb8();
    }

    let rgba = img.to_rgba8();
    let mut output = RgbImage::new(rgba.width(), rgba.height());

    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = a as f32 / 255.0;
        let blend = |fg: u8, bg: u8| (fg as f32 * alpha + bg as f32 * (1.0 - alpha)).round() as u8;
        output.put_pixel(
            x,
            y,
            Rgb([
                blend(r, background[0]),
                blend(g, background[1]),
                blend(b, background[2]),
            ]),
        );
    }

    output
}

/// Check if an image has an alpha channel
pub fn has_alpha_channel(img: &DynamicImage) -> bool {
    img.color().has_alpha()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_flatten_onto_white() {
        let mut img = RgbaImage::new(2, 2);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255])); // Opaque red
        img.put_pixel(0, 1, Rgba([0, 255, 0, 128])); // Semi-transparent green
        img.put_pixel(1, 0, Rgba([0, 0, 255, 0])); // Fully transparent blue
        img.put_pixel(1, 1, Rgba([255, 255, 0, 255])); // Opaque yellow

        let flat = flatten_alpha(&DynamicImage::ImageRgba8(img), DEFAULT_BACKGROUND);

        assert_eq!(flat.get_pixel(0, 0), &Rgb([255, 0, 0]));
        assert_eq!(flat.get_pixel(0, 1), &Rgb([127, 255, 127]));
        assert_eq!(flat.get_pixel(1, 0), &Rgb([255, 255, 255]));
        assert_eq!(flat.get_pixel(1, 1), &Rgb([255, 255, 0]));
    }

    #[test]
    fn test_opaque_image_passes_through() {
        let mut img = RgbImage::new(1, 1);
        img.put_pixel(0, 0, Rgb([10, 20, 30]));
        let flat = flatten_alpha(&DynamicImage::ImageRgb8(img), [0, 0, 0]);
        assert_eq!(flat.get_pixel(0, 0), &Rgb([10, 20, 30]));
    }

    #[test]
    fn test_has_alpha_channel() {
        assert!(has_alpha_channel(&DynamicImage::ImageRgba8(RgbaImage::new(1, 1))));
        assert!(!has_alpha_channel(&DynamicImage::ImageRgb8(RgbImage::new(1, 1))));
    }
}
