use image::{DynamicImage, GrayImage, Luma};

const BLACK: Luma<u8> = Luma([0]);
const WHITE: Luma<u8> = Luma([255]);

/// Global threshold: luma below `threshold` is black, the rest white
pub fn binarize(image: &DynamicImage, threshold: u8) -> GrayImage {
    let mut gray = image.to_luma8();
    for pixel in gray.pixels_mut() {
        *pixel = if pixel.0[0] < threshold { BLACK } else { WHITE };
    }
    gray
}

/// Map a pointer X over the display width onto the threshold range
pub fn threshold_from_position(x: f32, display_width: f32) -> u8 {
    if display_width <= 0.0 || !x.is_finite() {
        return 0;
    }
    ((x / display_width) * 256.0).clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn gradient() -> DynamicImage {
        let img = RgbaImage::from_fn(4, 1, |x, _| {
            let v = [0, 127, 128, 255][x as usize];
            image::Rgba([v, v, v, 255])
        });
        DynamicImage::ImageRgba8(img)
    }

    #[test]
    fn splits_at_threshold() {
        let out = binarize(&gradient(), 128);
        let values: Vec<u8> = out.pixels().map(|p| p.0[0]).collect();
        assert_eq!(values, vec![0, 0, 255, 255]);
    }

    #[test]
    fn zero_threshold_is_all_white() {
        let out = binarize(&gradient(), 0);
        assert!(out.pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn position_maps_linearly() {
        assert_eq!(threshold_from_position(0.0, 1000.0), 0);
        assert_eq!(threshold_from_position(500.0, 1000.0), 128);
        assert_eq!(threshold_from_position(1000.0, 1000.0), 255);
        assert_eq!(threshold_from_position(-20.0, 1000.0), 0);
    }

    #[test]
    fn degenerate_width_maps_to_zero() {
        assert_eq!(threshold_from_position(10.0, 0.0), 0);
    }
}
