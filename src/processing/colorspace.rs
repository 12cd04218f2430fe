use image::{GrayImage, Luma, RgbImage};

/// Hue/saturation/value planes of an RGB image, in the 8-bit convention the
/// tuned thresholds assume: hue in [0, 180), saturation and value in [0, 255].
pub struct HsvPlanes {
    pub hue: GrayImage,
    pub sat: GrayImage,
    pub val: GrayImage,
}

/// Luma and chroma planes (Y, Cr, Cb), each in [0, 255].
pub struct YcrcbPlanes {
    pub y: GrayImage,
    pub cr: GrayImage,
    pub cb: GrayImage,
}

pub fn rgb_to_hsv(image: &RgbImage) -> HsvPlanes {
    let (width, height) = image.dimensions();
    let mut hue = GrayImage::new(width, height);
    let mut sat = GrayImage::new(width, height);
    let mut val = GrayImage::new(width, height);

    for (x, y, pixel) in image.enumerate_pixels() {
        let r = pixel.0[0] as f32;
        let g = pixel.0[1] as f32;
        let b = pixel.0[2] as f32;

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;

        let s = if max > 0.0 { 255.0 * delta / max } else { 0.0 };

        let h_degrees = if delta > 0.0 {
            let h = if max == r {
                60.0 * (g - b) / delta
            } else if max == g {
                120.0 + 60.0 * (b - r) / delta
            } else {
                240.0 + 60.0 * (r - g) / delta
            };
            if h < 0.0 {
                h + 360.0
            } else {
                h
            }
        } else {
            0.0
        };

        // Halved so the full hue circle fits one byte, matching the
        // convention the feature thresholds were tuned against.
        hue.put_pixel(x, y, Luma([(h_degrees / 2.0).round().min(179.0) as u8]));
        sat.put_pixel(x, y, Luma([s.round().min(255.0) as u8]));
        val.put_pixel(x, y, Luma([max as u8]));
    }

    HsvPlanes { hue, sat, val }
}

pub fn rgb_to_ycrcb(image: &RgbImage) -> YcrcbPlanes {
    let (width, height) = image.dimensions();
    let mut y_plane = GrayImage::new(width, height);
    let mut cr_plane = GrayImage::new(width, height);
    let mut cb_plane = GrayImage::new(width, height);

    for (x, y, pixel) in image.enumerate_pixels() {
        let r = pixel.0[0] as f32;
        let g = pixel.0[1] as f32;
        let b = pixel.0[2] as f32;

        let luma = 0.299 * r + 0.587 * g + 0.114 * b;
        let cr = (r - luma) * 0.713 + 128.0;
        let cb = (b - luma) * 0.564 + 128.0;

        y_plane.put_pixel(x, y, Luma([luma.round().clamp(0.0, 255.0) as u8]));
        cr_plane.put_pixel(x, y, Luma([cr.round().clamp(0.0, 255.0) as u8]));
        cb_plane.put_pixel(x, y, Luma([cb.round().clamp(0.0, 255.0) as u8]));
    }

    YcrcbPlanes {
        y: y_plane,
        cr: cr_plane,
        cb: cb_plane,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_pure_red_hsv() {
        let mut img = RgbImage::new(1, 1);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        let hsv = rgb_to_hsv(&img);
        assert_eq!(hsv.hue.get_pixel(0, 0).0[0], 0);
        assert_eq!(hsv.sat.get_pixel(0, 0).0[0], 255);
        assert_eq!(hsv.val.get_pixel(0, 0).0[0], 255);
    }

    #[test]
    fn test_pure_blue_hue_is_120() {
        let mut img = RgbImage::new(1, 1);
        img.put_pixel(0, 0, Rgb([0, 0, 255]));
        let hsv = rgb_to_hsv(&img);
        // 240 degrees halved
        assert_eq!(hsv.hue.get_pixel(0, 0).0[0], 120);
    }

    #[test]
    fn test_gray_pixel_has_no_saturation() {
        let mut img = RgbImage::new(1, 1);
        img.put_pixel(0, 0, Rgb([128, 128, 128]));
        let hsv = rgb_to_hsv(&img);
        assert_eq!(hsv.hue.get_pixel(0, 0).0[0], 0);
        assert_eq!(hsv.sat.get_pixel(0, 0).0[0], 0);
        assert_eq!(hsv.val.get_pixel(0, 0).0[0], 128);
    }

    #[test]
    fn test_neutral_pixel_chroma_centered() {
        let mut img = RgbImage::new(1, 1);
        img.put_pixel(0, 0, Rgb([100, 100, 100]));
        let planes = rgb_to_ycrcb(&img);
        assert_eq!(planes.y.get_pixel(0, 0).0[0], 100);
        assert_eq!(planes.cr.get_pixel(0, 0).0[0], 128);
        assert_eq!(planes.cb.get_pixel(0, 0).0[0], 128);
    }
}
