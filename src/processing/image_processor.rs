use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageFormat, Luma, RgbImage};
use imageproc::contrast::threshold;
use imageproc::filter::median_filter;
use log::debug;

use crate::utils::AnalysisError;

const CONTRAST_GAIN: f32 = 1.75;
const BINARY_THRESHOLD: u8 = 127;

/// Prepares a decoded image for text recognition. Quality analysis and
/// preprocessing read the same source pixels but are independent
/// computations; this stage only serves the OCR engine.
pub struct ImageProcessor;

impl ImageProcessor {
    /// Contrast-stretch, denoise, and binarize the image, returning PNG
    /// bytes ready for the recognition engine.
    pub fn prepare_for_ocr(image: &RgbImage) -> Result<Vec<u8>, AnalysisError> {
        let gray = image::imageops::grayscale(image);

        let contrasted = Self::scale_contrast(&gray, CONTRAST_GAIN);
        let denoised = median_filter(&contrasted, 1, 1);
        let binary = threshold(&denoised, BINARY_THRESHOLD);

        let mut buffer = Vec::with_capacity((image.width() * image.height() / 4) as usize);
        let mut cursor = Cursor::new(&mut buffer);
        DynamicImage::ImageLuma8(binary)
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|e| {
                AnalysisError::ImageProcessingError(format!("Failed to encode processed image: {}", e))
            })?;

        debug!("OCR preprocessing complete ({} bytes)", buffer.len());
        Ok(buffer)
    }

    /// Multiply every pixel by a gain factor, saturating at white.
    fn scale_contrast(gray: &GrayImage, gain: f32) -> GrayImage {
        let (width, height) = gray.dimensions();
        let mut result = GrayImage::new(width, height);
        for (x, y, pixel) in gray.enumerate_pixels() {
            let scaled = (pixel.0[0] as f32 * gain).round().min(255.0) as u8;
            result.put_pixel(x, y, Luma([scaled]));
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_contrast_scaling_saturates() {
        let gray = GrayImage::from_pixel(2, 2, Luma([200]));
        let scaled = ImageProcessor::scale_contrast(&gray, 1.75);
        assert_eq!(scaled.get_pixel(0, 0).0[0], 255);

        let dark = GrayImage::from_pixel(2, 2, Luma([40]));
        let scaled = ImageProcessor::scale_contrast(&dark, 1.75);
        assert_eq!(scaled.get_pixel(0, 0).0[0], 70);
    }

    #[test]
    fn test_prepare_for_ocr_emits_png() {
        let img = RgbImage::from_pixel(16, 16, Rgb([90, 90, 90]));
        let bytes = ImageProcessor::prepare_for_ocr(&img).unwrap();
        // PNG signature
        assert_eq!(&bytes[..4], &[0x89, 0x50, 0x4E, 0x47]);
    }

    #[test]
    fn test_binarization_produces_two_levels() {
        let mut img = RgbImage::new(8, 8);
        for (x, _, pixel) in img.enumerate_pixels_mut() {
            *pixel = if x < 4 { Rgb([10, 10, 10]) } else { Rgb([240, 240, 240]) };
        }
        let bytes = ImageProcessor::prepare_for_ocr(&img).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_luma8();
        for pixel in decoded.pixels() {
            assert!(pixel.0[0] == 0 || pixel.0[0] == 255);
        }
    }
}
