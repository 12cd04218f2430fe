use image::imageops;
use image::RgbImage;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};

use crate::models::FaceRegion;
use crate::processing::colorspace;
use crate::processing::quality::{mean, std_dev};

/// Result of judging the portrait region of a card.
#[derive(Debug, Clone)]
pub struct HeadshotAssessment {
    pub score: f64,
    pub issues: Vec<String>,
}

/// Plausibility check for the portrait region of a license. This is an
/// optional, explicitly invoked extension: the scoring pipeline does not
/// call it, and face detection itself is a collaborator concern. Callers
/// pass in the regions their detector found.
pub struct HeadshotValidator;

impl HeadshotValidator {
    pub fn validate(image: &RgbImage, faces: &[FaceRegion]) -> HeadshotAssessment {
        if faces.is_empty() {
            return HeadshotAssessment {
                score: 75.0,
                issues: vec!["No face detected in ID".to_string()],
            };
        }
        if faces.len() > 1 {
            return HeadshotAssessment {
                score: 75.0,
                issues: vec!["Multiple faces detected in ID".to_string()],
            };
        }

        let face = faces[0];
        let (width, height) = image.dimensions();
        let mut score: f64 = 0.0;
        let mut issues = Vec::new();

        let size_ratio = (face.width as f64 * face.height as f64) / (width as f64 * height as f64);
        if !(0.08..=0.35).contains(&size_ratio) {
            score += 15.0;
            issues.push(format!("Unusual face size: {:.1}% of ID", size_ratio * 100.0));
        }

        // The portrait sits on the left side of US license layouts
        let position_x = face.x as f64 / width as f64;
        if !(0.08..=0.45).contains(&position_x) {
            score += 15.0;
            issues.push(format!("Unusual face position (x): {:.1}%", position_x * 100.0));
        }

        let position_y = face.y as f64 / height as f64;
        if !(0.15..=0.85).contains(&position_y) {
            score += 15.0;
            issues.push(format!("Unusual face position (y): {:.1}%", position_y * 100.0));
        }

        let aspect = face.width as f64 / face.height.max(1) as f64;
        if !(0.55..=0.95).contains(&aspect) {
            score += 15.0;
            issues.push(format!("Unusual face aspect ratio: {:.2}", aspect));
        }

        let region = imageops::crop_imm(image, face.x, face.y, face.width, face.height).to_image();
        let gray = imageops::grayscale(&region);
        let luma: Vec<f64> = gray.pixels().map(|p| p.0[0] as f64).collect();

        let brightness = mean(&luma);
        if !(40.0..=215.0).contains(&brightness) {
            score += 10.0;
            issues.push(format!("Unusual face brightness: {:.1}", brightness));
        }

        let contrast = std_dev(&luma);
        if contrast < 25.0 {
            score += 10.0;
            issues.push(format!("Low face contrast: {:.1}", contrast));
        }

        let edge_density = Self::edge_density(&gray);
        if edge_density > 0.35 {
            score += 10.0;
            issues.push("Unusual edge patterns in photo".to_string());
        }

        let hsv = colorspace::rgb_to_hsv(&region);
        let sat: Vec<f64> = hsv.sat.pixels().map(|p| p.0[0] as f64).collect();
        if std_dev(&sat) < 8.0 {
            score += 10.0;
            issues.push("Suspiciously uniform photo coloring".to_string());
        }

        HeadshotAssessment {
            score: score.min(100.0),
            issues,
        }
    }

    /// Share of pixels with a strong gradient response. A pasted-in or
    /// screen-captured portrait carries far more hard edges than a printed
    /// photo.
    fn edge_density(gray: &image::GrayImage) -> f64 {
        let gx = horizontal_sobel(gray);
        let gy = vertical_sobel(gray);
        let total = (gray.width() * gray.height()).max(1) as f64;
        let strong = gx
            .pixels()
            .zip(gy.pixels())
            .filter(|(px, py)| {
                let dx = px.0[0] as f64;
                let dy = py.0[0] as f64;
                (dx * dx + dy * dy).sqrt() > 400.0
            })
            .count();
        strong as f64 / total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn card_with_noise() -> RgbImage {
        // A 400x250 card with a textured portrait block on the left third
        let mut img = RgbImage::from_pixel(400, 250, Rgb([210, 205, 195]));
        for y in 60..200 {
            for x in 50..150 {
                let v = (((x * 13 + y * 29) % 97) + 80) as u8;
                img.put_pixel(x, y, Rgb([v, v.wrapping_add(30), v.wrapping_sub(20)]));
            }
        }
        img
    }

    #[test]
    fn test_no_face_scores_75() {
        let img = card_with_noise();
        let assessment = HeadshotValidator::validate(&img, &[]);
        assert_eq!(assessment.score, 75.0);
        assert_eq!(assessment.issues, vec!["No face detected in ID".to_string()]);
    }

    #[test]
    fn test_multiple_faces_score_75() {
        let img = card_with_noise();
        let region = FaceRegion { x: 50, y: 60, width: 100, height: 140 };
        let assessment = HeadshotValidator::validate(&img, &[region, region]);
        assert_eq!(assessment.score, 75.0);
    }

    #[test]
    fn test_plausible_region_scores_low() {
        let img = card_with_noise();
        // ~11% of the card, left side, portrait aspect
        let region = FaceRegion { x: 50, y: 60, width: 100, height: 140 };
        let assessment = HeadshotValidator::validate(&img, &[region]);
        assert!(assessment.score <= 25.0, "score was {}", assessment.score);
    }

    #[test]
    fn test_misplaced_region_accumulates_issues() {
        let img = card_with_noise();
        // Tiny region in the far right corner with landscape aspect
        let region = FaceRegion { x: 380, y: 10, width: 16, height: 8 };
        let assessment = HeadshotValidator::validate(&img, &[region]);
        assert!(assessment.score >= 45.0);
        assert!(assessment.issues.len() >= 3);
    }
}
