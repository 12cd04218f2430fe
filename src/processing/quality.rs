use image::imageops::{self, FilterType};
use image::{GrayImage, RgbImage};
use imageproc::filter::filter3x3;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};

use crate::models::{QualityAnalysis, QualityMetrics};
use crate::processing::colorspace::{self, YcrcbPlanes};

// Feature references the thresholds below were tuned against.
const MEGAPIXEL_REFERENCE: f64 = 1_000_000.0;
const HUE_GRADIENT_THRESHOLD: f64 = 30.0;
const HUE_SPREAD_REFERENCE: f64 = 75.0;

// Acceptable edge-response range for a photographed card. Mid-range blur is
// what a genuine capture looks like; both extremes are suspicious.
const BLUR_MIN_ACCEPTABLE: f64 = 100.0;
const BLUR_OPTIMAL: f64 = 1000.0;
const BLUR_MAX_ACCEPTABLE: f64 = 5000.0;

// Fusion weights. The strongest differentiators dominate; the secondary
// metrics contribute through the indicator thresholds instead.
const WEIGHT_COLOR_TRANSITION: f64 = 12.0;
const WEIGHT_RESOLUTION: f64 = 10.0;
const WEIGHT_MICROPRINT: f64 = 8.0;
const WEIGHT_DIGITAL_ARTIFACTS: f64 = 4.0;
const WEIGHT_RAINBOW: f64 = 0.1;
const WEIGHT_BLUR: f64 = 0.1;
const WEIGHT_SATURATION: f64 = 0.1;

const FFT_SIZE: u32 = 128;

/// Derives tamper/quality metrics from a decoded image and fuses them into
/// the image fraud sub-score. Each call builds its result from scratch;
/// nothing carries over between documents.
pub struct ImageQualityAnalyzer;

impl ImageQualityAnalyzer {
    pub fn analyze(image: &RgbImage) -> QualityAnalysis {
        let gray = imageops::grayscale(image);
        let hsv = colorspace::rgb_to_hsv(image);
        let ycrcb = colorspace::rgb_to_ycrcb(image);

        let metrics = QualityMetrics {
            resolution_score: Self::resolution_score(image.width(), image.height()),
            color_transition: Self::color_transition_score(&hsv.hue),
            rainbow_effect: Self::rainbow_score(&hsv.hue),
            blur_score: Self::blur_score(Self::laplacian_variance(&gray)),
            saturation_score: Self::saturation_score(&hsv.sat),
            digital_artifacts: Self::digital_artifact_score(&ycrcb),
            microprint_score: Self::microprint_score(&gray),
        };

        let (fake_indicators, indicator_penalty) = Self::collect_indicators(&metrics);
        let image_fraud_score = Self::fuse(&metrics, fake_indicators.len());

        QualityAnalysis {
            metrics,
            fake_indicators,
            indicator_penalty,
            image_fraud_score,
        }
    }

    /// Images below the megapixel reference score toward 100; at or above the
    /// reference the feature bottoms out at 0.
    fn resolution_score(width: u32, height: u32) -> f64 {
        let megapixel_share = (width as f64 * height as f64) / MEGAPIXEL_REFERENCE;
        (100.0 - megapixel_share * 100.0).clamp(0.0, 100.0)
    }

    /// Count of pixel locations whose hue gradient magnitude exceeds the
    /// transition threshold, capped. Printed cards transition hue smoothly;
    /// synthetic composites do not.
    fn color_transition_score(hue: &GrayImage) -> f64 {
        let gx = horizontal_sobel(hue);
        let gy = vertical_sobel(hue);

        let mut transitions = 0u64;
        for (gx_px, gy_px) in gx.pixels().zip(gy.pixels()) {
            let dx = gx_px.0[0] as f64;
            let dy = gy_px.0[0] as f64;
            if (dx * dx + dy * dy).sqrt() > HUE_GRADIENT_THRESHOLD {
                transitions += 1;
            }
        }
        (transitions as f64).min(100.0)
    }

    /// Hue spread against the reference deviation. A simulated hologram
    /// overlay pushes hue variance well past what card stock produces.
    fn rainbow_score(hue: &GrayImage) -> f64 {
        let values: Vec<f64> = hue.pixels().map(|p| p.0[0] as f64).collect();
        (std_dev(&values) / HUE_SPREAD_REFERENCE * 100.0).clamp(0.0, 100.0)
    }

    fn saturation_score(sat: &GrayImage) -> f64 {
        let values: Vec<f64> = sat.pixels().map(|p| p.0[0] as f64).collect();
        (mean(&values) / 255.0 * 150.0).clamp(0.0, 100.0)
    }

    fn laplacian_variance(gray: &GrayImage) -> f64 {
        let kernel: [i16; 9] = [0, 1, 0, 1, -4, 1, 0, 1, 0];
        let response = filter3x3::<_, i16, i16>(gray, &kernel);
        let values: Vec<f64> = response.pixels().map(|p| p.0[0] as f64).collect();
        let sigma = std_dev(&values);
        sigma * sigma
    }

    /// Second-derivative edge response mapped onto a non-monotonic penalty:
    /// too blurry and too sharp both score high, the optimal mid-range
    /// scores near zero.
    pub(crate) fn blur_score(variance: f64) -> f64 {
        if variance < BLUR_MIN_ACCEPTABLE {
            let ratio = variance / BLUR_MIN_ACCEPTABLE;
            (100.0 - ratio * 50.0).clamp(0.0, 100.0)
        } else if variance > BLUR_MAX_ACCEPTABLE {
            let excess = (variance - BLUR_MAX_ACCEPTABLE) / BLUR_MAX_ACCEPTABLE;
            (50.0 + excess * 25.0).clamp(0.0, 100.0)
        } else {
            let distance = (variance - BLUR_OPTIMAL).abs() / (BLUR_MAX_ACCEPTABLE - BLUR_MIN_ACCEPTABLE);
            (distance * 50.0).clamp(0.0, 100.0)
        }
    }

    /// Ratio of coarse-grid chroma/luma deviation to the full-image
    /// deviation. Block compression and upscaling leave the subsampled grid
    /// almost as varied as the full image.
    fn digital_artifact_score(planes: &YcrcbPlanes) -> f64 {
        let full: Vec<f64> = planes
            .y
            .pixels()
            .chain(planes.cr.pixels())
            .chain(planes.cb.pixels())
            .map(|p| p.0[0] as f64)
            .collect();

        let mut sampled = Vec::new();
        for plane in [&planes.y, &planes.cr, &planes.cb] {
            for y in (0..plane.height()).step_by(8) {
                for x in (0..plane.width()).step_by(8) {
                    sampled.push(plane.get_pixel(x, y).0[0] as f64);
                }
            }
        }

        let full_dev = std_dev(&full);
        if full_dev == 0.0 {
            return 0.0;
        }
        (std_dev(&sampled) / full_dev * 50.0).clamp(0.0, 100.0)
    }

    /// Microprint detail richness from three angles: sharpening residual at
    /// several kernel scales, regularity of horizontal line spacing, and the
    /// share of high-frequency spectral energy. Genuine documents carry more
    /// fine structure, so the combined richness is inverted.
    fn microprint_score(gray: &GrayImage) -> f64 {
        let detail = Self::sharpening_residual(gray);
        let spacing = Self::line_spacing_consistency(gray);
        let frequency = Self::high_frequency_score(gray);

        let richness = detail * 0.4 + spacing * 0.3 + frequency * 0.3;
        (100.0 - richness).clamp(0.0, 100.0)
    }

    fn sharpening_residual(gray: &GrayImage) -> f64 {
        let mut scores = Vec::new();
        for size in [3u32, 5, 7] {
            let divisor = (size * 2) as f32;
            let kernel: [f32; 9] = [
                -1.0 / divisor,
                -1.0 / divisor,
                -1.0 / divisor,
                -1.0 / divisor,
                9.0 / divisor,
                -1.0 / divisor,
                -1.0 / divisor,
                -1.0 / divisor,
                -1.0 / divisor,
            ];
            let filtered = filter3x3::<_, f32, u8>(gray, &kernel);

            let significant: Vec<f64> = filtered
                .pixels()
                .zip(gray.pixels())
                .map(|(f, g)| (f.0[0] as f64 - g.0[0] as f64).abs())
                .filter(|d| *d > 10.0)
                .collect();
            scores.push(if significant.is_empty() { 0.0 } else { mean(&significant) });
        }
        mean(&scores)
    }

    /// Deviation of the positive first differences of per-row strong-edge
    /// counts. Regular microprint rows keep this low on genuine documents.
    fn line_spacing_consistency(gray: &GrayImage) -> f64 {
        const EDGE_THRESHOLD: f64 = 30.0;

        let gy = vertical_sobel(gray);
        let (width, height) = gy.dimensions();

        let mut row_counts = Vec::with_capacity(height as usize);
        for y in 0..height {
            let mut count = 0i64;
            for x in 0..width {
                if (gy.get_pixel(x, y).0[0] as f64).abs() > EDGE_THRESHOLD {
                    count += 1;
                }
            }
            row_counts.push(count);
        }

        let positive_diffs: Vec<f64> = row_counts
            .windows(2)
            .map(|w| (w[1] - w[0]) as f64)
            .filter(|d| *d > 0.0)
            .collect();

        if positive_diffs.is_empty() {
            100.0
        } else {
            std_dev(&positive_diffs).min(100.0)
        }
    }

    /// Spectral energy outside the central half-size window over total
    /// energy, from a fixed-size luma resample.
    fn high_frequency_score(gray: &GrayImage) -> f64 {
        let resized = imageops::resize(gray, FFT_SIZE, FFT_SIZE, FilterType::Triangle);
        let n = FFT_SIZE as usize;

        let mut re = vec![0.0f64; n * n];
        let mut im = vec![0.0f64; n * n];
        for (i, pixel) in resized.pixels().enumerate() {
            re[i] = pixel.0[0] as f64;
        }

        // Row pass then column pass of the 1-D transform.
        for row in 0..n {
            fft_inplace(&mut re[row * n..(row + 1) * n], &mut im[row * n..(row + 1) * n]);
        }
        let mut col_re = vec![0.0f64; n];
        let mut col_im = vec![0.0f64; n];
        for col in 0..n {
            for row in 0..n {
                col_re[row] = re[row * n + col];
                col_im[row] = im[row * n + col];
            }
            fft_inplace(&mut col_re, &mut col_im);
            for row in 0..n {
                re[row * n + col] = col_re[row];
                im[row * n + col] = col_im[row];
            }
        }

        let half = (n / 4) as i64;
        let mut total = 0.0;
        let mut high = 0.0;
        for row in 0..n {
            let fy = centered_frequency(row, n);
            for col in 0..n {
                let fx = centered_frequency(col, n);
                let idx = row * n + col;
                let magnitude = (re[idx] * re[idx] + im[idx] * im[idx]).sqrt();
                total += magnitude;
                if fx.abs() >= half || fy.abs() >= half {
                    high += magnitude;
                }
            }
        }

        if total == 0.0 {
            return 0.0;
        }
        (high / total * 1000.0).min(100.0)
    }

    fn collect_indicators(metrics: &QualityMetrics) -> (Vec<String>, f64) {
        let mut indicators = Vec::new();
        let mut penalty = 0.0;

        // Primary indicators
        if metrics.resolution_score > 40.0 {
            indicators.push("Suspicious image resolution".to_string());
            penalty += 15.0;
        }
        if metrics.color_transition > 25.0 {
            indicators.push("Unnatural color transitions".to_string());
            penalty += 15.0;
        }
        if metrics.microprint_score > 50.0 {
            indicators.push("Suspicious microprint patterns".to_string());
            penalty += 10.0;
        }

        // Secondary indicators
        if metrics.rainbow_effect > 60.0 {
            indicators.push("Suspicious rainbow/hologram pattern".to_string());
            penalty += 10.0;
        }
        if metrics.saturation_score > 45.0 {
            indicators.push("Excessive color saturation".to_string());
            penalty += 10.0;
        }
        if metrics.digital_artifacts > 55.0 {
            indicators.push("Digital scanning artifacts detected".to_string());
            penalty += 10.0;
        }

        if indicators.len() >= 3 {
            penalty += 20.0;
        }

        (indicators, penalty)
    }

    fn fuse(metrics: &QualityMetrics, indicator_count: usize) -> f64 {
        let total_weight = WEIGHT_COLOR_TRANSITION
            + WEIGHT_RESOLUTION
            + WEIGHT_MICROPRINT
            + WEIGHT_DIGITAL_ARTIFACTS
            + WEIGHT_RAINBOW
            + WEIGHT_BLUR
            + WEIGHT_SATURATION;

        let weighted_sum = metrics.color_transition * WEIGHT_COLOR_TRANSITION
            + metrics.resolution_score * WEIGHT_RESOLUTION
            + metrics.microprint_score * WEIGHT_MICROPRINT
            + metrics.digital_artifacts * WEIGHT_DIGITAL_ARTIFACTS
            + metrics.rainbow_effect * WEIGHT_RAINBOW
            + metrics.blur_score * WEIGHT_BLUR
            + metrics.saturation_score * WEIGHT_SATURATION;

        let mut score = weighted_sum / total_weight;

        if indicator_count >= 4 {
            score *= 1.5;
        } else if indicator_count >= 3 {
            score *= 1.4;
        } else if indicator_count >= 2 {
            score *= 1.3;
        }

        // Two heavily-weighted features individually past 75 mark an extreme
        // case regardless of the indicator count.
        let extreme = [
            metrics.color_transition,
            metrics.resolution_score,
            metrics.microprint_score,
        ]
        .iter()
        .filter(|v| **v > 75.0)
        .count();
        if extreme >= 2 {
            score *= 1.2;
        }

        score.min(100.0)
    }
}

fn centered_frequency(index: usize, n: usize) -> i64 {
    let half = (n / 2) as i64;
    ((index as i64 + half) % n as i64) - half
}

/// Iterative radix-2 transform; length must be a power of two.
fn fft_inplace(re: &mut [f64], im: &mut [f64]) {
    let n = re.len();
    if n <= 1 {
        return;
    }
    debug_assert!(n.is_power_of_two());

    let mut j = 0;
    for i in 1..n {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j |= bit;
        if i < j {
            re.swap(i, j);
            im.swap(i, j);
        }
    }

    let mut len = 2;
    while len <= n {
        let angle = -2.0 * std::f64::consts::PI / len as f64;
        let (w_re, w_im) = (angle.cos(), angle.sin());
        for start in (0..n).step_by(len) {
            let (mut cur_re, mut cur_im) = (1.0f64, 0.0f64);
            for k in 0..len / 2 {
                let a = start + k;
                let b = start + k + len / 2;
                let (u_re, u_im) = (re[a], im[a]);
                let (v_re, v_im) = (
                    re[b] * cur_re - im[b] * cur_im,
                    re[b] * cur_im + im[b] * cur_re,
                );
                re[a] = u_re + v_re;
                im[a] = u_im + v_im;
                re[b] = u_re - v_re;
                im[b] = u_im - v_im;
                let next_re = cur_re * w_re - cur_im * w_im;
                cur_im = cur_re * w_im + cur_im * w_re;
                cur_re = next_re;
            }
        }
        len <<= 1;
    }
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}
