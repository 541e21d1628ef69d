use image::{imageops, GrayImage, Luma, RgbImage};

/// Convert an RGB patch to single-channel intensity
pub fn to_grayscale(patch: &RgbImage) -> GrayImage {
    imageops::grayscale(patch)
}

/// Global Otsu threshold over a 256-bin histogram
///
/// Returns the intensity that maximises the between-class variance; pixels
/// strictly above it are background-separated foreground.
pub fn otsu_threshold(image: &GrayImage) -> u8 {
    let mut histogram = [0u32; 256];
    for pixel in image.pixels() {
        histogram[pixel[0] as usize] += 1;
    }

    let total = image.width() as u64 * image.height() as u64;
    let mut sum_total = 0u64;
    for (i, &count) in histogram.iter().enumerate() {
        sum_total += (i as u64) * (count as u64);
    }

    let mut sum_b = 0u64;
    let mut w_b = 0u64;
    let mut max_var = 0.0f64;
    let mut threshold = 0u8;

    for (i, &count) in histogram.iter().enumerate() {
        w_b += count as u64;
        if w_b == 0 {
            continue;
        }
        let w_f = total - w_b;
        if w_f == 0 {
            break;
        }
        sum_b += (i as u64) * (count as u64);
        let m_b = sum_b as f64 / w_b as f64;
        let m_f = (sum_total - sum_b) as f64 / w_f as f64;
        let between = (w_b as f64) * (w_f as f64) * (m_b - m_f).powi(2);
        if between > max_var {
            max_var = between;
            threshold = i as u8;
        }
    }

    threshold
}

/// Inverted binarization: bright overlay text becomes black on white
pub fn binarize_inverted(image: &GrayImage, threshold: u8) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        if image.get_pixel(x, y)[0] > threshold {
            Luma([0])
        } else {
            Luma([255])
        }
    })
}

/// Full preprocessing chain for one region patch
pub fn prepare_patch(patch: &RgbImage) -> GrayImage {
    let gray = to_grayscale(patch);
    let threshold = otsu_threshold(&gray);
    binarize_inverted(&gray, threshold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn two_tone_patch() -> RgbImage {
        // white glyph stripe on a dark background
        RgbImage::from_fn(20, 10, |x, _| {
            if (8..12).contains(&x) {
                Rgb([240, 240, 240])
            } else {
                Rgb([20, 25, 30])
            }
        })
    }

    #[test]
    fn test_otsu_splits_bimodal_histogram() {
        let gray = to_grayscale(&two_tone_patch());
        let threshold = otsu_threshold(&gray);
        assert!(threshold >= 20 && threshold < 240, "threshold {}", threshold);
    }

    #[test]
    fn test_prepare_patch_inverts_text() {
        let binary = prepare_patch(&two_tone_patch());
        assert_eq!(binary.get_pixel(10, 5)[0], 0);
        assert_eq!(binary.get_pixel(2, 5)[0], 255);
        assert!(binary.pixels().all(|p| p[0] == 0 || p[0] == 255));
    }

    #[test]
    fn test_uniform_patch_stays_uniform() {
        let patch = RgbImage::from_pixel(6, 6, Rgb([90, 90, 90]));
        let gray = to_grayscale(&patch);
        assert_eq!(otsu_threshold(&gray), 0);

        let binary = prepare_patch(&patch);
        let first = binary.get_pixel(0, 0)[0];
        assert!(binary.pixels().all(|p| p[0] == first));
    }
}
