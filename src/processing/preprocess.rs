use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, Luma};
use imageproc::contrast::{otsu_level, threshold};

/// Working height bounds for the OCR stage. Crops below the minimum are
/// upscaled; crops above the maximum are downscaled, which keeps the
/// denoiser's cost bounded on high-resolution scans.
const MIN_REGION_HEIGHT: u32 = 200;
const MAX_REGION_HEIGHT: u32 = 400;

/// Local contrast enhancement parameters (clip limit and tile grid).
const CLAHE_CLIP_LIMIT: f32 = 3.0;
const CLAHE_GRID: u32 = 8;

/// Non-local-means parameters: filter strength, patch size, search window.
const NLM_H: f32 = 30.0;
const NLM_PATCH: i32 = 7;
const NLM_SEARCH: i32 = 21;

/// Prepares a suspected MRZ crop for character recognition.
///
/// The pipeline is fixed and order-dependent; reordering steps changes OCR
/// yield materially. No step branches on image content.
pub fn preprocess_region(region: &DynamicImage) -> GrayImage {
    // 1. Bring the crop into the working height band, preserving aspect
    //    ratio.
    let region = clamp_to_working_height(region);

    // 2. Grayscale.
    let gray = region.to_luma8();

    // 3. Local contrast enhancement.
    let enhanced = clahe(&gray);

    // 4. Denoise.
    let denoised = nl_means_denoise(&enhanced);

    // 5. Global Otsu binarization.
    let binary = threshold(&denoised, otsu_level(&denoised));

    // 6. Close broken strokes with a 2x2 structuring element.
    close_2x2(&binary)
}

fn clamp_to_working_height(region: &DynamicImage) -> DynamicImage {
    let target = region.height().clamp(MIN_REGION_HEIGHT, MAX_REGION_HEIGHT);
    if target == region.height() {
        return region.clone();
    }
    let scale = target as f32 / region.height() as f32;
    let width = (region.width() as f32 * scale).round().max(1.0) as u32;
    region.resize_exact(width, target, FilterType::CatmullRom)
}

/// Contrast-limited adaptive histogram equalization over an 8x8 tile grid.
/// Per-tile histograms are clipped, excess redistributed evenly, and the
/// resulting mappings blended bilinearly between neighboring tile centers.
/// Regions narrower or shorter than the full grid use only the tiles that
/// actually cover pixels.
fn clahe(img: &GrayImage) -> GrayImage {
    let (width, height) = img.dimensions();
    let tile_w = (width + CLAHE_GRID - 1) / CLAHE_GRID;
    let tile_h = (height + CLAHE_GRID - 1) / CLAHE_GRID;
    // Tiles with an origin past the image edge hold no pixels and take no
    // part in the interpolation below.
    let grid_x = ((width + tile_w - 1) / tile_w).min(CLAHE_GRID);
    let grid_y = ((height + tile_h - 1) / tile_h).min(CLAHE_GRID);
    let mut luts = vec![[0u8; 256]; (grid_x * grid_y) as usize];

    for ty in 0..grid_y {
        for tx in 0..grid_x {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = (x0 + tile_w).min(width);
            let y1 = (y0 + tile_h).min(height);

            let mut hist = [0u32; 256];
            for y in y0..y1 {
                for x in x0..x1 {
                    hist[img.get_pixel(x, y)[0] as usize] += 1;
                }
            }
            let count = ((x1 - x0) * (y1 - y0)) as u32;

            let clip = (CLAHE_CLIP_LIMIT * count as f32 / 256.0).max(1.0) as u32;
            let mut excess = 0u32;
            for bin in hist.iter_mut() {
                if *bin > clip {
                    excess += *bin - clip;
                    *bin = clip;
                }
            }
            let bonus = excess / 256;
            for bin in hist.iter_mut() {
                *bin += bonus;
            }

            let lut = &mut luts[(ty * grid_x + tx) as usize];
            let mut cdf = 0u32;
            for (value, bin) in hist.iter().enumerate() {
                cdf += bin;
                lut[value] = ((cdf as f32 / count as f32) * 255.0).round().min(255.0) as u8;
            }
        }
    }

    let mut out = GrayImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let value = img.get_pixel(x, y)[0] as usize;

            // Position in tile-center space, clamped to populated tiles.
            let gx = (x as f32 + 0.5) / tile_w as f32 - 0.5;
            let gy = (y as f32 + 0.5) / tile_h as f32 - 0.5;
            let tx0 = gx.floor().clamp(0.0, (grid_x - 1) as f32) as u32;
            let ty0 = gy.floor().clamp(0.0, (grid_y - 1) as f32) as u32;
            let tx1 = (tx0 + 1).min(grid_x - 1);
            let ty1 = (ty0 + 1).min(grid_y - 1);
            let fx = (gx - tx0 as f32).clamp(0.0, 1.0);
            let fy = (gy - ty0 as f32).clamp(0.0, 1.0);

            let lut_at = |tx: u32, ty: u32| luts[(ty * grid_x + tx) as usize][value] as f32;
            let top = lut_at(tx0, ty0) * (1.0 - fx) + lut_at(tx1, ty0) * fx;
            let bottom = lut_at(tx0, ty1) * (1.0 - fx) + lut_at(tx1, ty1) * fx;
            let blended = top * (1.0 - fy) + bottom * fy;

            out.put_pixel(x, y, Luma([blended.round().clamp(0.0, 255.0) as u8]));
        }
    }
    out
}

/// Non-local-means denoising: each output pixel is a similarity-weighted
/// average over a search window, with patch distance driving the weights.
///
/// Runs one pass per search offset: the squared-difference plane for that
/// offset gets an integral image, which makes every patch distance an O(1)
/// lookup. Total cost is search-window-area x pixels instead of the naive
/// additional patch-area factor.
fn nl_means_denoise(img: &GrayImage) -> GrayImage {
    let (width, height) = img.dimensions();
    let (w, h) = (width as usize, height as usize);
    let (wi, hi) = (width as i32, height as i32);
    let half_patch = NLM_PATCH / 2;
    let half_search = NLM_SEARCH / 2;
    let inv_h2 = 1.0 / (NLM_H * NLM_H * (NLM_PATCH * NLM_PATCH) as f32);

    let at = |x: i32, y: i32| -> f32 {
        img.get_pixel(x.clamp(0, wi - 1) as u32, y.clamp(0, hi - 1) as u32)[0] as f32
    };

    let mut weight_sum = vec![0.0f32; w * h];
    let mut value_sum = vec![0.0f32; w * h];
    let mut sq_diff = vec![0.0f32; w * h];
    let iw = w + 1;
    let mut integral = vec![0.0f32; iw * (h + 1)];

    for dy in -half_search..=half_search {
        for dx in -half_search..=half_search {
            for y in 0..hi {
                for x in 0..wi {
                    let d = at(x, y) - at(x + dx, y + dy);
                    sq_diff[y as usize * w + x as usize] = d * d;
                }
            }

            for y in 0..h {
                let mut row = 0.0f32;
                for x in 0..w {
                    row += sq_diff[y * w + x];
                    integral[(y + 1) * iw + (x + 1)] = integral[y * iw + (x + 1)] + row;
                }
            }

            for y in 0..hi {
                // Patches are truncated at the image border.
                let y0 = (y - half_patch).max(0) as usize;
                let y1 = (y + half_patch).min(hi - 1) as usize + 1;
                for x in 0..wi {
                    let x0 = (x - half_patch).max(0) as usize;
                    let x1 = (x + half_patch).min(wi - 1) as usize + 1;
                    let dist = integral[y1 * iw + x1] - integral[y0 * iw + x1]
                        - integral[y1 * iw + x0]
                        + integral[y0 * iw + x0];
                    let weight = (-dist * inv_h2).exp();
                    let i = y as usize * w + x as usize;
                    weight_sum[i] += weight;
                    value_sum[i] += weight * at(x + dx, y + dy);
                }
            }
        }
    }

    GrayImage::from_fn(width, height, |x, y| {
        let i = (y * width + x) as usize;
        Luma([(value_sum[i] / weight_sum[i]).round().clamp(0.0, 255.0) as u8])
    })
}

/// Morphological closing (dilate then erode) with a 2x2 structuring element.
/// imageproc only ships odd symmetric elements, so the 2x2 case is done here.
fn close_2x2(img: &GrayImage) -> GrayImage {
    erode_2x2(&dilate_2x2(img))
}

fn dilate_2x2(img: &GrayImage) -> GrayImage {
    window_2x2(img, |a, b| a.max(b))
}

fn erode_2x2(img: &GrayImage) -> GrayImage {
    window_2x2(img, |a, b| a.min(b))
}

fn window_2x2(img: &GrayImage, fold: fn(u8, u8) -> u8) -> GrayImage {
    let (width, height) = img.dimensions();
    let mut out = GrayImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let mut acc = img.get_pixel(x, y)[0];
            for (dx, dy) in [(1, 0), (0, 1), (1, 1)] {
                let nx = (x + dx).min(width - 1);
                let ny = (y + dy).min(height - 1);
                acc = fold(acc, img.get_pixel(nx, ny)[0]);
            }
            out.put_pixel(x, y, Luma([acc]));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_region(width: u32, height: u32) -> DynamicImage {
        let img = GrayImage::from_fn(width, height, |x, y| {
            Luma([(((x * 7 + y * 3) % 256) as u8).wrapping_add((y % 13) as u8)])
        });
        DynamicImage::ImageLuma8(img)
    }

    #[test]
    fn test_output_is_binary() {
        let processed = preprocess_region(&gradient_region(12, 200));
        assert!(processed.pixels().all(|p| p[0] == 0 || p[0] == 255));
    }

    #[test]
    fn test_small_region_is_upscaled_to_working_height() {
        let scaled = clamp_to_working_height(&gradient_region(30, 10));
        // Aspect ratio preserved: 30x10 scales to 600x200.
        assert_eq!((scaled.width(), scaled.height()), (600, 200));
    }

    #[test]
    fn test_oversized_region_is_downscaled_to_working_height() {
        // Bottom crops of high-resolution scans must not reach the
        // denoiser at full size; its cost scales with pixel count.
        let scaled = clamp_to_working_height(&gradient_region(100, 800));
        assert_eq!((scaled.width(), scaled.height()), (50, 400));
    }

    #[test]
    fn test_in_band_region_is_not_resized() {
        let scaled = clamp_to_working_height(&gradient_region(16, 220));
        assert_eq!((scaled.width(), scaled.height()), (16, 220));
    }

    #[test]
    fn test_pipeline_bounds_working_size() {
        let processed = preprocess_region(&gradient_region(60, 1200));
        assert_eq!(processed.height(), MAX_REGION_HEIGHT);
        assert_eq!(processed.width(), 20);
    }

    #[test]
    fn test_pipeline_is_deterministic() {
        let region = gradient_region(8, 200);
        let a = preprocess_region(&region);
        let b = preprocess_region(&region);
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn test_closing_fills_single_pixel_gap() {
        // Two white pixels with a one-pixel gap: dilation bridges it and
        // the erosion that follows must not reopen the bridge completely.
        let mut img = GrayImage::new(6, 3);
        img.put_pixel(1, 1, Luma([255]));
        img.put_pixel(3, 1, Luma([255]));
        let closed = close_2x2(&img);
        assert!((0..3).any(|y| closed.get_pixel(2, y)[0] == 255));
    }

    #[test]
    fn test_clahe_preserves_flat_image() {
        // A constant image has nothing to equalize into; output must stay
        // uniform (single gray level everywhere).
        let flat = GrayImage::from_pixel(32, 32, Luma([128]));
        let out = clahe(&flat);
        let first = out.get_pixel(0, 0)[0];
        assert!(out.pixels().all(|p| p[0] == first));
    }

    #[test]
    fn test_clahe_narrow_region_has_no_dark_border() {
        // Width 20 with the 8x8 grid leaves the last tile column without
        // pixels; the blend must lean on populated tiles only instead of
        // dragging the right edge toward black.
        let flat = GrayImage::from_pixel(20, 64, Luma([200]));
        let out = clahe(&flat);
        let first = out.get_pixel(0, 0)[0];
        assert!(out.pixels().all(|p| p[0] == first));
    }

    #[test]
    fn test_denoise_preserves_constant_image() {
        // Every candidate patch is identical, so all weights are equal and
        // the weighted average reproduces the input exactly.
        let flat = GrayImage::from_pixel(30, 24, Luma([97]));
        let out = nl_means_denoise(&flat);
        assert!(out.pixels().all(|p| p[0] == 97));
    }

    #[test]
    fn test_denoise_attenuates_impulse_noise() {
        let mut img = GrayImage::from_pixel(24, 24, Luma([180]));
        img.put_pixel(12, 12, Luma([0]));
        let out = nl_means_denoise(&img);
        // The lone dark pixel is pulled toward its uniform surroundings.
        assert!(out.get_pixel(12, 12)[0] > 90);
    }
}
