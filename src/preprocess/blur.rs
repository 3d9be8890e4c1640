//! Smoothing filters over interleaved RGB frames.
//!
//! Kernel sizes are fixed: Gaussian 5x5 with sigma derived from the size
//! (`0.3 * ((k - 1) * 0.5 - 1) + 0.8 = 1.1`), median 5x5, bilateral with a
//! diameter of 9 and color/space sigmas of 75. Borders reflect without
//! repeating the edge sample, except the median which replicates edges.

use crate::image::ColorImage;
use crate::util::math::{reflect_101, replicate, saturate_u8};

const GAUSSIAN_KSIZE: usize = 5;
const MEDIAN_KSIZE: usize = 5;
const BILATERAL_DIAMETER: usize = 9;
const BILATERAL_SIGMA_COLOR: f32 = 75.0;
const BILATERAL_SIGMA_SPACE: f32 = 75.0;

const C: usize = ColorImage::CHANNELS;

fn gaussian_kernel(ksize: usize) -> Vec<f32> {
    let sigma = 0.3 * ((ksize as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let half = (ksize / 2) as f32;
    let scale = -0.5 / (sigma * sigma);
    let mut kernel: Vec<f32> = (0..ksize)
        .map(|i| {
            let d = i as f32 - half;
            (scale * d * d).exp()
        })
        .collect();
    let sum: f32 = kernel.iter().sum();
    for w in kernel.iter_mut() {
        *w /= sum;
    }
    kernel
}

/// Separable 5x5 Gaussian blur.
pub fn gaussian_blur(src: &ColorImage) -> ColorImage {
    let width = src.width();
    let height = src.height();
    let kernel = gaussian_kernel(GAUSSIAN_KSIZE);
    let half = (GAUSSIAN_KSIZE / 2) as isize;
    let data = src.data();

    let mut horizontal = vec![0.0f32; width * height * C];
    for y in 0..height {
        for x in 0..width {
            let mut acc = [0.0f32; C];
            for (k, w) in kernel.iter().enumerate() {
                let sx = reflect_101(x as isize + k as isize - half, width);
                let idx = (y * width + sx) * C;
                for c in 0..C {
                    acc[c] += w * data[idx + c] as f32;
                }
            }
            let out = (y * width + x) * C;
            horizontal[out..out + C].copy_from_slice(&acc);
        }
    }

    let mut out = vec![0u8; width * height * C];
    for y in 0..height {
        for x in 0..width {
            let mut acc = [0.0f32; C];
            for (k, w) in kernel.iter().enumerate() {
                let sy = reflect_101(y as isize + k as isize - half, height);
                let idx = (sy * width + x) * C;
                for c in 0..C {
                    acc[c] += w * horizontal[idx + c];
                }
            }
            let dst = (y * width + x) * C;
            for c in 0..C {
                out[dst + c] = saturate_u8(acc[c]);
            }
        }
    }

    ColorImage::new(out, width, height).expect("blur output matches input geometry")
}

/// 5x5 median filter applied per channel.
pub fn median_blur(src: &ColorImage) -> ColorImage {
    let width = src.width();
    let height = src.height();
    let half = (MEDIAN_KSIZE / 2) as isize;
    let data = src.data();
    let mut window = Vec::with_capacity(MEDIAN_KSIZE * MEDIAN_KSIZE);
    let mut out = vec![0u8; width * height * C];

    for y in 0..height {
        for x in 0..width {
            for c in 0..C {
                window.clear();
                for dy in -half..=half {
                    let sy = replicate(y as isize + dy, height);
                    for dx in -half..=half {
                        let sx = replicate(x as isize + dx, width);
                        window.push(data[(sy * width + sx) * C + c]);
                    }
                }
                let mid = window.len() / 2;
                let (_, median, _) = window.select_nth_unstable(mid);
                out[(y * width + x) * C + c] = *median;
            }
        }
    }

    ColorImage::new(out, width, height).expect("blur output matches input geometry")
}

/// Bilateral filter; color distance is the L1 sum over channels.
pub fn bilateral_blur(src: &ColorImage) -> ColorImage {
    let width = src.width();
    let height = src.height();
    let radius = (BILATERAL_DIAMETER / 2) as isize;
    let space_coeff = -0.5 / (BILATERAL_SIGMA_SPACE * BILATERAL_SIGMA_SPACE);
    let color_coeff = -0.5 / (BILATERAL_SIGMA_COLOR * BILATERAL_SIGMA_COLOR);
    let data = src.data();

    let mut offsets = Vec::new();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let r2 = (dx * dx + dy * dy) as f32;
            if r2.sqrt() > radius as f32 {
                continue;
            }
            offsets.push((dx, dy, (r2 * space_coeff).exp()));
        }
    }
    let color_weights: Vec<f32> = (0..=(255 * C))
        .map(|d| {
            let d = d as f32;
            (d * d * color_coeff).exp()
        })
        .collect();

    let mut out = vec![0u8; width * height * C];
    for y in 0..height {
        for x in 0..width {
            let center = (y * width + x) * C;
            let mut acc = [0.0f32; C];
            let mut wsum = 0.0f32;
            for &(dx, dy, space_w) in &offsets {
                let sx = reflect_101(x as isize + dx, width);
                let sy = reflect_101(y as isize + dy, height);
                let idx = (sy * width + sx) * C;
                let diff: usize = (0..C)
                    .map(|c| (data[idx + c] as i32 - data[center + c] as i32).unsigned_abs() as usize)
                    .sum();
                let w = space_w * color_weights[diff];
                for c in 0..C {
                    acc[c] += w * data[idx + c] as f32;
                }
                wsum += w;
            }
            for c in 0..C {
                out[center + c] = saturate_u8(acc[c] / wsum);
            }
        }
    }

    ColorImage::new(out, width, height).expect("blur output matches input geometry")
}
