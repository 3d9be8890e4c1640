//! HSV conversion and inclusive color range masking.

use crate::image::{ColorImage, OwnedImage};

/// Converts one RGB pixel to 8-bit HSV (H in `0..=179`, S and V in `0..=255`).
pub fn rgb_to_hsv(rgb: [u8; 3]) -> [u8; 3] {
    let [r, g, b] = rgb.map(i32::from);
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = v - min;

    let s = if v == 0 {
        0
    } else {
        ((diff * 255) as f32 / v as f32).round() as i32
    };

    let h = if diff == 0 {
        0.0
    } else {
        let diff = diff as f32;
        let mut h = if v == r {
            60.0 * (g - b) as f32 / diff
        } else if v == g {
            120.0 + 60.0 * (b - r) as f32 / diff
        } else {
            240.0 + 60.0 * (r - g) as f32 / diff
        };
        if h < 0.0 {
            h += 360.0;
        }
        h
    };
    let mut h8 = (h * 0.5).round() as i32;
    if h8 >= 180 {
        h8 -= 180;
    }

    [h8 as u8, s.clamp(0, 255) as u8, v as u8]
}

/// Converts a whole frame to HSV, stored in the same 3-channel layout.
pub fn to_hsv_image(src: &ColorImage) -> ColorImage {
    let mut data = Vec::with_capacity(src.data().len());
    for px in src.data().chunks_exact(ColorImage::CHANNELS) {
        data.extend_from_slice(&rgb_to_hsv([px[0], px[1], px[2]]));
    }
    ColorImage::new(data, src.width(), src.height()).expect("hsv output matches input geometry")
}

/// Marks pixels whose three channels all lie within `[lower, upper]` (inclusive).
pub fn in_range(src: &ColorImage, lower: [u8; 3], upper: [u8; 3]) -> OwnedImage {
    let data = src
        .data()
        .chunks_exact(ColorImage::CHANNELS)
        .map(|px| {
            let inside = (0..ColorImage::CHANNELS).all(|c| px[c] >= lower[c] && px[c] <= upper[c]);
            if inside {
                255
            } else {
                0
            }
        })
        .collect();
    OwnedImage::new(data, src.width(), src.height()).expect("mask matches input geometry")
}

/// Zeroes every pixel of `src` where `mask` is zero.
pub fn apply_mask(src: &ColorImage, mask: &OwnedImage) -> ColorImage {
    let mut data = src.data().to_vec();
    for (px, &m) in data
        .chunks_exact_mut(ColorImage::CHANNELS)
        .zip(mask.data().iter())
    {
        if m == 0 {
            px.fill(0);
        }
    }
    ColorImage::new(data, src.width(), src.height()).expect("masked output matches input geometry")
}

#[cfg(test)]
mod tests {
    use super::{apply_mask, in_range, rgb_to_hsv, to_hsv_image};
    use crate::image::ColorImage;

    #[test]
    fn primary_colors_map_to_expected_hues() {
        assert_eq!(rgb_to_hsv([255, 0, 0]), [0, 255, 255]);
        assert_eq!(rgb_to_hsv([0, 255, 0]), [60, 255, 255]);
        assert_eq!(rgb_to_hsv([0, 0, 255]), [120, 255, 255]);
        assert_eq!(rgb_to_hsv([128, 128, 128]), [0, 0, 128]);
        assert_eq!(rgb_to_hsv([0, 0, 0]), [0, 0, 0]);
    }

    #[test]
    fn in_range_is_inclusive_and_masks_color() {
        let img = ColorImage::from_fn(2, 1, |x, _| if x == 0 { [255, 0, 0] } else { [0, 0, 255] })
            .unwrap();
        let hsv = to_hsv_image(&img);
        let mask = in_range(&hsv, [0, 255, 255], [0, 255, 255]);
        assert_eq!(mask.data(), &[255, 0]);

        let masked = apply_mask(&img, &mask);
        assert_eq!(masked.pixel(0, 0), [255, 0, 0]);
        assert_eq!(masked.pixel(1, 0), [0, 0, 0]);
    }
}
